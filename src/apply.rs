//! The apply module drives the pipeline end to end: normalize every spec, resolve the batch's
//! topology, render for the selected backend, write the artifacts, then restart the networking
//! service.  Normalization, resolution, and rendering are pure; nothing touches the filesystem
//! until all three have succeeded.
//!
//! Writes and the restart are serialized host-wide behind a lock file: concurrent invocations
//! queue rather than interleave partial writes.  A failed write aborts the remaining writes but
//! never rolls back files already written; the error reports both so the caller can decide.
use crate::backend::{Artifact, Backend};
use crate::detect;
use crate::net_config::{self, InterfaceSpec};
use crate::service;
use crate::topology;
use log::{debug, info};
use nix::fcntl::{flock, FlockArg};
use snafu::ResultExt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCK_DIR: &str = "run/lock";
const LOCK_FILE: &str = "sheepdog.lock";

const MANAGED_BEGIN: &str = "# --- sheepdog managed block ---";
const MANAGED_END: &str = "# --- end sheepdog managed block ---";

pub(crate) struct ApplyOptions {
    /// Render for this backend instead of detecting one
    pub(crate) backend: Option<Backend>,
    /// Filesystem root the artifacts and lock are written under
    pub(crate) root: PathBuf,
    pub(crate) restart: bool,
    pub(crate) restart_timeout: Duration,
    /// Override the backend's restart command
    pub(crate) restart_command: Option<Vec<String>>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            backend: None,
            root: PathBuf::from("/"),
            restart: true,
            restart_timeout: Duration::from_secs(60),
            restart_command: None,
        }
    }
}

/// Normalize, resolve, and render a batch of raw interface descriptions without touching the
/// filesystem.  This is the pure front half of `configure`, shared with offline rendering.
pub(crate) fn render_artifacts(specs: &[InterfaceSpec], backend: Backend) -> Result<Vec<Artifact>> {
    let models = net_config::normalize_batch(specs)
        .map_err(|errors| error::ValidationSnafu { errors }.build())?;
    let batch = topology::resolve(models).context(error::TopologySnafu)?;

    let artifacts = backend.render(&batch).context(error::RenderSnafu)?;
    info!(
        "Rendered {} artifact(s) for {} interface(s) via the {} backend",
        artifacts.len(),
        batch.len(),
        backend
    );

    Ok(artifacts)
}

/// Apply a batch of raw interface descriptions to the host
pub(crate) fn configure(specs: &[InterfaceSpec], options: &ApplyOptions) -> Result<()> {
    let backend = match options.backend {
        Some(backend) => backend,
        None => detect::cached_backend().context(error::DetectSnafu)?,
    };

    let artifacts = render_artifacts(specs, backend)?;

    let _lock = HostLock::acquire(&options.root)?;
    write_artifacts(&artifacts, &options.root)?;

    if options.restart {
        match &options.restart_command {
            Some(command) => service::restart_with_command(command, options.restart_timeout),
            None => service::restart(backend, options.restart_timeout),
        }
        .context(error::RestartSnafu)?;
    }

    Ok(())
}

/// Restart the networking service on its own; safe to invoke even if nothing changed
pub(crate) fn restart_service(backend: Option<Backend>, timeout: Duration) -> Result<()> {
    let backend = match backend {
        Some(backend) => backend,
        None => detect::cached_backend().context(error::DetectSnafu)?,
    };

    let _lock = HostLock::acquire(Path::new("/"))?;
    service::restart(backend, timeout).context(error::RestartSnafu)
}

/// Write every artifact under the given root, stopping at the first failure.  Files already
/// written stay in place; the error names them alongside the failing path.
pub(crate) fn write_artifacts(artifacts: &[Artifact], root: &Path) -> Result<()> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = rooted_path(root, &artifact.target.path());
        match write_artifact(artifact, &path) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                written.push(path);
            }
            Err(source) => {
                return Err(source).context(error::ArtifactWriteSnafu { path, written });
            }
        }
    }

    Ok(())
}

/// Persist one artifact via write-temp-then-rename, so either the old or the new content is
/// visible, never a torn write
fn write_artifact(artifact: &Artifact, path: &Path) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("/"));
    fs::create_dir_all(parent)?;

    let content = if artifact.target.merges() {
        let existing = match fs::read_to_string(path) {
            Ok(existing) => existing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        merge_managed_block(&existing, &artifact.content)
    } else {
        artifact.content.clone()
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Splice our managed block into an existing file's content, replacing a previous block if one
/// is present and appending otherwise.  Content outside the markers is left untouched.
fn merge_managed_block(existing: &str, fragment: &str) -> String {
    let mut block = format!("{}\n{}", MANAGED_BEGIN, fragment);
    if !block.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(MANAGED_END);
    block.push('\n');

    match (existing.find(MANAGED_BEGIN), existing.find(MANAGED_END)) {
        (Some(start), Some(end)) if start < end => {
            let mut tail = end + MANAGED_END.len();
            if existing[tail..].starts_with('\n') {
                tail += 1;
            }
            format!("{}{}{}", &existing[..start], block, &existing[tail..])
        }
        _ => {
            let mut merged = existing.to_string();
            if !merged.is_empty() {
                if !merged.ends_with('\n') {
                    merged.push('\n');
                }
                merged.push('\n');
            }
            merged.push_str(&block);
            merged
        }
    }
}

fn rooted_path(root: &Path, target: &Path) -> PathBuf {
    match target.strip_prefix("/") {
        Ok(relative) => root.join(relative),
        Err(_) => root.join(target),
    }
}

/// An exclusive, host-wide lock held around the write+restart critical section.  Acquisition
/// blocks until any concurrent apply finishes; the lock releases with the file descriptor on
/// every exit path.
struct HostLock {
    _file: File,
}

impl HostLock {
    fn acquire(root: &Path) -> Result<Self> {
        let dir = rooted_path(root, Path::new(LOCK_DIR));
        fs::create_dir_all(&dir).context(error::CreateDirSnafu { path: dir.clone() })?;

        let path = dir.join(LOCK_FILE);
        let file = File::create(&path).context(error::LockOpenSnafu { path: path.clone() })?;
        flock(file.as_raw_fd(), FlockArg::LockExclusive).context(error::LockSnafu { path })?;

        Ok(Self { _file: file })
    }
}

mod error {
    use snafu::Snafu;
    use std::io;
    use std::path::PathBuf;

    fn join_errors(errors: &[crate::net_config::Error]) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n  ")
    }

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Invalid interface configuration:\n  {}", join_errors(errors)))]
        Validation {
            errors: Vec<crate::net_config::Error>,
        },

        #[snafu(display("{}", source))]
        Topology { source: crate::topology::Error },

        #[snafu(display("{}", source))]
        Detect { source: crate::detect::Error },

        #[snafu(display("{}", source))]
        Render { source: crate::backend::Error },

        #[snafu(display("Unable to create directory '{}': {}", path.display(), source))]
        CreateDir { path: PathBuf, source: io::Error },

        #[snafu(display("Unable to open lock file '{}': {}", path.display(), source))]
        LockOpen { path: PathBuf, source: io::Error },

        #[snafu(display("Unable to lock '{}': {}", path.display(), source))]
        Lock {
            path: PathBuf,
            source: nix::Error,
        },

        #[snafu(display(
            "Unable to write artifact '{}' ({} already written): {}",
            path.display(),
            written.len(),
            source
        ))]
        ArtifactWrite {
            path: PathBuf,
            written: Vec<PathBuf>,
            source: io::Error,
        },

        #[snafu(display("{}", source))]
        Restart { source: crate::service::Error },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service;
    use std::fs;

    fn specs(toml: &str) -> Vec<InterfaceSpec> {
        net_config::from_str(toml).unwrap().interfaces
    }

    fn options_for(root: &Path, backend: Backend) -> ApplyOptions {
        ApplyOptions {
            backend: Some(backend),
            root: root.to_path_buf(),
            restart: false,
            ..Default::default()
        }
    }

    #[test]
    fn end_to_end_ifupdown_dhcp() {
        let root = tempfile::tempdir().unwrap();
        let marker = root.path().join("restarts");

        let mut options = options_for(root.path(), Backend::Ifupdown);
        options.restart = true;
        options.restart_command = Some(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!("echo restarted >> {}", marker.display()),
        ]);

        configure(
            &specs(
                r#"
                [[interface]]
                interface = "eth0"
                dhcp = true
            "#,
            ),
            &options,
        )
        .unwrap();

        let stanza_dir = root.path().join("etc/network/interfaces.d");
        let entries: Vec<_> = fs::read_dir(&stanza_dir).unwrap().flatten().collect();
        assert_eq!(1, entries.len());

        let stanza = fs::read_to_string(stanza_dir.join("eth0")).unwrap();
        assert!(stanza.contains("iface eth0 inet dhcp"));

        // Restart ran exactly once
        let restarts = fs::read_to_string(&marker).unwrap();
        assert_eq!(1, restarts.lines().count());
    }

    #[test]
    fn restart_failure_leaves_files_written() {
        let root = tempfile::tempdir().unwrap();

        let mut options = options_for(root.path(), Backend::Ifupdown);
        options.restart = true;
        options.restart_command = Some(vec!["false".to_string()]);

        let err = configure(
            &specs(
                r#"
                [[interface]]
                interface = "eth0"
                dhcp = true
            "#,
            ),
            &options,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Restart {
                source: service::Error::RestartFailed { .. }
            }
        ));

        // The stanza is on disk even though activation failed
        let stanza = root.path().join("etc/network/interfaces.d/eth0");
        assert!(stanza.is_file());
    }

    #[test]
    fn validation_failure_writes_nothing() {
        let root = tempfile::tempdir().unwrap();

        let err = configure(
            &specs(
                r#"
                [[interface]]
                interface = "eth0"
                dhcp = true
                ip_address = "192.168.1.10"
                prefix = 24
            "#,
            ),
            &options_for(root.path(), Backend::Ifupdown),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert!(!root.path().join("etc").exists());
    }

    #[test]
    fn topology_failure_writes_nothing() {
        let root = tempfile::tempdir().unwrap();

        let err = configure(
            &specs(
                r#"
                [[interface]]
                interface = "br0"
                bridge_ports = ["br1"]

                [[interface]]
                interface = "br1"
                bridge_ports = ["br0"]
            "#,
            ),
            &options_for(root.path(), Backend::Ifupdown),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Topology { .. }));
        assert!(!root.path().join("etc").exists());
    }

    #[test]
    fn dhcpcd_conf_merge_is_stable_across_applies() {
        let root = tempfile::tempdir().unwrap();

        // Host content outside our markers must survive
        let etc = root.path().join("etc");
        fs::create_dir_all(&etc).unwrap();
        fs::write(etc.join("dhcpcd.conf"), "hostname\npersistent\n").unwrap();

        let toml = r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            noarp = true
        "#;
        let options = options_for(root.path(), Backend::Dhcpcd);
        configure(&specs(toml), &options).unwrap();
        configure(&specs(toml), &options).unwrap();

        let conf = fs::read_to_string(etc.join("dhcpcd.conf")).unwrap();
        assert!(conf.starts_with("hostname\npersistent\n"));
        assert_eq!(1, conf.matches(MANAGED_BEGIN).count());
        assert_eq!(1, conf.matches(MANAGED_END).count());
        assert!(conf.contains("interface eth0\nnoarp\n"));
    }

    #[test]
    fn merge_replaces_previous_block() {
        let first = merge_managed_block("", "interface eth0\n");
        let second = merge_managed_block(&first, "interface eth1\n");

        assert_eq!(1, second.matches(MANAGED_BEGIN).count());
        assert!(second.contains("interface eth1"));
        assert!(!second.contains("interface eth0"));
    }

    #[test]
    fn merge_appends_after_host_content() {
        let merged = merge_managed_block("host content", "interface eth0\n");
        assert!(merged.starts_with("host content\n\n"));
        assert!(merged.ends_with(&format!("{}\n", MANAGED_END)));
    }
}
