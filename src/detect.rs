//! The detect module probes host state to decide which network-configuration backend is
//! authoritative.  The probe is a pure read of the filesystem; the result for the default root
//! is cached for the life of the process since the answer can't change underneath us without a
//! reinstall.
use crate::backend::Backend;
use once_cell::sync::OnceCell;
use std::fs;
use std::path::Path;

static DETECTED: OnceCell<Backend> = OnceCell::new();

/// Detect the backend for the host, probing at most once per process
pub(crate) fn cached_backend() -> Result<Backend> {
    DETECTED.get_or_try_init(|| detect_backend("/")).copied()
}

/// Probe the given filesystem root for the authoritative backend.
///
/// A netplan directory with rendered YAML wins; classic ifupdown config is next; a dhcpcd.conf
/// settles the remainder.  An empty netplan directory only counts when nothing else claims the
/// host, since several distributions ship the directory itself unconditionally.
pub(crate) fn detect_backend<P>(root: P) -> Result<Backend>
where
    P: AsRef<Path>,
{
    let root = root.as_ref();

    let netplan_dir = root.join("etc/netplan");
    if dir_contains_yaml(&netplan_dir) {
        return Ok(Backend::Netplan);
    }

    if root.join("etc/network/interfaces").is_file()
        || root.join("etc/network/interfaces.d").is_dir()
    {
        return Ok(Backend::Ifupdown);
    }

    if root.join("etc/dhcpcd.conf").is_file() {
        return Ok(Backend::Dhcpcd);
    }

    if netplan_dir.is_dir() {
        return Ok(Backend::Netplan);
    }

    error::UnknownBackendSnafu.fail()
}

fn dir_contains_yaml(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return false,
    };

    entries.flatten().any(|entry| {
        entry
            .path()
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false)
    })
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display(
            "Unable to determine network backend: no netplan, ifupdown, or dhcpcd configuration found"
        ))]
        UnknownBackend,
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;
