//! The service module restarts the networking service so written configuration takes effect.
//! Restarting is idempotent: the underlying commands are safe to invoke even when nothing
//! changed.  A caller-supplied timeout bounds how long a hung service manager can stall us;
//! written files are left in place either way.
use snafu::{ensure, OptionExt, ResultExt};
use std::time::Duration;
use tokio::process::Command;

use crate::backend::Backend;

/// Restart the networking service for the given backend
pub(crate) fn restart(backend: Backend, timeout: Duration) -> Result<()> {
    let command: Vec<String> = backend
        .restart_command()
        .iter()
        .map(|s| s.to_string())
        .collect();
    restart_with_command(&command, timeout)
}

/// Run the given restart command, killing it and reporting a timeout if it outlives `timeout`
pub(crate) fn restart_with_command(command: &[String], timeout: Duration) -> Result<()> {
    let display = command.join(" ");
    let (program, args) = command.split_first().context(error::EmptyCommandSnafu)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(error::RuntimeSnafu)?;

    runtime.block_on(async {
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, output).await {
            Err(_) => error::RestartTimeoutSnafu {
                command: display.clone(),
                timeout_secs: timeout.as_secs(),
            }
            .fail(),
            Ok(output) => {
                let output = output.context(error::RestartSpawnSnafu {
                    command: display.clone(),
                })?;
                ensure!(
                    output.status.success(),
                    error::RestartFailedSnafu {
                        command: display.clone(),
                        status: output.status.to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    }
                );
                Ok(())
            }
        }
    })
}

mod error {
    use snafu::Snafu;
    use std::io;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Restart command is empty"))]
        EmptyCommand,

        #[snafu(display("Unable to build async runtime: {}", source))]
        Runtime { source: io::Error },

        #[snafu(display("Unable to run '{}': {}", command, source))]
        RestartSpawn { command: String, source: io::Error },

        #[snafu(display(
            "Restarting networking via '{}' failed ({}): {}",
            command,
            status,
            stderr
        ))]
        RestartFailed {
            command: String,
            status: String,
            stderr: String,
        },

        #[snafu(display(
            "Restarting networking via '{}' timed out after {}s; config files remain written",
            command,
            timeout_secs
        ))]
        RestartTimeout { command: String, timeout_secs: u64 },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn successful_restart() {
        let command = cmd(&["true"]);
        assert!(restart_with_command(&command, Duration::from_secs(5)).is_ok())
    }

    #[test]
    fn failed_restart() {
        let command = cmd(&["false"]);
        let err = restart_with_command(&command, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::RestartFailed { .. }))
    }

    #[test]
    fn restart_timeout() {
        let command = cmd(&["sleep", "5"]);
        let err = restart_with_command(&command, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, Error::RestartTimeout { .. }))
    }

    #[test]
    fn missing_restart_command() {
        let command = cmd(&["definitely-not-a-real-program-sheepdog"]);
        let err = restart_with_command(&command, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::RestartSpawn { .. }))
    }
}
