use super::{error, Result};
use crate::apply;
use crate::backend::Backend;
use argh::FromArgs;
use snafu::ResultExt;
use std::time::Duration;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "restart")]
/// Restart the networking service without writing configuration
pub(crate) struct RestartArgs {
    #[argh(option, short = 'b')]
    /// backend whose service to restart instead of detecting one
    backend: Option<Backend>,

    #[argh(option, default = "60")]
    /// seconds to wait for the networking restart
    timeout: u64,
}

pub(crate) fn run(args: RestartArgs) -> Result<()> {
    apply::restart_service(args.backend, Duration::from_secs(args.timeout))
        .context(error::ApplySnafu)
}
