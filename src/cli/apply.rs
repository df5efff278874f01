use super::{error, Result};
use crate::apply::{self, ApplyOptions};
use crate::backend::Backend;
use crate::net_config;
use argh::FromArgs;
use log::info;
use snafu::ResultExt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "apply")]
/// Write network configuration and restart networking
pub(crate) struct ApplyArgs {
    #[argh(option, short = 'c')]
    /// path to the network config file
    config: PathBuf,

    #[argh(option, short = 'b')]
    /// backend to render for instead of detecting one
    backend: Option<Backend>,

    #[argh(option, default = "PathBuf::from(\"/\")")]
    /// filesystem root to write artifacts under
    root: PathBuf,

    #[argh(option, default = "60")]
    /// seconds to wait for the networking restart
    timeout: u64,

    #[argh(switch)]
    /// write artifacts without restarting networking
    no_restart: bool,
}

pub(crate) fn run(args: ApplyArgs) -> Result<()> {
    let net_config = net_config::from_path(&args.config).context(error::NetConfigSnafu)?;
    if !net_config.has_interfaces() {
        info!("No network interfaces were configured");
        return Ok(());
    }

    let options = ApplyOptions {
        backend: args.backend,
        root: args.root,
        restart: !args.no_restart,
        restart_timeout: Duration::from_secs(args.timeout),
        restart_command: None,
    };
    apply::configure(&net_config.interfaces, &options).context(error::ApplySnafu)
}
