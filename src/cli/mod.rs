//! The cli module contains the subcommands and shared error handling for the `sheepdog` binary.
pub(crate) mod apply;
pub(crate) mod detect;
pub(crate) mod render;
pub(crate) mod restart;

use argh::FromArgs;
use log::LevelFilter;
use simplelog::{Config as LogConfig, SimpleLogger};
use snafu::ResultExt;

#[derive(FromArgs, PartialEq, Debug)]
/// Generate and apply network interface configuration.
pub(crate) struct Args {
    #[argh(option, short = 'l', default = "LevelFilter::Info")]
    /// logging verbosity (trace|debug|info|warn|error)
    log_level: LevelFilter,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Apply(apply::ApplyArgs),
    Detect(detect::DetectArgs),
    Render(render::RenderArgs),
    Restart(restart::RestartArgs),
}

pub(crate) fn run(args: Args) -> Result<()> {
    // SimpleLogger will send errors to stderr and anything less to stdout.
    SimpleLogger::init(args.log_level, LogConfig::default()).context(error::LoggerSnafu)?;

    match args.subcommand {
        SubCommand::Apply(args) => apply::run(args),
        SubCommand::Detect(args) => detect::run(args),
        SubCommand::Render(args) => render::run(args),
        SubCommand::Restart(args) => restart::run(args),
    }
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("{}", source))]
        Apply { source: crate::apply::Error },

        #[snafu(display("{}", source))]
        Detect { source: crate::detect::Error },

        #[snafu(display("{}", source))]
        NetConfig { source: crate::net_config::Error },

        #[snafu(display("Logger setup error: {}", source))]
        Logger { source: log::SetLoggerError },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;
