use super::{error, Result};
use crate::detect;
use argh::FromArgs;
use snafu::ResultExt;
use std::path::PathBuf;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "detect")]
/// Print the network backend detected on the host
pub(crate) struct DetectArgs {
    #[argh(option, default = "PathBuf::from(\"/\")")]
    /// filesystem root to probe
    root: PathBuf,
}

pub(crate) fn run(args: DetectArgs) -> Result<()> {
    let backend = detect::detect_backend(&args.root).context(error::DetectSnafu)?;
    println!("{}", backend);
    Ok(())
}
