use super::{error, Result};
use crate::apply;
use crate::backend::Backend;
use crate::net_config;
use argh::FromArgs;
use snafu::ResultExt;
use std::path::PathBuf;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "render")]
/// Render artifacts for a backend without touching the host
pub(crate) struct RenderArgs {
    #[argh(option, short = 'c')]
    /// path to the network config file
    config: PathBuf,

    #[argh(option, short = 'b')]
    /// backend to render for
    backend: Backend,

    #[argh(option, short = 'o')]
    /// write artifacts under this root instead of printing them
    out: Option<PathBuf>,
}

/// Render and print (or write) artifacts for one backend.  Useful for inspecting what an apply
/// would write, or for migration tooling rendering the same batch once per backend; outputs of
/// separate runs do not interact.
pub(crate) fn run(args: RenderArgs) -> Result<()> {
    let net_config = net_config::from_path(&args.config).context(error::NetConfigSnafu)?;
    let artifacts = apply::render_artifacts(&net_config.interfaces, args.backend)
        .context(error::ApplySnafu)?;

    match args.out {
        Some(root) => apply::write_artifacts(&artifacts, &root).context(error::ApplySnafu),
        None => {
            for artifact in artifacts {
                println!("# {}", artifact.target.path().display());
                println!("{}", artifact.content);
            }
            Ok(())
        }
    }
}
