use snafu::Snafu;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum Error {
    #[snafu(display(
        "Invalid config for interface '{}', field '{}': {}",
        interface,
        field,
        reason
    ))]
    InvalidField {
        interface: String,
        field: String,
        reason: String,
    },

    #[snafu(display("Unable to read network config '{}': {}", path.display(), source))]
    NetConfigRead { path: PathBuf, source: io::Error },

    #[snafu(display("Unable to parse network config: {}", source))]
    NetConfigParse { source: toml::de::Error },
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
