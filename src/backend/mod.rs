//! The backend module contains the renderers for the supported network-configuration stacks.
//! Each renderer is a pure function from a resolved batch of interface configs to a set of
//! artifacts; no renderer performs I/O.
//!
//! The renderers hang off a runtime `Backend` variant rather than a trait object: exactly one is
//! selected per apply, and the dispatch sites stay greppable.
pub(crate) mod dhcpcd;
pub(crate) mod ifupdown;
pub(crate) mod netplan;
pub(crate) mod pppoe;

use crate::interface_name::InterfaceName;
use crate::model::InterfaceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(crate) const NETPLAN_CONFIG_DIR: &str = "/etc/netplan";
pub(crate) const NETPLAN_CONFIG_FILE: &str = "10-sheepdog.yaml";
pub(crate) const INTERFACES_D_DIR: &str = "/etc/network/interfaces.d";
pub(crate) const DHCPCD_CONF: &str = "/etc/dhcpcd.conf";
pub(crate) const PPP_PEERS_DIR: &str = "/etc/ppp/peers";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Backend {
    Netplan,
    Ifupdown,
    Dhcpcd,
    Pppoe,
}

serde_plain::derive_fromstr_from_deserialize!(Backend);
serde_plain::derive_display_from_serialize!(Backend);

impl Backend {
    pub(crate) fn render(self, batch: &[InterfaceConfig]) -> Result<Vec<Artifact>> {
        match self {
            Backend::Netplan => netplan::render(batch),
            Backend::Ifupdown => ifupdown::render(batch),
            Backend::Dhcpcd => dhcpcd::render(batch),
            Backend::Pppoe => pppoe::render(batch),
        }
    }

    /// The command that activates this backend's configuration; safe to run repeatedly
    pub(crate) fn restart_command(self) -> &'static [&'static str] {
        match self {
            Backend::Netplan => &["netplan", "apply"],
            Backend::Ifupdown | Backend::Pppoe => &["systemctl", "restart", "networking"],
            Backend::Dhcpcd => &["systemctl", "restart", "dhcpcd"],
        }
    }
}

/// A rendered configuration file, ready to be persisted
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Artifact {
    pub(crate) target: Target,
    pub(crate) content: String,
}

/// The logical location an artifact belongs to.  Renderers only pick the target; translating a
/// target into a path on a particular filesystem root is the writer's concern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Target {
    /// The single netplan YAML document
    NetplanConfig,
    /// One stanza file per interface under interfaces.d
    InterfacesD(InterfaceName),
    /// A managed block merged into the host's dhcpcd.conf
    DhcpcdConf,
    /// A pppd peers file, keyed by provider name
    PppPeer(String),
}

impl Target {
    pub(crate) fn path(&self) -> PathBuf {
        match self {
            Target::NetplanConfig => PathBuf::from(NETPLAN_CONFIG_DIR).join(NETPLAN_CONFIG_FILE),
            Target::InterfacesD(name) => PathBuf::from(INTERFACES_D_DIR).join(name.to_string()),
            Target::DhcpcdConf => PathBuf::from(DHCPCD_CONF),
            Target::PppPeer(provider) => PathBuf::from(PPP_PEERS_DIR).join(provider),
        }
    }

    /// Whether this artifact is merged into an existing file rather than replacing it
    pub(crate) fn merges(&self) -> bool {
        matches!(self, Target::DhcpcdConf)
    }
}

mod error {
    use super::Backend;
    use crate::interface_name::InterfaceName;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display(
            "The {} backend cannot express the config for interface '{}': {}",
            backend,
            interface,
            reason
        ))]
        UnsupportedConfig {
            backend: Backend,
            interface: InterfaceName,
            reason: String,
        },

        #[snafu(display("Unable to serialize netplan config: {}", source))]
        NetplanSerialize { source: serde_yaml::Error },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;
