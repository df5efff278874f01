//! The net_config module contains the structures needed to deserialize a `net.toml` file: the
//! raw, possibly-partial interface descriptions supplied by the caller.  It also contains the
//! normalizer, which converts raw descriptions into validated `InterfaceConfig` instances.
//!
//! These structures are the user-facing options for configuring one or more network interfaces.
mod error;
pub(crate) mod normalize;

use crate::vlan_id::VlanId;
pub(crate) use error::{Error, Result};
pub(crate) use normalize::{normalize, normalize_batch};
use serde::Deserialize;
use snafu::ResultExt;
use std::fs;
use std::path::Path;

/// A batch of raw interface descriptions; order is preserved and used as the application order
/// input for topology resolution.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NetConfig {
    #[serde(default, rename = "interface")]
    pub(crate) interfaces: Vec<InterfaceSpec>,
}

impl NetConfig {
    pub(crate) fn has_interfaces(&self) -> bool {
        !self.interfaces.is_empty()
    }
}

/// One raw interface description.  Any field may be absent; contradictions are caught during
/// normalization, not deserialization, so a caller sees every problem at once.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InterfaceSpec {
    pub(crate) interface: Option<String>,
    pub(crate) vlanid: Option<VlanId>,
    pub(crate) ifname: Option<String>,
    pub(crate) ip_address: Option<String>,
    pub(crate) prefix: Option<u8>,
    pub(crate) gateway: Option<String>,
    pub(crate) nameservers: Option<NameserverList>,
    pub(crate) dhcp: Option<bool>,
    pub(crate) manual: Option<bool>,
    pub(crate) optional: Option<bool>,
    pub(crate) noarp: Option<bool>,
    pub(crate) ppp: Option<bool>,
    pub(crate) provider: Option<String>,
    pub(crate) physical_interface: Option<String>,
    pub(crate) routes: Option<Vec<RawRoute>>,
    pub(crate) bridge_ports: Option<Vec<String>>,
    pub(crate) external_ports: Option<Vec<String>>,
    pub(crate) bridge_stp: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRoute {
    pub(crate) to: String,
    pub(crate) via: String,
}

/// Nameservers may be given as a sequence, or as a single delimited string.  A string splits on
/// any run of commas and/or whitespace, so `"8.8.8.8, 1.1.1.1 1.2.2.1"` yields three entries.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum NameserverList {
    List(Vec<String>),
    String(String),
}

impl NameserverList {
    pub(crate) fn tokens(&self) -> Vec<&str> {
        match self {
            Self::List(list) => list.iter().map(|s| s.trim()).collect(),
            Self::String(s) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }
}

/// Read a batch of raw interface descriptions from file
pub(crate) fn from_path<P>(path: P) -> Result<NetConfig>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let net_config_str =
        fs::read_to_string(path).context(error::NetConfigReadSnafu { path })?;
    from_str(&net_config_str)
}

pub(crate) fn from_str(net_config_str: &str) -> Result<NetConfig> {
    toml::from_str(net_config_str).context(error::NetConfigParseSnafu)
}
