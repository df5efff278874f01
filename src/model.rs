//! The model module contains `InterfaceConfig`, the normalized in-memory representation of one
//! interface's desired state.  Instances are created by the normalizer, consumed by exactly one
//! topology resolution pass and one rendering pass, then discarded; they are never mutated after
//! normalization.
//!
//! Addressing is a tagged union decided once during normalization.  Renderers match on the
//! variant and never re-derive the addressing mode from raw fields.
use crate::interface_name::InterfaceName;
use crate::vlan_id::VlanId;
use ipnet::{IpNet, Ipv4Net};
use serde::Serialize;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InterfaceConfig {
    /// The device named by the caller; identity key of the spec this config came from
    pub(crate) interface: InterfaceName,
    pub(crate) vlan_id: Option<VlanId>,
    /// The name actually configured; `{interface}.{vlanid}` for VLANs unless overridden
    pub(crate) ifname: InterfaceName,
    pub(crate) addressing: AddressingMode,
    pub(crate) nameservers: Vec<IpAddr>,
    /// Boot-non-critical marker
    pub(crate) optional: bool,
    pub(crate) no_arp: bool,
    /// Only the netplan backend can express routes
    pub(crate) routes: Vec<Route>,
    /// Non-empty ports designate this config as a bridge
    pub(crate) bridge_ports: Vec<InterfaceName>,
    /// Ports assumed to already exist on the host rather than in the batch
    pub(crate) external_ports: Vec<InterfaceName>,
    pub(crate) bridge_stp: bool,
}

impl InterfaceConfig {
    pub(crate) fn is_bridge(&self) -> bool {
        !self.bridge_ports.is_empty()
    }

    pub(crate) fn is_vlan(&self) -> bool {
        self.vlan_id.is_some()
    }
}

/// The mutually exclusive strategy by which an interface obtains its IP configuration.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AddressingMode {
    Static {
        address: Ipv4Net,
        gateway: Option<Ipv4Addr>,
    },
    Dhcp,
    Manual,
    Ppp {
        provider: String,
        physical_interface: InterfaceName,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Route {
    pub(crate) to: RouteTo,
    pub(crate) via: IpAddr,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RouteTo {
    Default,
    Net(IpNet),
}

impl FromStr for RouteTo {
    type Err = ipnet::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(RouteTo::Default);
        }
        IpNet::from_str(s).map(RouteTo::Net)
    }
}

impl Display for RouteTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteTo::Default => write!(f, "default"),
            RouteTo::Net(net) => write!(f, "{}", net),
        }
    }
}

serde_plain::derive_serialize_from_display!(RouteTo);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_to_from_str() {
        assert_eq!(RouteTo::Default, RouteTo::from_str("default").unwrap());
        assert_eq!(
            RouteTo::Net(IpNet::from_str("10.0.0.0/8").unwrap()),
            RouteTo::from_str("10.0.0.0/8").unwrap()
        );
        assert!(RouteTo::from_str("not-a-network").is_err())
    }

    #[test]
    fn route_to_display() {
        assert_eq!("default", RouteTo::Default.to_string());
        assert_eq!(
            "10.0.0.0/8",
            RouteTo::from_str("10.0.0.0/8").unwrap().to_string()
        )
    }
}
