//! The netplan renderer emits a single YAML document containing every interface in the batch,
//! keyed under the `ethernets`, `vlans`, or `bridges` stanza as appropriate.
use super::{error, Artifact, Backend, Result, Target};
use crate::interface_name::InterfaceName;
use crate::model::{AddressingMode, InterfaceConfig, Route};
use crate::vlan_id::VlanId;
use indexmap::IndexMap;
use ipnet::Ipv4Net;
use serde::Serialize;
use snafu::ResultExt;
use std::net::{IpAddr, Ipv4Addr};

pub(crate) fn render(batch: &[InterfaceConfig]) -> Result<Vec<Artifact>> {
    let mut ethernets = IndexMap::new();
    let mut vlans = IndexMap::new();
    let mut bridges = IndexMap::new();

    for model in batch {
        let options = address_options(model)?;
        let key = model.ifname.to_string();

        // Normalization rejects vlan+bridge combinations, so the order here doesn't hide one
        // behind the other
        if let Some(id) = &model.vlan_id {
            vlans.insert(
                key,
                VlanStanza {
                    id: id.clone(),
                    link: model.interface.clone(),
                    options,
                },
            );
        } else if model.is_bridge() {
            bridges.insert(
                key,
                BridgeStanza {
                    interfaces: model.bridge_ports.clone(),
                    parameters: BridgeParameters {
                        stp: model.bridge_stp,
                    },
                    options,
                },
            );
        } else {
            ethernets.insert(key, EthernetStanza { options });
        }
    }

    let config = NetplanConfig {
        network: Network {
            version: 2,
            ethernets,
            vlans,
            bridges,
        },
    };
    let content = serde_yaml::to_string(&config).context(error::NetplanSerializeSnafu)?;

    Ok(vec![Artifact {
        target: Target::NetplanConfig,
        content,
    }])
}

fn address_options(model: &InterfaceConfig) -> Result<AddressOptions> {
    let mut options = AddressOptions {
        routes: model.routes.clone(),
        optional: model.optional,
        ..Default::default()
    };

    if model.no_arp {
        return error::UnsupportedConfigSnafu {
            backend: Backend::Netplan,
            interface: model.ifname.clone(),
            reason: "netplan has no noarp setting",
        }
        .fail();
    }

    match &model.addressing {
        AddressingMode::Static { address, gateway } => {
            options.addresses = vec![*address];
            options.gateway4 = *gateway;
            if !model.nameservers.is_empty() {
                options.nameservers = Some(Nameservers {
                    addresses: model.nameservers.clone(),
                });
            }
        }
        AddressingMode::Dhcp => {
            options.dhcp4 = Some(true);
            if !model.nameservers.is_empty() {
                options.nameservers = Some(Nameservers {
                    addresses: model.nameservers.clone(),
                });
            }
        }
        AddressingMode::Manual => options.dhcp4 = Some(false),
        AddressingMode::Ppp { .. } => {
            return error::UnsupportedConfigSnafu {
                backend: Backend::Netplan,
                interface: model.ifname.clone(),
                reason: "pppoe links require the pppoe backend",
            }
            .fail();
        }
    }

    Ok(options)
}

#[derive(Debug, Serialize)]
struct NetplanConfig {
    network: Network,
}

#[derive(Debug, Serialize)]
struct Network {
    version: u8,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    ethernets: IndexMap<String, EthernetStanza>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    vlans: IndexMap<String, VlanStanza>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    bridges: IndexMap<String, BridgeStanza>,
}

#[derive(Debug, Serialize)]
struct EthernetStanza {
    #[serde(flatten)]
    options: AddressOptions,
}

#[derive(Debug, Serialize)]
struct VlanStanza {
    id: VlanId,
    link: InterfaceName,
    #[serde(flatten)]
    options: AddressOptions,
}

#[derive(Debug, Serialize)]
struct BridgeStanza {
    interfaces: Vec<InterfaceName>,
    parameters: BridgeParameters,
    #[serde(flatten)]
    options: AddressOptions,
}

#[derive(Debug, Serialize)]
struct BridgeParameters {
    stp: bool,
}

#[derive(Debug, Default, Serialize)]
struct AddressOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp4: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    addresses: Vec<Ipv4Net>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway4: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nameservers: Option<Nameservers>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    routes: Vec<Route>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
}

#[derive(Debug, Serialize)]
struct Nameservers {
    addresses: Vec<IpAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net_config::{self, normalize_batch};
    use crate::topology;
    use serde_yaml::Value;

    fn rendered(toml: &str) -> String {
        let config = net_config::from_str(toml).unwrap();
        let batch = topology::resolve(normalize_batch(&config.interfaces).unwrap()).unwrap();
        let artifacts = render(&batch).unwrap();
        assert_eq!(1, artifacts.len());
        assert_eq!(Target::NetplanConfig, artifacts[0].target);
        artifacts[0].content.clone()
    }

    #[test]
    fn static_round_trip() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "eth1"
            ip_address = "192.168.1.10"
            prefix = 24
            gateway = "192.168.1.1"
            nameservers = "8.8.8.8"
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        let eth1 = &value["network"]["ethernets"]["eth1"];
        assert_eq!(Value::from("192.168.1.10/24"), eth1["addresses"][0]);
        assert_eq!(Value::from("192.168.1.1"), eth1["gateway4"]);
        assert_eq!(
            Value::from("8.8.8.8"),
            eth1["nameservers"]["addresses"][0]
        );
    }

    #[test]
    fn dhcp_and_optional() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            optional = true
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        let eth0 = &value["network"]["ethernets"]["eth0"];
        assert_eq!(Value::from(true), eth0["dhcp4"]);
        assert_eq!(Value::from(true), eth0["optional"]);
        assert_eq!(Value::from(2), value["network"]["version"]);
    }

    #[test]
    fn manual_disables_dhcp() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "eth0"
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        assert_eq!(
            Value::from(false),
            value["network"]["ethernets"]["eth0"]["dhcp4"]
        );
    }

    #[test]
    fn vlan_stanza() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            vlanid = 10
            ip_address = "192.168.1.10"
            prefix = 24
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        let vlan = &value["network"]["vlans"]["eth0.10"];
        assert_eq!(Value::from(10), vlan["id"]);
        assert_eq!(Value::from("eth0"), vlan["link"]);
        assert_eq!(Value::from("192.168.1.10/24"), vlan["addresses"][0]);
    }

    #[test]
    fn bridge_stanza() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "br0"
            dhcp = true
            bridge_ports = ["eth0", "eth1"]
            bridge_stp = true

            [[interface]]
            interface = "eth0"

            [[interface]]
            interface = "eth1"
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        let br0 = &value["network"]["bridges"]["br0"];
        assert_eq!(Value::from("eth0"), br0["interfaces"][0]);
        assert_eq!(Value::from("eth1"), br0["interfaces"][1]);
        assert_eq!(Value::from(true), br0["parameters"]["stp"]);
    }

    #[test]
    fn routes_are_emitted_verbatim() {
        let content = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            ip_address = "10.0.0.2"
            prefix = 24

            [[interface.routes]]
            to = "default"
            via = "10.0.0.1"
        "#,
        );

        let value: Value = serde_yaml::from_str(&content).unwrap();
        let route = &value["network"]["ethernets"]["eth0"]["routes"][0];
        assert_eq!(Value::from("default"), route["to"]);
        assert_eq!(Value::from("10.0.0.1"), route["via"]);
    }

    #[test]
    fn ppp_is_unsupported() {
        let config = net_config::from_str(
            r#"
            [[interface]]
            interface = "ppp0"
            ppp = true
            provider = "myisp"
            physical_interface = "eth1"
        "#,
        )
        .unwrap();
        let batch = normalize_batch(&config.interfaces).unwrap();

        let err = render(&batch).unwrap_err();
        assert!(matches!(err, crate::backend::Error::UnsupportedConfig { .. }));
    }

    #[test]
    fn noarp_is_unsupported() {
        let config = net_config::from_str(
            r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            noarp = true
        "#,
        )
        .unwrap();
        let batch = normalize_batch(&config.interfaces).unwrap();

        let err = render(&batch).unwrap_err();
        assert!(matches!(err, crate::backend::Error::UnsupportedConfig { .. }));
    }

    #[test]
    fn rendering_is_idempotent() {
        let toml = r#"
            [[interface]]
            interface = "eth0"
            dhcp = true

            [[interface]]
            interface = "eth0"
            vlanid = 10
            ip_address = "192.168.1.10"
            prefix = 24
        "#;
        assert_eq!(rendered(toml), rendered(toml));
    }
}
