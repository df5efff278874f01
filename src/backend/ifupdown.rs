//! The ifupdown renderer emits one `interfaces.d` stanza file per interface: an `auto` or
//! `allow-hotplug` line followed by an `iface <name> inet <method>` block.
use super::{error, Artifact, Backend, Result, Target};
use crate::model::{AddressingMode, InterfaceConfig};

const INDENT: &str = "    ";

pub(crate) fn render(batch: &[InterfaceConfig]) -> Result<Vec<Artifact>> {
    batch.iter().map(render_stanza).collect()
}

fn render_stanza(model: &InterfaceConfig) -> Result<Artifact> {
    if !model.routes.is_empty() {
        return error::UnsupportedConfigSnafu {
            backend: Backend::Ifupdown,
            interface: model.ifname.clone(),
            reason: "routes are only supported by the netplan backend",
        }
        .fail();
    }
    if model.no_arp {
        return error::UnsupportedConfigSnafu {
            backend: Backend::Ifupdown,
            interface: model.ifname.clone(),
            reason: "noarp is only supported by the dhcpcd backend",
        }
        .fail();
    }

    let mut lines = Vec::new();

    // Boot-non-critical interfaces are brought up on hotplug events instead of blocking boot
    if model.optional {
        lines.push(format!("allow-hotplug {}", model.ifname));
    } else {
        lines.push(format!("auto {}", model.ifname));
    }

    let method = match &model.addressing {
        AddressingMode::Static { .. } => "static",
        AddressingMode::Dhcp => "dhcp",
        AddressingMode::Manual => "manual",
        AddressingMode::Ppp { .. } => "ppp",
    };
    lines.push(format!("iface {} inet {}", model.ifname, method));

    match &model.addressing {
        AddressingMode::Static { address, gateway } => {
            lines.push(format!("{}address {}", INDENT, address.addr()));
            lines.push(format!("{}netmask {}", INDENT, address.netmask()));
            if let Some(gateway) = gateway {
                lines.push(format!("{}gateway {}", INDENT, gateway));
            }
        }
        AddressingMode::Ppp { provider, .. } => {
            lines.push(format!("{}provider {}", INDENT, provider));
        }
        AddressingMode::Dhcp | AddressingMode::Manual => {}
    }

    if !model.nameservers.is_empty() {
        let nameservers: Vec<String> = model.nameservers.iter().map(|ns| ns.to_string()).collect();
        lines.push(format!(
            "{}dns-nameservers {}",
            INDENT,
            nameservers.join(" ")
        ));
    }

    if model.is_vlan() {
        lines.push(format!("{}vlan-raw-device {}", INDENT, model.interface));
    }

    if model.is_bridge() {
        let ports: Vec<String> = model.bridge_ports.iter().map(|p| p.to_string()).collect();
        lines.push(format!("{}bridge_ports {}", INDENT, ports.join(" ")));
        lines.push(format!(
            "{}bridge_stp {}",
            INDENT,
            if model.bridge_stp { "on" } else { "off" }
        ));
    }

    let mut content = lines.join("\n");
    content.push('\n');

    Ok(Artifact {
        target: Target::InterfacesD(model.ifname.clone()),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net_config::{self, normalize_batch};
    use crate::topology;
    use std::fs;
    use std::path::PathBuf;

    const NET_CONFIG: &str = include_str!("../../test_data/net_config.toml");

    fn ifupdown_data() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("ifupdown")
    }

    fn rendered(toml: &str) -> Vec<Artifact> {
        let config = net_config::from_str(toml).unwrap();
        let batch = topology::resolve(normalize_batch(&config.interfaces).unwrap()).unwrap();
        render(&batch).unwrap()
    }

    // Every interface in the shared test config has a golden stanza file named after it
    #[test]
    fn net_config_to_stanzas() {
        let artifacts = rendered(NET_CONFIG);
        for artifact in artifacts {
            let name = match &artifact.target {
                Target::InterfacesD(name) => name.to_string(),
                other => panic!("expected an interfaces.d target, got {:?}", other),
            };
            let expected = fs::read_to_string(ifupdown_data().join(&name)).unwrap();
            assert_eq!(
                expected, artifact.content,
                "generated stanza does not match golden file for {}",
                name
            );
        }
    }

    #[test]
    fn dhcp_stanza() {
        let artifacts = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
        "#,
        );
        assert_eq!(1, artifacts.len());
        assert_eq!("auto eth0\niface eth0 inet dhcp\n", artifacts[0].content);
    }

    #[test]
    fn optional_uses_allow_hotplug() {
        let artifacts = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            optional = true
        "#,
        );
        assert!(artifacts[0].content.starts_with("allow-hotplug eth0\n"));
    }

    #[test]
    fn routes_are_unsupported() {
        let config = net_config::from_str(
            r#"
            [[interface]]
            interface = "eth0"
            ip_address = "10.0.0.2"
            prefix = 24

            [[interface.routes]]
            to = "default"
            via = "10.0.0.1"
        "#,
        )
        .unwrap();
        let batch = normalize_batch(&config.interfaces).unwrap();

        let err = render(&batch).unwrap_err();
        assert!(matches!(
            err,
            crate::backend::Error::UnsupportedConfig { .. }
        ));
    }

    #[test]
    fn rendering_is_idempotent() {
        assert_eq!(rendered(NET_CONFIG), rendered(NET_CONFIG));
    }
}
