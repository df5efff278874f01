//! The dhcpcd renderer emits a single `dhcpcd.conf` fragment containing one `interface` block
//! per Dhcp or Static spec.  Manual specs are skipped entirely: dhcpcd has no directive for
//! them, and a bare block would enable DHCP.
//!
//! dhcpcd only configures addressing on devices that already exist, so specs that create
//! devices (bridges, VLANs) cannot be expressed by this backend.
use super::{error, Artifact, Backend, Result, Target};
use crate::model::{AddressingMode, InterfaceConfig};

pub(crate) fn render(batch: &[InterfaceConfig]) -> Result<Vec<Artifact>> {
    let mut blocks = Vec::new();

    for model in batch {
        if let Some(block) = render_block(model)? {
            blocks.push(block);
        }
    }

    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let mut content = blocks.join("\n\n");
    content.push('\n');

    Ok(vec![Artifact {
        target: Target::DhcpcdConf,
        content,
    }])
}

fn render_block(model: &InterfaceConfig) -> Result<Option<String>> {
    let unsupported = |reason: &str| {
        error::UnsupportedConfigSnafu {
            backend: Backend::Dhcpcd,
            interface: model.ifname.clone(),
            reason,
        }
        .fail()
    };

    if model.is_bridge() {
        return unsupported("dhcpcd cannot create bridge devices");
    }
    if model.is_vlan() {
        return unsupported("dhcpcd cannot create vlan devices");
    }
    if !model.routes.is_empty() {
        return unsupported("routes are only supported by the netplan backend");
    }

    let mut lines = vec![format!("interface {}", model.ifname)];

    match &model.addressing {
        AddressingMode::Static { address, gateway } => {
            lines.push(format!("static ip_address={}", address));
            match gateway {
                Some(gateway) => lines.push(format!("static routers={}", gateway)),
                None => lines.push("nogateway".to_string()),
            }
            if !model.nameservers.is_empty() {
                let nameservers: Vec<String> =
                    model.nameservers.iter().map(|ns| ns.to_string()).collect();
                lines.push(format!(
                    "static domain_name_servers={}",
                    nameservers.join(" ")
                ));
            }
        }
        AddressingMode::Dhcp => {}
        AddressingMode::Manual => return Ok(None),
        AddressingMode::Ppp { .. } => {
            return unsupported("pppoe links require the pppoe backend");
        }
    }

    if model.no_arp {
        lines.push("noarp".to_string());
    }

    Ok(Some(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net_config::{self, normalize_batch};
    use crate::topology;
    use std::fs;
    use std::path::PathBuf;

    fn dhcpcd_data() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("dhcpcd")
    }

    fn rendered(toml: &str) -> Vec<Artifact> {
        let config = net_config::from_str(toml).unwrap();
        let batch = topology::resolve(normalize_batch(&config.interfaces).unwrap()).unwrap();
        render(&batch).unwrap()
    }

    #[test]
    fn fragment_matches_golden_file() {
        let artifacts = rendered(
            r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            noarp = true

            [[interface]]
            interface = "eth1"
            ip_address = "192.168.1.10"
            prefix = 24
            gateway = "192.168.1.1"
            nameservers = "8.8.8.8, 1.1.1.1"

            [[interface]]
            interface = "eth2"
            ip_address = "10.0.0.2"
            prefix = 24
        "#,
        );

        assert_eq!(1, artifacts.len());
        assert_eq!(Target::DhcpcdConf, artifacts[0].target);

        let expected = fs::read_to_string(dhcpcd_data().join("dhcpcd.conf")).unwrap();
        assert_eq!(expected, artifacts[0].content);
    }

    #[test]
    fn manual_specs_are_skipped() {
        let artifacts = rendered(
            r#"
            [[interface]]
            interface = "eth0"
        "#,
        );
        assert!(artifacts.is_empty());
    }

    #[test]
    fn bridges_are_unsupported() {
        let config = net_config::from_str(
            r#"
            [[interface]]
            interface = "br0"
            dhcp = true
            bridge_ports = ["eth0"]

            [[interface]]
            interface = "eth0"
        "#,
        )
        .unwrap();
        let batch = topology::resolve(normalize_batch(&config.interfaces).unwrap()).unwrap();

        let err = render(&batch).unwrap_err();
        assert!(matches!(
            err,
            crate::backend::Error::UnsupportedConfig { .. }
        ));
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
        let toml = r#"
            [[interface]]
            interface = "eth0"
            dhcp = true
            noarp = true
        "#;
        assert_eq!(rendered(toml), rendered(toml));
    }
}
