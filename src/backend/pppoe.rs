//! The pppoe renderer emits a pppd peers file per PPP spec, keyed by provider name and
//! referencing the physical interface the PPPoE session runs over.  Non-PPP specs don't
//! participate in this backend and are skipped.
use super::{error, Artifact, Backend, Result, Target};
use crate::model::{AddressingMode, InterfaceConfig};

pub(crate) fn render(batch: &[InterfaceConfig]) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for model in batch {
        let (provider, physical_interface) = match &model.addressing {
            AddressingMode::Ppp {
                provider,
                physical_interface,
            } => (provider, physical_interface),
            _ => continue,
        };

        // The normalizer guarantees a non-empty provider; re-assert since a peers file with an
        // empty key would land at the peers directory itself
        if provider.is_empty() {
            return error::UnsupportedConfigSnafu {
                backend: Backend::Pppoe,
                interface: model.ifname.clone(),
                reason: "provider must not be empty",
            }
            .fail();
        }

        let mut lines = vec![
            format!("# PPPoE provider written by sheepdog for {}", model.ifname),
            format!("plugin rp-pppoe.so {}", physical_interface),
            "noipdefault".to_string(),
            "defaultroute".to_string(),
            "hide-password".to_string(),
            "persist".to_string(),
            "noauth".to_string(),
        ];
        // Explicit nameservers win over whatever the peer offers
        if model.nameservers.is_empty() {
            lines.push("usepeerdns".to_string());
        }

        let mut content = lines.join("\n");
        content.push('\n');

        artifacts.push(Artifact {
            target: Target::PppPeer(provider.clone()),
            content,
        });
    }

    Ok(artifacts)
}
