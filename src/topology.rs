//! The topology module orders a batch of interface configs for safe sequential application.
//!
//! Bridges depend on their in-batch member ports, and VLANs depend on their base interface when
//! the base is part of the same batch.  The resolver produces a topological order (members and
//! parents first) using Kahn's algorithm over an arena of configs indexed by interface name.
//! Ties among independent interfaces are broken by original input order, so identical input
//! always yields identical output.
use crate::interface_name::InterfaceName;
use crate::model::InterfaceConfig;
use indexmap::IndexMap;
use snafu::ensure;

pub(crate) fn resolve(models: Vec<InterfaceConfig>) -> Result<Vec<InterfaceConfig>> {
    let mut by_name: IndexMap<InterfaceName, usize> = IndexMap::with_capacity(models.len());
    for (idx, model) in models.iter().enumerate() {
        // The normalizer already rejects duplicate names; re-assert here so the resolver is
        // safe to use on its own
        ensure!(
            by_name.insert(model.ifname.clone(), idx).is_none(),
            error::DuplicateInterfaceSnafu {
                interface: model.ifname.clone(),
            }
        );
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); models.len()];
    let mut blockers: Vec<usize> = vec![0; models.len()];
    for (idx, model) in models.iter().enumerate() {
        for port in &model.bridge_ports {
            match by_name.get(port) {
                Some(&port_idx) => {
                    dependents[port_idx].push(idx);
                    blockers[idx] += 1;
                }
                None => {
                    // A port that is neither in the batch nor declared pre-existing is more
                    // likely a typo than an intentional cross-batch reference
                    ensure!(
                        model.external_ports.contains(port),
                        error::UnresolvedPortSnafu {
                            bridge: model.ifname.clone(),
                            port: port.clone(),
                        }
                    );
                }
            }
        }

        // An absent VLAN base is a physical device assumed to exist on the host
        if model.is_vlan() {
            if let Some(&base_idx) = by_name.get(&model.interface) {
                if base_idx != idx {
                    dependents[base_idx].push(idx);
                    blockers[idx] += 1;
                }
            }
        }
    }

    let mut order = Vec::with_capacity(models.len());
    let mut emitted = vec![false; models.len()];
    while order.len() < models.len() {
        let ready = (0..models.len()).find(|&idx| !emitted[idx] && blockers[idx] == 0);
        match ready {
            Some(idx) => {
                emitted[idx] = true;
                order.push(idx);
                for &dependent in &dependents[idx] {
                    blockers[dependent] -= 1;
                }
            }
            None => {
                let members = cycle_members(&models, &dependents, &emitted);
                return error::DependencyCycleSnafu { members }.fail();
            }
        }
    }

    let mut slots: Vec<Option<InterfaceConfig>> = models.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}

/// Narrow the leftover nodes down to the ones actually on a cycle: iteratively strip nodes with
/// no remaining dependents, which removes anything merely downstream of a cycle.
fn cycle_members(
    models: &[InterfaceConfig],
    dependents: &[Vec<usize>],
    emitted: &[bool],
) -> String {
    let mut remaining: Vec<bool> = emitted.iter().map(|emitted| !emitted).collect();

    let mut stripped = true;
    while stripped {
        stripped = false;
        for idx in 0..models.len() {
            if remaining[idx] && !dependents[idx].iter().any(|&d| remaining[d]) {
                remaining[idx] = false;
                stripped = true;
            }
        }
    }

    let members: Vec<String> = models
        .iter()
        .enumerate()
        .filter(|(idx, _)| remaining[*idx])
        .map(|(_, model)| model.ifname.to_string())
        .collect();
    members.join(", ")
}

mod error {
    use crate::interface_name::InterfaceName;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Interface dependency cycle involving: {}", members))]
        DependencyCycle { members: String },

        #[snafu(display(
            "Bridge '{}' references port '{}' which is neither in the batch nor listed in external_ports",
            bridge,
            port
        ))]
        UnresolvedPort {
            bridge: InterfaceName,
            port: InterfaceName,
        },

        #[snafu(display("Duplicate interface '{}' in batch", interface))]
        DuplicateInterface { interface: InterfaceName },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;
