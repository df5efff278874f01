//! The normalize module converts raw `InterfaceSpec` descriptions into validated
//! `InterfaceConfig` instances: defaults are applied, derived fields (VLAN interface names,
//! addressing mode) are resolved once, and contradictory field combinations are rejected.
//!
//! Validation problems are collected rather than short-circuited so the caller sees every
//! offending field at once.  Normalization is a pure function: no I/O, deterministic for
//! identical input.
use super::{error, Error, InterfaceSpec};
use crate::interface_name::InterfaceName;
use crate::model::{AddressingMode, InterfaceConfig, Route, RouteTo};
use ipnet::Ipv4Net;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// Normalize a batch of raw descriptions, collecting validation errors across all of them.
/// Resolved interface names must be unique within the batch.
pub(crate) fn normalize_batch(
    specs: &[InterfaceSpec],
) -> std::result::Result<Vec<InterfaceConfig>, Vec<Error>> {
    let mut errors = Vec::new();
    let mut models = Vec::with_capacity(specs.len());

    for spec in specs {
        match normalize(spec) {
            Ok(model) => models.push(model),
            Err(mut spec_errors) => errors.append(&mut spec_errors),
        }
    }

    let mut seen = HashSet::new();
    for model in &models {
        if !seen.insert(model.ifname.clone()) {
            errors.push(invalid(
                &model.interface,
                "ifname",
                format!("duplicate interface name '{}' in batch", model.ifname),
            ));
        }
    }

    if errors.is_empty() {
        Ok(models)
    } else {
        Err(errors)
    }
}

/// Normalize a single raw description, returning one error per offending field.
pub(crate) fn normalize(spec: &InterfaceSpec) -> std::result::Result<InterfaceConfig, Vec<Error>> {
    let mut errors = Vec::new();

    // Identity used in error messages; fall back to a placeholder so problems with unnamed
    // specs are still reported
    let identity = spec
        .interface
        .clone()
        .unwrap_or_else(|| "<unnamed>".to_string());

    let interface = match &spec.interface {
        Some(name) => match InterfaceName::try_from(name.as_str()) {
            Ok(name) => Some(name),
            Err(e) => {
                errors.push(invalid(&identity, "interface", e.to_string()));
                None
            }
        },
        None => {
            errors.push(invalid(&identity, "interface", "required field is missing"));
            None
        }
    };

    let ifname = resolve_ifname(spec, &interface, &identity, &mut errors);
    let addressing = resolve_addressing(spec, &identity, &mut errors);
    let nameservers = resolve_nameservers(spec, &identity, &mut errors);
    let routes = resolve_routes(spec, &identity, &mut errors);
    let (bridge_ports, external_ports) = resolve_bridge(spec, &ifname, &identity, &mut errors);

    match (interface, ifname, addressing) {
        (Some(interface), Some(ifname), Some(addressing)) if errors.is_empty() => {
            Ok(InterfaceConfig {
                interface,
                vlan_id: spec.vlanid.clone(),
                ifname,
                addressing,
                nameservers,
                optional: spec.optional.unwrap_or(false),
                no_arp: spec.noarp.unwrap_or(false),
                routes,
                bridge_ports,
                external_ports,
                bridge_stp: spec.bridge_stp.unwrap_or(false),
            })
        }
        _ => Err(errors),
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// The configured name is the explicit `ifname` when given, `{interface}.{vlanid}` for VLANs,
/// and the interface name itself otherwise.
fn resolve_ifname(
    spec: &InterfaceSpec,
    interface: &Option<InterfaceName>,
    identity: &str,
    errors: &mut Vec<Error>,
) -> Option<InterfaceName> {
    if let Some(explicit) = &spec.ifname {
        return match InterfaceName::try_from(explicit.as_str()) {
            Ok(name) => Some(name),
            Err(e) => {
                errors.push(invalid(identity, "ifname", e.to_string()));
                None
            }
        };
    }

    match (interface, &spec.vlanid) {
        (Some(base), Some(id)) => match InterfaceName::try_from(format!("{}.{}", base, id)) {
            Ok(name) => Some(name),
            // The base name fits but the derived name may not, e.g. "verylongname.4094"
            Err(e) => {
                errors.push(invalid(identity, "ifname", e.to_string()));
                None
            }
        },
        (Some(base), None) => Some(base.clone()),
        (None, _) => None,
    }
}

/// Decide the addressing mode once; every combination of two modes is a validation error for
/// each field involved, never a silent override.
fn resolve_addressing(
    spec: &InterfaceSpec,
    identity: &str,
    errors: &mut Vec<Error>,
) -> Option<AddressingMode> {
    let dhcp = spec.dhcp.unwrap_or(false);
    let manual = spec.manual.unwrap_or(false);
    let ppp = spec.ppp.unwrap_or(false);
    let has_static = spec.ip_address.is_some() || spec.prefix.is_some();

    let mut mode_fields = Vec::new();
    if dhcp {
        mode_fields.push("dhcp");
    }
    if has_static {
        mode_fields.push(if spec.ip_address.is_some() {
            "ip_address"
        } else {
            "prefix"
        });
    }
    if manual {
        mode_fields.push("manual");
    }
    if ppp {
        mode_fields.push("ppp");
    }

    if mode_fields.len() > 1 {
        let conflict = mode_fields.join(", ");
        for field in &mode_fields {
            errors.push(invalid(
                identity,
                field,
                format!("conflicting addressing modes: {}", conflict),
            ));
        }
        return None;
    }

    if !ppp {
        for (field, present) in [
            ("provider", spec.provider.is_some()),
            ("physical_interface", spec.physical_interface.is_some()),
        ] {
            if present {
                errors.push(invalid(identity, field, "only valid when ppp is enabled"));
            }
        }
    }

    if spec.gateway.is_some() && !has_static {
        errors.push(invalid(
            identity,
            "gateway",
            "only valid with static addressing",
        ));
    }

    if ppp {
        return resolve_ppp(spec, identity, errors);
    }
    if dhcp {
        return Some(AddressingMode::Dhcp);
    }
    if has_static {
        return resolve_static(spec, identity, errors);
    }
    Some(AddressingMode::Manual)
}

fn resolve_ppp(
    spec: &InterfaceSpec,
    identity: &str,
    errors: &mut Vec<Error>,
) -> Option<AddressingMode> {
    // PPP links are pppd's to address; the device kinds below can't carry one
    if spec.vlanid.is_some() {
        errors.push(invalid(identity, "vlanid", "cannot be combined with ppp"));
    }
    if spec.bridge_ports.is_some() {
        errors.push(invalid(
            identity,
            "bridge_ports",
            "cannot be combined with ppp",
        ));
    }

    let provider = match &spec.provider {
        Some(provider) if !provider.is_empty() => Some(provider.clone()),
        Some(_) => {
            errors.push(invalid(identity, "provider", "must not be empty"));
            None
        }
        None => {
            errors.push(invalid(identity, "provider", "required when ppp is enabled"));
            None
        }
    };

    let physical_interface = match &spec.physical_interface {
        Some(physical) => match InterfaceName::try_from(physical.as_str()) {
            Ok(name) => Some(name),
            Err(e) => {
                errors.push(invalid(identity, "physical_interface", e.to_string()));
                None
            }
        },
        None => {
            errors.push(invalid(
                identity,
                "physical_interface",
                "required when ppp is enabled",
            ));
            None
        }
    };

    match (provider, physical_interface) {
        (Some(provider), Some(physical_interface)) => Some(AddressingMode::Ppp {
            provider,
            physical_interface,
        }),
        _ => None,
    }
}

fn resolve_static(
    spec: &InterfaceSpec,
    identity: &str,
    errors: &mut Vec<Error>,
) -> Option<AddressingMode> {
    let address = match (&spec.ip_address, spec.prefix) {
        (Some(ip), Some(prefix)) => {
            let addr = match Ipv4Addr::from_str(ip) {
                Ok(addr) => Some(addr),
                Err(_) => {
                    errors.push(invalid(
                        identity,
                        "ip_address",
                        format!("'{}' is not an IPv4 address", ip),
                    ));
                    None
                }
            };
            if prefix > 32 {
                errors.push(invalid(
                    identity,
                    "prefix",
                    format!("'{}' is not in the range 0-32", prefix),
                ));
            }
            match addr {
                Some(addr) if prefix <= 32 => Ipv4Net::new(addr, prefix).ok(),
                _ => None,
            }
        }
        (Some(_), None) => {
            errors.push(invalid(
                identity,
                "prefix",
                "required together with ip_address",
            ));
            None
        }
        (None, Some(_)) => {
            errors.push(invalid(
                identity,
                "ip_address",
                "required together with prefix",
            ));
            None
        }
        (None, None) => None,
    };

    let gateway = match &spec.gateway {
        Some(gateway) => match Ipv4Addr::from_str(gateway) {
            Ok(gateway) => Some(gateway),
            Err(_) => {
                errors.push(invalid(
                    identity,
                    "gateway",
                    format!("'{}' is not an IPv4 address", gateway),
                ));
                return None;
            }
        },
        None => None,
    };

    address.map(|address| AddressingMode::Static { address, gateway })
}

/// Parse nameservers into an ordered, de-duplicated list; first occurrence wins.
fn resolve_nameservers(
    spec: &InterfaceSpec,
    identity: &str,
    errors: &mut Vec<Error>,
) -> Vec<IpAddr> {
    let mut nameservers = Vec::new();
    let mut seen = HashSet::new();

    for token in spec.nameservers.iter().flat_map(|list| list.tokens()) {
        match IpAddr::from_str(token) {
            Ok(addr) => {
                if seen.insert(addr) {
                    nameservers.push(addr);
                }
            }
            Err(_) => errors.push(invalid(
                identity,
                "nameservers",
                format!("'{}' is not an IP address", token),
            )),
        }
    }

    nameservers
}

fn resolve_routes(spec: &InterfaceSpec, identity: &str, errors: &mut Vec<Error>) -> Vec<Route> {
    let mut routes = Vec::new();

    for raw in spec.routes.iter().flatten() {
        let to = match RouteTo::from_str(&raw.to) {
            Ok(to) => Some(to),
            Err(_) => {
                errors.push(invalid(
                    identity,
                    "routes",
                    format!("'{}' is not 'default' or a network in CIDR form", raw.to),
                ));
                None
            }
        };
        let via = match IpAddr::from_str(&raw.via) {
            Ok(via) => Some(via),
            Err(_) => {
                errors.push(invalid(
                    identity,
                    "routes",
                    format!("'{}' is not an IP address", raw.via),
                ));
                None
            }
        };
        if let (Some(to), Some(via)) = (to, via) {
            routes.push(Route { to, via });
        }
    }

    routes
}

fn resolve_bridge(
    spec: &InterfaceSpec,
    ifname: &Option<InterfaceName>,
    identity: &str,
    errors: &mut Vec<Error>,
) -> (Vec<InterfaceName>, Vec<InterfaceName>) {
    let mut bridge_ports = Vec::new();
    for port in spec.bridge_ports.iter().flatten() {
        match InterfaceName::try_from(port.as_str()) {
            Ok(port) => bridge_ports.push(port),
            Err(e) => errors.push(invalid(identity, "bridge_ports", e.to_string())),
        }
    }

    if spec.bridge_ports.is_some() && spec.vlanid.is_some() {
        errors.push(invalid(
            identity,
            "vlanid",
            "cannot be combined with bridge_ports",
        ));
    }

    if let Some(ifname) = ifname {
        if bridge_ports.contains(ifname) {
            errors.push(invalid(
                identity,
                "bridge_ports",
                "a bridge cannot list itself as a port",
            ));
        }
    }

    let mut external_ports = Vec::new();
    for port in spec.external_ports.iter().flatten() {
        match InterfaceName::try_from(port.as_str()) {
            Ok(port) => external_ports.push(port),
            Err(e) => errors.push(invalid(identity, "external_ports", e.to_string())),
        }
    }
    for port in &external_ports {
        if !bridge_ports.contains(port) {
            errors.push(invalid(
                identity,
                "external_ports",
                format!("'{}' is not listed in bridge_ports", port),
            ));
        }
    }

    if spec.bridge_stp.is_some() && bridge_ports.is_empty() {
        errors.push(invalid(
            identity,
            "bridge_stp",
            "only valid with bridge_ports",
        ));
    }

    (bridge_ports, external_ports)
}

fn invalid<R>(interface: &str, field: &str, reason: R) -> Error
where
    R: Into<String>,
{
    error::InvalidFieldSnafu {
        interface,
        field,
        reason: reason.into(),
    }
    .build()
}
