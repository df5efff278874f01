/*!
sheepdog turns a backend-agnostic description of desired network-interface state into concrete
configuration for the network stack that owns the host -- netplan YAML, classic ifupdown
`interfaces.d` stanzas, `dhcpcd.conf` fragments, or pppd provider files for PPPoE links -- then
writes the rendered files atomically and restarts networking so the change takes effect.

Interfaces are described in a TOML file as a list of `[[interface]]` tables covering physical
NICs, VLANs, bridges, and PPPoE links.  Descriptions are normalized into a single canonical
model (addressing mode, derived VLAN names, nameserver lists), ordered so bridges and VLANs
come after the devices they depend on, and rendered for exactly one backend per apply.

Subcommands:
* `apply` - render for the detected (or given) backend, write the artifacts, restart networking
* `render` - print or write the artifacts for one backend without touching the host
* `restart` - restart the networking service on its own
* `detect` - print the backend detected on the host
*/
mod apply;
mod backend;
mod cli;
mod detect;
mod interface_name;
mod model;
mod net_config;
mod service;
mod topology;
mod vlan_id;

use cli::Args;

fn run() -> cli::Result<()> {
    let args: Args = argh::from_env();
    cli::run(args)
}

// Returning a Result from main makes it print a Debug representation of the error, but with Snafu
// we have nice Display representations of the error, so we wrap "main" (run) and print any error.
// https://github.com/shepmaster/snafu/issues/110
fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
