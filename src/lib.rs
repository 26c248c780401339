//! CIDR allocation maps and route lookups for AWS VPC data.
//!
//! This crate provides:
//! - [`models`] - IPv4/IPv6 address and subnet value types
//! - [`processing`] - Allocation tree, route resolution and CIDR list hygiene
//! - [`source`] - Reading exported VPC snapshots
//! - [`output`] - Terminal output
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod source;

use std::error::Error;

pub use config::Config;
pub use error::{CidrError, ParseError};
pub use models::{Address, IpSubnet, IpVersion, Subnet};
pub use processing::{map_children, resolve, Resolution};

/// Print the allocation map of a VPC, optionally limited to one block.
pub fn run_map(
    snapshot: &source::Snapshot,
    vpc: &str,
    cidr: Option<&str>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let vpc = snapshot
        .vpc(vpc)
        .ok_or_else(|| format!("VPC not found in snapshot: {vpc}"))?;
    let only_block = cidr.map(IpSubnet::new).transpose()?;
    let maps = processing::map_vpc(vpc, only_block, &config.map_options());
    output::print_block_maps(&maps);
    Ok(())
}

/// Print the next free subnet in each block of a VPC.
pub fn run_next(
    snapshot: &source::Snapshot,
    vpc: &str,
    mask: Option<u8>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let vpc = snapshot
        .vpc(vpc)
        .ok_or_else(|| format!("VPC not found in snapshot: {vpc}"))?;
    let next = processing::next_available_in_vpc(vpc, mask, &config.map_options());
    output::print_next_available(&next);
    Ok(())
}

/// Print the next free neighbour of a subnet, e.g. to copy it to another AZ.
pub fn run_adjacent(
    snapshot: &source::Snapshot,
    vpc: &str,
    subnet: &str,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let vpc = snapshot
        .vpc(vpc)
        .ok_or_else(|| format!("VPC not found in snapshot: {vpc}"))?;
    let subnet = IpSubnet::new(subnet)?;
    match processing::adjacent_in_vpc(vpc, subnet, config.adjacent_limit) {
        Some(next) => println!("{subnet}: next free adjacent {next}"),
        None => println!(
            "{subnet}: no free adjacent subnet within {} step(s)",
            config.adjacent_limit
        ),
    }
    Ok(())
}

/// Resolve a destination against a route table and print every candidate.
pub fn run_resolve(
    snapshot: &source::Snapshot,
    route_table: &str,
    destination: &str,
) -> Result<Resolution, Box<dyn Error>> {
    let table = snapshot
        .route_table(route_table)
        .ok_or_else(|| format!("Route table not found in snapshot: {route_table}"))?;
    let resolution = resolve(destination, &table.routes, &snapshot.prefix_list_map())?;
    output::print_resolution(&resolution);
    Ok(resolution)
}
