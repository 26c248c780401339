//! Line output for allocation maps and route resolutions.

use super::terminal::{
    allocation_label, colored_allocation_label, colored_match_label, match_label,
};
use crate::models::{num_aws_hosts, IpSubnet};
use crate::processing::{AllocationNode, Resolution, RouteMatch, VpcBlockMap};

/// Usable host count shown next to an IPv4 block.
fn hosts_field(cidr: &IpSubnet) -> String {
    match cidr {
        IpSubnet::V4(s) => num_aws_hosts(s.mask())
            .map(|hosts| format!("{hosts} hosts"))
            .unwrap_or_default(),
        IpSubnet::V6(_) => String::new(),
    }
}

fn format_node(node: &AllocationNode<IpSubnet>, label: &str) -> String {
    format!(
        "  {label} {:<43} {}",
        node.cidr.to_string(),
        hosts_field(&node.cidr)
    )
    .trim_end()
    .to_string()
}

fn block_header(map: &VpcBlockMap) -> String {
    format!(
        "{} {}: {} mapped, {} available, {} mixed",
        map.vpc_id, map.block, map.summary.mapped, map.summary.available, map.summary.mixed
    )
}

/// Header line plus one line per leaf, without colors.
pub fn format_block_map(map: &VpcBlockMap) -> Vec<String> {
    std::iter::once(block_header(map))
        .chain(
            map.nodes
                .iter()
                .map(|node| format_node(node, allocation_label(node.status))),
        )
        .collect()
}

/// Print allocation maps to stdout.
pub fn print_block_maps(maps: &[VpcBlockMap]) {
    log::info!("#Start print_block_maps() for {} block(s)", maps.len());
    for map in maps {
        println!("{}", block_header(map));
        for node in &map.nodes {
            let label = colored_allocation_label(node.status).to_string();
            println!("{}", format_node(node, &label));
        }
    }
}

/// One line per VPC block with its next free subnet.
pub fn format_next_available(next: &[(IpSubnet, Option<IpSubnet>)]) -> Vec<String> {
    next.iter()
        .map(|(block, subnet)| match subnet {
            Some(subnet) => format!("{block}: next free {subnet}"),
            None => format!("{block}: no free subnet of the requested size"),
        })
        .collect()
}

pub fn print_next_available(next: &[(IpSubnet, Option<IpSubnet>)]) {
    for line in format_next_available(next) {
        println!("{line}");
    }
}

fn resolution_header(resolution: &Resolution) -> String {
    match (resolution.outcome, resolution.matched()) {
        (RouteMatch::Matched { prefix_length, .. }, Some(matched)) => format!(
            "{} -> {} via {} (/{prefix_length}, {} candidate(s) checked)",
            resolution.destination,
            matched.candidate.destination,
            matched.candidate.gateway,
            resolution.candidates.len()
        ),
        _ => format!(
            "{} -> no matching route ({} candidate(s) checked)",
            resolution.destination,
            resolution.candidates.len()
        ),
    }
}

fn candidate_line(resolution: &Resolution, index: usize, label: &str) -> String {
    let c = &resolution.candidates[index].candidate;
    let source = c
        .prefix_list
        .as_ref()
        .map(|id| format!(" [{id}]"))
        .unwrap_or_default();
    format!(
        "  {label} #{:<3} {:<43} {}{source}",
        c.route_index,
        c.destination.to_string(),
        c.gateway
    )
}

/// Header, one line per candidate and one per warning, without colors.
pub fn format_resolution(resolution: &Resolution) -> Vec<String> {
    let mut lines = vec![resolution_header(resolution)];
    for (index, annotated) in resolution.candidates.iter().enumerate() {
        let label = match_label(annotated.status);
        lines.push(candidate_line(resolution, index, label));
    }
    for warning in &resolution.warnings {
        lines.push(format!("  skipped   {warning}"));
    }
    lines
}

/// Print a resolution to stdout.
pub fn print_resolution(resolution: &Resolution) {
    println!("{}", resolution_header(resolution));
    for (index, annotated) in resolution.candidates.iter().enumerate() {
        let label = colored_match_label(annotated.status).to_string();
        println!("{}", candidate_line(resolution, index, &label));
    }
    for warning in &resolution.warnings {
        println!("  skipped   {warning}");
    }
}
