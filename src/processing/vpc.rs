//! Per-VPC allocation operations.
//!
//! Runs the allocation tree over every CIDR block of a VPC, using the VPC's
//! subnets as the occupied set.

use super::allocation::{
    allocation_summary_ip, map_children_ip, next_adjacent_free_ip, next_available_ip,
    AllocationNode, AllocationSummary, MapOptions,
};
use super::overlap::{find_overlaps, log_overlaps};
use crate::models::IpSubnet;
use crate::source::Vpc;

/// Allocation map of one VPC CIDR block.
#[derive(Debug, Clone)]
pub struct VpcBlockMap {
    pub vpc_id: String,
    pub block: IpSubnet,
    pub nodes: Vec<AllocationNode<IpSubnet>>,
    pub summary: AllocationSummary,
}

/// Map every block of `vpc`, or only `only_block` when given.
pub fn map_vpc(vpc: &Vpc, only_block: Option<IpSubnet>, options: &MapOptions) -> Vec<VpcBlockMap> {
    let subnets = vpc.subnet_cidrs();
    log_overlaps(&vpc.vpc_id, &find_overlaps(&subnets));

    let maps: Vec<VpcBlockMap> = vpc
        .cidr_blocks()
        .into_iter()
        .filter(|block| only_block.is_none_or(|only| only == *block))
        .map(|block| {
            let nodes = map_children_ip(block, &subnets, options);
            let summary = allocation_summary_ip(&nodes);
            VpcBlockMap {
                vpc_id: vpc.vpc_id.clone(),
                block,
                nodes,
                summary,
            }
        })
        .collect();

    if maps.is_empty() {
        log::warn!("{}: no matching CIDR blocks to map", vpc.label());
    }
    maps
}

/// Next free subnet in each block of `vpc`.
///
/// # Returns
/// One (block, next free subnet) pair per block
pub fn next_available_in_vpc(
    vpc: &Vpc,
    mask: Option<u8>,
    options: &MapOptions,
) -> Vec<(IpSubnet, Option<IpSubnet>)> {
    let subnets = vpc.subnet_cidrs();
    vpc.cidr_blocks()
        .into_iter()
        .map(|block| (block, next_available_ip(block, &subnets, mask, options)))
        .collect()
}

/// Next free same-size neighbour of `subnet` inside its VPC block.
pub fn adjacent_in_vpc(vpc: &Vpc, subnet: IpSubnet, limit: usize) -> Option<IpSubnet> {
    let Some(block) = vpc.cidr_blocks().into_iter().find(|b| b.contains(&subnet)) else {
        log::warn!("{subnet} is not inside any CIDR block of {}", vpc.label());
        return None;
    };
    let subnets = vpc.subnet_cidrs();
    next_adjacent_free_ip(subnet, block, &subnets, limit)
}
