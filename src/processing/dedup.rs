//! CIDR list parsing and de-duplication.

use crate::error::ParseError;
use crate::models::{IpSubnet, Subnet};
use itertools::{Either, Itertools};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse every entry of `items`, collecting failures instead of stopping.
///
/// # Returns
/// A tuple of (parsed subnets in input order, (text, error) for each failure)
pub fn parse_cidr_list<S: AsRef<str>>(items: &[S]) -> (Vec<IpSubnet>, Vec<(String, ParseError)>) {
    items
        .iter()
        .map(|item| {
            let text = item.as_ref();
            IpSubnet::new(text).map_err(|e| (text.to_string(), e))
        })
        .partition_map(|result| match result {
            Ok(subnet) => Either::Left(subnet),
            Err(failure) => Either::Right(failure),
        })
}

/// Sort by address (IPv4 first) and drop repeated entries.
pub fn sort_and_dedup(list: Vec<IpSubnet>) -> Vec<IpSubnet> {
    let before = list.len();
    let list: Vec<IpSubnet> = list.into_iter().sorted().dedup().collect();
    if list.len() < before {
        log::debug!("Removed {} duplicate CIDR(s)", before - list.len());
    }
    list
}

/// Entries that appear more than once, each reported once, sorted.
pub fn find_duplicates(list: &[IpSubnet]) -> Vec<IpSubnet> {
    list.iter().copied().duplicates().sorted().collect()
}

/// Split a mixed list by family.
pub fn split_families(list: &[IpSubnet]) -> (Vec<Subnet<Ipv4Addr>>, Vec<Subnet<Ipv6Addr>>) {
    list.iter().partition_map(|subnet| match subnet {
        IpSubnet::V4(s) => Either::Left(*s),
        IpSubnet::V6(s) => Either::Right(*s),
    })
}
