//! Subnet allocation tree.
//!
//! Splits a parent CIDR into allocated ("mapped") and free ("available")
//! blocks given the child subnets already carved out of it, and picks free
//! children for new subnets.

use crate::models::{Address, IpSubnet, Subnet};
use itertools::Itertools;
use serde::Serialize;

/// State of one leaf block of the allocation tree.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationStatus {
    /// Exactly an occupied subnet.
    Mapped,
    /// Overlaps no occupied subnet.
    Available,
    /// Depth limit reached while still partly occupied.
    Mixed,
}

/// A leaf block of the allocation tree.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationNode<S> {
    pub cidr: S,
    pub status: AllocationStatus,
}

impl<S> AllocationNode<S> {
    pub fn is_mapped(&self) -> bool {
        self.status == AllocationStatus::Mapped
    }

    pub fn is_available(&self) -> bool {
        self.status == AllocationStatus::Available
    }
}

/// Options for [`map_children`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    /// Maximum number of bisections below the parent. `None` means down to
    /// single addresses.
    pub max_depth: Option<u8>,
}

/// Leaf counts for a finished map.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationSummary {
    pub mapped: usize,
    pub available: usize,
    pub mixed: usize,
    /// Addresses in available leaves, saturating at `u128::MAX`.
    pub available_addresses: u128,
}

/// Partition `parent` into mapped and available blocks.
///
/// Blocks are bisected while partly occupied. Leaves come back in ascending
/// address order and together cover `parent` exactly. Occupied entries not
/// nested in `parent` are ignored. An occupied entry inside another occupied
/// entry is reported as a warning and only the outer one becomes a leaf.
pub fn map_children<A: Address>(
    parent: Subnet<A>,
    occupied: &[Subnet<A>],
    options: &MapOptions,
) -> Vec<AllocationNode<Subnet<A>>> {
    let nested = nested_occupied(parent, occupied);
    let max_depth = options.max_depth.unwrap_or(A::WIDTH);
    let mut nodes = Vec::new();
    bisect(parent, &nested, 0, max_depth, &mut nodes);
    log::debug!(
        "Mapped {parent} against {} occupied subnet(s) into {} block(s)",
        nested.len(),
        nodes.len()
    );
    nodes
}

fn bisect<A: Address>(
    block: Subnet<A>,
    occupied: &[Subnet<A>],
    depth: u8,
    max_depth: u8,
    nodes: &mut Vec<AllocationNode<Subnet<A>>>,
) {
    let overlapping: Vec<Subnet<A>> = occupied
        .iter()
        .filter(|o| block.overlaps(o))
        .copied()
        .collect();

    let status = if overlapping.is_empty() {
        AllocationStatus::Available
    } else if overlapping.contains(&block) {
        AllocationStatus::Mapped
    } else {
        match block.split() {
            Some((lo, hi)) if depth < max_depth => {
                bisect(lo, &overlapping, depth + 1, max_depth, nodes);
                bisect(hi, &overlapping, depth + 1, max_depth, nodes);
                return;
            }
            _ => {
                log::warn!(
                    "Subdivision depth limit {max_depth} reached at {block}, {} occupied subnet(s) left unresolved",
                    overlapping.len()
                );
                AllocationStatus::Mixed
            }
        }
    };
    nodes.push(AllocationNode {
        cidr: block,
        status,
    });
}

/// Occupied subnets inside `parent`, sorted and de-duplicated.
///
/// An entry lying inside another occupied entry is dropped with a warning,
/// the outer entry is mapped as one block.
fn nested_occupied<A: Address>(parent: Subnet<A>, occupied: &[Subnet<A>]) -> Vec<Subnet<A>> {
    let sorted: Vec<Subnet<A>> = occupied
        .iter()
        .filter(|o| {
            let inside = parent.contains(o);
            if !inside {
                log::debug!("Ignoring {o}: not nested in {parent}");
            }
            inside
        })
        .copied()
        .sorted()
        .dedup()
        .collect();

    // Sorted CIDRs nest or are disjoint: only the last kept one can contain the next
    let mut kept: Vec<Subnet<A>> = Vec::with_capacity(sorted.len());
    for subnet in sorted {
        match kept.last().copied() {
            Some(outer) if outer.contains(&subnet) => {
                log::warn!(
                    "Occupied {subnet} overlaps occupied {outer}, mapping {outer} only"
                );
            }
            _ => kept.push(subnet),
        }
    }
    kept
}

/// Only the available blocks of [`map_children`].
pub fn available_ranges<A: Address>(
    parent: Subnet<A>,
    occupied: &[Subnet<A>],
    options: &MapOptions,
) -> Vec<Subnet<A>> {
    map_children(parent, occupied, options)
        .into_iter()
        .filter(|n| n.is_available())
        .map(|n| n.cidr)
        .collect()
}

/// Lowest free child of `parent` with the given prefix length.
///
/// Without a prefix length, the most common one among the occupied subnets
/// is used (longer prefix on ties), or one bit longer than `parent` when
/// nothing is occupied. Returns `None` when no block of that size is free.
pub fn next_available<A: Address>(
    parent: Subnet<A>,
    occupied: &[Subnet<A>],
    mask: Option<u8>,
    options: &MapOptions,
) -> Option<Subnet<A>> {
    let nested = nested_occupied(parent, occupied);
    let mask = mask.unwrap_or_else(|| infer_mask(parent, &nested));
    if mask < parent.mask() || mask > A::WIDTH {
        log::warn!("Requested /{mask} does not fit inside {parent}");
        return None;
    }

    map_children(parent, &nested, options)
        .into_iter()
        .filter(|n| n.is_available() && n.cidr.mask() <= mask)
        .find_map(|n| Subnet::from_parts(n.cidr.addr(), mask).ok())
}

/// Prefix length to use when the caller gives none.
pub fn infer_mask<A: Address>(parent: Subnet<A>, occupied: &[Subnet<A>]) -> u8 {
    occupied
        .iter()
        .map(|s| s.mask())
        .counts()
        .into_iter()
        .max_by_key(|&(mask, count)| (count, mask))
        .map(|(mask, _)| mask)
        .unwrap_or_else(|| parent.mask().saturating_add(1).min(A::WIDTH))
}

/// First subnet after `subnet` (same size, at most `limit` steps away) that
/// stays inside `parent` and overlaps nothing in `occupied`.
pub fn next_adjacent_free<A: Address>(
    subnet: Subnet<A>,
    parent: Subnet<A>,
    occupied: &[Subnet<A>],
    limit: usize,
) -> Option<Subnet<A>> {
    subnet
        .next(limit)
        .take_while(|candidate| parent.contains(candidate))
        .find(|candidate| !occupied.iter().any(|o| o.overlaps(candidate)))
}

/// Count leaves by status.
pub fn allocation_summary<A: Address>(nodes: &[AllocationNode<Subnet<A>>]) -> AllocationSummary {
    nodes
        .iter()
        .fold(AllocationSummary::default(), |mut summary, node| {
            match node.status {
                AllocationStatus::Mapped => summary.mapped += 1,
                AllocationStatus::Mixed => summary.mixed += 1,
                AllocationStatus::Available => {
                    summary.available += 1;
                    let size = node.cidr.num_addresses().unwrap_or(u128::MAX);
                    summary.available_addresses = summary.available_addresses.saturating_add(size);
                }
            }
            summary
        })
}

/// [`map_children`] for a family-tagged parent. Occupied subnets of the
/// other family are ignored.
pub fn map_children_ip(
    parent: IpSubnet,
    occupied: &[IpSubnet],
    options: &MapOptions,
) -> Vec<AllocationNode<IpSubnet>> {
    match parent {
        IpSubnet::V4(p) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v4).collect();
            tag_nodes(map_children(p, &occupied, options))
        }
        IpSubnet::V6(p) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v6).collect();
            tag_nodes(map_children(p, &occupied, options))
        }
    }
}

/// [`next_available`] for a family-tagged parent.
pub fn next_available_ip(
    parent: IpSubnet,
    occupied: &[IpSubnet],
    mask: Option<u8>,
    options: &MapOptions,
) -> Option<IpSubnet> {
    match parent {
        IpSubnet::V4(p) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v4).collect();
            next_available(p, &occupied, mask, options).map(IpSubnet::V4)
        }
        IpSubnet::V6(p) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v6).collect();
            next_available(p, &occupied, mask, options).map(IpSubnet::V6)
        }
    }
}

/// [`next_adjacent_free`] for family-tagged values. `None` when `subnet`
/// and `parent` are of different families.
pub fn next_adjacent_free_ip(
    subnet: IpSubnet,
    parent: IpSubnet,
    occupied: &[IpSubnet],
    limit: usize,
) -> Option<IpSubnet> {
    match (subnet, parent) {
        (IpSubnet::V4(s), IpSubnet::V4(p)) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v4).collect();
            next_adjacent_free(s, p, &occupied, limit).map(IpSubnet::V4)
        }
        (IpSubnet::V6(s), IpSubnet::V6(p)) => {
            let occupied: Vec<_> = occupied.iter().filter_map(IpSubnet::as_v6).collect();
            next_adjacent_free(s, p, &occupied, limit).map(IpSubnet::V6)
        }
        _ => None,
    }
}

/// [`allocation_summary`] for family-tagged leaves.
pub fn allocation_summary_ip(nodes: &[AllocationNode<IpSubnet>]) -> AllocationSummary {
    let v4: Vec<_> = nodes
        .iter()
        .filter_map(|n| {
            let cidr = n.cidr.as_v4()?;
            Some(AllocationNode {
                cidr,
                status: n.status,
            })
        })
        .collect();
    let v6: Vec<_> = nodes
        .iter()
        .filter_map(|n| {
            let cidr = n.cidr.as_v6()?;
            Some(AllocationNode {
                cidr,
                status: n.status,
            })
        })
        .collect();
    let a = allocation_summary(&v4);
    let b = allocation_summary(&v6);
    AllocationSummary {
        mapped: a.mapped + b.mapped,
        available: a.available + b.available,
        mixed: a.mixed + b.mixed,
        available_addresses: a.available_addresses.saturating_add(b.available_addresses),
    }
}

fn tag_nodes<A: Address>(nodes: Vec<AllocationNode<Subnet<A>>>) -> Vec<AllocationNode<IpSubnet>>
where
    IpSubnet: From<Subnet<A>>,
{
    nodes
        .into_iter()
        .map(|n| AllocationNode {
            cidr: IpSubnet::from(n.cidr),
            status: n.status,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::AllocationStatus::{Available, Mapped, Mixed};

    fn v4(s: &str) -> Subnet<Ipv4Addr> {
        Subnet::new(s).unwrap()
    }

    fn v6(s: &str) -> Subnet<Ipv6Addr> {
        Subnet::new(s).unwrap()
    }

    fn leaf(s: &str, status: AllocationStatus) -> AllocationNode<Subnet<Ipv4Addr>> {
        AllocationNode {
            cidr: v4(s),
            status,
        }
    }

    fn mapped<A: Address>(nodes: &[AllocationNode<Subnet<A>>]) -> Vec<Subnet<A>> {
        nodes
            .iter()
            .filter(|n| n.is_mapped())
            .map(|n| n.cidr)
            .collect()
    }

    /// Leaves are contiguous, ascending and span exactly `parent`.
    fn assert_covers<A: Address>(parent: Subnet<A>, nodes: &[AllocationNode<Subnet<A>>]) {
        assert!(!nodes.is_empty());
        assert_eq!(nodes[0].cidr.lo(), parent.lo());
        assert_eq!(nodes[nodes.len() - 1].cidr.hi(), parent.hi());
        for pair in nodes.windows(2) {
            let expected_next = pair[0].cidr.hi().checked_offset(1);
            assert_eq!(Some(pair[1].cidr.lo()), expected_next, "gap or overlap");
        }
        for node in nodes {
            assert!(parent.contains(&node.cidr));
        }
    }

    #[test]
    fn test_map_children_example() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![v4("10.0.0.0/24"), v4("10.0.5.0/24")];
        let nodes = map_children(parent, &occupied, &MapOptions::default());

        assert_covers(parent, &nodes);
        assert_eq!(mapped(&nodes), occupied);
        assert!(nodes.iter().all(|n| n.status != Mixed));

        let expected = vec![
            leaf("10.0.0.0/24", Mapped),
            leaf("10.0.1.0/24", Available),
            leaf("10.0.2.0/23", Available),
            leaf("10.0.4.0/24", Available),
            leaf("10.0.5.0/24", Mapped),
            leaf("10.0.6.0/23", Available),
            leaf("10.0.8.0/21", Available),
            leaf("10.0.16.0/20", Available),
            leaf("10.0.32.0/19", Available),
            leaf("10.0.64.0/18", Available),
            leaf("10.0.128.0/17", Available),
        ];
        assert_eq!(nodes, expected);
    }

    #[test]
    fn test_map_children_empty_and_full() {
        let parent = v4("10.0.0.0/16");
        let nodes = map_children(parent, &[], &MapOptions::default());
        assert_eq!(nodes, vec![leaf("10.0.0.0/16", Available)]);

        let nodes = map_children(parent, &[parent], &MapOptions::default());
        assert_eq!(nodes, vec![leaf("10.0.0.0/16", Mapped)]);
    }

    #[test]
    fn test_map_children_ignores_outside_and_duplicates() {
        let parent = v4("10.0.0.0/24");
        let occupied = vec![
            v4("10.0.0.128/25"),
            v4("10.0.0.128/25"),
            v4("10.1.0.0/24"),
            v4("10.0.0.0/8"),
        ];
        let nodes = map_children(parent, &occupied, &MapOptions::default());
        assert_covers(parent, &nodes);
        assert_eq!(
            nodes,
            vec![
                leaf("10.0.0.0/25", Available),
                leaf("10.0.0.128/25", Mapped),
            ]
        );
    }

    #[test]
    fn test_map_children_overlapping_occupied() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![v4("10.0.0.0/24"), v4("10.0.0.0/25"), v4("10.0.1.0/24")];
        let nodes = map_children(parent, &occupied, &MapOptions::default());

        // The /25 inside the first /24 is folded into it
        assert_covers(parent, &nodes);
        assert_eq!(mapped(&nodes), vec![v4("10.0.0.0/24"), v4("10.0.1.0/24")]);
        assert_eq!(nodes[0], leaf("10.0.0.0/24", Mapped));

        let reversed: Vec<_> = occupied.iter().rev().copied().collect();
        let options = MapOptions::default();
        assert_eq!(map_children(parent, &reversed, &options), nodes);
    }

    #[test]
    fn test_nested_occupied_keeps_outermost() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![
            v4("10.0.4.0/24"),
            v4("10.0.0.0/22"),
            v4("10.0.1.0/24"),
            v4("10.0.1.128/25"),
            v4("10.0.4.0/24"),
        ];
        assert_eq!(
            nested_occupied(parent, &occupied),
            vec![v4("10.0.0.0/22"), v4("10.0.4.0/24")]
        );
        let occupied = [parent, v4("10.0.9.0/24")];
        assert_eq!(nested_occupied(parent, &occupied), vec![parent]);
    }

    #[test]
    fn test_map_children_host_granularity() {
        let parent = v4("192.168.0.0/24");
        let occupied = vec![v4("192.168.0.77/32"), v4("192.168.0.200/29")];
        let nodes = map_children(parent, &occupied, &MapOptions::default());
        assert_covers(parent, &nodes);
        assert_eq!(mapped(&nodes), occupied);
    }

    #[test]
    fn test_map_children_depth_limit() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![v4("10.0.0.0/24")];
        let options = MapOptions { max_depth: Some(4) };
        let nodes = map_children(parent, &occupied, &options);

        assert_covers(parent, &nodes);
        assert_eq!(nodes[0], leaf("10.0.0.0/20", Mixed));
        assert!(nodes[1..].iter().all(|n| n.is_available()));
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn test_map_children_ipv6() {
        let parent = v6("2600:1f18:aaaa::/56");
        let occupied = vec![v6("2600:1f18:aaaa:1::/64"), v6("2600:1f18:aaaa:ff::/64")];
        let nodes = map_children(parent, &occupied, &MapOptions::default());
        assert_covers(parent, &nodes);
        assert_eq!(mapped(&nodes), occupied);
        assert_eq!(nodes[0].cidr, v6("2600:1f18:aaaa::/64"));
        assert!(nodes[0].is_available());
    }

    #[test]
    fn test_map_children_is_deterministic() {
        let parent = v4("172.16.0.0/20");
        let a = vec![
            v4("172.16.3.0/24"),
            v4("172.16.0.0/26"),
            v4("172.16.8.0/22"),
        ];
        let mut b = a.clone();
        b.reverse();
        let options = MapOptions::default();
        assert_eq!(
            map_children(parent, &a, &options),
            map_children(parent, &b, &options)
        );
    }

    #[test]
    fn test_available_ranges() {
        let parent = v4("10.0.0.0/22");
        let free = available_ranges(parent, &[v4("10.0.1.0/24")], &MapOptions::default());
        assert_eq!(free, vec![v4("10.0.0.0/24"), v4("10.0.2.0/23")]);
    }

    #[test]
    fn test_next_available() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![v4("10.0.0.0/24"), v4("10.0.1.0/24"), v4("10.0.3.0/24")];
        let next = |mask| next_available(parent, &occupied, mask, &MapOptions::default());
        assert_eq!(next(Some(24)), Some(v4("10.0.2.0/24")));
        assert_eq!(next(Some(23)), Some(v4("10.0.4.0/23")));
        assert_eq!(next(Some(28)), Some(v4("10.0.2.0/28")));
        // inferred /24 from the occupied subnets
        assert_eq!(next(None), Some(v4("10.0.2.0/24")));
        assert_eq!(next(Some(8)), None);

        let full = next_available(parent, &[parent], Some(24), &MapOptions::default());
        assert_eq!(full, None);
    }

    #[test]
    fn test_infer_mask() {
        let parent = v4("10.0.0.0/16");
        assert_eq!(infer_mask(parent, &[]), 17);
        let occupied = [v4("10.0.0.0/24"), v4("10.0.1.0/24"), v4("10.0.2.0/26")];
        assert_eq!(infer_mask(parent, &occupied), 24);
        // ties go to the longer prefix
        let occupied = [v4("10.0.0.0/24"), v4("10.0.2.0/26")];
        assert_eq!(infer_mask(parent, &occupied), 26);
        assert_eq!(infer_mask(v4("10.0.0.1/32"), &[]), 32);
    }

    #[test]
    fn test_next_adjacent_free() {
        let parent = v4("10.0.0.0/16");
        let occupied = vec![v4("10.0.0.0/24"), v4("10.0.1.0/24"), v4("10.0.2.0/25")];
        assert_eq!(
            next_adjacent_free(v4("10.0.0.0/24"), parent, &occupied, 16),
            Some(v4("10.0.3.0/24"))
        );
        // Runs off the end of the parent
        assert_eq!(
            next_adjacent_free(v4("10.0.255.0/24"), parent, &occupied, 16),
            None
        );
        // Limit too small to get past the occupied run
        assert_eq!(
            next_adjacent_free(v4("10.0.0.0/24"), parent, &occupied, 2),
            None
        );
    }

    #[test]
    fn test_allocation_summary() {
        let parent = v4("10.0.0.0/22");
        let nodes = map_children(parent, &[v4("10.0.1.0/24")], &MapOptions::default());
        let summary = allocation_summary(&nodes);
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.available, 2);
        assert_eq!(summary.mixed, 0);
        assert_eq!(summary.available_addresses, 768);

        let all_v6 = map_children(v6("::/0"), &[], &MapOptions::default());
        assert_eq!(allocation_summary(&all_v6).available_addresses, u128::MAX);
    }

    #[test]
    fn test_ip_wrappers() {
        let parent = IpSubnet::new("10.0.0.0/23").unwrap();
        let occupied = vec![
            IpSubnet::new("10.0.0.0/24").unwrap(),
            IpSubnet::new("2600:1f18::/64").unwrap(),
        ];
        let options = MapOptions::default();
        let nodes = map_children_ip(parent, &occupied, &options);
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_mapped());
        assert_eq!(nodes[1].cidr, IpSubnet::new("10.0.1.0/24").unwrap());

        assert_eq!(
            next_available_ip(parent, &occupied, None, &options),
            Some(IpSubnet::new("10.0.1.0/24").unwrap())
        );
        assert_eq!(
            next_adjacent_free_ip(occupied[0], parent, &occupied, 4),
            Some(IpSubnet::new("10.0.1.0/24").unwrap())
        );
        assert_eq!(
            next_adjacent_free_ip(occupied[1], parent, &occupied, 4),
            None
        );

        let summary = allocation_summary_ip(&nodes);
        assert_eq!((summary.mapped, summary.available), (1, 1));
    }
}
