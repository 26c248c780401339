//! Overlapping CIDR detection.
//!
//! Overlapping subnets inside one VPC break the one-leaf-per-subnet property
//! of the allocation map, so they are reported before mapping.

use crate::models::IpSubnet;
use itertools::Itertools;

/// Two entries of a list that share addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapConflict {
    /// The entry with the shorter (or equal) prefix.
    pub outer: IpSubnet,
    pub inner: IpSubnet,
}

/// Find every overlapping pair in `list`. Repeated entries count as overlaps.
///
/// Sorts a copy and sweeps it: an entry can only overlap the entries that
/// follow it up to the first one starting past its range.
pub fn find_overlaps(list: &[IpSubnet]) -> Vec<OverlapConflict> {
    let sorted: Vec<IpSubnet> = list.iter().copied().sorted().collect();
    let mut conflicts = Vec::new();

    for (i, outer) in sorted.iter().enumerate() {
        for inner in sorted[i + 1..].iter() {
            if !outer.overlaps(inner) {
                break;
            }
            conflicts.push(OverlapConflict {
                outer: *outer,
                inner: *inner,
            });
        }
    }

    conflicts
}

/// Log overlapping CIDRs as warnings.
pub fn log_overlaps(context: &str, conflicts: &[OverlapConflict]) {
    if conflicts.is_empty() {
        log::debug!("{context}: no overlapping CIDRs found.");
        return;
    }

    log::warn!(
        "{context}: found {} overlapping CIDR pair(s):",
        conflicts.len()
    );
    for conflict in conflicts {
        log::warn!("  {} overlaps {}", conflict.outer, conflict.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpSubnet {
        IpSubnet::new(s).unwrap()
    }

    #[test]
    fn test_no_overlaps() {
        let list = vec![ip("10.0.1.0/24"), ip("10.0.0.0/24"), ip("2600::/64")];
        assert!(find_overlaps(&list).is_empty());
    }

    #[test]
    fn test_nested_and_duplicate() {
        let list = vec![
            ip("10.0.5.0/24"),
            ip("10.0.0.0/16"),
            ip("10.1.0.0/24"),
            ip("10.0.5.0/24"),
        ];
        let conflicts = find_overlaps(&list);
        assert_eq!(
            conflicts,
            vec![
                OverlapConflict {
                    outer: ip("10.0.0.0/16"),
                    inner: ip("10.0.5.0/24"),
                },
                OverlapConflict {
                    outer: ip("10.0.0.0/16"),
                    inner: ip("10.0.5.0/24"),
                },
                OverlapConflict {
                    outer: ip("10.0.5.0/24"),
                    inner: ip("10.0.5.0/24"),
                },
            ]
        );
    }

    #[test]
    fn test_sweep_continues_past_nested_entries() {
        // 10.0.0.0/8 must be compared with everything inside it, not just its neighbour
        let list = vec![
            ip("10.0.0.0/8"),
            ip("10.1.0.0/16"),
            ip("10.200.0.0/16"),
            ip("11.0.0.0/8"),
        ];
        let conflicts = find_overlaps(&list);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts.iter().all(|c| c.outer == ip("10.0.0.0/8")));
    }

    #[test]
    fn test_cross_family_is_not_overlap() {
        let list = vec![ip("0.0.0.0/0"), ip("::/0")];
        assert!(find_overlaps(&list).is_empty());
    }
}
