//! CIDR processing logic.
//!
//! This module contains the algorithms that work on parsed CIDRs:
//! - [`allocation`] - Allocation tree: mapped vs available blocks of a parent
//! - [`route`] - Route resolution by longest-prefix match
//! - [`dedup`] - Tolerant parsing and de-duplication of CIDR lists
//! - [`overlap`] - Overlapping CIDR detection
//! - [`vpc`] - Allocation operations over a whole VPC

mod allocation;
mod dedup;
mod overlap;
mod route;
mod vpc;

// Re-export public functions
pub use allocation::{
    allocation_summary, allocation_summary_ip, available_ranges, infer_mask, map_children,
    map_children_ip, next_adjacent_free, next_adjacent_free_ip, next_available, next_available_ip,
    AllocationNode, AllocationStatus, AllocationSummary, MapOptions,
};
pub use dedup::{find_duplicates, parse_cidr_list, sort_and_dedup, split_families};
pub use overlap::{find_overlaps, log_overlaps, OverlapConflict};
pub use route::{
    expand_candidates, is_prefix_list_id, resolve, resolve_candidates, AnnotatedCandidate,
    CandidateIssue, CandidateWarning, Destination, MatchStatus, PrefixList, Resolution,
    RouteCandidate, RouteEntry, RouteMatch,
};
pub use vpc::{adjacent_in_vpc, map_vpc, next_available_in_vpc, VpcBlockMap};
