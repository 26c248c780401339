//! Input data for the CIDR engine.
//!
//! - [`snapshot`] - JSON snapshot of VPCs, route tables and prefix lists

mod snapshot;

// Re-export public types and functions
pub use snapshot::{
    default_cache_file, parse_snapshot, read_snapshot, RouteTable, Snapshot, Vpc, VpcSubnet,
};
