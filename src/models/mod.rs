//! Address and subnet value types.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Address`] - fixed-width IPv4/IPv6 address arithmetic
//! - [`Subnet`] - CIDR range generic over the address family
//! - [`IpSubnet`] - family-tagged subnet for mixed lists

mod address;
mod ip_subnet;
mod subnet;

// Re-export public types
pub use address::{Address, IpVersion};
pub use ip_subnet::IpSubnet;
pub use subnet::{
    num_aws_hosts, NextSubnets, Subnet, AWS_MAX_SUBNET_MASK, AWS_MIN_SUBNET_MASK,
    AWS_RESERVED_HOSTS,
};
