//! Fixed-width IP address values.
//!
//! [`Address`] abstracts over [`Ipv4Addr`] and [`Ipv6Addr`] so the subnet,
//! allocation and route code is written once for both families. All bit
//! arithmetic is done in `u128`; IPv4 values only ever use the low 32 bits.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// IP protocol version of an address or subnet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IpVersion {
    #[serde(rename = "IPv4", alias = "ipv4")]
    V4,
    #[serde(rename = "IPv6", alias = "ipv6")]
    V6,
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// An immutable IP address of a fixed bit width.
pub trait Address: Copy + Eq + Ord + Hash + Debug + Display + FromStr + 'static {
    /// Number of bits in the address (32 or 128).
    const WIDTH: u8;
    const VERSION: IpVersion;
    /// Base address and prefix length of the loopback block.
    const LOOPBACK: (Self, u8);

    fn to_bits(self) -> u128;

    /// Build an address from the low `WIDTH` bits of `bits`.
    fn from_bits(bits: u128) -> Self;

    /// All bits of the family set.
    fn max_bits() -> u128 {
        u128::MAX >> (128 - u32::from(Self::WIDTH))
    }

    /// Bits not covered by a `len` prefix.
    fn host_mask(len: u8) -> u128 {
        Self::max_bits().checked_shr(u32::from(len)).unwrap_or(0)
    }

    /// Bits covered by a `len` prefix.
    fn network_mask(len: u8) -> u128 {
        Self::max_bits() & !Self::host_mask(len)
    }

    /// Clear every bit past the first `len`.
    fn cut(self, len: u8) -> Self {
        Self::from_bits(self.to_bits() & Self::network_mask(len))
    }

    /// `self + n`, or `None` when the result leaves the address space.
    fn checked_offset(self, n: u128) -> Option<Self> {
        let bits = self.to_bits().checked_add(n)?;
        (bits <= Self::max_bits()).then(|| Self::from_bits(bits))
    }
}

impl Address for Ipv4Addr {
    const WIDTH: u8 = 32;
    const VERSION: IpVersion = IpVersion::V4;
    const LOOPBACK: (Self, u8) = (Ipv4Addr::new(127, 0, 0, 0), 8);

    fn to_bits(self) -> u128 {
        u128::from(u32::from(self))
    }

    fn from_bits(bits: u128) -> Self {
        Ipv4Addr::from(bits as u32)
    }
}

impl Address for Ipv6Addr {
    const WIDTH: u8 = 128;
    const VERSION: IpVersion = IpVersion::V6;
    const LOOPBACK: (Self, u8) = (Ipv6Addr::LOCALHOST, 128);

    fn to_bits(self) -> u128 {
        u128::from(self)
    }

    fn from_bits(bits: u128) -> Self {
        Ipv6Addr::from(bits)
    }
}
