//! CIDR subnet value, generic over the address family.
//!
//! Provides [`Subnet`] for representing `address/prefix` ranges, along with
//! containment, overlap and adjacency calculations.

use super::address::Address;
use crate::error::ParseError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;
use std::str::FromStr;

/// Addresses AWS reserves in every IPv4 subnet (network, router, DNS, future use, broadcast).
pub const AWS_RESERVED_HOSTS: u64 = 5;

/// Smallest and largest prefix lengths AWS accepts for an IPv4 subnet.
pub const AWS_MIN_SUBNET_MASK: u8 = 16;
pub const AWS_MAX_SUBNET_MASK: u8 = 28;

/// Usable host addresses in an AWS IPv4 subnet of the given prefix length.
///
/// # Examples
/// ```
/// use vpc_cidr_summary::models::num_aws_hosts;
/// assert_eq!(num_aws_hosts(24), Some(251));
/// assert_eq!(num_aws_hosts(30), None);
/// ```
pub fn num_aws_hosts(mask: u8) -> Option<u64> {
    if !(AWS_MIN_SUBNET_MASK..=AWS_MAX_SUBNET_MASK).contains(&mask) {
        return None;
    }
    Some((1u64 << (32 - mask)) - AWS_RESERVED_HOSTS)
}

/// An address range in CIDR notation.
///
/// The base address is always canonical: every bit past `mask` is zero.
/// Ordering is by base address, then prefix length, so a supernet sorts
/// before the subnets it contains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subnet<A: Address> {
    addr: A,
    mask: u8,
}

impl<A: Address> Subnet<A> {
    /// Parse `address` or `address/prefix` (e.g. "10.0.0.0/24").
    ///
    /// A missing prefix means a host route (/32 or /128). Host bits are
    /// cleared, so "10.2.3.4/16" becomes 10.2.0.0/16.
    pub fn new(addr_cidr: &str) -> Result<Subnet<A>, ParseError> {
        let addr_cidr = addr_cidr.trim();
        if addr_cidr.is_empty() {
            return Err(ParseError::Empty);
        }

        let (addr_part, mask_part) = match addr_cidr.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (addr_cidr, None),
        };

        let addr = parse_addr::<A>(addr_part)?;
        let mask = match mask_part {
            Some(mask) => parse_mask(mask, A::WIDTH)?,
            None => A::WIDTH,
        };
        Self::from_parts(addr, mask)
    }

    /// Build a subnet from an address and prefix length, masking host bits.
    pub fn from_parts(addr: A, mask: u8) -> Result<Subnet<A>, ParseError> {
        if mask > A::WIDTH {
            return Err(ParseError::InvalidPrefixLength {
                value: mask.to_string(),
                max: A::WIDTH,
            });
        }
        let base = addr.cut(mask);
        if base != addr {
            log::debug!("Masked {addr}/{mask} to network address {base}/{mask}");
        }
        Ok(Subnet { addr: base, mask })
    }

    /// The single-address subnet for `addr`.
    pub fn host(addr: A) -> Subnet<A> {
        Subnet {
            addr,
            mask: A::WIDTH,
        }
    }

    /// The subnet with host bits cleared. Idempotent.
    pub fn canonicalize(&self) -> Subnet<A> {
        Subnet {
            addr: self.addr.cut(self.mask),
            mask: self.mask,
        }
    }

    /// The (canonical) base address.
    pub fn addr(&self) -> A {
        self.addr
    }

    /// The prefix length.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> A {
        self.addr
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> A {
        A::from_bits(self.addr.to_bits() | A::host_mask(self.mask))
    }

    /// Number of addresses covered, `None` for an IPv6 /0.
    pub fn num_addresses(&self) -> Option<u128> {
        1u128.checked_shl(u32::from(A::WIDTH - self.mask))
    }

    pub fn contains_addr(&self, ip: A) -> bool {
        ip.cut(self.mask) == self.addr
    }

    /// True iff all of `other` lies inside this subnet.
    pub fn contains(&self, other: &Subnet<A>) -> bool {
        other.mask >= self.mask && self.contains_addr(other.addr)
    }

    /// True iff the two ranges share at least one address.
    pub fn overlaps(&self, other: &Subnet<A>) -> bool {
        if self.mask <= other.mask {
            self.contains_addr(other.addr)
        } else {
            other.contains_addr(self.addr)
        }
    }

    /// True iff the subnet lies wholly inside the family's loopback block.
    pub fn is_loopback(&self) -> bool {
        let (base, mask) = A::LOOPBACK;
        Subnet { addr: base, mask }.contains(self)
    }

    /// The two halves one bit longer, or `None` for a single address.
    pub fn split(&self) -> Option<(Subnet<A>, Subnet<A>)> {
        if self.mask >= A::WIDTH {
            return None;
        }
        let mask = self.mask + 1;
        let half_bit = 1u128 << (A::WIDTH - mask);
        let lo = Subnet {
            addr: self.addr,
            mask,
        };
        let hi = Subnet {
            addr: A::from_bits(self.addr.to_bits() | half_bit),
            mask,
        };
        Some((lo, hi))
    }

    /// The enclosing subnet one bit shorter, or `None` for /0.
    pub fn supernet(&self) -> Option<Subnet<A>> {
        let mask = self.mask.checked_sub(1)?;
        Some(Subnet {
            addr: self.addr.cut(mask),
            mask,
        })
    }

    /// The same-size subnet directly after this one.
    pub fn next_subnet(&self) -> Option<Subnet<A>> {
        let size = self.num_addresses()?;
        let addr = self.addr.checked_offset(size)?;
        Some(Subnet {
            addr,
            mask: self.mask,
        })
    }

    /// Up to `count` adjacent same-size subnets following this one.
    ///
    /// Stops early instead of wrapping past the end of the address space.
    ///
    /// # Examples
    /// ```
    /// use std::net::Ipv4Addr;
    /// use vpc_cidr_summary::models::Subnet;
    /// let s: Subnet<Ipv4Addr> = Subnet::new("10.20.30.0/24").unwrap();
    /// let next: Vec<_> = s.next(1).collect();
    /// assert_eq!(next, vec![Subnet::new("10.20.31.0/24").unwrap()]);
    /// ```
    pub fn next(&self, count: usize) -> NextSubnets<A> {
        NextSubnets {
            current: *self,
            remaining: count,
        }
    }
}

/// Iterator returned by [`Subnet::next`].
#[derive(Debug, Clone)]
pub struct NextSubnets<A: Address> {
    current: Subnet<A>,
    remaining: usize,
}

impl<A: Address> Iterator for NextSubnets<A> {
    type Item = Subnet<A>;

    fn next(&mut self) -> Option<Subnet<A>> {
        if self.remaining == 0 {
            return None;
        }
        let next = match self.current.next_subnet() {
            Some(next) => next,
            None => {
                self.remaining = 0;
                return None;
            }
        };
        self.remaining -= 1;
        self.current = next;
        Some(next)
    }
}

fn parse_addr<A: Address>(text: &str) -> Result<A, ParseError> {
    if let Ok(addr) = text.parse::<A>() {
        return Ok(addr);
    }
    // Valid address of the other family
    if text.parse::<IpAddr>().is_ok() {
        return Err(ParseError::FamilyMismatch {
            expected: A::VERSION,
            value: text.to_string(),
        });
    }
    Err(ParseError::InvalidAddress(text.to_string()))
}

/// Parse a decimal prefix length, digits only.
fn parse_mask(text: &str, max: u8) -> Result<u8, ParseError> {
    if text.contains('/') {
        return Err(ParseError::TrailingGarbage(text.to_string()));
    }
    let invalid = || ParseError::InvalidPrefixLength {
        value: text.to_string(),
        max,
    };
    if text.is_empty() || text.len() > 3 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match text.parse::<u8>() {
        Ok(mask) if mask <= max => Ok(mask),
        _ => Err(invalid()),
    }
}

impl<A: Address> FromStr for Subnet<A> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subnet::new(s)
    }
}

impl<A: Address> std::fmt::Display for Subnet<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl<A: Address> Serialize for Subnet<A> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, A: Address> Deserialize<'de> for Subnet<A> {
    fn deserialize<D>(deserializer: D) -> Result<Subnet<A>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Subnet::new(&s).map_err(|e| de::Error::custom(format!("invalid CIDR '{s}': {e}")))
    }
}
