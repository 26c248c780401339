//! Family-tagged subnet for mixed IPv4/IPv6 lists.

use super::address::IpVersion;
use super::subnet::Subnet;
use crate::error::ParseError;
use itertools::Either;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IPv4 or IPv6 subnet.
///
/// Comparisons across families never match: `contains` and `overlaps`
/// return `false`. All IPv4 subnets sort before all IPv6 subnets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IpSubnet {
    V4(Subnet<Ipv4Addr>),
    V6(Subnet<Ipv6Addr>),
}

impl IpSubnet {
    /// Parse an IPv4 or IPv6 address or CIDR, picking the family from its shape.
    pub fn new(addr_cidr: &str) -> Result<IpSubnet, ParseError> {
        let trimmed = addr_cidr.trim();
        let addr_part = trimmed.split('/').next().unwrap_or(trimmed);
        if addr_part.contains(':') {
            Ok(IpSubnet::V6(Subnet::new(trimmed)?))
        } else {
            Ok(IpSubnet::V4(Subnet::new(trimmed)?))
        }
    }

    /// The single-address subnet for `ip`.
    pub fn host(ip: IpAddr) -> IpSubnet {
        match ip {
            IpAddr::V4(ip) => IpSubnet::V4(Subnet::host(ip)),
            IpAddr::V6(ip) => IpSubnet::V6(Subnet::host(ip)),
        }
    }

    pub fn version(&self) -> IpVersion {
        match self {
            IpSubnet::V4(_) => IpVersion::V4,
            IpSubnet::V6(_) => IpVersion::V6,
        }
    }

    pub fn addr(&self) -> IpAddr {
        match self {
            IpSubnet::V4(s) => IpAddr::V4(s.addr()),
            IpSubnet::V6(s) => IpAddr::V6(s.addr()),
        }
    }

    pub fn mask(&self) -> u8 {
        match self {
            IpSubnet::V4(s) => s.mask(),
            IpSubnet::V6(s) => s.mask(),
        }
    }

    pub fn as_v4(&self) -> Option<Subnet<Ipv4Addr>> {
        match self {
            IpSubnet::V4(s) => Some(*s),
            IpSubnet::V6(_) => None,
        }
    }

    pub fn as_v6(&self) -> Option<Subnet<Ipv6Addr>> {
        match self {
            IpSubnet::V4(_) => None,
            IpSubnet::V6(s) => Some(*s),
        }
    }

    pub fn canonicalize(&self) -> IpSubnet {
        match self {
            IpSubnet::V4(s) => IpSubnet::V4(s.canonicalize()),
            IpSubnet::V6(s) => IpSubnet::V6(s.canonicalize()),
        }
    }

    pub fn contains_addr(&self, ip: IpAddr) -> bool {
        match (self, ip) {
            (IpSubnet::V4(s), IpAddr::V4(ip)) => s.contains_addr(ip),
            (IpSubnet::V6(s), IpAddr::V6(ip)) => s.contains_addr(ip),
            _ => false,
        }
    }

    pub fn contains(&self, other: &IpSubnet) -> bool {
        match (self, other) {
            (IpSubnet::V4(a), IpSubnet::V4(b)) => a.contains(b),
            (IpSubnet::V6(a), IpSubnet::V6(b)) => a.contains(b),
            _ => false,
        }
    }

    pub fn overlaps(&self, other: &IpSubnet) -> bool {
        match (self, other) {
            (IpSubnet::V4(a), IpSubnet::V4(b)) => a.overlaps(b),
            (IpSubnet::V6(a), IpSubnet::V6(b)) => a.overlaps(b),
            _ => false,
        }
    }

    pub fn is_loopback(&self) -> bool {
        match self {
            IpSubnet::V4(s) => s.is_loopback(),
            IpSubnet::V6(s) => s.is_loopback(),
        }
    }

    /// See [`Subnet::next`].
    pub fn next(&self, count: usize) -> impl Iterator<Item = IpSubnet> {
        match *self {
            IpSubnet::V4(s) => Either::Left(s.next(count).map(IpSubnet::V4)),
            IpSubnet::V6(s) => Either::Right(s.next(count).map(IpSubnet::V6)),
        }
    }
}

impl From<Subnet<Ipv4Addr>> for IpSubnet {
    fn from(s: Subnet<Ipv4Addr>) -> IpSubnet {
        IpSubnet::V4(s)
    }
}

impl From<Subnet<Ipv6Addr>> for IpSubnet {
    fn from(s: Subnet<Ipv6Addr>) -> IpSubnet {
        IpSubnet::V6(s)
    }
}

impl FromStr for IpSubnet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IpSubnet::new(s)
    }
}

impl std::fmt::Display for IpSubnet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IpSubnet::V4(s) => write!(f, "{s}"),
            IpSubnet::V6(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for IpSubnet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IpSubnet {
    fn deserialize<D>(deserializer: D) -> Result<IpSubnet, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IpSubnet::new(&s).map_err(|e| de::Error::custom(format!("invalid CIDR '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpSubnet {
        IpSubnet::new(s).unwrap()
    }

    #[test]
    fn test_family_dispatch() {
        assert_eq!(ip("10.0.0.0/8").version(), IpVersion::V4);
        assert_eq!(ip("2600:1f18::/56").version(), IpVersion::V6);
        assert_eq!(ip("::1").mask(), 128);
        assert_eq!(ip("10.0.0.1").mask(), 32);
        assert!(matches!(
            IpSubnet::new("not-an-ip"),
            Err(ParseError::InvalidAddress(_))
        ));
        assert!(matches!(
            IpSubnet::new("1:2:3/200"),
            Err(ParseError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_cross_family_never_matches() {
        let v4 = ip("0.0.0.0/0");
        let v6 = ip("::/0");
        assert!(!v4.contains(&v6));
        assert!(!v4.overlaps(&v6));
        assert!(!v6.contains(&v4));
        assert!(!v6.overlaps(&v4));
        assert!(!v6.contains_addr("10.0.0.1".parse().unwrap()));
        assert!(v4.contains_addr("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_ordering_v4_before_v6() {
        let mut list = vec![ip("::/0"), ip("10.0.0.0/8"), ip("0.0.0.0/0")];
        list.sort();
        assert_eq!(list, vec![ip("0.0.0.0/0"), ip("10.0.0.0/8"), ip("::/0")]);
    }

    #[test]
    fn test_next() {
        let next: Vec<_> = ip("2600:1f18:0:1::/64").next(2).collect();
        assert_eq!(
            next,
            vec![ip("2600:1f18:0:2::/64"), ip("2600:1f18:0:3::/64")]
        );
        let next: Vec<_> = ip("10.0.0.0/24").next(1).collect();
        assert_eq!(next, vec![ip("10.0.1.0/24")]);
    }

    #[test]
    fn test_serde_round_trip_in_struct() {
        #[derive(Deserialize, Serialize)]
        struct Row {
            cidr: IpSubnet,
        }
        let row: Row = serde_json::from_str(r#"{"cidr":"2001:db8::/32"}"#).unwrap();
        assert_eq!(row.cidr, ip("2001:db8::/32"));
        assert!(serde_json::from_str::<Row>(r#"{"cidr":"10.0.0.0/99"}"#).is_err());
    }
}
