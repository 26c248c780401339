//! Route resolution by longest-prefix match.
//!
//! Resolves a destination typed by a user against the routes of one route
//! table. Routes that point at a managed prefix list are expanded into one
//! candidate per list entry first.

use crate::error::{CidrError, ParseError};
use crate::models::{IpSubnet, IpVersion};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::OnceLock;
use thiserror::Error;

/// Regex matching a managed prefix list id such as `pl-0123abcd`.
static PREFIX_LIST_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_prefix_list_regex() -> &'static Regex {
    PREFIX_LIST_REGEX.get_or_init(|| Regex::new(r"^pl-[0-9a-fA-F]+$").expect("Invalid Regex"))
}

/// True iff `text` looks like a prefix list id.
pub fn is_prefix_list_id(text: &str) -> bool {
    get_prefix_list_regex().is_match(text.trim())
}

/// One route of a route table as exported.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// CIDR, bare address or prefix list id.
    pub destination: String,
    /// Gateway, NAT gateway, peering connection, ... id.
    pub gateway: String,
}

impl RouteEntry {
    pub fn new(destination: &str, gateway: &str) -> RouteEntry {
        RouteEntry {
            destination: destination.to_string(),
            gateway: gateway.to_string(),
        }
    }
}

/// A managed prefix list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrefixList {
    pub prefix_list_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub address_family: IpVersion,
    #[serde(default)]
    pub entries: Vec<String>,
}

/// A classified lookup destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Bare address, resolved by longest-prefix match.
    Host(IpAddr),
    /// CIDR, resolved by exact match.
    Cidr(IpSubnet),
}

impl Destination {
    /// Classify `text` as an address or a CIDR.
    pub fn classify(text: &str) -> Result<Destination, CidrError> {
        let trimmed = text.trim();
        let invalid = |source: ParseError| CidrError::InvalidDestination {
            destination: text.to_string(),
            source,
        };
        if trimmed.is_empty() {
            return Err(invalid(ParseError::Empty));
        }
        if trimmed.contains('/') {
            let cidr = IpSubnet::new(trimmed).map_err(invalid)?;
            return Ok(Destination::Cidr(cidr));
        }
        trimmed
            .parse::<IpAddr>()
            .map(Destination::Host)
            .map_err(|_| invalid(ParseError::InvalidAddress(trimmed.to_string())))
    }

    pub fn version(&self) -> IpVersion {
        match self {
            Destination::Host(IpAddr::V4(_)) => IpVersion::V4,
            Destination::Host(IpAddr::V6(_)) => IpVersion::V6,
            Destination::Cidr(cidr) => cidr.version(),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Destination::Host(ip) => write!(f, "{ip}"),
            Destination::Cidr(cidr) => write!(f, "{cidr}"),
        }
    }
}

/// A route destination ready for matching.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteCandidate {
    /// Index of the route in the route table.
    pub route_index: usize,
    pub destination: IpSubnet,
    pub gateway: String,
    /// Prefix list the destination was expanded from.
    pub prefix_list: Option<String>,
}

/// Why a route produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateIssue {
    #[error("destination is not a CIDR or prefix list: {0}")]
    Unclassifiable(ParseError),
    #[error("unknown prefix list {0}")]
    UnknownPrefixList(String),
    #[error("prefix list entry '{entry}' is invalid: {source}")]
    InvalidEntry {
        entry: String,
        #[source]
        source: ParseError,
    },
    #[error("prefix list entry '{entry}' is not {expected}")]
    FamilyMismatch { entry: String, expected: IpVersion },
}

/// A route skipped during candidate expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWarning {
    pub route_index: usize,
    pub destination: String,
    pub issue: CandidateIssue,
}

impl std::fmt::Display for CandidateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "route #{} '{}': {}",
            self.route_index, self.destination, self.issue
        )
    }
}

/// Per-candidate outcome of a resolution.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    /// The winning route.
    Selected,
    /// Matched, but a more specific (or earlier) route won.
    Shadowed,
    /// Contains the destination, but only one side is loopback.
    LoopbackExcluded,
    NoMatch,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedCandidate {
    pub candidate: RouteCandidate,
    pub status: MatchStatus,
}

/// Overall outcome of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// `index` points into [`Resolution::candidates`].
    Matched { index: usize, prefix_length: u8 },
    NoMatch,
}

/// Result of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub destination: Destination,
    pub outcome: RouteMatch,
    /// Every candidate checked, in input order.
    pub candidates: Vec<AnnotatedCandidate>,
    pub warnings: Vec<CandidateWarning>,
}

impl Resolution {
    /// The selected candidate, if any.
    pub fn matched(&self) -> Option<&AnnotatedCandidate> {
        match self.outcome {
            RouteMatch::Matched { index, .. } => self.candidates.get(index),
            RouteMatch::NoMatch => None,
        }
    }

    pub fn prefix_length(&self) -> Option<u8> {
        match self.outcome {
            RouteMatch::Matched { prefix_length, .. } => Some(prefix_length),
            RouteMatch::NoMatch => None,
        }
    }
}

/// Turn route entries into match candidates.
///
/// Prefix list routes become one candidate per entry, sharing the route's
/// gateway. Routes or entries that cannot be used are returned as warnings.
pub fn expand_candidates(
    routes: &[RouteEntry],
    prefix_lists: &HashMap<String, PrefixList>,
) -> (Vec<RouteCandidate>, Vec<CandidateWarning>) {
    let mut candidates = Vec::new();
    let mut warnings = Vec::new();

    for (route_index, route) in routes.iter().enumerate() {
        let destination = route.destination.trim();
        let warn = |issue: CandidateIssue| CandidateWarning {
            route_index,
            destination: route.destination.clone(),
            issue,
        };

        if is_prefix_list_id(destination) {
            let Some(list) = prefix_lists.get(destination) else {
                warnings.push(warn(CandidateIssue::UnknownPrefixList(destination.to_string())));
                continue;
            };
            if list.entries.is_empty() {
                log::debug!("Prefix list {destination} has no entries");
            }
            for entry in &list.entries {
                match IpSubnet::new(entry) {
                    Ok(cidr) if cidr.version() == list.address_family => {
                        candidates.push(RouteCandidate {
                            route_index,
                            destination: cidr,
                            gateway: route.gateway.clone(),
                            prefix_list: Some(list.prefix_list_id.clone()),
                        })
                    }
                    Ok(_) => warnings.push(warn(CandidateIssue::FamilyMismatch {
                        entry: entry.clone(),
                        expected: list.address_family,
                    })),
                    Err(source) => warnings.push(warn(CandidateIssue::InvalidEntry {
                        entry: entry.clone(),
                        source,
                    })),
                }
            }
            continue;
        }

        match IpSubnet::new(destination) {
            Ok(cidr) => candidates.push(RouteCandidate {
                route_index,
                destination: cidr,
                gateway: route.gateway.clone(),
                prefix_list: None,
            }),
            Err(e) => warnings.push(warn(CandidateIssue::Unclassifiable(e))),
        }
    }

    (candidates, warnings)
}

/// How one candidate relates to the destination, before picking a winner.
fn check_candidate(destination: &Destination, candidate: &RouteCandidate) -> MatchStatus {
    match destination {
        Destination::Host(ip) => {
            if !candidate.destination.contains_addr(*ip) {
                MatchStatus::NoMatch
            } else if candidate.destination.is_loopback() != ip.is_loopback() {
                MatchStatus::LoopbackExcluded
            } else {
                MatchStatus::Selected
            }
        }
        Destination::Cidr(cidr) => {
            if candidate.destination == cidr.canonicalize() {
                MatchStatus::Selected
            } else {
                MatchStatus::NoMatch
            }
        }
    }
}

/// Match `destination` against already expanded candidates.
///
/// A host destination picks the longest matching prefix; a CIDR destination
/// only matches an identical CIDR. On equal prefix lengths the earliest
/// candidate wins.
pub fn resolve_candidates(
    destination: &Destination,
    candidates: Vec<RouteCandidate>,
) -> (RouteMatch, Vec<AnnotatedCandidate>) {
    let statuses: Vec<MatchStatus> = candidates
        .iter()
        .map(|c| check_candidate(destination, c))
        .collect();

    let mut best: Option<(usize, u8)> = None;
    for (index, (candidate, status)) in candidates.iter().zip(&statuses).enumerate() {
        if *status != MatchStatus::Selected {
            continue;
        }
        let prefix_length = candidate.destination.mask();
        if best.is_none_or(|(_, best_len)| prefix_length > best_len) {
            best = Some((index, prefix_length));
        }
    }

    let annotated = candidates
        .into_iter()
        .zip(statuses)
        .enumerate()
        .map(|(index, (candidate, status))| {
            let status = match status {
                MatchStatus::Selected if best.map(|(i, _)| i) != Some(index) => {
                    MatchStatus::Shadowed
                }
                other => other,
            };
            AnnotatedCandidate { candidate, status }
        })
        .collect();

    let outcome = match best {
        Some((index, prefix_length)) => RouteMatch::Matched {
            index,
            prefix_length,
        },
        None => RouteMatch::NoMatch,
    };
    (outcome, annotated)
}

/// Resolve `destination` against the routes of one route table.
///
/// # Arguments
/// * `destination` - Address or CIDR typed by the user
/// * `routes` - Routes of the table, in table order
/// * `prefix_lists` - Prefix lists referenced by the routes, keyed by id
///
/// # Returns
/// * `Ok(Resolution)` - Outcome plus every candidate checked
/// * `Err(CidrError::InvalidDestination)` - `destination` is not an address or CIDR
pub fn resolve(
    destination: &str,
    routes: &[RouteEntry],
    prefix_lists: &HashMap<String, PrefixList>,
) -> Result<Resolution, CidrError> {
    let destination = Destination::classify(destination)?;
    let (candidates, warnings) = expand_candidates(routes, prefix_lists);
    for warning in &warnings {
        log::warn!("Skipping {warning}");
    }

    let (outcome, candidates) = resolve_candidates(&destination, candidates);
    match outcome {
        RouteMatch::Matched { index, prefix_length } => log::info!(
            "{destination} matched {} (/{prefix_length}) among {} candidate(s)",
            candidates[index].candidate.destination,
            candidates.len()
        ),
        RouteMatch::NoMatch => log::info!(
            "{destination} matched none of {} candidate(s)",
            candidates.len()
        ),
    }

    Ok(Resolution {
        destination,
        outcome,
        candidates,
        warnings,
    })
}
