//! Terminal output utilities.
//!
//! Plain labels are used for anything returned as a string; colors are only
//! added right before printing.

use crate::processing::{AllocationStatus, MatchStatus};
use colored::{ColoredString, Colorize};

/// Fixed-width label for an allocation leaf.
pub fn allocation_label(status: AllocationStatus) -> &'static str {
    match status {
        AllocationStatus::Mapped => "mapped   ",
        AllocationStatus::Available => "available",
        AllocationStatus::Mixed => "mixed    ",
    }
}

pub fn colored_allocation_label(status: AllocationStatus) -> ColoredString {
    let label = allocation_label(status);
    match status {
        AllocationStatus::Mapped => label.blue(),
        AllocationStatus::Available => label.green(),
        AllocationStatus::Mixed => label.on_red(),
    }
}

/// Fixed-width label for a route candidate.
pub fn match_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Selected => "selected ",
        MatchStatus::Shadowed => "shadowed ",
        MatchStatus::LoopbackExcluded => "loopback ",
        MatchStatus::NoMatch => "no-match ",
    }
}

pub fn colored_match_label(status: MatchStatus) -> ColoredString {
    let label = match_label(status);
    match status {
        MatchStatus::Selected => label.on_green(),
        MatchStatus::Shadowed => label.yellow(),
        MatchStatus::LoopbackExcluded => label.red(),
        MatchStatus::NoMatch => label.normal(),
    }
}
