//! Output formatting for allocation maps and route resolutions.
//!
//! - [`report`] - Line formatting and printing
//! - [`terminal`] - Colored status markers

mod report;
mod terminal;

pub use report::{
    format_block_map, format_next_available, format_resolution, print_block_maps,
    print_next_available, print_resolution,
};
pub use terminal::{allocation_label, colored_allocation_label, colored_match_label, match_label};
