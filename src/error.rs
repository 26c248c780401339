//! Error types.
//!
//! [`ParseError`] covers a single address/CIDR parse. [`CidrError`] is what the
//! public operations return.

use crate::models::IpVersion;
use thiserror::Error;

/// Malformed address or CIDR text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty address/CIDR text")]
    Empty,
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length '{value}' (expected 0..={max})")]
    InvalidPrefixLength { value: String, max: u8 },
    #[error("unexpected trailing text '{0}'")]
    TrailingGarbage(String),
    #[error("expected an {expected} address, got '{value}'")]
    FamilyMismatch { expected: IpVersion, value: String },
}

#[derive(Debug, Error)]
pub enum CidrError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid destination '{destination}': {source}")]
    InvalidDestination {
        destination: String,
        #[source]
        source: ParseError,
    },
    #[error("snapshot file does not exist: {0}")]
    SnapshotMissing(String),
    #[error("error reading snapshot {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing snapshot {path}: {source}")]
    SnapshotJson {
        path: String,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("invalid value for {name}: '{value}'")]
    Config { name: &'static str, value: String },
}
