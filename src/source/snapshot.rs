//! Exported VPC snapshot.
//!
//! The snapshot is a JSON file holding the VPCs, subnets, route tables and
//! prefix lists of an account, as produced by the AWS query layer. CIDR
//! fields stay strings here so one bad entry does not reject the whole file.

use crate::error::{CidrError, ParseError};
use crate::models::IpSubnet;
use crate::processing::{parse_cidr_list, PrefixList, RouteEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Everything read from one snapshot file.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub vpcs: Vec<Vpc>,
    #[serde(default)]
    pub route_tables: Vec<RouteTable>,
    #[serde(default)]
    pub prefix_lists: Vec<PrefixList>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Vpc {
    pub vpc_id: String,
    /// Value of the `Name` tag.
    #[serde(default)]
    pub name: Option<String>,
    /// Primary and secondary IPv4 blocks plus IPv6 blocks.
    pub cidr_blocks: Vec<String>,
    #[serde(default)]
    pub subnets: Vec<VpcSubnet>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VpcSubnet {
    pub subnet_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    pub cidr: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouteTable {
    pub route_table_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl Snapshot {
    /// Find a VPC by id or `Name` tag.
    pub fn vpc(&self, id_or_name: &str) -> Option<&Vpc> {
        self.vpcs
            .iter()
            .find(|v| v.vpc_id == id_or_name || v.name.as_deref() == Some(id_or_name))
    }

    /// Find a route table by id or `Name` tag.
    pub fn route_table(&self, id_or_name: &str) -> Option<&RouteTable> {
        self.route_tables
            .iter()
            .find(|t| t.route_table_id == id_or_name || t.name.as_deref() == Some(id_or_name))
    }

    /// Prefix lists keyed by id.
    pub fn prefix_list_map(&self) -> HashMap<String, PrefixList> {
        self.prefix_lists
            .iter()
            .map(|p| (p.prefix_list_id.clone(), p.clone()))
            .collect()
    }
}

impl Vpc {
    /// Display label: `Name (vpc-id)` or just the id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({})", self.vpc_id),
            None => self.vpc_id.clone(),
        }
    }

    /// Parsed VPC blocks. Unparseable entries are logged and skipped.
    pub fn cidr_blocks(&self) -> Vec<IpSubnet> {
        let (blocks, failed) = parse_cidr_list(&self.cidr_blocks);
        log_failures(&self.vpc_id, &failed);
        blocks
    }

    /// Parsed subnet CIDRs. Unparseable entries are logged and skipped.
    pub fn subnet_cidrs(&self) -> Vec<IpSubnet> {
        let cidrs: Vec<&str> = self.subnets.iter().map(|s| s.cidr.as_str()).collect();
        let (subnets, failed) = parse_cidr_list(&cidrs);
        log_failures(&self.vpc_id, &failed);
        subnets
    }
}

fn log_failures(context: &str, failed: &[(String, ParseError)]) {
    for (text, e) in failed {
        log::warn!("{context}: skipping CIDR '{text}': {e}");
    }
}

/// Default snapshot name for the given day, e.g. `cidr_cache_2024-05-01.json`.
pub fn default_cache_file(now: DateTime<Utc>) -> String {
    format!("cidr_cache_{}.json", now.format("%Y-%m-%d"))
}

/// Read a snapshot from `cache_file`, or today's default cache file.
///
/// # Arguments
/// * `cache_file` - Optional path to a specific snapshot. If None, uses default naming.
///
/// # Returns
/// * `Ok(Snapshot)` - The parsed snapshot
/// * `Err` - If the file is missing, unreadable or not valid snapshot JSON
pub fn read_snapshot(cache_file: Option<&str>) -> Result<Snapshot, CidrError> {
    let cache_file = match cache_file {
        Some(file) => {
            log::info!("Using provided snapshot file: {file}");
            file.to_string()
        }
        None => default_cache_file(Utc::now()),
    };

    if !Path::new(&cache_file).exists() {
        return Err(CidrError::SnapshotMissing(cache_file));
    }

    log::info!("Reading from snapshot file: {cache_file}");
    let json = std::fs::read_to_string(&cache_file).map_err(|source| CidrError::SnapshotIo {
        path: cache_file.clone(),
        source,
    })?;
    parse_snapshot(&json, &cache_file)
}

/// Parse snapshot JSON, naming the failing field on error.
pub fn parse_snapshot(json: &str, path: &str) -> Result<Snapshot, CidrError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let snapshot: Snapshot =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
            CidrError::SnapshotJson {
                path: path.to_string(),
                source,
            }
        })?;
    log::info!(
        "Snapshot {path}: {} VPC(s), {} route table(s), {} prefix list(s)",
        snapshot.vpcs.len(),
        snapshot.route_tables.len(),
        snapshot.prefix_lists.len()
    );
    Ok(snapshot)
}
