//! Scan input and discovery policy.
//!
//! The fetch step is external: a scan arrives as a JSON snapshot of the raw
//! tables. Discovery then decides, per port, whether a monitored item exists
//! at all and what it is called. Ports outside the configured state filters
//! produce no item and no alerting; on a large chassis the disabled blocks
//! would otherwise drown everything else out.

pub(crate) mod fake;

use crate::config::DiscoveryParams;
use crate::types::{PortRecord, ScanSnapshot};
use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default snapshot location; `FCTOP_SNAPSHOT` overrides it.
const DEFAULT_SNAPSHOT_PATH: &str = "/var/lib/fctop/snapshot.json";

/// A port that passed discovery, with its stable display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPort {
    pub index: u32,
    pub name: String,
}

pub fn snapshot_path(cli_path: Option<&str>) -> PathBuf {
    cli_path.map_or_else(
        || {
            std::env::var("FCTOP_SNAPSHOT")
                .map_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_PATH), PathBuf::from)
        },
        PathBuf::from,
    )
}

pub fn load_snapshot(path: &Path) -> Result<ScanSnapshot> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing snapshot {}", path.display()))
}

/// Apply the inclusion filters and compute item names for one scan.
pub fn discover_ports(records: &[PortRecord], params: &DiscoveryParams) -> Vec<DiscoveredPort> {
    let pad_width = digits(records.len());
    let names_usable = params.use_portname && port_names_usable(records);

    let discovered: Vec<DiscoveredPort> = records
        .iter()
        .filter(|record| {
            params.phystates.contains(&record.phys_state)
                && params.opstates.contains(&record.oper_state)
                && params.admstates.contains(&record.adm_state)
        })
        .map(|record| DiscoveredPort {
            index: record.index,
            name: item_name(record, pad_width, names_usable, params.show_isl),
        })
        .collect();

    debug!(
        "discovery kept {} of {} ports",
        discovered.len(),
        records.len()
    );
    discovered
}

/// Port names only make good item names when the switch filled them in and
/// kept them distinct; otherwise fall back to typed index names.
fn port_names_usable(records: &[PortRecord]) -> bool {
    let mut seen = HashSet::new();
    records
        .iter()
        .all(|record| !record.port_name.is_empty() && seen.insert(record.port_name.as_str()))
}

fn item_name(record: &PortRecord, pad_width: usize, names_usable: bool, show_isl: bool) -> String {
    let padded = format!("{:0pad_width$}", record.index);
    if names_usable {
        format!("{padded} {}", record.port_name)
    } else if record.is_isl && show_isl {
        format!("ISL {padded}")
    } else {
        format!("Port {padded}")
    }
}

fn digits(count: usize) -> usize {
    count.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortCounters;

    fn record(index: u32, name: &str) -> PortRecord {
        PortRecord {
            index,
            phys_state: 6,
            oper_state: 1,
            adm_state: 1,
            counters: PortCounters::default(),
            legacy_speed_code: None,
            isl_baud_code: None,
            std_high_speed_kbit: None,
            port_name: name.to_string(),
            port_type_code: None,
            is_isl: false,
        }
    }

    #[test]
    fn test_filters_exclude_ports_entirely() {
        let mut offline = record(2, "b");
        offline.adm_state = 2; // not in the default inclusion set
        let records = vec![record(1, "a"), offline, record(3, "c")];

        let discovered = discover_ports(&records, &DiscoveryParams::default());
        let indexes: Vec<u32> = discovered.iter().map(|p| p.index).collect();
        assert_eq!(indexes, vec![1, 3]);
    }

    #[test]
    fn test_distinct_names_are_used() {
        let records = vec![record(1, "fabric-a"), record(2, "fabric-b")];
        let discovered = discover_ports(&records, &DiscoveryParams::default());
        assert_eq!(discovered[0].name, "1 fabric-a");
        assert_eq!(discovered[1].name, "2 fabric-b");
    }

    #[test]
    fn test_colliding_names_fall_back_to_typed_index() {
        let mut isl = record(2, "port");
        isl.is_isl = true;
        let records = vec![record(1, "port"), isl];

        let discovered = discover_ports(&records, &DiscoveryParams::default());
        assert_eq!(discovered[0].name, "Port 1");
        assert_eq!(discovered[1].name, "ISL 2");
    }

    #[test]
    fn test_blank_names_fall_back_to_typed_index() {
        let records = vec![record(1, ""), record(2, "named")];
        let discovered = discover_ports(&records, &DiscoveryParams::default());
        assert_eq!(discovered[0].name, "Port 1");
    }

    #[test]
    fn test_padding_follows_port_count() {
        let records: Vec<PortRecord> = (1..=120).map(|i| record(i, "")).collect();
        let discovered = discover_ports(&records, &DiscoveryParams::default());
        assert_eq!(discovered[0].name, "Port 001");
        assert_eq!(discovered[119].name, "Port 120");
    }

    #[test]
    fn test_isl_labelling_can_be_disabled() {
        let mut isl = record(1, "");
        isl.is_isl = true;
        let params = DiscoveryParams {
            show_isl: false,
            ..DiscoveryParams::default()
        };

        let discovered = discover_ports(&[isl], &params);
        assert_eq!(discovered[0].name, "Port 1");
    }

    #[test]
    fn test_portname_preference_can_be_disabled() {
        let records = vec![record(1, "fabric-a")];
        let params = DiscoveryParams {
            use_portname: false,
            ..DiscoveryParams::default()
        };

        let discovered = discover_ports(&records, &params);
        assert_eq!(discovered[0].name, "Port 1");
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{"fcport": [], "neighbors": [], "interfaces": []}"#,
        )
        .unwrap();

        let snapshot = load_snapshot(&path).unwrap();
        assert!(snapshot.fcport.is_empty());
        assert!(snapshot.port_stats.is_none());
    }

    #[test]
    fn test_snapshot_path_precedence() {
        assert_eq!(
            snapshot_path(Some("/tmp/snap.json")),
            PathBuf::from("/tmp/snap.json")
        );
    }
}
