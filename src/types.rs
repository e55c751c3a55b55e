//! Core data model: raw protocol tables as fetched from a switch, and the
//! per-scan `PortRecord` they are correlated into.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a fetched table: ordered string fields, numerics as decimal text.
pub type RawRow = Vec<String>;

/// An ordered table as walked from one protocol sub-tree.
pub type RawTable = Vec<RawRow>;

/// Row of the wide-counter stats table. The index is the trailing part of the
/// hierarchical instance identifier; counter fields are raw octet strings
/// because the transport has no native 64-bit counter type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideCounterRow {
    pub index: String,
    pub tx_elements: Vec<u8>,
    pub rx_elements: Vec<u8>,
    pub tx_objects: Vec<u8>,
    pub rx_objects: Vec<u8>,
    pub bb_credit_zero: Vec<u8>,
}

/// All raw tables of one scan, as produced by the external fetch step.
///
/// The tables are independently indexed; `align` establishes the
/// correspondence. `port_stats` is absent on switches without the wide
/// counter group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSnapshot {
    /// Primary per-port table, one row per port:
    /// `[index, phys, oper, adm, txwords, rxwords, txframes, rxframes,
    ///   notxcredits, rxcrcs, rxencin, rxencout, c3discards, speed, name]`.
    pub fcport: RawTable,
    /// Neighbour table for inter-switch links: `[local port index, baud code]`.
    pub neighbors: RawTable,
    /// Standard interface table: `[if_index, if_type, if_high_speed_kbit]`.
    pub interfaces: RawTable,
    /// Optional wide-counter stats, keyed by the interface index space.
    #[serde(default)]
    pub port_stats: Option<Vec<WideCounterRow>>,
}

/// Monotonic counters of one port, normalised to 64 bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortCounters {
    pub tx_words: u64,
    pub rx_words: u64,
    pub tx_frames: u64,
    pub rx_frames: u64,
    pub no_tx_credits: u64,
    pub rx_crcs: u64,
    pub rx_enc_in: u64,
    pub rx_enc_out: u64,
    pub c3_discards: u64,
    /// Only transported through the wide-counter table.
    pub bb_credit_zero: Option<u64>,
}

/// One port's merged view of all tables, rebuilt fresh each scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortRecord {
    /// 1-based sequential index as transmitted by the switch.
    pub index: u32,
    pub phys_state: u8,
    pub oper_state: u8,
    pub adm_state: u8,
    pub counters: PortCounters,
    /// Vendor speed encoding; absent when blank or unparseable.
    pub legacy_speed_code: Option<u8>,
    /// Baud code from the neighbour table, for inter-switch links.
    pub isl_baud_code: Option<String>,
    /// Interface-table high speed in kbit/s, when alignment succeeded.
    pub std_high_speed_kbit: Option<u64>,
    pub port_name: String,
    /// Interface type discriminator from the standard table ("56" = FC).
    pub port_type_code: Option<String>,
    pub is_isl: bool,
}

/// Aggregated state of one check, worst-of combinable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Ok,
    Warn,
    Crit,
}

impl Severity {
    /// Trailing annotation appended to a non-OK message.
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Ok => "",
            Severity::Warn => " (!)",
            Severity::Crit => " (!!)",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warn => 1,
            Severity::Crit => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Crit => "CRIT",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Ok < Severity::Warn);
        assert!(Severity::Warn < Severity::Crit);
        assert_eq!(
            Severity::Warn.max(Severity::Crit).max(Severity::Ok),
            Severity::Crit
        );
    }

    #[test]
    fn test_severity_markers() {
        assert_eq!(Severity::Ok.marker(), "");
        assert_eq!(Severity::Warn.marker(), " (!)");
        assert_eq!(Severity::Crit.marker(), " (!!)");
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let snapshot = ScanSnapshot {
            fcport: vec![vec!["1".to_string(), "6".to_string()]],
            neighbors: vec![vec!["1".to_string(), "16".to_string()]],
            interfaces: vec![vec![
                "1073741824".to_string(),
                "56".to_string(),
                "8000000".to_string(),
            ]],
            port_stats: Some(vec![WideCounterRow {
                index: "1".to_string(),
                tx_elements: vec![0x01, 0x00],
                ..WideCounterRow::default()
            }]),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ScanSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fcport, snapshot.fcport);
        assert_eq!(back.port_stats, snapshot.port_stats);
    }
}
