//! Operator configuration: check levels, accepted link states and discovery
//! filters, loadable from a JSON params file. Every field defaults to the
//! vendor factory settings so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Accepted state codes, written either as a single code or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AcceptedCodes {
    One(u8),
    Many(Vec<u8>),
}

impl AcceptedCodes {
    pub fn codes(&self) -> &[u8] {
        match self {
            AcceptedCodes::One(code) => std::slice::from_ref(code),
            AcceptedCodes::Many(codes) => codes,
        }
    }
}

/// Throughput levels, either relative to the resolved wire speed or as
/// absolute megabytes per second.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthLevels {
    Percent(f64, f64),
    MegaBytes(f64, f64),
}

impl BandwidthLevels {
    /// Convert to absolute warn/crit bytes per second against a wire speed.
    pub fn as_bytes_per_sec(self, wire_speed_bytes: f64) -> (f64, f64) {
        match self {
            BandwidthLevels::Percent(warn, crit) => (
                wire_speed_bytes * warn / 100.0,
                wire_speed_bytes * crit / 100.0,
            ),
            BandwidthLevels::MegaBytes(warn, crit) => {
                (warn * 1_048_576.0, crit * 1_048_576.0)
            }
        }
    }
}

/// Per-port check parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckParams {
    /// Optional throughput levels; without them bandwidth is metrics-only.
    pub bw: Option<BandwidthLevels>,
    /// Fallback link speed in Gbit/s when no table yields one.
    pub assumed_speed: f64,
    /// Averaging window in minutes; `None` disables averaging.
    pub average: Option<f64>,
    /// Warn/crit percentages per error-ratio counter.
    pub rxcrcs: (f64, f64),
    pub rxencin: (f64, f64),
    pub rxencout: (f64, f64),
    pub c3discards: (f64, f64),
    pub notxcredits: (f64, f64),
    pub phystate: AcceptedCodes,
    pub opstate: AcceptedCodes,
    pub admstate: AcceptedCodes,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            bw: None,
            assumed_speed: 2.0,
            average: None,
            rxcrcs: (3.0, 20.0),
            rxencin: (3.0, 20.0),
            rxencout: (3.0, 20.0),
            c3discards: (3.0, 20.0),
            notxcredits: (3.0, 20.0),
            phystate: AcceptedCodes::One(6),
            opstate: AcceptedCodes::One(1),
            admstate: AcceptedCodes::One(1),
        }
    }
}

/// Which ports become monitored items, and how they are named.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryParams {
    pub phystates: Vec<u8>,
    pub opstates: Vec<u8>,
    pub admstates: Vec<u8>,
    /// Prefer `<index> <portname>` items when the switch names are usable.
    pub use_portname: bool,
    /// Label inter-switch links as `ISL <index>`.
    pub show_isl: bool,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            phystates: vec![3, 4, 5, 6, 7, 8, 9, 10],
            opstates: vec![1, 2, 3, 4],
            admstates: vec![1, 3, 4],
            use_portname: true,
            show_isl: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Params {
    pub check: CheckParams,
    pub discovery: DiscoveryParams,
}

impl Params {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading params file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("parsing params file {}", path.display()))
    }
}
