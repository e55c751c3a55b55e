//! Scan orchestration: raw snapshot in, evaluated monitored ports out.

use crate::align::build_port_records;
use crate::check::{evaluate_port, Metric, PortAssessment};
use crate::config::Params;
use crate::discovery;
use crate::history::HistoryBook;
use crate::store::MemStore;
use crate::types::{ScanSnapshot, Severity};
use serde::Serialize;

/// One discovered port with its latest evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoredPort {
    pub index: u32,
    pub name: String,
    pub severity: Severity,
    pub summary: String,
    pub speed_gbit: f64,
    pub metrics: Vec<Metric>,
}

impl MonitoredPort {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|metric| metric.name == name)
            .map(|metric| metric.value)
    }
}

/// Owns the counter store and history across scans and runs one scan to
/// completion: align, discover, evaluate, record.
#[derive(Debug, Default)]
pub struct ScanCollector {
    store: MemStore,
    pub history: HistoryBook,
    ports: Vec<MonitoredPort>,
}

impl ScanCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from persisted counter state (one-shot check mode).
    pub fn with_store(store: MemStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn update(&mut self, snapshot: &ScanSnapshot, params: &Params, now: f64) {
        let records = build_port_records(snapshot);
        let discovered = discovery::discover_ports(&records, &params.discovery);

        let mut ports = Vec::with_capacity(discovered.len());
        for item in discovered {
            let Some(record) = records.iter().find(|r| r.index == item.index) else {
                continue;
            };
            let PortAssessment {
                severity,
                summary,
                metrics,
                speed_gbit,
            } = evaluate_port(record, &params.check, &mut self.store, now);

            let port = MonitoredPort {
                index: item.index,
                name: item.name,
                severity,
                summary,
                speed_gbit,
                metrics,
            };
            self.history.record(
                &port.name,
                port.metric("in").unwrap_or(0.0),
                port.metric("out").unwrap_or(0.0),
                port.metric("rxframes").unwrap_or(0.0) + port.metric("txframes").unwrap_or(0.0),
                port.severity,
            );
            ports.push(port);
        }

        let active: Vec<String> = ports.iter().map(|p| p.name.clone()).collect();
        self.history.retain_items(&active);
        self.ports = ports;
    }

    pub fn ports(&self) -> &[MonitoredPort] {
        &self.ports
    }

    pub fn worst_severity(&self) -> Severity {
        self.ports
            .iter()
            .map(|port| port.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    pub fn into_store(self) -> MemStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::fake::generate_fake_snapshot;

    #[test]
    fn test_first_scan_has_no_rates() {
        let mut collector = ScanCollector::new();
        collector.update(&generate_fake_snapshot(), &Params::default(), 100.0);

        assert!(!collector.ports().is_empty());
        for port in collector.ports() {
            assert!(port.metric("in").is_none(), "cold store must yield no rate");
        }
    }

    #[test]
    fn test_second_scan_produces_rates_and_history() {
        let mut collector = ScanCollector::new();
        let params = Params::default();
        collector.update(&generate_fake_snapshot(), &params, 100.0);
        collector.update(&generate_fake_snapshot(), &params, 101.0);

        let active = collector
            .ports()
            .iter()
            .find(|p| p.metric("in").is_some())
            .expect("an active port should have a rate on the second scan");
        assert!(active.metric("in").unwrap() > 0.0);
        assert!(collector.history.get(&active.name).is_some());
    }

    #[test]
    fn test_admin_disabled_port_is_not_monitored() {
        let mut collector = ScanCollector::new();
        collector.update(&generate_fake_snapshot(), &Params::default(), 100.0);

        // Demo port 6 is administratively offline and outside the default
        // discovery filter.
        assert!(collector.ports().iter().all(|p| p.index != 6));
    }

    #[test]
    fn test_empty_snapshot_yields_no_ports() {
        let mut collector = ScanCollector::new();
        collector.update(&ScanSnapshot::default(), &Params::default(), 100.0);
        assert!(collector.ports().is_empty());
        assert_eq!(collector.worst_severity(), Severity::Ok);
    }
}
