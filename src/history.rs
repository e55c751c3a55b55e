//! Per-item time series for the TUI: throughput sparklines in the table,
//! charts in the detail panel, and a severity track.

#![allow(dead_code)] // some series accessors exist for tests and future views

use crate::types::Severity;
use std::collections::{HashMap, VecDeque};

/// Samples kept per series; at one scan per second this is three minutes.
pub const DEFAULT_CAPACITY: usize = 180;

/// Bounded series of float samples, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Series {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Series {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn last_n(&self, n: usize) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(self.values.len().saturating_sub(n))
            .copied()
    }

    pub fn max(&self) -> f64 {
        self.iter().fold(0.0_f64, f64::max)
    }

    /// Chart points as (sample offset, value) for plotting.
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v))
            .collect()
    }
}

/// Scale samples into the 0..=7 range of an eight-level block sparkline.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sparkline_levels(values: impl Iterator<Item = f64>) -> Vec<u64> {
    let values: Vec<f64> = values.collect();
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|v| ((v / max) * 7.0).round() as u64)
        .collect()
}

/// History of one monitored item.
#[derive(Debug, Clone)]
pub struct ItemHistory {
    pub in_bytes: Series,
    pub out_bytes: Series,
    pub frames: Series,
    severities: VecDeque<Severity>,
    capacity: usize,
}

impl ItemHistory {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            in_bytes: Series::with_capacity(capacity),
            out_bytes: Series::with_capacity(capacity),
            frames: Series::with_capacity(capacity),
            severities: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, in_bps: f64, out_bps: f64, frames: f64, severity: Severity) {
        self.in_bytes.push(in_bps);
        self.out_bytes.push(out_bps);
        self.frames.push(frames);
        if self.severities.len() == self.capacity {
            self.severities.pop_front();
        }
        self.severities.push_back(severity);
    }

    /// Combined in+out throughput levels for the table sparkline.
    pub fn throughput_sparkline(&self, samples: usize) -> Vec<u64> {
        let combined: Vec<f64> = self
            .in_bytes
            .last_n(samples)
            .zip(self.out_bytes.last_n(samples))
            .map(|(i, o)| i + o)
            .collect();
        sparkline_levels(combined.into_iter())
    }

    /// Worst severity seen over the retained window.
    pub fn worst_severity(&self) -> Severity {
        self.severities
            .iter()
            .copied()
            .max()
            .unwrap_or(Severity::Ok)
    }
}

/// All item histories of the running session.
#[derive(Debug)]
pub struct HistoryBook {
    items: HashMap<String, ItemHistory>,
    capacity: usize,
}

impl Default for HistoryBook {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBook {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: HashMap::new(),
            capacity,
        }
    }

    pub fn record(
        &mut self,
        item: &str,
        in_bps: f64,
        out_bps: f64,
        frames: f64,
        severity: Severity,
    ) {
        self.items
            .entry(item.to_string())
            .or_insert_with(|| ItemHistory::with_capacity(self.capacity))
            .record(in_bps, out_bps, frames, severity);
    }

    pub fn get(&self, item: &str) -> Option<&ItemHistory> {
        self.items.get(item)
    }

    /// Drop items that vanished from the scan so renamed or removed ports do
    /// not leak.
    pub fn retain_items(&mut self, active: &[String]) {
        self.items.retain(|key, _| active.contains(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_keeps_only_capacity() {
        let mut series = Series::with_capacity(3);
        for i in 1..=5 {
            series.push(f64::from(i));
        }
        assert_eq!(series.len(), 3);
        let values: Vec<f64> = series.iter().collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
        assert_eq!(series.last(), Some(5.0));
    }

    #[test]
    fn test_series_last_n() {
        let mut series = Series::with_capacity(10);
        for i in 1..=6 {
            series.push(f64::from(i));
        }
        let tail: Vec<f64> = series.last_n(2).collect();
        assert_eq!(tail, vec![5.0, 6.0]);
    }

    #[test]
    fn test_sparkline_levels_scale_to_max() {
        let levels = sparkline_levels(vec![0.0, 50.0, 100.0].into_iter());
        assert_eq!(levels, vec![0, 4, 7]);
    }

    #[test]
    fn test_sparkline_all_zero() {
        let levels = sparkline_levels(vec![0.0, 0.0].into_iter());
        assert_eq!(levels, vec![0, 0]);
    }

    #[test]
    fn test_item_history_worst_severity() {
        let mut history = ItemHistory::with_capacity(5);
        history.record(1.0, 1.0, 1.0, Severity::Ok);
        history.record(1.0, 1.0, 1.0, Severity::Warn);
        history.record(1.0, 1.0, 1.0, Severity::Ok);
        assert_eq!(history.worst_severity(), Severity::Warn);
    }

    #[test]
    fn test_book_retains_active_items_only() {
        let mut book = HistoryBook::new();
        book.record("01 a", 1.0, 1.0, 1.0, Severity::Ok);
        book.record("02 b", 1.0, 1.0, 1.0, Severity::Ok);

        book.retain_items(&["01 a".to_string()]);
        assert!(book.get("01 a").is_some());
        assert!(book.get("02 b").is_none());
    }

    #[test]
    fn test_throughput_sparkline_combines_directions() {
        let mut history = ItemHistory::with_capacity(5);
        history.record(10.0, 10.0, 0.0, Severity::Ok);
        history.record(50.0, 50.0, 0.0, Severity::Ok);
        let levels = history.throughput_sparkline(5);
        assert_eq!(levels, vec![1, 7]);
    }
}
