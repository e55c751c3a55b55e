//! Counter store: turns monotonic counter samples into per-second rates and
//! windowed averages.
//!
//! The evaluator only sees the [`CounterStore`] trait so tests can inject a
//! deterministic fake. [`MemStore`] is the shipped implementation; it can be
//! persisted to JSON so one-shot check invocations keep state between
//! processes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Returned when a key cannot yield a meaningful rate this round: first
/// sample for the key, non-positive elapsed time, or a counter regression
/// (device reset) the store absorbed by re-seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUnavailable;

/// Per-key rate and averaging state, keyed `<metric>.<port index>`.
///
/// Invocations are sequential within a scan; no two ports share a key.
pub trait CounterStore {
    /// Per-second delta since the previous call with this key.
    fn rate(&mut self, key: &str, now: f64, value: u64) -> Result<f64, RateUnavailable>;

    /// Time-weighted exponential average with a half-life of
    /// `window_minutes`, seeded with the first value.
    fn average(&mut self, key: &str, now: f64, value: f64, window_minutes: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RateSlot {
    time: f64,
    value: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct AverageSlot {
    time: f64,
    average: f64,
}

/// In-memory counter store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemStore {
    rates: HashMap<String, RateSlot>,
    averages: HashMap<String, AverageSlot>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted state; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading counter state {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("parsing counter state {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("writing counter state {}", path.display()))
    }
}

impl CounterStore for MemStore {
    fn rate(&mut self, key: &str, now: f64, value: u64) -> Result<f64, RateUnavailable> {
        let previous = self
            .rates
            .insert(key.to_string(), RateSlot { time: now, value });

        let Some(prev) = previous else {
            return Err(RateUnavailable);
        };

        let elapsed = now - prev.time;
        if elapsed <= 0.0 {
            return Err(RateUnavailable);
        }
        if value < prev.value {
            // Counter went backwards: the device rebooted or reset its
            // counters. The slot is already re-seeded, skip this round.
            return Err(RateUnavailable);
        }

        #[allow(clippy::cast_precision_loss)]
        let delta = (value - prev.value) as f64;
        Ok(delta / elapsed)
    }

    fn average(&mut self, key: &str, now: f64, value: f64, window_minutes: f64) -> f64 {
        let averaged = match self.averages.get(key) {
            None => value,
            Some(slot) => {
                let elapsed = now - slot.time;
                if elapsed <= 0.0 || window_minutes <= 0.0 {
                    slot.average
                } else {
                    let weight = 0.5_f64.powf(elapsed / (window_minutes * 60.0));
                    slot.average * weight + value * (1.0 - weight)
                }
            }
        };

        self.averages.insert(
            key.to_string(),
            AverageSlot {
                time: now,
                average: averaged,
            },
        );
        averaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_unavailable() {
        let mut store = MemStore::new();
        assert_eq!(store.rate("in.1", 100.0, 500), Err(RateUnavailable));
    }

    #[test]
    fn test_rate_is_delta_per_second() {
        let mut store = MemStore::new();
        assert!(store.rate("in.1", 100.0, 1000).is_err());
        let rate = store.rate("in.1", 110.0, 1500).unwrap();
        assert!((rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = MemStore::new();
        assert!(store.rate("in.1", 100.0, 1000).is_err());
        assert!(store.rate("in.2", 100.0, 9999).is_err());
        let rate = store.rate("in.1", 101.0, 1100).unwrap();
        assert!((rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_elapsed_is_unavailable() {
        let mut store = MemStore::new();
        assert!(store.rate("in.1", 100.0, 1000).is_err());
        assert_eq!(store.rate("in.1", 100.0, 2000), Err(RateUnavailable));
    }

    #[test]
    fn test_regression_reseeds_and_recovers() {
        let mut store = MemStore::new();
        assert!(store.rate("in.1", 100.0, 100_000).is_err());
        // Device reset: counter restarts near zero.
        assert_eq!(store.rate("in.1", 110.0, 40), Err(RateUnavailable));
        // Next sample rates against the re-seeded slot.
        let rate = store.rate("in.1", 120.0, 140).unwrap();
        assert!((rate - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_seeds_with_first_value() {
        let mut store = MemStore::new();
        let avg = store.average("in.1.avg", 100.0, 42.0, 5.0);
        assert!((avg - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_half_life() {
        let mut store = MemStore::new();
        store.average("in.1.avg", 0.0, 100.0, 5.0);
        // One full window later the old value carries weight 0.5.
        let avg = store.average("in.1.avg", 300.0, 0.0, 5.0);
        assert!((avg - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_moves_toward_new_values() {
        let mut store = MemStore::new();
        store.average("x", 0.0, 0.0, 1.0);
        let mut last = 0.0;
        for i in 1..=10 {
            last = store.average("x", f64::from(i) * 30.0, 100.0, 1.0);
        }
        assert!(last > 90.0, "average should converge, got {last}");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = MemStore::new();
        assert!(store.rate("in.1", 100.0, 1000).is_err());
        store.save(&path).unwrap();

        let mut restored = MemStore::load(&path).unwrap();
        let rate = restored.rate("in.1", 110.0, 2000).unwrap();
        assert!((rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.rates.is_empty());
    }
}
