//! Per-port evaluation: bandwidth against wire speed, frame rates, error
//! ratios against reference traffic, and the three link-state axes, combined
//! into one worst-of severity with an annotated summary.
//!
//! All counter math goes through the injected [`CounterStore`]; a key that
//! cannot yield a rate this round drops that check entirely for the round —
//! no message, no metric, no severity contribution.

use crate::config::CheckParams;
use crate::portstate::{ADMINISTRATIVE, OPERATIONAL, PHYSICAL};
use crate::speed::resolve_speed;
use crate::store::CounterStore;
use crate::types::{PortRecord, Severity};
use serde::Serialize;

/// One graphable value of a port's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

/// Aggregated result of one port for one scan.
#[derive(Debug, Clone, Serialize)]
pub struct PortAssessment {
    pub severity: Severity,
    pub summary: String,
    pub metrics: Vec<Metric>,
    pub speed_gbit: f64,
}

/// Error-ratio checks in reporting order. Receive-side counters reference the
/// received-frame rate, transmit-side the transmitted-frame rate.
const ERROR_CHECKS: [(&str, &str, ReferenceSide); 5] = [
    ("rxcrcs", "CRC errors", ReferenceSide::Rx),
    ("rxencin", "ENC-In", ReferenceSide::Rx),
    ("rxencout", "ENC-Out", ReferenceSide::Rx),
    ("c3discards", "C3 discards", ReferenceSide::Tx),
    ("notxcredits", "No TX credits", ReferenceSide::Tx),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceSide {
    Rx,
    Tx,
}

/// Evaluate one port. `now` is the scan timestamp in epoch seconds.
pub fn evaluate_port(
    record: &PortRecord,
    params: &CheckParams,
    store: &mut dyn CounterStore,
    now: f64,
) -> PortAssessment {
    let mut parts: Vec<(Severity, String)> = Vec::new();
    let mut metrics: Vec<Metric> = Vec::new();
    let index = record.index;

    let speed = resolve_speed(record, params.assumed_speed);
    parts.push((Severity::Ok, speed.message.clone()));
    let wire_speed_bytes = speed.gbit * 1e9 / 8.0;

    // Bandwidth, in then out, each followed by its average when configured.
    let bw_levels = params.bw.map(|levels| levels.as_bytes_per_sec(wire_speed_bytes));
    for (name, label, words) in [
        ("in", "In", record.counters.rx_words),
        ("out", "Out", record.counters.tx_words),
    ] {
        let bytes = words.saturating_mul(4);
        let Ok(rate) = store.rate(&format!("{name}.{index}"), now, bytes) else {
            continue;
        };

        let severity = levels_severity(rate, bw_levels);
        parts.push((
            severity,
            format!("{label}: {}{}", render_bytes_per_sec(rate), severity.marker()),
        ));
        metrics.push(Metric {
            name: name.to_string(),
            value: rate,
        });

        if let Some(minutes) = params.average {
            let avg = store.average(&format!("{name}.{index}.avg"), now, rate, minutes);
            let severity = levels_severity(avg, bw_levels);
            parts.push((
                severity,
                format!(
                    "{label} ({minutes}min avg): {}{}",
                    render_bytes_per_sec(avg),
                    severity.marker()
                ),
            ));
            metrics.push(Metric {
                name: format!("{name}_avg"),
                value: avg,
            });
        }
    }

    // Frame rates: informational messages plus reference values for the
    // error ratios below.
    let rx_frame_rate = store
        .rate(&format!("rxframes.{index}"), now, record.counters.rx_frames)
        .ok();
    let tx_frame_rate = store
        .rate(&format!("txframes.{index}"), now, record.counters.tx_frames)
        .ok();
    for (name, label, rate) in [
        ("rxframes", "Frames in", rx_frame_rate),
        ("txframes", "Frames out", tx_frame_rate),
    ] {
        let Some(rate) = rate else { continue };
        parts.push((Severity::Ok, format!("{label}: {rate:.1}/s")));
        metrics.push(Metric {
            name: name.to_string(),
            value: rate,
        });
        if let Some(minutes) = params.average {
            let avg = store.average(&format!("{name}.{index}.avg"), now, rate, minutes);
            metrics.push(Metric {
                name: format!("{name}_avg"),
                value: avg,
            });
        }
    }

    for (name, label, side) in ERROR_CHECKS {
        let counter = match name {
            "rxcrcs" => record.counters.rx_crcs,
            "rxencin" => record.counters.rx_enc_in,
            "rxencout" => record.counters.rx_enc_out,
            "c3discards" => record.counters.c3_discards,
            _ => record.counters.no_tx_credits,
        };
        let reference = match side {
            ReferenceSide::Rx => rx_frame_rate,
            ReferenceSide::Tx => tx_frame_rate,
        };

        let Ok(error_rate) = store.rate(&format!("{name}.{index}"), now, counter) else {
            continue;
        };
        // Without a reference rate a single warm-up sample would read as a
        // 100 % error ratio; skip the round instead.
        let Some(reference) = reference else { continue };

        let (warn, crit) = error_levels(params, name);
        let ratio_pct = error_ratio_percent(error_rate, reference);
        let severity = levels_severity(ratio_pct, Some((warn, crit)));
        parts.push((
            severity,
            format!("{label}: {ratio_pct:.2}%{}", severity.marker()),
        ));
        metrics.push(Metric {
            name: name.to_string(),
            value: error_rate,
        });

        if let Some(minutes) = params.average {
            // The ratio itself is averaged, not the raw rate.
            let avg_pct = store.average(&format!("{name}.{index}.avg"), now, ratio_pct, minutes);
            let severity = levels_severity(avg_pct, Some((warn, crit)));
            parts.push((
                severity,
                format!("{label} ({minutes}min avg): {avg_pct:.2}%{}", severity.marker()),
            ));
            metrics.push(Metric {
                name: format!("{name}_avg"),
                value: avg_pct,
            });
        }
    }

    if let Some(bb_credit_zero) = record.counters.bb_credit_zero {
        if let Ok(rate) = store.rate(&format!("bbcredit_zero.{index}"), now, bb_credit_zero) {
            metrics.push(Metric {
                name: "bbcredit_zero".to_string(),
                value: rate,
            });
        }
    }

    for (axis, code, accepted) in [
        (&PHYSICAL, record.phys_state, params.phystate.codes()),
        (&OPERATIONAL, record.oper_state, params.opstate.codes()),
        (&ADMINISTRATIVE, record.adm_state, params.admstate.codes()),
    ] {
        parts.push(axis.evaluate(code, accepted));
    }

    let severity = parts
        .iter()
        .map(|(severity, _)| *severity)
        .max()
        .unwrap_or(Severity::Ok);
    let summary = parts
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join(", ");

    PortAssessment {
        severity,
        summary,
        metrics,
        speed_gbit: speed.gbit,
    }
}

/// `ratio = er / (ref + er)` as a percentage; defined as 0 when both rates
/// are zero.
fn error_ratio_percent(error_rate: f64, reference_rate: f64) -> f64 {
    let total = reference_rate + error_rate;
    if total > 0.0 {
        error_rate / total * 100.0
    } else {
        0.0
    }
}

fn error_levels(params: &CheckParams, name: &str) -> (f64, f64) {
    match name {
        "rxcrcs" => params.rxcrcs,
        "rxencin" => params.rxencin,
        "rxencout" => params.rxencout,
        "c3discards" => params.c3discards,
        _ => params.notxcredits,
    }
}

fn levels_severity(value: f64, levels: Option<(f64, f64)>) -> Severity {
    match levels {
        Some((_, crit)) if value >= crit => Severity::Crit,
        Some((warn, _)) if value >= warn => Severity::Warn,
        _ => Severity::Ok,
    }
}

/// Human-readable byte rate, 1024-based.
pub fn render_bytes_per_sec(rate: f64) -> String {
    const UNITS: [&str; 5] = ["B/s", "kB/s", "MB/s", "GB/s", "TB/s"];
    let mut value = rate;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
