//! Tiered link-speed resolution.
//!
//! Firmware generations disagree on which speed field is authoritative, so
//! the resolver walks a fixed reliability ordering: ISL baud code, vendor
//! legacy code, standard-table high speed, operator-configured default.
//! Each tier is a pure function of the record; the first match wins.

use crate::types::PortRecord;

/// Interface type code the standard table uses for Fibre Channel ports.
pub const FC_IFTYPE: &str = "56";

/// Resolved line speed plus the message describing where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpeed {
    pub gbit: f64,
    pub message: String,
}

/// Baud codes reported for inter-switch links.
fn isl_baud_gbit(code: &str) -> Option<f64> {
    match code {
        "2" => Some(0.155),
        "4" => Some(0.266),
        "8" => Some(0.532),
        "16" => Some(1.0),
        "32" => Some(2.0),
        "64" => Some(4.0),
        "128" => Some(8.0),
        "256" => Some(10.0),
        "512" => Some(16.0),
        _ => None,
    }
}

/// Vendor legacy speed encoding. Codes 3 (auto-negotiate) and 7 (unknown)
/// carry no usable value.
fn legacy_gbit(code: u8) -> Option<f64> {
    match code {
        1 => Some(1.0),
        2 => Some(2.0),
        4 => Some(4.0),
        5 => Some(8.0),
        6 => Some(10.0),
        8 => Some(16.0),
        _ => None,
    }
}

/// Decide the effective line speed in Gbit/s.
pub fn resolve_speed(record: &PortRecord, assumed_gbit: f64) -> ResolvedSpeed {
    if record.is_isl {
        if let Some(gbit) = record.isl_baud_code.as_deref().and_then(isl_baud_gbit) {
            return ResolvedSpeed {
                gbit,
                message: format!("ISL speed: {gbit:.0} Gbit/s"),
            };
        }
    }

    // The legacy encoding is trusted only when the standard table did not
    // positively classify the port as FC.
    if record.port_type_code.as_deref() != Some(FC_IFTYPE) {
        if let Some(gbit) = record.legacy_speed_code.and_then(legacy_gbit) {
            return ResolvedSpeed {
                gbit,
                message: format!("{gbit:.0} Gbit/s"),
            };
        }
    }

    match record.std_high_speed_kbit {
        Some(kbit) if kbit > 0 => {
            #[allow(clippy::cast_precision_loss)]
            let gbit = kbit as f64 / 1000.0;
            ResolvedSpeed {
                gbit,
                message: format!("Speed: {gbit} Gbit/s"),
            }
        }
        _ => ResolvedSpeed {
            gbit: assumed_gbit,
            message: format!("Assumed speed: {assumed_gbit} Gbit/s"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortCounters;

    fn record() -> PortRecord {
        PortRecord {
            index: 1,
            phys_state: 6,
            oper_state: 1,
            adm_state: 1,
            counters: PortCounters::default(),
            legacy_speed_code: None,
            isl_baud_code: None,
            std_high_speed_kbit: None,
            port_name: String::new(),
            port_type_code: None,
            is_isl: false,
        }
    }

    #[test]
    fn test_isl_baud_wins_over_everything() {
        let mut rec = record();
        rec.is_isl = true;
        rec.isl_baud_code = Some("16".to_string());
        rec.legacy_speed_code = Some(6); // would say 10 Gbit
        rec.std_high_speed_kbit = Some(8000); // would say 8 Gbit

        let resolved = resolve_speed(&rec, 2.0);
        assert!((resolved.gbit - 1.0).abs() < f64::EPSILON);
        assert_eq!(resolved.message, "ISL speed: 1 Gbit/s");
    }

    #[test]
    fn test_unknown_baud_code_falls_through() {
        let mut rec = record();
        rec.is_isl = true;
        rec.isl_baud_code = Some("1".to_string());
        rec.legacy_speed_code = Some(5);

        let resolved = resolve_speed(&rec, 2.0);
        assert!((resolved.gbit - 8.0).abs() < f64::EPSILON);
        assert_eq!(resolved.message, "8 Gbit/s");
    }

    #[test]
    fn test_legacy_not_trusted_for_classified_fc_port() {
        let mut rec = record();
        rec.legacy_speed_code = Some(5);
        rec.port_type_code = Some(FC_IFTYPE.to_string());
        rec.std_high_speed_kbit = Some(16000);

        let resolved = resolve_speed(&rec, 2.0);
        assert!((resolved.gbit - 16.0).abs() < f64::EPSILON);
        assert_eq!(resolved.message, "Speed: 16 Gbit/s");
    }

    #[test]
    fn test_auto_negotiate_code_never_matches() {
        let mut rec = record();
        rec.legacy_speed_code = Some(3);
        rec.std_high_speed_kbit = Some(4000);

        let resolved = resolve_speed(&rec, 2.0);
        assert!((resolved.gbit - 4.0).abs() < f64::EPSILON);
        assert_eq!(resolved.message, "Speed: 4 Gbit/s");
    }

    #[test]
    fn test_zero_high_speed_falls_back_to_assumed() {
        let mut rec = record();
        rec.std_high_speed_kbit = Some(0);

        let resolved = resolve_speed(&rec, 2.0);
        assert!((resolved.gbit - 2.0).abs() < f64::EPSILON);
        assert_eq!(resolved.message, "Assumed speed: 2 Gbit/s");
    }

    #[test]
    fn test_assumed_default_renders_fraction() {
        let resolved = resolve_speed(&record(), 0.5);
        assert_eq!(resolved.message, "Assumed speed: 0.5 Gbit/s");
    }
}
