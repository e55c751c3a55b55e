//! Correlates the independently-indexed raw tables of one scan into merged
//! per-port records.
//!
//! The primary FC-port table and the standard interface table do not share a
//! key: the switch maps port index `n` to interface index
//! `1073741823 + first port index + (n - first port index)`. Alignment finds
//! that anchor row once, then joins positionally. Everything here degrades
//! per row or per scan, never aborts: a port with bad data is dropped, a scan
//! whose tables cannot be reconciled loses the interface join only.

use crate::decode::decode_wide_counter;
use crate::speed::FC_IFTYPE;
use crate::types::{PortCounters, PortRecord, RawRow, ScanSnapshot, WideCounterRow};
use log::{debug, warn};
use std::collections::HashMap;

/// Interface index of the first FC port, minus the first port's own index.
const IFINDEX_ANCHOR_BASE: u64 = 1_073_741_823;

/// Column layout of the primary per-port table.
mod col {
    pub const INDEX: usize = 0;
    pub const PHYS: usize = 1;
    pub const OPER: usize = 2;
    pub const ADM: usize = 3;
    pub const TX_WORDS: usize = 4;
    pub const RX_WORDS: usize = 5;
    pub const TX_FRAMES: usize = 6;
    pub const RX_FRAMES: usize = 7;
    pub const NO_TX_CREDITS: usize = 8;
    pub const RX_CRCS: usize = 9;
    pub const RX_ENC_IN: usize = 10;
    pub const RX_ENC_OUT: usize = 11;
    pub const C3_DISCARDS: usize = 12;
    pub const SPEED: usize = 13;
    pub const NAME: usize = 14;
    pub const WIDTH: usize = 15;
}

/// Build one `PortRecord` per usable primary-table row.
pub fn build_port_records(snapshot: &ScanSnapshot) -> Vec<PortRecord> {
    if snapshot.fcport.is_empty() {
        return Vec::new();
    }

    let if_join = align_interface_table(&snapshot.fcport, &snapshot.interfaces);
    let isl_bauds = isl_baud_map(&snapshot.neighbors);

    let mut records = Vec::with_capacity(snapshot.fcport.len());
    for (position, row) in snapshot.fcport.iter().enumerate() {
        let Some(mut record) = parse_primary_row(row) else {
            warn!("dropping port row {position}: malformed field in {row:?}");
            continue;
        };

        if let Some(joined) = &if_join {
            if let Some((port_type, high_speed)) = joined.get(position) {
                record.port_type_code.clone_from(port_type);
                record.std_high_speed_kbit = *high_speed;
            }
        }

        record.is_isl = isl_bauds.contains_key(&record.index);
        record.isl_baud_code = isl_bauds.get(&record.index).cloned().flatten();

        if let Some(stats) = &snapshot.port_stats {
            apply_wide_counters(&mut record, stats);
        }

        records.push(record);
    }

    debug!(
        "aligned {} of {} port rows",
        records.len(),
        snapshot.fcport.len()
    );
    records
}

/// Positionally aligned `(port_type_code, std_high_speed_kbit)` per primary
/// row, or `None` when the scan degrades to the legacy-speed-only path.
type InterfaceJoin = Vec<(Option<String>, Option<u64>)>;

fn align_interface_table(fcport: &[RawRow], interfaces: &[RawRow]) -> Option<InterfaceJoin> {
    let offset = fcport
        .first()
        .and_then(|row| parse_u64(row.get(col::INDEX)?))?;
    let anchor_index = IFINDEX_ANCHOR_BASE + offset;

    let Some(anchor) = interfaces
        .iter()
        .position(|row| row.first().and_then(|f| parse_u64(f)) == Some(anchor_index))
    else {
        warn!("interface anchor {anchor_index} not found; speeds fall back to the legacy field");
        return None;
    };

    // Drop the index column; rows now line up positionally with the primary
    // table, apart from non-FC interfaces appended after the FC block.
    let mut sliced: Vec<(String, Option<u64>)> = interfaces[anchor..]
        .iter()
        .map(|row| {
            (
                row.get(1).cloned().unwrap_or_default(),
                row.get(2).and_then(|f| parse_u64(f)),
            )
        })
        .collect();

    while sliced
        .last()
        .is_some_and(|(port_type, _)| !port_type.is_empty() && port_type != FC_IFTYPE)
    {
        sliced.pop();
    }

    if sliced.len() != fcport.len() {
        warn!(
            "interface slice length {} does not match {} ports; speeds fall back to the legacy field",
            sliced.len(),
            fcport.len()
        );
        return None;
    }

    Some(
        sliced
            .into_iter()
            .map(|(port_type, high_speed)| {
                // Non-FC interfaces inside the block keep their slot for
                // positional alignment but must not lend their speed to an
                // FC port record.
                let high_speed = (port_type == FC_IFTYPE).then_some(high_speed).flatten();
                let port_type = (!port_type.is_empty()).then_some(port_type);
                (port_type, high_speed)
            })
            .collect(),
    )
}

fn isl_baud_map(neighbors: &[RawRow]) -> HashMap<u32, Option<String>> {
    let mut bauds = HashMap::new();
    for row in neighbors {
        let Some(index) = row.first().and_then(|f| parse_u32(f)) else {
            continue;
        };
        bauds.insert(index, row.get(1).cloned());
    }
    bauds
}

/// Override the text counters with decoded wide counters. A port without a
/// matching stats row gets zeroed counters; the stats group simply does not
/// cover it.
fn apply_wide_counters(record: &mut PortRecord, stats: &[WideCounterRow]) {
    let wanted = record.index.to_string();
    let matched = stats
        .iter()
        .find(|row| row.index.rsplit('.').next() == Some(wanted.as_str()));

    match matched {
        Some(row) => {
            // Element counters are octets; keep them in words so the
            // bandwidth math stays uniform downstream.
            record.counters.tx_words = decode_wide_counter(&row.tx_elements) / 4;
            record.counters.rx_words = decode_wide_counter(&row.rx_elements) / 4;
            record.counters.tx_frames = decode_wide_counter(&row.tx_objects);
            record.counters.rx_frames = decode_wide_counter(&row.rx_objects);
            record.counters.bb_credit_zero = Some(decode_wide_counter(&row.bb_credit_zero));
        }
        None => {
            record.counters.tx_words = 0;
            record.counters.rx_words = 0;
            record.counters.tx_frames = 0;
            record.counters.rx_frames = 0;
            record.counters.bb_credit_zero = None;
        }
    }
}

fn parse_primary_row(row: &RawRow) -> Option<PortRecord> {
    if row.len() < col::WIDTH {
        return None;
    }

    Some(PortRecord {
        index: parse_u32(&row[col::INDEX])?,
        phys_state: parse_u8(&row[col::PHYS])?,
        oper_state: parse_u8(&row[col::OPER])?,
        adm_state: parse_u8(&row[col::ADM])?,
        counters: PortCounters {
            tx_words: parse_u64(&row[col::TX_WORDS])?,
            rx_words: parse_u64(&row[col::RX_WORDS])?,
            tx_frames: parse_u64(&row[col::TX_FRAMES])?,
            rx_frames: parse_u64(&row[col::RX_FRAMES])?,
            no_tx_credits: parse_u64(&row[col::NO_TX_CREDITS])?,
            rx_crcs: parse_u64(&row[col::RX_CRCS])?,
            rx_enc_in: parse_u64(&row[col::RX_ENC_IN])?,
            rx_enc_out: parse_u64(&row[col::RX_ENC_OUT])?,
            c3_discards: parse_u64(&row[col::C3_DISCARDS])?,
            bb_credit_zero: None,
        },
        // A bad speed code costs the legacy tier, not the whole port.
        legacy_speed_code: parse_u8(&row[col::SPEED]),
        isl_baud_code: None,
        std_high_speed_kbit: None,
        port_name: row[col::NAME].trim().to_string(),
        port_type_code: None,
        is_isl: false,
    })
}

fn parse_u64(field: &str) -> Option<u64> {
    field.trim().parse().ok()
}

fn parse_u32(field: &str) -> Option<u32> {
    field.trim().parse().ok()
}

fn parse_u8(field: &str) -> Option<u8> {
    field.trim().parse().ok()
}
