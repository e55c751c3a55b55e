//! Demo switch: evolving raw tables so every mode works without hardware.
//!
//! Each call advances monotonic counters by randomised per-port deltas and
//! rebuilds the snapshot a real fetch would deliver, including an ISL port,
//! administratively disabled ports, trailing non-FC interfaces and a wide
//! counter group.

use crate::types::{RawRow, ScanSnapshot, WideCounterRow};
use std::sync::atomic::{AtomicU64, Ordering};

const PORT_COUNT: usize = 8;
const ANCHOR_BASE: u64 = 1_073_741_823;

struct DemoPort {
    name: &'static str,
    phys: u8,
    oper: u8,
    adm: u8,
    legacy_speed: u8,
    high_speed_kbit: u64,
    /// Mean words moved per call; 0 for dark ports.
    words_per_tick: u64,
    frames_per_tick: u64,
    /// Roughly one CRC error per this many calls; 0 disables.
    crc_error_odds: u8,
    isl_baud: Option<&'static str>,
    /// Whether the wide-counter group covers this port.
    wide: bool,
}

const DEMO_PORTS: [DemoPort; PORT_COUNT] = [
    DemoPort {
        name: "isl_core1",
        phys: 6,
        oper: 1,
        adm: 1,
        legacy_speed: 3,
        high_speed_kbit: 10_000,
        words_per_tick: 60_000_000,
        frames_per_tick: 40_000,
        crc_error_odds: 0,
        isl_baud: Some("256"),
        wide: true,
    },
    DemoPort {
        name: "san_prod_a",
        phys: 6,
        oper: 1,
        adm: 1,
        legacy_speed: 5,
        high_speed_kbit: 8_000,
        words_per_tick: 25_000_000,
        frames_per_tick: 18_000,
        crc_error_odds: 0,
        isl_baud: None,
        wide: true,
    },
    DemoPort {
        name: "san_prod_b",
        phys: 6,
        oper: 1,
        adm: 1,
        legacy_speed: 5,
        high_speed_kbit: 8_000,
        words_per_tick: 8_000_000,
        frames_per_tick: 6_000,
        crc_error_odds: 4,
        isl_baud: None,
        wide: true,
    },
    DemoPort {
        name: "backup_pool",
        phys: 6,
        oper: 1,
        adm: 1,
        legacy_speed: 4,
        high_speed_kbit: 4_000,
        words_per_tick: 2_000_000,
        frames_per_tick: 1_500,
        crc_error_odds: 0,
        isl_baud: None,
        wide: true,
    },
    DemoPort {
        name: "spare_21",
        phys: 4, // no light
        oper: 2,
        adm: 1,
        legacy_speed: 3,
        high_speed_kbit: 0,
        words_per_tick: 0,
        frames_per_tick: 0,
        crc_error_odds: 0,
        isl_baud: None,
        wide: false,
    },
    DemoPort {
        name: "spare_22",
        phys: 1, // no card
        oper: 2,
        adm: 2,
        legacy_speed: 3,
        high_speed_kbit: 0,
        words_per_tick: 0,
        frames_per_tick: 0,
        crc_error_odds: 0,
        isl_baud: None,
        wide: false,
    },
    DemoPort {
        name: "esx_cluster1",
        phys: 6,
        oper: 1,
        adm: 1,
        legacy_speed: 8,
        high_speed_kbit: 16_000,
        words_per_tick: 90_000_000,
        frames_per_tick: 55_000,
        crc_error_odds: 0,
        isl_baud: None,
        wide: true,
    },
    DemoPort {
        name: "tape_lib",
        phys: 6,
        oper: 3, // testing
        adm: 1,
        legacy_speed: 2,
        high_speed_kbit: 2_000,
        words_per_tick: 400_000,
        frames_per_tick: 300,
        crc_error_odds: 0,
        isl_baud: None,
        wide: true,
    },
];

static TX_WORDS: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];
static RX_WORDS: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];
static TX_FRAMES: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];
static RX_FRAMES: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];
static RX_CRCS: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];
static BB_CREDIT_ZERO: [AtomicU64; PORT_COUNT] = [const { AtomicU64::new(0) }; PORT_COUNT];

fn advance(counter: &AtomicU64, mean: u64) -> u64 {
    if mean == 0 {
        return counter.load(Ordering::Relaxed);
    }
    // Jitter around the mean keeps the rates alive without ever going
    // backwards.
    let delta = mean / 2 + rand::random::<u64>() % mean;
    counter.fetch_add(delta, Ordering::Relaxed) + delta
}

fn maybe_count(counter: &AtomicU64, odds: u8) -> u64 {
    let bump = u64::from(odds > 0 && rand::random::<u8>() % odds == 0);
    counter.fetch_add(bump, Ordering::Relaxed) + bump
}

/// Encode a counter the way the wide-counter transport does: raw octets,
/// last byte least significant.
fn to_octets(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn generate_fake_snapshot() -> ScanSnapshot {
    let mut fcport: Vec<RawRow> = Vec::with_capacity(PORT_COUNT);
    let mut neighbors: Vec<RawRow> = Vec::new();
    let mut interfaces: Vec<RawRow> = Vec::with_capacity(PORT_COUNT + 2);
    let mut port_stats: Vec<WideCounterRow> = Vec::new();

    for (slot, port) in DEMO_PORTS.iter().enumerate() {
        let index = slot as u64 + 1;

        let tx_words = advance(&TX_WORDS[slot], port.words_per_tick);
        let rx_words = advance(&RX_WORDS[slot], port.words_per_tick * 3 / 4);
        let tx_frames = advance(&TX_FRAMES[slot], port.frames_per_tick);
        let rx_frames = advance(&RX_FRAMES[slot], port.frames_per_tick * 3 / 4);
        let rx_crcs = maybe_count(&RX_CRCS[slot], port.crc_error_odds);

        fcport.push(vec![
            index.to_string(),
            port.phys.to_string(),
            port.oper.to_string(),
            port.adm.to_string(),
            tx_words.to_string(),
            rx_words.to_string(),
            tx_frames.to_string(),
            rx_frames.to_string(),
            "0".to_string(), // notxcredits
            rx_crcs.to_string(),
            "0".to_string(), // rxencin
            "0".to_string(), // rxencout
            "0".to_string(), // c3discards
            port.legacy_speed.to_string(),
            port.name.to_string(),
        ]);

        if let Some(baud) = port.isl_baud {
            neighbors.push(vec![index.to_string(), baud.to_string()]);
        }

        interfaces.push(vec![
            (ANCHOR_BASE + index).to_string(),
            "56".to_string(),
            port.high_speed_kbit.to_string(),
        ]);

        if port.wide {
            let bb_credit_zero = maybe_count(&BB_CREDIT_ZERO[slot], 3);
            port_stats.push(WideCounterRow {
                index: format!("16.{index}"),
                tx_elements: to_octets(tx_words * 4),
                rx_elements: to_octets(rx_words * 4),
                tx_objects: to_octets(tx_frames),
                rx_objects: to_octets(rx_frames),
                bb_credit_zero: to_octets(bb_credit_zero),
            });
        }
    }

    // Management interfaces trail the FC block and must be trimmed by
    // alignment.
    interfaces.push(vec!["2000001".to_string(), "6".to_string(), "1000000".to_string()]);
    interfaces.push(vec!["2000002".to_string(), "6".to_string(), "1000000".to_string()]);

    ScanSnapshot {
        fcport,
        neighbors,
        interfaces,
        port_stats: Some(port_stats),
    }
}
