//! fctop - monitor and health-check Fibre Channel switch ports.
//!
//! A scan's raw tables arrive as a JSON snapshot written by an external
//! fetch step; `--demo` (or `FCTOP_DEMO`) substitutes a simulated switch.

mod align;
mod check;
mod config;
mod decode;
mod discovery;
mod history;
mod metrics;
mod portstate;
mod speed;
mod store;
mod types;
mod ui;

use anyhow::{Context, Result};
use config::Params;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use metrics::ScanCollector;
use ratatui::{backend::CrosstermBackend, Terminal};
use simple_logger::SimpleLogger;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use store::MemStore;
use types::ScanSnapshot;

const UI_REFRESH_INTERVAL_MS: u64 = 100;
const SCAN_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Default)]
struct Options {
    check_mode: bool,
    json_mode: bool,
    demo: bool,
    params_path: Option<String>,
    snapshot_path: Option<String>,
    state_path: Option<String>,
}

fn parse_args() -> Options {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--check" => opts.check_mode = true,
            "--json" => opts.json_mode = true,
            "--demo" => opts.demo = true,
            "--params" => opts.params_path = args.next(),
            "--snapshot" => opts.snapshot_path = args.next(),
            "--state" => opts.state_path = args.next(),
            other => warn!("ignoring unknown argument {other}"),
        }
    }
    opts
}

fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    let opts = parse_args();
    let params = match &opts.params_path {
        Some(path) => Params::load(Path::new(path))?,
        None => Params::default(),
    };

    if opts.check_mode {
        run_check_mode(&opts, &params)
    } else if opts.json_mode {
        run_json_mode(&opts, &params)
    } else {
        run_interactive_mode(&opts, &params)
    }
}

fn use_demo_data(opts: &Options) -> bool {
    opts.demo || std::env::var("FCTOP_DEMO").is_ok()
}

fn fetch_snapshot(opts: &Options) -> Result<ScanSnapshot> {
    if use_demo_data(opts) {
        return Ok(discovery::fake::generate_fake_snapshot());
    }
    discovery::load_snapshot(&discovery::snapshot_path(opts.snapshot_path.as_deref()))
}

fn now_epoch() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One-shot evaluation in monitoring-plugin style: one line per port,
/// exit code = worst severity. Counter state persists through `--state`.
fn run_check_mode(opts: &Options, params: &Params) -> Result<()> {
    let snapshot = fetch_snapshot(opts)?;
    let state_path = opts.state_path.as_ref().map(PathBuf::from);

    let store = match &state_path {
        Some(path) => MemStore::load(path)?,
        None => MemStore::new(),
    };
    let mut collector = ScanCollector::with_store(store);
    collector.update(&snapshot, params, now_epoch());

    for port in collector.ports() {
        let metrics = port
            .metrics
            .iter()
            .map(|m| format!("{}={:.2}", m.name, m.value))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{} {} - {} | {}", port.name, port.severity, port.summary, metrics);
    }

    let worst = collector.worst_severity();
    if let Some(path) = &state_path {
        collector
            .into_store()
            .save(path)
            .context("persisting counter state")?;
    }
    std::process::exit(worst.exit_code());
}

fn run_json_mode(opts: &Options, params: &Params) -> Result<()> {
    let snapshot = fetch_snapshot(opts)?;
    let mut collector = ScanCollector::new();
    collector.update(&snapshot, params, now_epoch());

    println!("{}", serde_json::to_string_pretty(collector.ports())?);
    Ok(())
}

fn run_interactive_mode(opts: &Options, params: &Params) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, opts, params);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    opts: &Options,
    params: &Params,
) -> Result<()> {
    let hostname = hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    info!("fctop started on {hostname}");

    let mut collector = ScanCollector::new();
    let mut state = ui::AppState::new();

    let ui_refresh = Duration::from_millis(UI_REFRESH_INTERVAL_MS);
    let scan_interval = Duration::from_millis(SCAN_INTERVAL_MS);
    let mut last_scan: Option<Instant> = None;

    loop {
        let now = Instant::now();

        let scan_due = last_scan.map_or(true, |t| now.duration_since(t) >= scan_interval);
        if scan_due {
            match fetch_snapshot(opts) {
                Ok(snapshot) => collector.update(&snapshot, params, now_epoch()),
                // A missing or half-written snapshot keeps the previous
                // scan on screen.
                Err(err) => warn!("scan skipped: {err:#}"),
            }
            last_scan = Some(now);
        }

        terminal.draw(|frame| {
            ui::draw(
                frame,
                collector.ports(),
                &collector.history,
                &hostname,
                &mut state,
            );
        })?;

        let timeout = ui_refresh.saturating_sub(now.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char('j') | KeyCode::Down => {
                        state.select_next(collector.ports().len());
                    }
                    KeyCode::Char('k') | KeyCode::Up => state.select_prev(),
                    KeyCode::Enter => state.toggle_detail(),
                    KeyCode::Tab => state.next_tab(),
                    KeyCode::BackTab => state.prev_tab(),
                    KeyCode::Char('r') => last_scan = None,
                    _ => {}
                }
            }
        }
    }
}
