//! TUI: port table with severity colours, utilisation bars and sparklines,
//! plus an expandable detail panel with the full summary and charts.

#![allow(clippy::cast_precision_loss)] // chart coordinates
#![allow(clippy::cast_possible_truncation)] // layout math
#![allow(clippy::similar_names)] // in/out pairs are intentionally similar

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::check::render_bytes_per_sec;
use crate::history::{HistoryBook, ItemHistory};
use crate::metrics::MonitoredPort;
use crate::types::Severity;

/// Sparkline width in the main table.
const SPARKLINE_SAMPLES: usize = 20;

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// UI navigation state.
#[derive(Debug, Default)]
pub struct AppState {
    pub selected_row: usize,
    pub detail_expanded: bool,
    pub detail_tab: usize,
    pub frame_count: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_prev(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn select_next(&mut self, port_count: usize) {
        if self.selected_row + 1 < port_count {
            self.selected_row += 1;
        }
    }

    pub fn toggle_detail(&mut self) {
        self.detail_expanded = !self.detail_expanded;
    }

    pub fn next_tab(&mut self) {
        self.detail_tab = (self.detail_tab + 1) % 3;
    }

    pub fn prev_tab(&mut self) {
        self.detail_tab = if self.detail_tab == 0 {
            2
        } else {
            self.detail_tab - 1
        };
    }

    pub fn selected_port<'a>(&self, ports: &'a [MonitoredPort]) -> Option<&'a MonitoredPort> {
        ports.get(self.selected_row)
    }

    fn clamp_selection(&mut self, port_count: usize) {
        if self.selected_row >= port_count {
            self.selected_row = port_count.saturating_sub(1);
        }
    }
}

pub fn draw(
    frame: &mut Frame,
    ports: &[MonitoredPort],
    history: &HistoryBook,
    hostname: &str,
    state: &mut AppState,
) {
    state.frame_count += 1;
    state.clamp_selection(ports.len());

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if state.detail_expanded {
            vec![Constraint::Percentage(50), Constraint::Percentage(50)]
        } else {
            vec![Constraint::Min(0)]
        })
        .split(frame.area());

    draw_port_table(frame, main_layout[0], ports, history, hostname, state);

    if state.detail_expanded && main_layout.len() > 1 {
        draw_detail_panel(frame, main_layout[1], ports, history, state);
    }
}

fn totals(ports: &[MonitoredPort]) -> (f64, f64) {
    let total_in: f64 = ports.iter().filter_map(|p| p.metric("in")).sum();
    let total_out: f64 = ports.iter().filter_map(|p| p.metric("out")).sum();
    (total_in, total_out)
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Ok => Color::Green,
        Severity::Warn => Color::Yellow,
        Severity::Crit => Color::Red,
    }
}

#[allow(clippy::too_many_lines)]
fn draw_port_table(
    frame: &mut Frame,
    area: Rect,
    ports: &[MonitoredPort],
    history: &HistoryBook,
    hostname: &str,
    state: &AppState,
) {
    let (total_in, total_out) = totals(ports);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let mut rows: Vec<Row> = Vec::new();

    if ports.is_empty() {
        rows.push(Row::new(vec![
            Cell::from(""),
            Cell::from("No monitored ports in this scan").style(Style::default().fg(Color::Yellow)),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
        ]));
    }

    for (row_idx, port) in ports.iter().enumerate() {
        let is_selected = state.selected_row == row_idx;
        let item_history = history.get(&port.name);

        // Pulse the indicator of non-OK ports so they draw the eye.
        let indicator = match port.severity {
            Severity::Ok => "●",
            _ if state.frame_count % 30 < 15 => "●",
            _ => "○",
        };
        let status = format!("{indicator} {}", port.severity);

        let (in_rate, out_rate) = (port.metric("in"), port.metric("out"));
        let in_cell = in_rate.map_or_else(|| "--".to_string(), render_bytes_per_sec);
        let out_cell = out_rate.map_or_else(|| "--".to_string(), render_bytes_per_sec);

        let sparkline = item_history.map_or_else(
            || " ".repeat(SPARKLINE_SAMPLES + 2),
            |h| format!(" {} ", render_sparkline(&h.throughput_sparkline(SPARKLINE_SAMPLES))),
        );

        let wire_speed_bytes = port.speed_gbit * 1e9 / 8.0;
        let utilization = match (in_rate, out_rate) {
            (Some(i), Some(o)) if wire_speed_bytes > 0.0 => {
                ((i + o) / wire_speed_bytes * 100.0).min(100.0)
            }
            _ => 0.0,
        };

        let row_style = if is_selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };

        rows.push(
            Row::new(vec![
                Cell::from(format!("  {}", port.name)).style(Style::default().fg(Color::Cyan)),
                Cell::from(status).style(Style::default().fg(severity_color(port.severity))),
                Cell::from(format!("{} G", port.speed_gbit)).style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::DIM),
                ),
                Cell::from(render_utilization_bar(utilization, 8)),
                Cell::from(in_cell).style(Style::default().fg(Color::Blue)),
                Cell::from(out_cell).style(Style::default().fg(Color::Magenta)),
                Cell::from(sparkline).style(Style::default().fg(Color::Cyan)),
                Cell::from(if is_selected { "◀" } else { " " })
                    .style(Style::default().fg(Color::Cyan)),
            ])
            .style(row_style)
            .height(1),
        );
    }

    let widths = [
        Constraint::Min(16),                              // Item
        Constraint::Length(7),                            // Status
        Constraint::Length(6),                            // Speed
        Constraint::Length(10),                           // Load bar
        Constraint::Length(10),                           // In
        Constraint::Length(10),                           // Out
        Constraint::Length(SPARKLINE_SAMPLES as u16 + 4), // Sparkline
        Constraint::Length(2),                            // Selection indicator
    ];

    let header_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                Cell::from("Port").style(header_style),
                Cell::from("Status").style(header_style),
                Cell::from("Speed").style(header_style),
                Cell::from("Load").style(header_style),
                Cell::from("In").style(header_style),
                Cell::from("Out").style(header_style),
                Cell::from("History").style(header_style),
                Cell::from("").style(header_style),
            ])
            .height(1),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Line::from(vec![
                    Span::styled(
                        " fctop ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("@ ", Style::default().fg(Color::DarkGray)),
                    Span::styled(hostname, Style::default().fg(Color::White)),
                    Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
                    Span::styled("▼ ", Style::default().fg(Color::Blue)),
                    Span::styled(
                        render_bytes_per_sec(total_in),
                        Style::default().fg(Color::Blue),
                    ),
                    Span::styled("  ▲ ", Style::default().fg(Color::Magenta)),
                    Span::styled(
                        render_bytes_per_sec(total_out),
                        Style::default().fg(Color::Magenta),
                    ),
                    Span::styled(" ", Style::default()),
                ])),
        );

    frame.render_widget(table, chunks[0]);

    let help_spans = if state.detail_expanded {
        vec![
            Span::styled(" ", Style::default().fg(Color::DarkGray)),
            Span::styled("Tab", Style::default().fg(Color::Cyan)),
            Span::styled(" switch tab  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" close  ", Style::default().fg(Color::DarkGray)),
            Span::styled("j/k", Style::default().fg(Color::Cyan)),
            Span::styled(" select port  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" quit ", Style::default().fg(Color::DarkGray)),
        ]
    } else {
        vec![
            Span::styled(" ", Style::default().fg(Color::DarkGray)),
            Span::styled("j/k", Style::default().fg(Color::Cyan)),
            Span::styled(" navigate  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" details  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" quit ", Style::default().fg(Color::DarkGray)),
        ]
    };
    frame.render_widget(Paragraph::new(Line::from(help_spans)), chunks[1]);
}

fn draw_detail_panel(
    frame: &mut Frame,
    area: Rect,
    ports: &[MonitoredPort],
    history: &HistoryBook,
    state: &AppState,
) {
    let Some(port) = state.selected_port(ports) else {
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new("Select a port to view details")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(vec![
            Span::styled(
                format!(" {} ", port.name),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("[{}] ", port.severity),
                Style::default().fg(severity_color(port.severity)),
            ),
        ]));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let tabs = Tabs::new(vec!["Summary", "Throughput", "Frames"])
        .select(state.detail_tab)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let item_history = history.get(&port.name);
    match state.detail_tab {
        0 => draw_summary_tab(frame, chunks[1], port),
        1 => draw_throughput_tab(frame, chunks[1], item_history),
        _ => draw_frames_tab(frame, chunks[1], item_history),
    }
}

fn draw_summary_tab(frame: &mut Frame, area: Rect, port: &MonitoredPort) {
    let mut lines = vec![
        Line::from(Span::styled(
            port.summary.clone(),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
    ];
    for metric in &port.metrics {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<16}", metric.name),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!("{:.2}", metric.value), Style::default().fg(Color::White)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_throughput_tab(frame: &mut Frame, area: Rect, item_history: Option<&ItemHistory>) {
    let Some(item_history) = item_history else {
        frame.render_widget(
            Paragraph::new("No history yet").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    };

    let in_points = item_history.in_bytes.points();
    let out_points = item_history.out_bytes.points();
    let y_max = item_history
        .in_bytes
        .max()
        .max(item_history.out_bytes.max())
        .max(1.0);
    let x_max = in_points.len().max(out_points.len()).max(2) as f64 - 1.0;

    let datasets = vec![
        Dataset::default()
            .name("in")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&in_points),
        Dataset::default()
            .name("out")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&out_points),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max * 1.1])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(render_bytes_per_sec(y_max / 2.0)),
                    Span::raw(render_bytes_per_sec(y_max)),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

fn draw_frames_tab(frame: &mut Frame, area: Rect, item_history: Option<&ItemHistory>) {
    let Some(item_history) = item_history else {
        frame.render_widget(
            Paragraph::new("No history yet").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    };

    let points = item_history.frames.points();
    let y_max = item_history.frames.max().max(1.0);
    let x_max = points.len().max(2) as f64 - 1.0;

    let datasets = vec![Dataset::default()
        .name("frames/s")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max * 1.1])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.0}")),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

fn render_sparkline(levels: &[u64]) -> String {
    let mut line = String::with_capacity(SPARKLINE_SAMPLES);
    for _ in levels.len()..SPARKLINE_SAMPLES {
        line.push(' ');
    }
    for level in levels {
        let idx = (*level).min(7) as usize;
        line.push(SPARK_BLOCKS[idx]);
    }
    line
}

fn render_utilization_bar(percent: f64, width: usize) -> String {
    #[allow(clippy::cast_sign_loss)]
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_clamps_to_port_count() {
        let mut state = AppState::new();
        state.selected_row = 10;
        state.clamp_selection(3);
        assert_eq!(state.selected_row, 2);
        state.clamp_selection(0);
        assert_eq!(state.selected_row, 0);
    }

    #[test]
    fn test_tab_cycling_wraps() {
        let mut state = AppState::new();
        state.next_tab();
        state.next_tab();
        state.next_tab();
        assert_eq!(state.detail_tab, 0);
        state.prev_tab();
        assert_eq!(state.detail_tab, 2);
    }

    #[test]
    fn test_utilization_bar_bounds() {
        assert_eq!(render_utilization_bar(0.0, 4), "░░░░");
        assert_eq!(render_utilization_bar(100.0, 4), "████");
        assert_eq!(render_utilization_bar(50.0, 4), "██░░");
    }

    #[test]
    fn test_sparkline_pads_to_width() {
        let line = render_sparkline(&[0, 7]);
        assert_eq!(line.chars().count(), SPARKLINE_SAMPLES);
        assert!(line.ends_with("▁█"));
    }
}
