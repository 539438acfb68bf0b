//! Summary table and data-quality views for the velo-monitor TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per station
//! plus a highlighted totals row, and the list of stations that could not
//! be placed on the map.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use velo_core::formatting;
use velo_data::aggregator::SummaryTable;

use crate::themes::Theme;

/// Width of the textual intensity bar in the table.
const INTENSITY_BAR_WIDTH: usize = 10;

/// Render the per-station summary table into `area`.
///
/// The table has one data row per [`velo_core::models::StationSummary`],
/// followed by a highlighted totals row, all within a bordered block titled
/// `title`. `metric_label` names the aggregated column in the header.
pub fn render_summary_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    summary: &SummaryTable,
    metric_label: &str,
    theme: &Theme,
) {
    let subset_header = format!("Subset ({metric_label})");
    let total_header = format!("Total ({metric_label})");
    let header_cells = [
        "Station",
        "Lat",
        "Lon",
        subset_header.as_str(),
        total_header.as_str(),
        "Intensity",
    ]
    .into_iter()
    .map(|h| Cell::from(h.to_string()).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = summary
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(row.station.clone()),
                Cell::from(formatting::format_coordinate(row.lat)),
                Cell::from(formatting::format_coordinate(row.lon)),
                Cell::from(formatting::format_number(row.subset_sum, 1)),
                Cell::from(formatting::format_number(row.total_sum, 1)),
                Cell::from(intensity_cell(row.intensity))
                    .style(theme.intensity_style(row.intensity)),
            ])
            .style(style)
        })
        .collect();

    // Totals row – styled separately to stand out. The overall intensity is
    // the subset share of the grand total, same definition as per station.
    let overall = if summary.grand_total > 0.0 {
        (summary.subset_total / summary.grand_total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let total_row = Row::new(vec![
        Cell::from("TOTAL").style(theme.table_total),
        Cell::from(format!("{} stations", summary.station_count())),
        Cell::from(""),
        Cell::from(formatting::format_number(summary.subset_total, 1)),
        Cell::from(formatting::format_number(summary.grand_total, 1)),
        Cell::from(intensity_cell(overall)),
    ])
    .style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Min(18),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(18),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render the data-quality list of stations without usable coordinates.
pub fn render_unmapped(frame: &mut Frame, area: Rect, summary: &SummaryTable, theme: &Theme) {
    let mut lines: Vec<Line> = Vec::new();

    if summary.unmapped.is_empty() {
        lines.push(Line::from(Span::styled(
            "All selected stations have coordinates.",
            theme.dim,
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Stations without usable coordinates:",
            theme.warning,
        )));
        for station in &summary.unmapped {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", station.station), theme.text),
                Span::styled(
                    format!(
                        "(subset {}, intensity {})",
                        formatting::format_number(station.subset_sum, 1),
                        formatting::format_intensity(station.intensity),
                    ),
                    theme.dim,
                ),
            ]));
        }
    }

    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Data Quality "),
        ),
        area,
    );
}

/// Render a placeholder when no reading matched the current filter.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No data for the current filter",
            theme.warning,
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Widen the precipitation threshold or select more months.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" velo-monitor "),
        ),
        area,
    );
}

/// Render the prompt shown while the station selection is empty.
pub fn render_no_stations(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No stations selected", theme.error)),
        Line::from(""),
        Line::from(Span::styled(
            "Select at least one station ('a' selects all).",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" velo-monitor "),
        ),
        area,
    );
}

/// Build the `"0.67 ██████░░░░"` intensity cell text.
fn intensity_cell(intensity: f64) -> String {
    let filled = (intensity * INTENSITY_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(INTENSITY_BAR_WIDTH);
    let mut bar = String::with_capacity(INTENSITY_BAR_WIDTH);
    for _ in 0..filled {
        bar.push('\u{2588}'); // █  FULL BLOCK
    }
    for _ in filled..INTENSITY_BAR_WIDTH {
        bar.push('\u{2591}'); // ░  LIGHT SHADE
    }
    format!("{} {}", formatting::format_intensity(intensity), bar)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
