//! Station map view for the velo-monitor TUI.
//!
//! Projects the summary rows onto a [`ratatui::widgets::canvas::Canvas`]
//! using their lat/lon coordinates: one marker per station, coloured by the
//! intensity heat scale, with the highlighted station labelled in place.
//! This is the terminal counterpart of the original map's heat layer and
//! marker popups.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::canvas::Canvas,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use velo_core::formatting;
use velo_data::aggregator::SummaryTable;

use crate::themes::Theme;

/// Relative padding applied around the station bounding box so markers
/// never sit on the border.
const BOUNDS_PADDING: f64 = 0.15;

/// Minimum span of either axis in degrees; keeps a single-station map from
/// collapsing to a zero-sized viewport.
const MIN_SPAN_DEGREES: f64 = 0.005;

/// Render the station map into `area`.
///
/// `highlight` selects the row whose name and values are printed next to
/// its marker (the popup equivalent).
pub fn render_map(
    frame: &mut Frame,
    area: Rect,
    summary: &SummaryTable,
    highlight: Option<usize>,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(" Station Map ");

    if summary.rows.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No mappable stations", theme.warning)),
            Line::from(Span::styled(
                "Selected stations have no usable coordinates.",
                theme.dim,
            )),
        ];
        frame.render_widget(
            Paragraph::new(ratatui::text::Text::from(text)).block(block),
            area,
        );
        return;
    }

    let ((min_lat, min_lon), (max_lat, max_lon)) = padded_bounds(summary);

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([min_lon, max_lon])
        .y_bounds([min_lat, max_lat])
        .paint(|ctx| {
            for (i, row) in summary.rows.iter().enumerate() {
                let style = theme.intensity_style(row.intensity);
                let highlighted = highlight == Some(i);

                if highlighted {
                    ctx.print(
                        row.lon,
                        row.lat,
                        Line::from(vec![
                            Span::styled("◉ ", style),
                            Span::styled(
                                format!(
                                    "{} {} ({} / {})",
                                    row.station,
                                    formatting::format_intensity(row.intensity),
                                    formatting::format_number(row.subset_sum, 1),
                                    formatting::format_number(row.total_sum, 1),
                                ),
                                theme.value,
                            ),
                        ]),
                    );
                } else {
                    ctx.print(row.lon, row.lat, Line::styled("●", style));
                }
            }
        });

    frame.render_widget(canvas, area);
}

/// Render the one-line heat legend beneath the map.
pub fn render_heat_legend(frame: &mut Frame, area: Rect, theme: &Theme) {
    let swatch = |style: Style| Span::styled("\u{2588}\u{2588}", style);
    let line = Line::from(vec![
        Span::styled("Intensity  ", theme.label),
        swatch(Style::default().fg(theme.heat_low)),
        Span::styled(" low   ", theme.dim),
        swatch(Style::default().fg(theme.heat_medium)),
        Span::styled(" medium   ", theme.dim),
        swatch(Style::default().fg(theme.heat_high)),
        Span::styled(" high", theme.dim),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Bounding box over the mapped rows with padding and a minimum span.
fn padded_bounds(summary: &SummaryTable) -> ((f64, f64), (f64, f64)) {
    let mut min_lat = f64::INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut max_lon = f64::NEG_INFINITY;

    for row in &summary.rows {
        min_lat = min_lat.min(row.lat);
        min_lon = min_lon.min(row.lon);
        max_lat = max_lat.max(row.lat);
        max_lon = max_lon.max(row.lon);
    }

    let lat_span = (max_lat - min_lat).max(MIN_SPAN_DEGREES);
    let lon_span = (max_lon - min_lon).max(MIN_SPAN_DEGREES);

    (
        (
            min_lat - lat_span * BOUNDS_PADDING,
            min_lon - lon_span * BOUNDS_PADDING,
        ),
        (
            max_lat + lat_span * BOUNDS_PADDING,
            max_lon + lon_span * BOUNDS_PADDING,
        ),
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
