//! Filter panel widgets: precipitation gauge and selection checklists.
//!
//! These render the interactive side of the dashboard; the app recomputes
//! the summary synchronously whenever one of them changes state.

use std::collections::BTreeSet;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use velo_core::formatting;

use crate::themes::Theme;

/// Width of the precipitation gauge bar in terminal columns.
const GAUGE_WIDTH: usize = 24;

/// Render the precipitation threshold gauge.
///
/// `threshold` is the current filter value, `max` the dataset maximum.
/// With `has_precipitation == false` the gauge renders as disabled.
pub fn render_rain_gauge(
    frame: &mut Frame,
    area: Rect,
    threshold: f64,
    max: f64,
    has_precipitation: bool,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused {
        theme.panel_focused
    } else {
        theme.panel_unfocused
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Max Precipitation ");

    let line = if !has_precipitation {
        Line::from(Span::styled("no precipitation data", theme.dim))
    } else {
        let ratio = if max > 0.0 {
            (threshold / max).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let filled = (ratio * GAUGE_WIDTH as f64).round() as usize;
        let filled = filled.min(GAUGE_WIDTH);

        let mut spans = Vec::with_capacity(3);
        spans.push(Span::styled(
            "\u{2588}".repeat(filled),
            theme.gauge_fill,
        ));
        spans.push(Span::styled(
            "\u{2591}".repeat(GAUGE_WIDTH - filled),
            theme.gauge_empty,
        ));
        spans.push(Span::styled(
            format!(
                " \u{2264} {} of {}",
                formatting::format_mm(threshold),
                formatting::format_mm(max)
            ),
            theme.label,
        ));
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Render a scrollable checklist of selectable items (months or stations).
///
/// `cursor` is only drawn when the panel is focused. The visible window
/// follows the cursor so it can never scroll out of sight.
#[allow(clippy::too_many_arguments)]
pub fn render_checklist(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: &[String],
    selected: &BTreeSet<String>,
    cursor: usize,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused {
        theme.panel_focused
    } else {
        theme.panel_unfocused
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(
            " {} ({}/{}) ",
            title,
            selected.len(),
            items.len()
        ));

    // Keep the cursor inside the visible window.
    let visible = area.height.saturating_sub(2) as usize;
    let offset = if visible == 0 || cursor < visible {
        0
    } else {
        cursor + 1 - visible
    };

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible.max(1))
        .map(|(i, item)| {
            let checked = selected.contains(item);
            let marker = if checked { "[x] " } else { "[ ] " };
            let style = if focused && i == cursor {
                theme.item_cursor
            } else if checked {
                theme.item_selected
            } else {
                theme.dim
            };
            Line::from(Span::styled(
                format!("{}{}", marker, truncate(item, area.width.saturating_sub(6))),
                style,
            ))
        })
        .collect();

    frame.render_widget(Paragraph::new(ratatui::text::Text::from(lines)).block(block), area);
}

/// Trim an item label to the available column width.
fn truncate(s: &str, max_cols: u16) -> String {
    if s.width() <= max_cols as usize {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_cols as usize {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('\u{2026}'); // …
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
