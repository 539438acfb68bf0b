use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned as the safe
/// default.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Complete theme definition carrying all UI styles used by velo-ui
/// components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,

    // ── Filter panels ────────────────────────────────────────────────────────
    /// Border/title of the panel holding keyboard focus.
    pub panel_focused: Style,
    pub panel_unfocused: Style,
    /// A month/station that is part of the current selection.
    pub item_selected: Style,
    /// The list line under the cursor.
    pub item_cursor: Style,

    // ── Rain gauge ───────────────────────────────────────────────────────────
    pub gauge_fill: Style,
    pub gauge_empty: Style,

    // ── Heat scale ───────────────────────────────────────────────────────────
    /// Marker colour for intensity below 1/3.
    pub heat_low: Color,
    /// Marker colour for intensity between 1/3 and 2/3.
    pub heat_medium: Color,
    /// Marker colour for intensity of 2/3 and above.
    pub heat_high: Color,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            panel_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            panel_unfocused: Style::default().fg(Color::DarkGray),
            item_selected: Style::default().fg(Color::Green),
            item_cursor: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),

            gauge_fill: Style::default().fg(Color::Blue),
            gauge_empty: Style::default().fg(Color::DarkGray),

            heat_low: Color::Green,
            heat_medium: Color::Yellow,
            heat_high: Color::Red,
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text and bright accent colours so that content
    /// remains legible against a white/light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            panel_focused: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            panel_unfocused: Style::default().fg(Color::Gray),
            item_selected: Style::default().fg(Color::Green),
            item_cursor: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),

            gauge_fill: Style::default().fg(Color::Blue),
            gauge_empty: Style::default().fg(Color::Gray),

            heat_low: Color::Green,
            heat_medium: Color::Yellow,
            heat_high: Color::Red,
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette.
    ///
    /// Avoids bold modifiers to maintain a retro aesthetic and maximise
    /// compatibility with minimal terminal emulators.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),

            panel_focused: Style::default().fg(Color::Cyan),
            panel_unfocused: Style::default().fg(Color::DarkGray),
            item_selected: Style::default().fg(Color::Green),
            item_cursor: Style::default().fg(Color::Black).bg(Color::White),

            gauge_fill: Style::default().fg(Color::Blue),
            gauge_empty: Style::default().fg(Color::DarkGray),

            heat_low: Color::Green,
            heat_medium: Color::Yellow,
            heat_high: Color::Red,
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// The heat-scale colour for an intensity value in `[0, 1]`.
    ///
    /// * `< 1/3`  → `heat_low`
    /// * `< 2/3`  → `heat_medium`
    /// * `≥ 2/3`  → `heat_high`
    pub fn intensity_color(&self, intensity: f64) -> Color {
        if intensity >= 2.0 / 3.0 {
            self.heat_high
        } else if intensity >= 1.0 / 3.0 {
            self.heat_medium
        } else {
            self.heat_low
        }
    }

    /// Same bucket mapping as [`Self::intensity_color`], as a text style.
    pub fn intensity_style(&self, intensity: f64) -> Style {
        Style::default().fg(self.intensity_color(intensity))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known_themes() {
        // Constructing each named theme must not panic and must differ in at
        // least one signature style.
        let dark = Theme::from_name("dark");
        let light = Theme::from_name("light");
        assert_ne!(dark.text.fg, light.text.fg);

        let classic = Theme::from_name("classic");
        assert_eq!(classic.table_total.add_modifier, Modifier::empty());
    }

    #[test]
    fn test_from_name_unknown_falls_back() {
        // Unknown names go through auto-detection; must not panic.
        let _ = Theme::from_name("neon");
    }

    #[test]
    fn test_intensity_color_buckets() {
        let theme = Theme::dark();
        assert_eq!(theme.intensity_color(0.0), theme.heat_low);
        assert_eq!(theme.intensity_color(0.32), theme.heat_low);
        assert_eq!(theme.intensity_color(0.5), theme.heat_medium);
        assert_eq!(theme.intensity_color(0.67), theme.heat_high);
        assert_eq!(theme.intensity_color(1.0), theme.heat_high);
    }

    #[test]
    fn test_intensity_style_uses_bucket_color() {
        let theme = Theme::dark();
        assert_eq!(theme.intensity_style(1.0).fg, Some(theme.heat_high));
    }
}
