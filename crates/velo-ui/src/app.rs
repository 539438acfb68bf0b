//! Main application state and TUI event loop for velo-monitor.
//!
//! [`App`] owns the theme, the current view, the filter selection and the
//! last computed summary. Every state change recomputes the summary
//! synchronously before the next event is processed; there is no background
//! refresh and no shared mutable state.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use velo_core::error::{Result, VeloError};
use velo_core::models::{CountMetric, FilterSelection};
use velo_data::aggregator::{StationIntensityAggregator, SummaryTable};
use velo_data::analysis::DatasetAnalysis;
use velo_runtime::dataset_cache::DatasetCache;

use crate::filter_view;
use crate::map_view;
use crate::table_view;
use crate::themes::Theme;

// ── ViewMode / Panel ──────────────────────────────────────────────────────────

/// Which main view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Station map with heat-scaled markers.
    Map,
    /// Per-station summary table.
    Table,
}

/// Which filter panel holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Rain,
    Months,
    Stations,
}

impl Panel {
    fn next(self) -> Self {
        match self {
            Panel::Rain => Panel::Months,
            Panel::Months => Panel::Stations,
            Panel::Stations => Panel::Rain,
        }
    }
}

// ── SummaryState / KeyOutcome ─────────────────────────────────────────────────

/// The result of the last aggregation run.
#[derive(Debug, Clone)]
pub enum SummaryState {
    /// A computed table; may be empty when no reading matched the filter.
    Table(SummaryTable),
    /// The station selection is empty; aggregation was aborted.
    NoStations,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    /// Nothing changed.
    Ignored,
    /// Filter state changed; recompute the summary.
    Recompute,
    /// Only presentation state changed; redraw is enough.
    Redraw,
    /// Force a dataset reload.
    Reload,
    /// Leave the event loop.
    Quit,
}

// ── Catalog snapshot ──────────────────────────────────────────────────────────

/// Owned snapshot of the dataset facts the UI needs every frame.
#[derive(Debug, Clone)]
struct CatalogView {
    months: Vec<String>,
    stations: Vec<String>,
    max_rain: f64,
    has_precipitation: bool,
    has_normalized: bool,
}

impl CatalogView {
    fn from_analysis(analysis: &DatasetAnalysis) -> Self {
        Self {
            months: analysis.dataset.months().to_vec(),
            stations: analysis.dataset.stations().to_vec(),
            max_rain: analysis.dataset.max_precipitation_mm(),
            has_precipitation: analysis.dataset.has_precipitation(),
            has_normalized: analysis.dataset.has_normalized(),
        }
    }

    /// Threshold adjustment step: a twentieth of the dataset range.
    fn rain_step(&self) -> f64 {
        if self.max_rain > 0.0 {
            self.max_rain / 20.0
        } else {
            1.0
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the velo-monitor TUI.
pub struct App {
    /// Active colour theme.
    pub theme: Theme,
    /// Current main view.
    pub view_mode: ViewMode,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,

    selection: FilterSelection,
    focus: Panel,
    month_cursor: usize,
    station_cursor: usize,
    /// Index into the summary rows whose marker is labelled on the map.
    highlight: usize,
    /// Transient status message shown in the footer.
    status: Option<String>,

    catalog: CatalogView,
    summary: SummaryState,
}

impl App {
    /// Construct the application around an already loaded dataset.
    pub fn new(
        theme_name: &str,
        view_mode: ViewMode,
        analysis: &DatasetAnalysis,
        selection: FilterSelection,
    ) -> Self {
        let catalog = CatalogView::from_analysis(analysis);
        let summary = Self::compute(analysis, &selection);
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            should_quit: false,
            selection,
            focus: Panel::Stations,
            month_cursor: 0,
            station_cursor: 0,
            highlight: 0,
            status: None,
            catalog,
            summary,
        }
    }

    /// The last computed summary state.
    pub fn summary(&self) -> &SummaryState {
        &self.summary
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until the user quits.
    ///
    /// The dataset comes from `cache`; the reload key forces a fresh load
    /// through it. Uses `crossterm::event::poll` with a short timeout so
    /// the loop stays fully synchronous on the current thread.
    pub fn run(mut self, cache: &mut DatasetCache) -> Result<()> {
        let mut analysis = cache.get(false)?.clone();
        self.refresh_catalog(&analysis);
        self.recompute(&analysis);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    match self.handle_key(key) {
                        KeyOutcome::Quit => break Ok(()),
                        KeyOutcome::Recompute => {
                            self.status = None;
                            self.recompute(&analysis);
                        }
                        KeyOutcome::Reload => match cache.get(true) {
                            Ok(fresh) => {
                                analysis = fresh.clone();
                                self.refresh_catalog(&analysis);
                                self.recompute(&analysis);
                                self.status = Some(format!(
                                    "Reloaded {} readings",
                                    analysis.dataset.len()
                                ));
                            }
                            Err(e) => {
                                self.status = Some(format!("Reload failed: {e}"));
                            }
                        },
                        KeyOutcome::Redraw | KeyOutcome::Ignored => {}
                    }
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State transitions ─────────────────────────────────────────────────────

    /// Apply one key press to the application state.
    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                KeyOutcome::Quit
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                KeyOutcome::Quit
            }

            KeyCode::Tab => {
                self.focus = self.focus.next();
                KeyOutcome::Redraw
            }
            KeyCode::Char('v') => {
                self.view_mode = match self.view_mode {
                    ViewMode::Map => ViewMode::Table,
                    ViewMode::Table => ViewMode::Map,
                };
                KeyOutcome::Redraw
            }
            KeyCode::Char('r') => KeyOutcome::Reload,

            KeyCode::Char('n') => {
                if !self.catalog.has_normalized {
                    return KeyOutcome::Ignored;
                }
                self.selection.metric = match self.selection.metric {
                    CountMetric::Raw => CountMetric::Normalized,
                    CountMetric::Normalized => CountMetric::Raw,
                };
                KeyOutcome::Recompute
            }

            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('a') => self.toggle_all(),

            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_rain(1.0),
            KeyCode::Char('-') => self.adjust_rain(-1.0),

            KeyCode::Left => self.move_highlight(-1),
            KeyCode::Right => self.move_highlight(1),

            _ => KeyOutcome::Ignored,
        }
    }

    /// Move the cursor of the focused panel; in the rain panel the arrows
    /// step the threshold instead.
    fn move_cursor(&mut self, delta: i64) -> KeyOutcome {
        match self.focus {
            Panel::Rain => self.adjust_rain(delta as f64),
            Panel::Months => {
                self.month_cursor = step_index(self.month_cursor, delta, self.catalog.months.len());
                KeyOutcome::Redraw
            }
            Panel::Stations => {
                self.station_cursor =
                    step_index(self.station_cursor, delta, self.catalog.stations.len());
                KeyOutcome::Redraw
            }
        }
    }

    /// Toggle the checklist item under the cursor.
    fn toggle_current(&mut self) -> KeyOutcome {
        match self.focus {
            Panel::Rain => KeyOutcome::Ignored,
            Panel::Months => {
                let Some(month) = self.catalog.months.get(self.month_cursor) else {
                    return KeyOutcome::Ignored;
                };
                if !self.selection.months.remove(month) {
                    self.selection.months.insert(month.clone());
                }
                KeyOutcome::Recompute
            }
            Panel::Stations => {
                let Some(station) = self.catalog.stations.get(self.station_cursor) else {
                    return KeyOutcome::Ignored;
                };
                if !self.selection.stations.remove(station) {
                    self.selection.stations.insert(station.clone());
                }
                KeyOutcome::Recompute
            }
        }
    }

    /// Select all items in the focused checklist, or clear the selection
    /// when everything is already selected.
    fn toggle_all(&mut self) -> KeyOutcome {
        match self.focus {
            Panel::Rain => KeyOutcome::Ignored,
            Panel::Months => {
                if self.selection.months.len() == self.catalog.months.len() {
                    self.selection.months.clear();
                } else {
                    self.selection.months = self.catalog.months.iter().cloned().collect();
                }
                KeyOutcome::Recompute
            }
            Panel::Stations => {
                if self.selection.stations.len() == self.catalog.stations.len() {
                    self.selection.stations.clear();
                } else {
                    self.selection.stations = self.catalog.stations.iter().cloned().collect();
                }
                KeyOutcome::Recompute
            }
        }
    }

    /// Step the precipitation threshold, clamped to the dataset range.
    fn adjust_rain(&mut self, direction: f64) -> KeyOutcome {
        if !self.catalog.has_precipitation {
            return KeyOutcome::Ignored;
        }
        let step = self.catalog.rain_step() * direction;
        let next = (self.selection.max_precipitation_mm + step).clamp(0.0, self.catalog.max_rain);
        if (next - self.selection.max_precipitation_mm).abs() < f64::EPSILON {
            return KeyOutcome::Ignored;
        }
        self.selection.max_precipitation_mm = next;
        KeyOutcome::Recompute
    }

    /// Cycle the map highlight through the mapped rows.
    fn move_highlight(&mut self, delta: i64) -> KeyOutcome {
        let len = match &self.summary {
            SummaryState::Table(table) => table.rows.len(),
            SummaryState::NoStations => 0,
        };
        if len == 0 {
            return KeyOutcome::Ignored;
        }
        self.highlight = step_index(self.highlight, delta, len);
        KeyOutcome::Redraw
    }

    /// Re-run the aggregation against the current selection.
    fn recompute(&mut self, analysis: &DatasetAnalysis) {
        self.summary = Self::compute(analysis, &self.selection);
        // Keep the highlight valid across shrinking results.
        if let SummaryState::Table(ref table) = self.summary {
            if self.highlight >= table.rows.len() {
                self.highlight = 0;
            }
        }
    }

    fn compute(analysis: &DatasetAnalysis, selection: &FilterSelection) -> SummaryState {
        match StationIntensityAggregator::summarize(&analysis.dataset, &analysis.coords, selection)
        {
            Ok(table) => SummaryState::Table(table),
            Err(VeloError::NoStationsSelected) => SummaryState::NoStations,
            // summarize has no other error paths; treat defensively as empty.
            Err(_) => SummaryState::Table(SummaryTable::default()),
        }
    }

    /// Re-snapshot the catalog after a reload, dropping selection entries
    /// that no longer exist and clamping cursors.
    fn refresh_catalog(&mut self, analysis: &DatasetAnalysis) {
        self.catalog = CatalogView::from_analysis(analysis);
        let months = &self.catalog.months;
        let stations = &self.catalog.stations;
        self.selection.months.retain(|m| months.contains(m));
        self.selection.stations.retain(|s| stations.contains(s));
        self.selection.max_precipitation_mm = self
            .selection
            .max_precipitation_mm
            .clamp(0.0, self.catalog.max_rain.max(0.0));
        self.month_cursor = self.month_cursor.min(months.len().saturating_sub(1));
        self.station_cursor = self.station_cursor.min(stations.len().saturating_sub(1));
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the full dashboard frame.
    fn render(&self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(10),   // body
                Constraint::Length(1), // legend / status
                Constraint::Length(1), // key hints
            ])
            .split(frame.area());

        self.render_header(frame, outer[0]);
        self.render_body(frame, outer[1]);
        self.render_status(frame, outer[2]);
        self.render_hints(frame, outer[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled("velo-monitor", self.theme.header),
            Span::styled(" - bicycle traffic by station", self.theme.label),
            Span::styled(
                format!(
                    "   metric: {}   months: {}/{}   stations: {}/{}",
                    self.selection.metric.label(),
                    self.selection.months.len(),
                    self.catalog.months.len(),
                    self.selection.stations.len(),
                    self.catalog.stations.len(),
                ),
                self.theme.dim,
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(40)])
            .split(area);

        self.render_filters(frame, columns[0]);
        self.render_main(frame, columns[1]);
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Percentage(40),
                Constraint::Min(5),
            ])
            .split(area);

        filter_view::render_rain_gauge(
            frame,
            rows[0],
            self.selection.max_precipitation_mm,
            self.catalog.max_rain,
            self.catalog.has_precipitation,
            self.focus == Panel::Rain,
            &self.theme,
        );
        filter_view::render_checklist(
            frame,
            rows[1],
            "Months",
            &self.catalog.months,
            &self.selection.months,
            self.month_cursor,
            self.focus == Panel::Months,
            &self.theme,
        );
        filter_view::render_checklist(
            frame,
            rows[2],
            "Stations",
            &self.catalog.stations,
            &self.selection.stations,
            self.station_cursor,
            self.focus == Panel::Stations,
            &self.theme,
        );
    }

    fn render_main(&self, frame: &mut Frame, area: Rect) {
        let table = match &self.summary {
            SummaryState::NoStations => {
                table_view::render_no_stations(frame, area, &self.theme);
                return;
            }
            SummaryState::Table(table) => table,
        };

        if table.is_empty() {
            table_view::render_no_data(frame, area, &self.theme);
            return;
        }

        // Reserve the bottom strip for the data-quality list whenever a
        // selected station is missing coordinates.
        let (main_area, quality_area) = if table.unmapped.is_empty() {
            (area, None)
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(8),
                    Constraint::Length((table.unmapped.len() as u16 + 3).min(8)),
                ])
                .split(area);
            (rows[0], Some(rows[1]))
        };

        match self.view_mode {
            ViewMode::Map => {
                let highlight = if table.rows.is_empty() {
                    None
                } else {
                    Some(self.highlight.min(table.rows.len() - 1))
                };
                map_view::render_map(frame, main_area, table, highlight, &self.theme);
            }
            ViewMode::Table => {
                table_view::render_summary_table(
                    frame,
                    main_area,
                    "Stations",
                    table,
                    self.selection.metric.label(),
                    &self.theme,
                );
            }
        }

        if let Some(quality_area) = quality_area {
            table_view::render_unmapped(frame, quality_area, table, &self.theme);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        match (&self.status, self.view_mode) {
            (Some(message), _) => {
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(message.clone(), self.theme.info))),
                    area,
                );
            }
            (None, ViewMode::Map) => map_view::render_heat_legend(frame, area, &self.theme),
            (None, ViewMode::Table) => {}
        }
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = "Tab panel · ↑/↓ move · Space toggle · a all · +/- rain · ←/→ station · n metric · v view · r reload · q quit";
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hints, self.theme.dim))),
            area,
        );
    }
}

/// Step `index` by `delta` within `len`, wrapping at both ends.
fn step_index(index: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    ((index as i64 + delta).rem_euclid(len)) as usize
}

// ── Tests ──────────────────────────────────────────────────────────────────────
