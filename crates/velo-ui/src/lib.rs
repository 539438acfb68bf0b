//! Terminal UI layer for velo-monitor.
//!
//! Provides themes, the station map and summary table views, the filter
//! panel, and the main application event loop built on top of [`ratatui`]
//! for rendering the bicycle-traffic dashboard in the terminal.

pub mod app;
pub mod filter_view;
pub mod map_view;
pub mod table_view;
pub mod themes;

pub use velo_core as core;
