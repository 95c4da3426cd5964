//! Terminal display utilities for the CLI.
//!
//! Provides styled tables, progress spinners, and formatted output.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{
    TableBuilder, create_cache_table, create_index_table, create_metrics_table,
    create_recent_queries_table, format_search_hits,
};
pub use theme::{THEME, Theme};
