//! Table formatting utilities for structured output.

use crate::cache::CacheStats;
use crate::metrics::{ACCEPTABLE_THRESHOLD_MS, FAST_THRESHOLD_MS, MetricsSnapshot, QueryRecord};
use crate::types::{CorpusTotals, SearchHit};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

/// Characters of snippet content shown under each search hit.
pub const PREVIEW_CHARS: usize = 150;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        Self { table: new_table() }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn metric_header(table: &mut Table) {
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
}

/// Index totals.
pub fn create_index_table(totals: CorpusTotals, snippets: usize) -> String {
    let mut table = new_table();
    metric_header(&mut table);
    table.add_row(vec!["Repositories".to_string(), totals.total_repositories.to_string()]);
    table.add_row(vec!["Files".to_string(), totals.total_files.to_string()]);
    table.add_row(vec!["Lines".to_string(), totals.total_lines.to_string()]);
    table.add_row(vec!["Snippets".to_string(), snippets.to_string()]);
    table.to_string()
}

/// Cache efficiency.
pub fn create_cache_table(stats: &CacheStats) -> String {
    let mut table = new_table();
    metric_header(&mut table);
    table.add_row(vec!["Hits".to_string(), stats.hits.to_string()]);
    table.add_row(vec!["Misses".to_string(), stats.misses.to_string()]);
    table.add_row(vec!["Lookups".to_string(), stats.total_queries.to_string()]);
    table.add_row(vec!["Hit rate".to_string(), format!("{:.2}%", stats.hit_rate)]);
    table.add_row(vec!["Entries".to_string(), stats.cache_size.to_string()]);
    table.to_string()
}

/// Latency summary, with the SLA buckets colored by how well they are met.
pub fn create_metrics_table(snapshot: &MetricsSnapshot) -> String {
    let mut table = new_table();
    metric_header(&mut table);

    table.add_row(vec!["Queries".to_string(), snapshot.total_queries.to_string()]);
    table.add_row(vec![
        "Average latency".to_string(),
        format!("{:.2} ms", snapshot.average_search_time_ms),
    ]);

    for (label, count, rate) in [
        (
            format!("Under {FAST_THRESHOLD_MS:.0} ms"),
            snapshot.queries_under_50ms,
            snapshot.sub_50ms_rate,
        ),
        (
            format!("Under {ACCEPTABLE_THRESHOLD_MS:.0} ms"),
            snapshot.queries_under_200ms,
            snapshot.sub_200ms_rate,
        ),
    ] {
        let color = if snapshot.total_queries == 0 {
            Color::Reset
        } else if rate >= 95.0 {
            Color::Green
        } else {
            Color::Yellow
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{count} ({rate:.2}%)")).fg(color),
        ]);
    }

    table.to_string()
}

/// The newest queries, oldest first.
pub fn create_recent_queries_table(records: &[QueryRecord]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Time").add_attribute(Attribute::Bold),
        Cell::new("Query").add_attribute(Attribute::Bold),
        Cell::new("Latency").add_attribute(Attribute::Bold),
        Cell::new("Cached").add_attribute(Attribute::Bold),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.timestamp.format("%H:%M:%S")),
            Cell::new(&record.query),
            Cell::new(format!("{:.2} ms", record.time_ms)).set_alignment(CellAlignment::Right),
            Cell::new(if record.cached { "yes" } else { "no" }),
        ]);
    }

    table.to_string()
}

/// Plain-text listing of search hits with a short content preview.
pub fn format_search_hits(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    for (rank, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (lines {}-{}) similarity {:.1}%\n",
            rank + 1,
            hit.file,
            hit.line_start,
            hit.line_end,
            hit.similarity_score * 100.0
        ));
        let preview = hit.preview(PREVIEW_CHARS);
        for line in preview.lines() {
            out.push_str("   ");
            out.push_str(line);
            out.push('\n');
        }
        if preview.len() < hit.content.len() {
            out.push_str("   ...\n");
        }
        out.push('\n');
    }
    out
}
