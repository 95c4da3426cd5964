//! Progress reporting for indexing operations

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Statistics collected while indexing one repository
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Repository name (root directory name)
    pub repo: String,

    /// Number of files chunked into the corpus
    pub files_indexed: usize,

    /// Files skipped because they could not be read or decoded
    pub files_skipped: usize,

    /// Lines read across indexed files
    pub lines_indexed: usize,

    /// Snippets appended to the corpus
    pub snippets_created: usize,

    /// Time elapsed during indexing
    pub elapsed: Duration,

    /// Skipped files with the reason (limited to first N)
    pub skipped: Vec<(PathBuf, String)>,

    /// Start time of indexing
    start_time: Option<Instant>,
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    /// Record a skipped file (reasons limited to first 100)
    pub fn add_skipped(&mut self, path: PathBuf, reason: String) {
        if self.skipped.len() < 100 {
            self.skipped.push((path, reason));
        }
        self.files_skipped += 1;
    }

    /// Display the statistics in a human-readable format
    pub fn display(&self) {
        println!("\nIndexed repository '{}':", self.repo);
        println!("  Files indexed: {}", self.files_indexed);
        println!("  Files skipped: {}", self.files_skipped);
        println!("  Lines read: {}", self.lines_indexed);
        println!("  Snippets: {}", self.snippets_created);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.files_indexed > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.files_indexed as f64 / self.elapsed.as_secs_f64();
            println!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.skipped.is_empty() {
            println!("\nSkipped (showing first {}):", self.skipped.len().min(5));
            for (path, reason) in &self.skipped[..5.min(self.skipped.len())] {
                println!("  {}: {}", path.display(), reason);
            }
            if self.skipped.len() > 5 {
                println!("  ... and {} more", self.skipped.len() - 5);
            }
        }
    }
}
