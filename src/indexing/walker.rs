//! File system walker for discovering source files to index
//!
//! This module provides directory traversal with support for:
//! - Skipping configured directory names anywhere in the tree
//! - An extension allow-list
//! - Optional .gitignore rules

use crate::config::IndexingConfig;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Walks directories to find source files to index
#[derive(Debug, Clone)]
pub struct FileWalker {
    extensions: HashSet<String>,
    ignore_dirs: HashSet<String>,
    respect_gitignore: bool,
}

impl FileWalker {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            ignore_dirs: config.ignore_dirs.iter().cloned().collect(),
            respect_gitignore: config.respect_gitignore,
        }
    }

    /// Walk a directory and return the files to index, sorted by path.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(false) // Hidden files are indexed unless their directory is ignored
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(false)
            .parents(false)
            .follow_links(false)
            .require_git(false);

        let ignore_dirs = self.ignore_dirs.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            // The root itself is never filtered
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !ignore_dirs.contains(name))
        });

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(Result::ok) // Skip entries we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.is_supported(path))
            .collect();

        // Stable corpus order across runs
        files.sort();
        files
    }

    /// Whether the extension of `path` is on the allow-list.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(ext))
    }

    /// Count files that would be indexed (useful for dry runs)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }
}
