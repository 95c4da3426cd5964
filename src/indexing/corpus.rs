//! Accumulates snippets from repositories and turns them into a searchable index.

use super::chunker::{chunk_content, count_lines};
use super::progress::IndexStats;
use super::walker::FileWalker;
use crate::config::IndexingConfig;
use crate::error::{IndexError, IndexResult};
use crate::search::SearchIndex;
use crate::types::{CodeSnippet, CorpusTotals};
use crate::vector::{EmbeddingGenerator, FlatL2Index, VectorError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Outcome of reading and chunking one file.
enum FileChunks {
    Chunked {
        snippets: Vec<CodeSnippet>,
        lines: usize,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
}

/// Append-only snippet store plus running file, line and repository counters.
///
/// Positions in [`snippets`](Self::snippets) become row numbers of the vector
/// index built from it.
#[derive(Debug)]
pub struct CorpusBuilder {
    config: IndexingConfig,
    walker: FileWalker,
    snippets: Vec<CodeSnippet>,
    totals: CorpusTotals,
}

impl CorpusBuilder {
    pub fn new(config: IndexingConfig) -> Self {
        Self {
            walker: FileWalker::new(&config),
            config,
            snippets: Vec::new(),
            totals: CorpusTotals::default(),
        }
    }

    /// Walk `root`, chunk every supported file and append the snippets.
    ///
    /// Unreadable or non-UTF-8 files are skipped and reported in the stats.
    pub fn index_repository(&mut self, root: &Path) -> IndexResult<IndexStats> {
        self.validate_config()?;
        if !root.exists() {
            return Err(IndexError::PathNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(IndexError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        // Resolve "." and trailing components so the repo gets a real name
        let root = root.canonicalize().map_err(|source| IndexError::FileRead {
            path: root.to_path_buf(),
            source,
        })?;
        let repo = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let prefix_base = root.parent().unwrap_or(&root).to_path_buf();

        tracing::info!("[index] indexing repository '{repo}' at {}", root.display());
        let mut stats = IndexStats::new(repo.clone());
        self.totals.total_repositories += 1;

        let files = self.walker.walk(&root);
        let chunk_lines = self.config.chunk_lines;

        let results: Vec<FileChunks> = files
            .into_par_iter()
            .map(|path| read_file_chunks(path, &prefix_base, &repo, chunk_lines))
            .collect();

        for result in results {
            match result {
                FileChunks::Chunked { snippets, lines } => {
                    stats.files_indexed += 1;
                    stats.lines_indexed += lines;
                    stats.snippets_created += snippets.len();
                    self.snippets.extend(snippets);
                }
                FileChunks::Skipped { path, reason } => {
                    tracing::debug!("[index] skipped {}: {reason}", path.display());
                    stats.add_skipped(path, reason);
                }
            }
        }

        self.totals.total_files += stats.files_indexed as u64;
        self.totals.total_lines += stats.lines_indexed as u64;

        stats.stop_timing();
        tracing::info!(
            "[index] '{repo}': {} files, {} snippets, {} skipped",
            stats.files_indexed,
            stats.snippets_created,
            stats.files_skipped
        );
        Ok(stats)
    }

    /// Embed every snippet in one batch and build the vector index over them.
    ///
    /// Calling this twice on the same corpus yields equivalent indexes.
    pub fn build_search_index(&self, embedder: &dyn EmbeddingGenerator) -> IndexResult<SearchIndex> {
        if self.snippets.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        tracing::info!("[index] embedding {} snippets", self.snippets.len());
        let texts: Vec<&str> = self.snippets.iter().map(|s| s.content.as_str()).collect();
        let vectors = embedder.embed_many(&texts)?;

        // Row i must describe snippet i
        if vectors.len() != self.snippets.len() {
            return Err(IndexError::Embedding(VectorError::EmbeddingFailed(format!(
                "Model returned {} embeddings for {} snippets",
                vectors.len(),
                self.snippets.len()
            ))));
        }

        let index = FlatL2Index::build(embedder.dimension(), &vectors)?;
        Ok(SearchIndex::new(
            self.snippets.clone(),
            Box::new(index),
            self.totals,
        ))
    }

    fn validate_config(&self) -> IndexResult<()> {
        if self.config.chunk_lines == 0 {
            return Err(IndexError::ConfigError {
                reason: "indexing.chunk_lines must be at least 1".to_string(),
            });
        }
        if self.config.extensions.is_empty() {
            return Err(IndexError::ConfigError {
                reason: "indexing.extensions is empty, no file would be indexed".to_string(),
            });
        }
        Ok(())
    }

    pub fn snippets(&self) -> &[CodeSnippet] {
        &self.snippets
    }

    pub fn totals(&self) -> CorpusTotals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

fn read_file_chunks(path: PathBuf, prefix_base: &Path, repo: &str, chunk_lines: usize) -> FileChunks {
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileChunks::Skipped {
                path,
                reason: e.to_string(),
            };
        }
    };
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            return FileChunks::Skipped {
                path,
                reason: "not valid UTF-8".to_string(),
            };
        }
    };

    let file = path
        .strip_prefix(prefix_base)
        .unwrap_or(&path)
        .to_string_lossy()
        .into_owned();

    let snippets = chunk_content(&content, chunk_lines)
        .into_iter()
        .map(|chunk| chunk.into_snippet(&file, repo))
        .collect();

    FileChunks::Chunked {
        snippets,
        lines: count_lines(&content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{MockEmbeddingGenerator, VectorIndex};
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(files: &[(&str, String)]) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("demo");
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (temp_dir, root)
    }

    fn lines(n: usize) -> String {
        (1..=n).map(|i| format!("print({i})\n")).collect()
    }

    #[test]
    fn test_index_repository_chunks_and_counts() {
        let (_tmp, root) = repo_with(&[
            ("src/a.py", lines(120)),
            ("src/blank.py", "\n\n\n".to_string()),
            ("notes.txt", lines(10)),
        ]);

        let mut corpus = CorpusBuilder::new(IndexingConfig::default());
        let stats = corpus.index_repository(&root).unwrap();

        assert_eq!(stats.files_indexed, 2);
        assert_eq!(stats.snippets_created, 3);
        assert_eq!(corpus.snippets().len(), 3);

        let first = &corpus.snippets()[0];
        assert_eq!(first.repo, "demo");
        assert_eq!(Path::new(&first.file), Path::new("demo/src/a.py"));
        assert_eq!((first.line_start, first.line_end), (1, 50));

        let totals = corpus.totals();
        assert_eq!(totals.total_files, 2);
        assert_eq!(totals.total_lines, 123);
        assert_eq!(totals.total_repositories, 1);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let (_tmp, root) = repo_with(&[("ok.rs", "fn ok() {}\n".to_string())]);
        fs::write(root.join("bad.rs"), [0x66, 0x6e, 0xff, 0xfe, 0x0a]).unwrap();

        let mut corpus = CorpusBuilder::new(IndexingConfig::default());
        let stats = corpus.index_repository(&root).unwrap();

        assert_eq!(stats.files_indexed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert!(stats.skipped[0].0.ends_with("bad.rs"));
        assert_eq!(corpus.snippets().len(), 1);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let mut corpus = CorpusBuilder::new(IndexingConfig::default());
        let err = corpus
            .index_repository(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert_eq!(err.status_code(), "PATH_NOT_FOUND");
        assert_eq!(corpus.totals().total_repositories, 0);
    }

    #[test]
    fn test_invalid_indexing_config_is_rejected() {
        let (_tmp, root) = repo_with(&[("a.rs", lines(5))]);

        let config = IndexingConfig {
            chunk_lines: 0,
            ..IndexingConfig::default()
        };
        let mut corpus = CorpusBuilder::new(config);
        let err = corpus.index_repository(&root).unwrap_err();
        assert!(matches!(err, IndexError::ConfigError { .. }));
        assert_eq!(corpus.totals().total_repositories, 0);

        let config = IndexingConfig {
            extensions: Vec::new(),
            ..IndexingConfig::default()
        };
        let err = CorpusBuilder::new(config).index_repository(&root).unwrap_err();
        assert_eq!(err.status_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_repositories_accumulate() {
        let (_tmp_a, a) = repo_with(&[("a.go", lines(5))]);
        let (_tmp_b, b) = repo_with(&[("b.go", lines(5))]);

        let mut corpus = CorpusBuilder::new(IndexingConfig::default());
        corpus.index_repository(&a).unwrap();
        corpus.index_repository(&b).unwrap();

        assert_eq!(corpus.totals().total_repositories, 2);
        assert_eq!(corpus.snippets().len(), 2);
    }

    #[test]
    fn test_build_search_index_aligns_rows() {
        let (_tmp, root) = repo_with(&[("a.rs", lines(60))]);
        let mut corpus = CorpusBuilder::new(IndexingConfig::default());
        corpus.index_repository(&root).unwrap();

        let embedder = MockEmbeddingGenerator::new();
        let index = corpus.build_search_index(&embedder).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.vectors().len(), 2);
        assert_eq!(index.totals(), corpus.totals());

        // Building again gives the same rows
        let again = corpus.build_search_index(&embedder).unwrap();
        assert_eq!(again.vectors().to_bytes(), index.vectors().to_bytes());
    }

    #[test]
    fn test_empty_corpus_cannot_be_built() {
        let corpus = CorpusBuilder::new(IndexingConfig::default());
        let err = corpus
            .build_search_index(&MockEmbeddingGenerator::new())
            .unwrap_err();
        assert!(matches!(err, IndexError::EmptyCorpus));
    }
}
