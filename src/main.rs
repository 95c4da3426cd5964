//! CLI entry point for snippet search.
//!
//! Provides commands for indexing repositories, querying the index, running a
//! synthetic query load and serving the HTTP API.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use snipsearch::display::{
    THEME, TableBuilder, create_cache_table, create_index_table, create_metrics_table,
    create_progress_bar, create_recent_queries_table, format_search_hits, with_spinner,
};
use snipsearch::{
    CacheStats, CorpusBuilder, FastEmbedGenerator, FileWalker, IndexPersistence, MetricsSnapshot,
    PersistenceError, SearchEngine, SearchIndex, Settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Queries replayed by `load-test`, cycled in order.
const LOAD_TEST_QUERIES: &[&str] = &[
    "authentication login",
    "database connection",
    "error handling",
    "http request",
    "file upload",
    "user validation",
    "api endpoint",
    "cache implementation",
    "data processing",
    "security check",
    "unit test",
    "configuration",
    "logging debug",
    "async function",
    "json parsing",
    "form validation",
    "session management",
];

#[derive(Debug, Serialize)]
struct IndexInfo {
    total_repositories: u64,
    total_files: u64,
    total_lines: u64,
    total_snippets: usize,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct LoadTestReport {
    queries: usize,
    total_time_secs: f64,
    queries_per_second: f64,
    cache: CacheStats,
    performance: MetricsSnapshot,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Semantic code snippet search
#[derive(Parser)]
#[command(
    name = "snipsearch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic code snippet search",
    long_about = "Index repositories into snippets and search them by meaning, with a result cache and latency metrics.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ snipsearch init\n  $ snipsearch index ./my-repo\n  $ snipsearch search \"open a database connection\"\n  $ snipsearch serve"
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .snipsearch directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Index repositories
    #[command(
        about = "Chunk, embed and persist one or more repositories",
        after_help = "Examples:\n  snipsearch index ./service-a ./service-b\n  snipsearch index . --force\n  snipsearch index . --dry-run"
    )]
    Index {
        /// Repository roots; each one counts as a repository
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Replace an existing index
        #[arg(short, long)]
        force: bool,

        /// List how many files would be indexed without indexing
        #[arg(long)]
        dry_run: bool,
    },

    /// Search the persisted index
    #[command(
        about = "Find snippets similar to a natural language query",
        after_help = "Examples:\n  snipsearch search \"parse json\"\n  snipsearch search \"retry with backoff\" --limit 3 --json"
    )]
    Search {
        /// Query text
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics
    #[command(about = "Show totals of the persisted index")]
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay common queries to exercise the cache and collect latency metrics
    #[command(name = "load-test", about = "Run a synthetic query load")]
    LoadTest {
        /// Number of queries to issue
        #[arg(short = 'n', long, default_value = "1000")]
        queries: usize,

        /// Results requested per query
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP server
    #[command(
        about = "Serve the search API over HTTP",
        after_help = "Examples:\n  snipsearch serve\n  snipsearch serve --bind 0.0.0.0:5000"
    )]
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Load the persisted index or exit with recovery suggestions.
fn load_index_or_exit(persistence: &IndexPersistence) -> SearchIndex {
    match persistence.load() {
        Ok(index) => index,
        Err(e) => {
            report_persistence_error(&e);
            std::process::exit(1);
        }
    }
}

fn report_persistence_error(e: &PersistenceError) {
    eprintln!("{}", THEME.error_with_icon(&e.to_string()));
    for suggestion in e.recovery_suggestions() {
        eprintln!("  - {suggestion}");
    }
}

/// Load the embedding model or exit.
fn load_embedder_or_exit(config: &Settings) -> Arc<FastEmbedGenerator> {
    let embedder = with_spinner(
        &format!("Loading embedding model {}...", config.semantic.model),
        || FastEmbedGenerator::from_config(&config.semantic),
    );
    match embedder {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("Failed to load model: {e}")));
            eprintln!("  - Ensure you have internet connection for first-time model download");
            std::process::exit(1);
        }
    }
}

/// Build an engine around the persisted index.
fn ready_engine(config: &Settings, persistence: &IndexPersistence) -> SearchEngine {
    let index = load_index_or_exit(persistence);
    let embedder = load_embedder_or_exit(config);
    let engine = SearchEngine::new(embedder, config);
    engine.install(index);
    engine
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };
    if cli.debug {
        config.debug = true;
    }
    init_tracing(config.debug);

    let persistence = IndexPersistence::new(&config.index_path);

    match cli.command {
        Commands::Init { force } => {
            match Settings::init_config_file(force) {
                Ok(path) => {
                    println!("Created configuration file at: {}", path.display());
                    println!("Edit this file to customize your settings.");
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            match toml::to_string_pretty(&config) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
        }

        Commands::Index {
            paths,
            force,
            dry_run,
        } => {
            if dry_run {
                let walker = FileWalker::new(&config.indexing);
                let mut table = TableBuilder::new().set_headers(vec!["Repository", "Files"]);
                for path in &paths {
                    table = table.add_row(vec![
                        path.display().to_string(),
                        walker.count_files(path).to_string(),
                    ]);
                }
                println!("{}", table.build());
                return;
            }

            if persistence.exists() && !force {
                eprintln!(
                    "Index already exists at: {}",
                    persistence.base_path().display()
                );
                eprintln!("Use --force to rebuild");
                std::process::exit(1);
            }

            let mut corpus = CorpusBuilder::new(config.indexing.clone());
            for path in &paths {
                match corpus.index_repository(path) {
                    Ok(stats) => stats.display(),
                    Err(e) => {
                        eprintln!("{}", THEME.error_with_icon(&format!("{e}")));
                        for suggestion in e.recovery_suggestions() {
                            eprintln!("  - {suggestion}");
                        }
                        std::process::exit(1);
                    }
                }
            }

            let embedder = load_embedder_or_exit(&config);
            let start = Instant::now();
            let built = with_spinner(
                &format!("Embedding {} snippets...", corpus.snippets().len()),
                || corpus.build_search_index(embedder.as_ref()),
            );
            let index = match built {
                Ok(index) => index,
                Err(e) => {
                    eprintln!("{}", THEME.error_with_icon(&format!("{e}")));
                    for suggestion in e.recovery_suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                    std::process::exit(1);
                }
            };
            tracing::info!(
                "[index] embedded {} snippets in {:.2}s",
                index.len(),
                start.elapsed().as_secs_f64()
            );

            // Drop the previous artifacts so a failed save cannot leave a mixed pair
            if force {
                if let Err(e) = persistence.clear() {
                    report_persistence_error(&e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = persistence.save(&index) {
                report_persistence_error(&e);
                std::process::exit(1);
            }

            println!();
            println!("{}", create_index_table(index.totals(), index.len()));
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Index saved to {}",
                    persistence.base_path().display()
                ))
            );
        }

        Commands::Search { query, limit, json } => {
            let engine = ready_engine(&config, &persistence);
            let limit = limit.unwrap_or(config.search.default_limit);

            match engine.search(&query, limit) {
                Ok(outcome) => {
                    if json {
                        let totals = engine.totals();
                        let body = serde_json::json!({
                            "query": query,
                            "results": outcome.results,
                            "count": outcome.count(),
                            "search_time_ms": outcome.search_time_ms,
                            "cached": outcome.cached,
                            "indexed_files": totals.total_files,
                            "indexed_lines": totals.total_lines,
                        });
                        match serde_json::to_string_pretty(&body) {
                            Ok(text) => println!("{text}"),
                            Err(e) => {
                                eprintln!("Error serializing results: {e}");
                                std::process::exit(1);
                            }
                        }
                    } else {
                        println!(
                            "Found {} results in {:.2}ms\n",
                            outcome.count(),
                            outcome.search_time_ms
                        );
                        print!("{}", format_search_hits(&outcome.results));
                    }
                }
                Err(e) => {
                    eprintln!("{}", THEME.error_with_icon(&e.to_string()));
                    std::process::exit(1);
                }
            }
        }

        Commands::Stats { json } => {
            let metadata = match persistence.load_metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    report_persistence_error(&e);
                    std::process::exit(1);
                }
            };

            if json {
                let info = IndexInfo {
                    total_repositories: metadata.total_repositories,
                    total_files: metadata.total_files,
                    total_lines: metadata.total_lines,
                    total_snippets: metadata.snippets.len(),
                    created_at: metadata.created_at.to_rfc3339(),
                };
                match serde_json::to_string_pretty(&info) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("Error serializing stats: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                metadata.display_source();
                println!(
                    "{}",
                    create_index_table(metadata.totals(), metadata.snippets.len())
                );
            }
        }

        Commands::LoadTest {
            queries,
            limit,
            json,
        } => {
            let engine = ready_engine(&config, &persistence);

            let progress = create_progress_bar(queries as u64, "queries");
            let start = Instant::now();
            for (i, query) in LOAD_TEST_QUERIES.iter().cycle().take(queries).enumerate() {
                if let Err(e) = engine.search(query, limit) {
                    progress.abandon();
                    eprintln!(
                        "{}",
                        THEME.error_with_icon(&format!("Query {} failed: {e}", i + 1))
                    );
                    std::process::exit(1);
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
            let total_time = start.elapsed().as_secs_f64();
            let queries_per_second = if total_time > 0.0 {
                queries as f64 / total_time
            } else {
                0.0
            };

            let cache = engine.get_cache_stats();
            let performance = engine.get_metrics_snapshot();

            if json {
                let report = LoadTestReport {
                    queries,
                    total_time_secs: total_time,
                    queries_per_second,
                    cache,
                    performance,
                };
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("Error serializing report: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                println!(
                    "{}",
                    THEME.success_with_icon(&format!(
                        "{queries} queries in {total_time:.2}s ({queries_per_second:.2} queries/second)"
                    ))
                );
                println!("\nCache:");
                println!("{}", create_cache_table(&cache));
                println!("\nPerformance:");
                println!("{}", create_metrics_table(&performance));
                println!("\nRecent queries:");
                println!("{}", create_recent_queries_table(&performance.recent_queries));
            }
        }

        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());

            #[cfg(feature = "http-server")]
            {
                use snipsearch::server::{AppState, serve_http};

                let embedder = load_embedder_or_exit(&config);
                let engine = SearchEngine::new(embedder, &config);
                match persistence.load() {
                    Ok(index) => engine.install(index),
                    Err(e) if e.is_missing() => {
                        eprintln!(
                            "{}",
                            THEME.warning_with_icon(
                                "No index found, searches return empty results until one is built"
                            )
                        );
                    }
                    Err(e) => {
                        report_persistence_error(&e);
                        std::process::exit(1);
                    }
                }

                let state = AppState {
                    engine: Arc::new(engine),
                    default_limit: config.search.default_limit,
                };
                if let Err(e) = serve_http(state, &bind).await {
                    eprintln!("HTTP server error: {e}");
                    std::process::exit(1);
                }
            }

            #[cfg(not(feature = "http-server"))]
            {
                eprintln!("HTTP server support is not compiled in (requested bind {bind}).");
                eprintln!("Please rebuild with: cargo build --features http-server");
                std::process::exit(1);
            }
        }
    }
}
