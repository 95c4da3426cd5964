//! Index, search, persist and reload through the public API.

mod common;

use common::{HashEmbedder, TestProject, numbered_lines};
use snipsearch::{
    CorpusBuilder, IndexError, IndexPersistence, SearchEngine, SearchIndex, Settings,
};
use std::sync::Arc;

fn build_index(project: &TestProject, repos: &[&str]) -> SearchIndex {
    let settings = Settings::default();
    let mut corpus = CorpusBuilder::new(settings.indexing.clone());
    for repo in repos {
        corpus.index_repository(&project.repo(repo)).unwrap();
    }
    corpus.build_search_index(&HashEmbedder::new()).unwrap()
}

fn engine_with(index: SearchIndex) -> SearchEngine {
    let engine = SearchEngine::new(Arc::new(HashEmbedder::new()), &Settings::default());
    engine.install(index);
    engine
}

#[test]
fn test_single_file_returns_both_chunks() {
    let project = TestProject::new();
    project.add_file("demo/big.rs", &numbered_lines(60));

    let engine = engine_with(build_index(&project, &["demo"]));
    let outcome = engine.search("compute value", 2).unwrap();

    assert_eq!(outcome.count(), 2);
    assert!(!outcome.cached);
    for hit in outcome.results.iter() {
        assert_eq!(hit.file, "demo/big.rs");
        assert_eq!(hit.repo, "demo");
        assert!(hit.similarity_score > 0.0 && hit.similarity_score <= 1.0);
    }

    let mut ranges: Vec<(u32, u32)> = outcome
        .results
        .iter()
        .map(|hit| (hit.line_start, hit.line_end))
        .collect();
    ranges.sort_unstable();
    assert_eq!(ranges, vec![(1, 50), (51, 60)]);
}

#[test]
fn test_results_are_ranked_by_similarity() {
    let project = TestProject::new();
    project.add_file("demo/db.rs", "open database connection pool\n");
    project.add_file("demo/http.rs", "send http request with retry\n");
    project.add_file("demo/json.rs", "parse json document into struct\n");

    let engine = engine_with(build_index(&project, &["demo"]));
    let outcome = engine.search("parse json document", 3).unwrap();

    assert_eq!(outcome.count(), 3);
    assert_eq!(outcome.results[0].file, "demo/json.rs");
    for pair in outcome.results.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[test]
fn test_repeated_query_is_served_from_cache() {
    let project = TestProject::new();
    project.add_file("demo/lib.rs", &numbered_lines(10));

    let engine = engine_with(build_index(&project, &["demo"]));
    let first = engine.search("compute", 5).unwrap();
    let second = engine.search("compute", 5).unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.results, second.results);
    assert_eq!(first.search_time_ms, second.search_time_ms);

    // A different result count is a different cache entry
    assert!(!engine.search("compute", 1).unwrap().cached);

    let cache = engine.get_cache_stats();
    assert_eq!(cache.hits, 1);
    assert_eq!(cache.misses, 2);

    let metrics = engine.get_metrics_snapshot();
    assert_eq!(metrics.total_queries, 3);
}

#[test]
fn test_rebuild_invalidates_cache() {
    let project = TestProject::new();
    project.add_file("demo/lib.rs", &numbered_lines(10));

    let engine = engine_with(build_index(&project, &["demo"]));
    engine.search("compute", 5).unwrap();

    project.add_file("demo/extra.rs", "fn compute_more() {}\n");
    engine.install(build_index(&project, &["demo"]));

    let after = engine.search("compute", 5).unwrap();
    assert!(!after.cached);
    assert_eq!(after.count(), 2);
}

#[test]
fn test_multiple_repositories_accumulate_totals() {
    let project = TestProject::new();
    project.add_file("alpha/main.py", "def main():\n    print('hi')\n");
    project.add_file("beta/app.js", "function app() {}\n");
    project.add_file("beta/README.md", "not indexed\n");

    let index = build_index(&project, &["alpha", "beta"]);
    let totals = index.totals();
    assert_eq!(totals.total_repositories, 2);
    assert_eq!(totals.total_files, 2);
    assert_eq!(totals.total_lines, 3);
    assert_eq!(index.len(), 2);
}

#[test]
fn test_undecodable_file_is_skipped() {
    let project = TestProject::new();
    project.add_file("demo/ok.rs", "fn ok() {}\n");
    project.add_bytes("demo/bad.rs", &[0xff, 0xfe, 0x00, 0x80]);

    let mut corpus = CorpusBuilder::new(Settings::default().indexing);
    let stats = corpus.index_repository(&project.repo("demo")).unwrap();

    assert_eq!(stats.files_indexed, 1);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(corpus.snippets().len(), 1);
}

#[test]
fn test_empty_corpus_cannot_be_built() {
    let project = TestProject::new();
    project.add_file("demo/blank.rs", "\n   \n\t\n");

    let mut corpus = CorpusBuilder::new(Settings::default().indexing);
    corpus.index_repository(&project.repo("demo")).unwrap();

    let err = corpus.build_search_index(&HashEmbedder::new()).unwrap_err();
    assert!(matches!(err, IndexError::EmptyCorpus));
}

#[test]
fn test_save_and_load_round_trip() {
    let project = TestProject::new();
    project.add_file("demo/a.rs", &numbered_lines(120));
    project.add_file("demo/b.rs", "fn parse_json() {}\nfn open_socket() {}\n");

    let index = build_index(&project, &["demo"]);
    let persistence = IndexPersistence::new(project.path().join("index"));
    assert!(!persistence.exists());
    persistence.save(&index).unwrap();
    assert!(persistence.exists());

    let loaded = persistence.load().unwrap();
    assert_eq!(loaded.totals(), index.totals());
    assert_eq!(loaded.snippets(), index.snippets());

    let original = engine_with(index).search("parse json", 3).unwrap();
    let reloaded = engine_with(loaded).search("parse json", 3).unwrap();
    assert_eq!(original.results, reloaded.results);
}

#[test]
fn test_load_without_index_is_missing() {
    let project = TestProject::new();
    let persistence = IndexPersistence::new(project.path().join("nothing"));
    assert!(persistence.load().unwrap_err().is_missing());
}

#[test]
fn test_concurrent_searches_share_engine() {
    let project = TestProject::new();
    project.add_file("demo/lib.rs", &numbered_lines(200));

    let engine = Arc::new(engine_with(build_index(&project, &["demo"])));
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for i in 0..25 {
                    let query = format!("compute {}", (worker + i) % 5);
                    let outcome = engine.search(&query, 3).unwrap();
                    assert_eq!(outcome.count(), 3);
                }
            });
        }
    });

    let metrics = engine.get_metrics_snapshot();
    assert_eq!(metrics.total_queries, 100);
    let cache = engine.get_cache_stats();
    assert_eq!(cache.hits + cache.misses, 100);
    assert!(cache.cache_size <= 5);
}
