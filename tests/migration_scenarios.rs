//! End-to-end migration runs against an in-memory catalog.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use ytm2tidal::blacklist::BlacklistRule;
use ytm2tidal::catalog::DestinationCatalog;
use ytm2tidal::driver::{tally_line, BatchDriver};
use ytm2tidal::engine::Reconciler;
use ytm2tidal::error::CatalogError;
use ytm2tidal::library::{prepare_batch, SourceLibrary};
use ytm2tidal::models::{CandidateTrack, Outcome, SourceTrack};

#[derive(Default)]
struct MemoryCatalog {
    by_query: HashMap<String, Vec<CandidateTrack>>,
    unavailable: HashSet<String>,
    favorites: RefCell<HashSet<String>>,
    searched: RefCell<Vec<String>>,
    added: RefCell<Vec<String>>,
}

impl MemoryCatalog {
    fn answer(mut self, query: &str, candidate: CandidateTrack) -> Self {
        self.by_query.entry(query.to_string()).or_default().push(candidate);
        self
    }

    fn unavailable(mut self, query: &str) -> Self {
        self.unavailable.insert(query.to_string());
        self
    }
}

impl DestinationCatalog for MemoryCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        self.searched.borrow_mut().push(query.to_string());
        if self.unavailable.contains(query) {
            return Err(CatalogError::Status {
                endpoint: "search/tracks".to_string(),
                status: 429,
            });
        }
        Ok(self.by_query.get(query).cloned().unwrap_or_default())
    }

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError> {
        Ok(self.favorites.borrow().contains(track_id))
    }

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError> {
        self.added.borrow_mut().push(track_id.to_string());
        self.favorites.borrow_mut().insert(track_id.to_string());
        Ok(())
    }
}

/// Source library listing liked tracks newest first, like the real service.
struct NewestFirst(Vec<SourceTrack>);

impl SourceLibrary for NewestFirst {
    fn liked_tracks(&self, limit: usize) -> Result<Vec<SourceTrack>> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }
}

fn yesterday() -> CandidateTrack {
    CandidateTrack::new("t1", "Yesterday", vec!["The Beatles"])
}

fn run(catalog: &MemoryCatalog, tracks: &[SourceTrack]) -> ytm2tidal::models::RunSummary {
    let reconciler = Reconciler::new(catalog, BlacklistRule::disabled());
    BatchDriver::new(reconciler, Duration::ZERO).run(tracks)
}

#[test]
fn test_yesterday_is_added() {
    let catalog = MemoryCatalog::default().answer("Yesterday The Beatles", yesterday());
    let track = SourceTrack::new("Yesterday", vec!["The Beatles"]);

    let mut reconciler = Reconciler::new(&catalog, BlacklistRule::disabled());
    let resolution = reconciler.resolve(&track).unwrap();
    assert_eq!(resolution.outcome, Outcome::Added);

    let fresh = MemoryCatalog::default().answer("Yesterday The Beatles", yesterday());
    let summary = run(&fresh, &[track]);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(*fresh.added.borrow(), vec!["t1".to_string()]);
}

#[test]
fn test_unknown_track_not_found() {
    let catalog = MemoryCatalog::default();
    let track = SourceTrack::new("Unknown Obscure Track", Vec::<String>::new());

    let summary = run(&catalog, &[track]);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.success_count, 0);
    assert!(catalog.added.borrow().is_empty());
    // No artist round: only the bare title is searched
    assert_eq!(*catalog.searched.borrow(), vec!["Unknown Obscure Track".to_string()]);
}

#[test]
fn test_second_run_adds_nothing() {
    let catalog = MemoryCatalog::default().answer("Yesterday The Beatles", yesterday());
    let tracks = vec![SourceTrack::new("Yesterday", vec!["The Beatles"])];

    let first = run(&catalog, &tracks);
    let second = run(&catalog, &tracks);

    assert_eq!(first.added, 1);
    assert_eq!(second.added, 0);
    assert_eq!(second.already_present, 1);
    assert_eq!(second.success_count, 1);
    assert_eq!(catalog.added.borrow().len(), 1);
}

#[test]
fn test_rate_limited_track_counts_as_failure() {
    let catalog = MemoryCatalog::default()
        .unavailable("Help! The Beatles")
        .answer("Yesterday The Beatles", yesterday());
    let tracks = vec![
        SourceTrack::new("Help!", vec!["The Beatles"]),
        SourceTrack::new("Yesterday", vec!["The Beatles"]),
    ];

    let summary = run(&catalog, &tracks);
    assert_eq!(summary.errored, 1);
    assert_eq!(tally_line(&summary), "Processed 2 tracks. (1 succeeded / 1 failed)");
}

#[test]
fn test_batch_is_oldest_first() {
    let library = NewestFirst(vec![
        SourceTrack::new("Newest", vec!["A"]),
        SourceTrack::new("Middle", vec!["A"]),
        SourceTrack::new("Oldest", vec!["A"]),
        SourceTrack::new("Ancient", vec!["A"]),
    ]);
    let catalog = MemoryCatalog::default();

    let batch = prepare_batch(&library, 3).unwrap();
    let titles: Vec<&str> = batch.iter().map(SourceTrack::title).collect();
    assert_eq!(titles, vec!["Oldest", "Middle", "Newest"]);

    run(&catalog, &batch);
    let first_queries: Vec<String> = catalog
        .searched
        .borrow()
        .iter()
        .filter(|q| q.ends_with(" A"))
        .cloned()
        .collect();
    assert_eq!(first_queries, vec!["Oldest A", "Middle A", "Newest A"]);
}
