//! In-memory collaborators shared by the unit tests.

use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::{DestinationCatalog, TrackFetcher};
use crate::error::CatalogError;
use crate::models::CandidateTrack;

/// Catalog answering exact queries from a fixed table and keeping real favorites.
#[derive(Default)]
pub struct FakeCatalog {
    results: FxHashMap<String, Vec<CandidateTrack>>,
    failing_queries: FxHashSet<String>,
    favorites: Mutex<FxHashSet<String>>,
    searches: Mutex<Vec<String>>,
    adds: Mutex<Vec<String>>,
    membership_checks: Mutex<usize>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn yesterday() -> CandidateTrack {
        CandidateTrack::new("t1", "Yesterday", vec!["The Beatles"])
    }

    pub fn with_results(mut self, query: &str, candidates: Vec<CandidateTrack>) -> Self {
        self.results.insert(query.to_string(), candidates);
        self
    }

    pub fn with_failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn with_favorite(self, track_id: &str) -> Self {
        self.favorites.lock().unwrap().insert(track_id.to_string());
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn adds(&self) -> Vec<String> {
        self.adds.lock().unwrap().clone()
    }

    pub fn membership_checks(&self) -> usize {
        *self.membership_checks.lock().unwrap()
    }
}

impl DestinationCatalog for FakeCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.failing_queries.contains(query) {
            return Err(CatalogError::Transport {
                endpoint: "search/tracks".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError> {
        *self.membership_checks.lock().unwrap() += 1;
        Ok(self.favorites.lock().unwrap().contains(track_id))
    }

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError> {
        self.adds.lock().unwrap().push(track_id.to_string());
        self.favorites.lock().unwrap().insert(track_id.to_string());
        Ok(())
    }
}

/// Fetcher returning fixed bytes, failing for the listed track ids.
#[derive(Default)]
pub struct FakeFetcher {
    pub failing_ids: FxHashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl TrackFetcher for FakeFetcher {
    fn audio_extension(&self) -> &str {
        "m4a"
    }

    fn fetch_audio(&self, track: &CandidateTrack) -> Result<Vec<u8>, CatalogError> {
        self.fetched.lock().unwrap().push(track.id.clone());
        if self.failing_ids.contains(&track.id) {
            return Err(CatalogError::Status {
                endpoint: format!("tracks/{}/urlpostpaywall", track.id),
                status: 404,
            });
        }
        Ok(format!("audio for {}", track.id).into_bytes())
    }

    fn fetch_cover(&self, _track: &CandidateTrack) -> Result<Option<Vec<u8>>, CatalogError> {
        Ok(None)
    }
}
