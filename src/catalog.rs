//! Collaborator traits for the destination catalog and file acquisition.

use std::sync::Arc;

use crate::error::CatalogError;
use crate::models::CandidateTrack;

/// Search and favorites operations of the destination service.
///
/// Every call goes to the service: `favorites_contains` must reflect the
/// favorites as of the call, not a cached copy.
pub trait DestinationCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError>;

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError>;

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError>;
}

impl<T: DestinationCatalog + ?Sized> DestinationCatalog for &T {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        (**self).search(query)
    }

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError> {
        (**self).favorites_contains(track_id)
    }

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError> {
        (**self).add_to_favorites(track_id)
    }
}

impl<T: DestinationCatalog + ?Sized> DestinationCatalog for Arc<T> {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        (**self).search(query)
    }

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError> {
        (**self).favorites_contains(track_id)
    }

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError> {
        (**self).add_to_favorites(track_id)
    }
}

/// Fetches what a download worker needs. Called from worker threads.
pub trait TrackFetcher: Send + Sync {
    /// Extension (without the dot) of the files `fetch_audio` returns.
    fn audio_extension(&self) -> &str;

    fn fetch_audio(&self, track: &CandidateTrack) -> Result<Vec<u8>, CatalogError>;

    /// `Ok(None)` when the track has no cover art.
    fn fetch_cover(&self, track: &CandidateTrack) -> Result<Option<Vec<u8>>, CatalogError>;
}
