//! Core data models for the liked-songs migration.
//!
//! This module contains the track types exchanged with the source library and
//! the destination catalog, plus the per-track outcome and run summary types.

use serde::Serialize;
use std::fmt;

// ============================================================================
// Source Models
// ============================================================================

/// Placeholder artist for source tracks that come without any artist metadata.
pub const NO_ARTIST: &str = "<No artist provided>";

/// A liked track read from the source library.
///
/// `artists` is never empty: a track without artist metadata carries the single
/// [`NO_ARTIST`] entry instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceTrack {
    title: String,
    artists: Vec<String>,
}

impl SourceTrack {
    /// Build a source track, dropping blank artist names and falling back to the
    /// sentinel when nothing is left.
    pub fn new<I, S>(title: impl Into<String>, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut artists: Vec<String> = artists
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.trim().is_empty())
            .collect();
        if artists.is_empty() {
            artists.push(NO_ARTIST.to_string());
        }
        Self {
            title: title.into(),
            artists,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    /// False when the artist list is the sentinel.
    pub fn has_artists(&self) -> bool {
        !is_no_artist(&self.artists)
    }
}

impl fmt::Display for SourceTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by '{}'", self.title, self.artists.join(", "))
    }
}

/// True for the sentinel artist list (or an empty one).
pub fn is_no_artist(artists: &[String]) -> bool {
    artists.is_empty() || (artists.len() == 1 && artists[0] == NO_ARTIST)
}

// ============================================================================
// Destination Models
// ============================================================================

/// One search hit from the destination catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateTrack {
    pub id: String,           // Catalog track id (opaque)
    pub display_name: String, // Title, with the version qualifier when present
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub cover: Option<String>, // Catalog cover art identifier
}

impl CandidateTrack {
    pub fn new<I, S>(id: impl Into<String>, display_name: impl Into<String>, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            artists: artists.into_iter().map(Into::into).collect(),
            album: None,
            cover: None,
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

impl fmt::Display for CandidateTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' by '{}'",
            self.display_name,
            self.primary_artist().unwrap_or(NO_ARTIST)
        )
    }
}

/// Candidate with its similarity score against the source track (0.0 to 2.0).
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: CandidateTrack,
    pub score: f64,
}

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Added,
    AlreadyPresent,
    NotFound,
}

impl Outcome {
    /// Added and AlreadyPresent both count as a successful migration.
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Added | Outcome::AlreadyPresent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Added => "added",
            Outcome::AlreadyPresent => "already_present",
            Outcome::NotFound => "not_found",
        }
    }
}

/// Counters reported by the download pool once it has been drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub completed: usize,
    pub skipped: usize, // File already on disk
    pub failed: usize,
}

/// Aggregated result of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub added: usize,
    pub already_present: usize,
    pub not_found: usize,
    pub errored: usize,
    pub downloads: Option<DownloadStats>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Added => self.added += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::NotFound => self.not_found += 1,
        }
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    pub fn record_error(&mut self) {
        self.errored += 1;
        self.failure_count += 1;
    }

    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }
}
