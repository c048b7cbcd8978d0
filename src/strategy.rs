//! Search query plan for a source track.
//!
//! One round per source artist (title + artist), then a title-only round. Each
//! round tries the title variants from [`crate::normalize::title_variants`] in
//! order before moving to the next round.

use crate::models::SourceTrack;
use crate::normalize::title_variants;

/// One search attempt: a title form plus the artist appended to it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAttempt {
    pub title: String,
    pub artist: Option<String>,
}

impl QueryAttempt {
    /// Search text sent to the catalog.
    pub fn query(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

/// All attempts for a round sharing one artist (or none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRound {
    pub artist: Option<String>,
    pub attempts: Vec<QueryAttempt>,
}

/// Build the full plan for a track. Deterministic for a given input.
pub fn query_rounds(track: &SourceTrack) -> Vec<QueryRound> {
    let variants = title_variants(track.title());

    let mut artists: Vec<Option<String>> = Vec::new();
    if track.has_artists() {
        artists.extend(track.artists().iter().cloned().map(Some));
    }
    artists.push(None);

    artists
        .into_iter()
        .map(|artist| QueryRound {
            attempts: variants
                .iter()
                .map(|title| QueryAttempt {
                    title: title.clone(),
                    artist: artist.clone(),
                })
                .collect(),
            artist,
        })
        .collect()
}
