//! Source library access: the liked tracks to migrate.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::SourceTrack;

/// Liked tracks of the source service, newest-liked first.
pub trait SourceLibrary {
    fn liked_tracks(&self, limit: usize) -> Result<Vec<SourceTrack>>;
}

/// Liked-songs dump of a YouTube Music account, as written by the
/// `get_liked_songs` call of common client libraries.
#[derive(Debug, Deserialize)]
struct LikedSongsDump {
    #[serde(default)]
    tracks: Vec<DumpTrack>,
}

#[derive(Debug, Deserialize)]
struct DumpTrack {
    title: Option<String>,
    #[serde(default)]
    artists: Option<Vec<DumpArtist>>,
}

#[derive(Debug, Deserialize)]
struct DumpArtist {
    name: Option<String>,
}

impl From<DumpTrack> for SourceTrack {
    fn from(track: DumpTrack) -> Self {
        let artists = track
            .artists
            .unwrap_or_default()
            .into_iter()
            .filter_map(|artist| artist.name);
        SourceTrack::new(track.title.unwrap_or_default(), artists)
    }
}

/// Source library backed by a liked-songs JSON export file.
pub struct LikedSongsExport {
    path: PathBuf,
}

impl LikedSongsExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse export JSON. Tracks without a title are skipped.
    pub fn parse(json: &str) -> Result<Vec<SourceTrack>> {
        let dump: LikedSongsDump =
            serde_json::from_str(json).context("Liked songs export is not valid JSON")?;
        Ok(dump
            .tracks
            .into_iter()
            .filter(|t| t.title.as_deref().is_some_and(|title| !title.trim().is_empty()))
            .map(SourceTrack::from)
            .collect())
    }
}

impl SourceLibrary for LikedSongsExport {
    fn liked_tracks(&self, limit: usize) -> Result<Vec<SourceTrack>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read liked songs export: {:?}", self.path))?;
        let mut tracks = Self::parse(&content)
            .with_context(|| format!("Failed to parse liked songs export: {:?}", self.path))?;
        tracks.truncate(limit);
        Ok(tracks)
    }
}

/// The first `limit` liked tracks, oldest-liked first.
pub fn prepare_batch(library: &dyn SourceLibrary, limit: usize) -> Result<Vec<SourceTrack>> {
    let mut tracks = library.liked_tracks(limit)?;
    tracks.truncate(limit);
    tracks.reverse();
    Ok(tracks)
}
