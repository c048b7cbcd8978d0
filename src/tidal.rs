//! Blocking client for the TIDAL v1 API.
//!
//! Implements [`DestinationCatalog`] for search and favorites, and
//! [`TrackFetcher`] for stream and cover art downloads. Authentication is a
//! bearer token obtained outside this program.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

use crate::catalog::{DestinationCatalog, TrackFetcher};
use crate::error::CatalogError;
use crate::models::CandidateTrack;

pub const DEFAULT_API_BASE: &str = "https://api.tidal.com/v1";
pub const COVER_BASE: &str = "https://resources.tidal.com/images";

/// Search results requested per query; the ranker picks among them.
pub const SEARCH_LIMIT: usize = 10;

const FAVORITES_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct TidalSettings {
    pub api_base: String,
    pub access_token: String,
    pub user_id: u64,
    pub country_code: String,
    pub audio_quality: String, // LOW, HIGH, LOSSLESS, HI_RES
}

// ============================================================================
// API payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct TidalTrack {
    id: u64,
    title: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    artists: Vec<TidalArtist>,
    #[serde(default)]
    album: Option<TidalAlbum>,
}

#[derive(Debug, Deserialize)]
struct TidalArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TidalAlbum {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cover: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default, rename = "totalNumberOfItems")]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct FavoriteItem {
    item: TidalTrack,
}

#[derive(Debug, Deserialize)]
struct StreamUrls {
    #[serde(default)]
    urls: Vec<String>,
}

/// "Title" or "Title (Version)".
pub fn display_name(title: &str, version: Option<&str>) -> String {
    match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(version) => format!("{} ({})", title, version),
        None => title.to_string(),
    }
}

/// Cover ids are UUIDs; the image path uses '/' in place of '-'.
pub fn cover_url(cover: &str) -> String {
    format!("{}/{}/1280x1280.jpg", COVER_BASE, cover.replace('-', "/"))
}

/// File extension of the stream delivered for an audio quality.
pub fn extension_for_quality(quality: &str) -> &'static str {
    match quality {
        "LOSSLESS" | "HI_RES" | "HI_RES_LOSSLESS" => "flac",
        _ => "m4a",
    }
}

impl From<TidalTrack> for CandidateTrack {
    fn from(track: TidalTrack) -> Self {
        let (album, cover) = match track.album {
            Some(album) => (album.title, album.cover),
            None => (None, None),
        };
        CandidateTrack {
            id: track.id.to_string(),
            display_name: display_name(&track.title, track.version.as_deref()),
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album,
            cover,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct TidalCatalog {
    agent: ureq::Agent,
    settings: TidalSettings,
}

impl TidalCatalog {
    pub fn new(settings: TidalSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(10))
            .build();
        Self { agent, settings }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), endpoint)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.settings.access_token)
    }

    fn request_error(endpoint: &str, error: ureq::Error) -> CatalogError {
        match error {
            ureq::Error::Status(status, _) => CatalogError::Status {
                endpoint: endpoint.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => CatalogError::Transport {
                endpoint: endpoint.to_string(),
                message: transport.to_string(),
            },
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let mut request = self
            .agent
            .get(&self.url(endpoint))
            .set("Authorization", &self.bearer())
            .set("Accept", "application/json")
            .query("countryCode", &self.settings.country_code);
        for (name, value) in params {
            request = request.query(name, value);
        }

        let response = request
            .call()
            .map_err(|error| Self::request_error(endpoint, error))?;
        response.into_json::<T>().map_err(|error| CatalogError::Decode {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|error| Self::request_error(url, error))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|error| CatalogError::Transport {
                endpoint: url.to_string(),
                message: format!("Failed to read response: {error}"),
            })?;
        Ok(bytes)
    }

    fn favorites_endpoint(&self) -> String {
        format!("users/{}/favorites/tracks", self.settings.user_id)
    }
}

impl DestinationCatalog for TidalCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError> {
        let limit = SEARCH_LIMIT.to_string();
        let page: Page<TidalTrack> =
            self.get_json("search/tracks", &[("query", query), ("limit", limit.as_str())])?;
        Ok(page.items.into_iter().map(CandidateTrack::from).collect())
    }

    fn favorites_contains(&self, track_id: &str) -> Result<bool, CatalogError> {
        let endpoint = self.favorites_endpoint();
        let limit = FAVORITES_PAGE_SIZE.to_string();
        let mut offset = 0usize;

        loop {
            let offset_param = offset.to_string();
            let page: Page<FavoriteItem> = self.get_json(
                &endpoint,
                &[
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                    ("order", "DATE"),
                    ("orderDirection", "DESC"),
                ],
            )?;

            if page.items.iter().any(|f| f.item.id.to_string() == track_id) {
                return Ok(true);
            }

            offset += page.items.len();
            if page.items.is_empty() || offset >= page.total {
                return Ok(false);
            }
        }
    }

    fn add_to_favorites(&self, track_id: &str) -> Result<(), CatalogError> {
        let endpoint = self.favorites_endpoint();
        self.agent
            .post(&self.url(&endpoint))
            .set("Authorization", &self.bearer())
            .query("countryCode", &self.settings.country_code)
            .send_form(&[("trackIds", track_id), ("onArtifactNotFound", "FAIL")])
            .map_err(|error| Self::request_error(&endpoint, error))?;
        Ok(())
    }
}

impl TrackFetcher for TidalCatalog {
    fn audio_extension(&self) -> &str {
        extension_for_quality(&self.settings.audio_quality)
    }

    fn fetch_audio(&self, track: &CandidateTrack) -> Result<Vec<u8>, CatalogError> {
        let endpoint = format!("tracks/{}/urlpostpaywall", track.id);
        let stream: StreamUrls = self.get_json(
            &endpoint,
            &[
                ("audioquality", self.settings.audio_quality.as_str()),
                ("urlusagemode", "STREAM"),
                ("assetpresentation", "FULL"),
            ],
        )?;

        let url = stream.urls.first().ok_or_else(|| CatalogError::Decode {
            endpoint: endpoint.clone(),
            message: "no stream url in response".to_string(),
        })?;
        self.get_bytes(url)
    }

    fn fetch_cover(&self, track: &CandidateTrack) -> Result<Option<Vec<u8>>, CatalogError> {
        match &track.cover {
            Some(cover) => self.get_bytes(&cover_url(cover)).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Song", None), "Song");
        assert_eq!(display_name("Song", Some("")), "Song");
        assert_eq!(display_name("Song", Some("2009 Remaster")), "Song (2009 Remaster)");
    }

    #[test]
    fn test_cover_url() {
        assert_eq!(
            cover_url("a1b2-c3d4-e5"),
            "https://resources.tidal.com/images/a1b2/c3d4/e5/1280x1280.jpg"
        );
    }

    #[test]
    fn test_search_page_to_candidates() {
        let json = r#"{
            "limit": 10, "offset": 0, "totalNumberOfItems": 2,
            "items": [
                {"id": 1234, "title": "Yesterday", "version": "Remastered 2009",
                 "artists": [{"id": 1, "name": "The Beatles", "type": "MAIN"}],
                 "album": {"id": 9, "title": "Help!", "cover": "aa-bb"}},
                {"id": 99, "title": "Yesterday", "version": null, "artists": []}
            ]
        }"#;
        let page: Page<TidalTrack> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 2);

        let candidates: Vec<CandidateTrack> =
            page.items.into_iter().map(CandidateTrack::from).collect();
        assert_eq!(candidates[0].id, "1234");
        assert_eq!(candidates[0].display_name, "Yesterday (Remastered 2009)");
        assert_eq!(candidates[0].artists, vec!["The Beatles"]);
        assert_eq!(candidates[0].album.as_deref(), Some("Help!"));
        assert_eq!(candidates[0].cover.as_deref(), Some("aa-bb"));
        assert_eq!(candidates[1].display_name, "Yesterday");
        assert!(candidates[1].artists.is_empty());
        assert!(candidates[1].album.is_none());
    }

    #[test]
    fn test_favorites_page() {
        let json = r#"{"items": [{"created": "2024-01-01T00:00:00.000+0000",
                        "item": {"id": 5, "title": "Song", "artists": [{"name": "X"}]}}],
                       "totalNumberOfItems": 1}"#;
        let page: Page<FavoriteItem> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].item.id, 5);
    }

    #[test]
    fn test_extension_for_quality() {
        assert_eq!(extension_for_quality("LOSSLESS"), "flac");
        assert_eq!(extension_for_quality("HIGH"), "m4a");
    }
}
