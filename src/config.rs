//! Run configuration.
//!
//! Values come from an optional TOML file and from the command line. Command
//! line (and environment) values override the file; anything left unset falls
//! back to the defaults below.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::blacklist::BlacklistRule;
use crate::download::{DownloadPolicy, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::tidal::{TidalSettings, DEFAULT_API_BASE};

pub const DEFAULT_CONFIG_FILE: &str = "ytm2tidal.toml";
pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const DEFAULT_AUDIO_QUALITY: &str = "HIGH";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_DELAY_MS: u64 = 1000;

const AUDIO_QUALITIES: [&str; 4] = ["LOW", "HIGH", "LOSSLESS", "HI_RES"];

// ============================================================================
// File config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub destination: Option<DestinationFileConfig>,
    pub blacklist: Option<BlacklistFileConfig>,
    pub download: Option<DownloadFileConfig>,
    pub run: Option<RunFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationFileConfig {
    pub api_base: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<u64>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlacklistFileConfig {
    pub enabled: Option<bool>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub substrings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadFileConfig {
    pub enabled: Option<bool>,
    pub favorites_too: Option<bool>,
    pub dir: Option<String>,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFileConfig {
    pub delay_ms: Option<u64>,
    pub report: Option<String>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("In {:?}", path))
    }

    /// Load an explicitly requested file, or the default one if it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>> {
        match explicit {
            Some(path) => Self::load(path).map(Some),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }
}

// ============================================================================
// Resolved config
// ============================================================================

/// Command line values that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub access_token: Option<String>,
    pub user_id: Option<u64>,
    pub country_code: Option<String>,
    pub download: bool,
    pub download_favorites: bool,
    pub download_dir: Option<PathBuf>,
    pub delay_ms: Option<u64>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub policy: DownloadPolicy,
    pub dir: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tidal: TidalSettings,
    pub blacklist: BlacklistRule,
    pub download: DownloadSettings,
    pub delay: Duration,
    pub report: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// CLI values override TOML values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let dest = file.destination.unwrap_or_default();
        let access_token = cli
            .access_token
            .clone()
            .or(dest.access_token)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("access token must be given via --access-token, TIDAL_ACCESS_TOKEN or [destination] access_token")
            })?;
        let user_id = cli.user_id.or(dest.user_id).ok_or_else(|| {
            anyhow!("user id must be given via --user-id, TIDAL_USER_ID or [destination] user_id")
        })?;
        let country_code = cli
            .country_code
            .clone()
            .or(dest.country_code)
            .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string())
            .to_uppercase();
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!("country code must be two letters, got '{}'", country_code);
        }

        let dl = file.download.unwrap_or_default();
        let audio_quality = dl
            .quality
            .unwrap_or_else(|| DEFAULT_AUDIO_QUALITY.to_string())
            .to_uppercase();
        if !AUDIO_QUALITIES.contains(&audio_quality.as_str()) {
            bail!(
                "download quality must be one of {}, got '{}'",
                AUDIO_QUALITIES.join(", "),
                audio_quality
            );
        }

        let tidal = TidalSettings {
            api_base: dest
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token,
            user_id,
            country_code,
            audio_quality,
        };

        let bl = file.blacklist.unwrap_or_default();
        let blacklist = BlacklistRule::new(bl.enabled.unwrap_or(false), bl.artists, bl.substrings);

        // Either flag switches downloads on; neither can switch off the file setting
        let favorites_too = cli.download_favorites || dl.favorites_too.unwrap_or(false);
        let policy = DownloadPolicy {
            enabled: cli.download || favorites_too || dl.enabled.unwrap_or(false),
            favorites_too,
        };
        let download = DownloadSettings {
            policy,
            dir: cli
                .download_dir
                .clone()
                .or_else(|| dl.dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            workers: dl.workers.unwrap_or(DEFAULT_WORKERS),
            queue_capacity: dl.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
        };
        if download.workers == 0 || download.queue_capacity == 0 {
            bail!("download workers and queue_capacity must be at least 1");
        }

        let run = file.run.unwrap_or_default();
        let delay = Duration::from_millis(cli.delay_ms.or(run.delay_ms).unwrap_or(DEFAULT_DELAY_MS));
        let report = cli.report.clone().or_else(|| run.report.map(PathBuf::from));

        Ok(Self {
            tidal,
            blacklist,
            download,
            delay,
            report,
        })
    }
}
