//! Bounded download pool for matched tracks.
//!
//! A fixed number of worker threads take jobs from a bounded queue; `submit`
//! blocks while the queue is full. Dropping or finishing the pool closes the
//! queue and joins every worker, so queued downloads are never lost at exit.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::catalog::TrackFetcher;
use crate::models::{CandidateTrack, DownloadStats, Outcome};
use crate::normalize::file_stem;
use crate::safety::validate_output_path;
use crate::tagging::write_tags;

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Which outcomes trigger a download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadPolicy {
    pub enabled: bool,
    pub favorites_too: bool, // Also download tracks that were already favorites
}

impl DownloadPolicy {
    pub fn should_download(&self, outcome: Outcome) -> bool {
        self.enabled
            && match outcome {
                Outcome::Added => true,
                Outcome::AlreadyPresent => self.favorites_too,
                Outcome::NotFound => false,
            }
    }
}

enum JobResult {
    Completed,
    Skipped,
}

pub struct DownloadPool {
    sender: Option<Sender<CandidateTrack>>,
    workers: Vec<JoinHandle<DownloadStats>>,
}

impl DownloadPool {
    pub fn start(
        workers: usize,
        capacity: usize,
        fetcher: Arc<dyn TrackFetcher>,
        dir: PathBuf,
    ) -> Result<Self> {
        let (sender, receiver) = bounded::<CandidateTrack>(capacity.max(1));

        let handles = (0..workers.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                let fetcher = Arc::clone(&fetcher);
                let dir = dir.clone();
                thread::Builder::new()
                    .name(format!("download-{}", index))
                    .spawn(move || worker_loop(receiver, fetcher, dir))
                    .context("Failed to spawn download worker")
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Started {} download workers (queue capacity {})",
            handles.len(),
            capacity.max(1)
        );
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Queue a track. Blocks while the queue is full.
    pub fn submit(&self, track: CandidateTrack) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("Download pool is already closed"))?;
        debug!("Queueing download of {}", track);
        sender
            .send(track)
            .map_err(|_| anyhow!("All download workers have stopped"))
    }

    /// Close the queue, wait for every queued download and return the totals.
    pub fn finish(mut self) -> DownloadStats {
        self.drain()
    }

    fn drain(&mut self) -> DownloadStats {
        drop(self.sender.take());

        let mut total = DownloadStats::default();
        for handle in self.workers.drain(..) {
            match handle.join() {
                Ok(stats) => {
                    total.completed += stats.completed;
                    total.skipped += stats.skipped;
                    total.failed += stats.failed;
                }
                Err(_) => error!("A download worker panicked; its downloads are lost"),
            }
        }
        total
    }
}

impl Drop for DownloadPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.drain();
        }
    }
}

fn worker_loop(
    receiver: Receiver<CandidateTrack>,
    fetcher: Arc<dyn TrackFetcher>,
    dir: PathBuf,
) -> DownloadStats {
    let mut stats = DownloadStats::default();
    for track in receiver.iter() {
        match download_track(&track, fetcher.as_ref(), &dir) {
            Ok(JobResult::Completed) => stats.completed += 1,
            Ok(JobResult::Skipped) => stats.skipped += 1,
            Err(e) => {
                warn!("Download of {} failed: {:#}", track, e);
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Target path for a track inside `dir`.
pub fn target_path(dir: &Path, track: &CandidateTrack, extension: &str) -> PathBuf {
    let artist = track.primary_artist().unwrap_or("Unknown Artist");
    dir.join(format!("{}.{}", file_stem(artist, &track.display_name), extension))
}

fn download_track(track: &CandidateTrack, fetcher: &dyn TrackFetcher, dir: &Path) -> Result<JobResult> {
    let path = target_path(dir, track, fetcher.audio_extension());
    validate_output_path(dir, &path)?;
    if path.exists() {
        debug!("{:?} already exists, skipping download", path);
        return Ok(JobResult::Skipped);
    }

    let bytes = fetcher.fetch_audio(track)?;

    // Write under a temporary name so an interrupted download never looks complete
    let partial = path.with_extension(format!("{}.part", fetcher.audio_extension()));
    std::fs::write(&partial, &bytes).with_context(|| format!("Failed to write {:?}", partial))?;
    std::fs::rename(&partial, &path)
        .with_context(|| format!("Failed to move {:?} into place", partial))?;

    let cover = match fetcher.fetch_cover(track) {
        Ok(cover) => cover,
        Err(e) => {
            warn!("Cover art for {} unavailable: {}", track, e);
            None
        }
    };
    if let Err(e) = write_tags(&path, track, cover) {
        warn!("Saved {:?} without tags: {:#}", path, e);
    }

    info!("Downloaded {} to {:?}", track, path);
    Ok(JobResult::Completed)
}
