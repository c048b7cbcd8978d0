//! Sequential batch over the prepared source tracks.
//!
//! Tracks are resolved one at a time with a blocking pause between them. A
//! failing track is logged, counted as a failure and the run moves on. Matched
//! tracks go to the download pool when the policy asks for it; the pool is
//! drained before the summary is returned.

use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::catalog::DestinationCatalog;
use crate::download::{DownloadPolicy, DownloadPool};
use crate::engine::Reconciler;
use crate::models::{RunSummary, SourceTrack};
use crate::progress::{create_track_bar, error_line, format_duration, log_progress, outcome_line, status_line};
use crate::report::RunReport;

const LOG_INTERVAL: u64 = 10;

pub struct BatchDriver<C> {
    reconciler: Reconciler<C>,
    delay: Duration,
    downloads: Option<(DownloadPool, DownloadPolicy)>,
    report: Option<RunReport>,
}

impl<C: DestinationCatalog> BatchDriver<C> {
    pub fn new(reconciler: Reconciler<C>, delay: Duration) -> Self {
        Self {
            reconciler,
            delay,
            downloads: None,
            report: None,
        }
    }

    pub fn with_downloads(mut self, pool: DownloadPool, policy: DownloadPolicy) -> Self {
        self.downloads = Some((pool, policy));
        self
    }

    pub fn with_report(mut self, report: RunReport) -> Self {
        self.report = Some(report);
        self
    }

    /// Resolve every track in order and return the tally.
    pub fn run(mut self, tracks: &[SourceTrack]) -> RunSummary {
        let start = Instant::now();
        let total = tracks.len();
        let pb = create_track_bar(total as u64);
        let mut summary = RunSummary::default();

        for (index, track) in tracks.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            let position = index + 1;

            match self.reconciler.resolve(track) {
                Ok(resolution) => {
                    summary.record(resolution.outcome);
                    status_line(&pb, &outcome_line(position, total, track, resolution.outcome));

                    if let (Some((pool, policy)), Some(matched)) =
                        (&self.downloads, resolution.matched.as_ref())
                    {
                        if policy.should_download(resolution.outcome) {
                            if let Err(e) = pool.submit(matched.candidate.clone()) {
                                warn!("Could not queue download of {}: {:#}", matched.candidate, e);
                            }
                        }
                    }

                    if let Some(report) = &self.report {
                        if let Err(e) = report.record_resolution(index, track, &resolution) {
                            warn!("Failed to record {} in report: {:#}", track, e);
                        }
                    }
                }
                Err(e) => {
                    summary.record_error();
                    let transient = if e.catalog_error().is_transient() {
                        " (transient)"
                    } else {
                        ""
                    };
                    warn!("Resolving {} failed{}: {}", track, transient, e);
                    status_line(&pb, &error_line(position, total, track, &e.to_string()));

                    if let Some(report) = &self.report {
                        if let Err(re) = report.record_error(index, track, &e.to_string()) {
                            warn!("Failed to record {} in report: {:#}", track, re);
                        }
                    }
                }
            }

            pb.inc(1);
            log_progress(position as u64, total as u64, LOG_INTERVAL);
        }
        pb.finish_and_clear();

        if let Some((pool, _)) = self.downloads.take() {
            info!("Waiting for queued downloads to finish");
            let stats = pool.finish();
            info!(
                "Downloads: {} completed, {} skipped, {} failed",
                stats.completed, stats.skipped, stats.failed
            );
            summary.downloads = Some(stats);
        }

        if let Some(report) = &self.report {
            if let Err(e) = report.finish(&summary) {
                warn!("Failed to close run {} in report: {:#}", report.run_id(), e);
            }
        }

        info!(
            "Run finished in {} ({} added, {} already present, {} not found, {} errors, {} new this run)",
            format_duration(start.elapsed()),
            summary.added,
            summary.already_present,
            summary.not_found,
            summary.errored,
            self.reconciler.added_this_run()
        );
        summary
    }
}

/// Final tally line.
pub fn tally_line(summary: &RunSummary) -> String {
    format!(
        "Processed {} tracks. ({} succeeded / {} failed)",
        summary.processed(),
        summary.success_count,
        summary.failure_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::BlacklistRule;
    use crate::models::{CandidateTrack, DownloadStats};
    use crate::report::status_counts;
    use crate::test_support::{FakeCatalog, FakeFetcher};
    use std::sync::Arc;

    fn driver(catalog: &FakeCatalog) -> BatchDriver<&FakeCatalog> {
        BatchDriver::new(
            Reconciler::new(catalog, BlacklistRule::disabled()),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_summary_counts_each_outcome() {
        let catalog = FakeCatalog::new()
            .with_results("Yesterday The Beatles", vec![FakeCatalog::yesterday()])
            .with_results("Help! The Beatles", vec![CandidateTrack::new("t2", "Help!", vec!["The Beatles"])])
            .with_favorite("t2");
        let tracks = vec![
            SourceTrack::new("Yesterday", vec!["The Beatles"]),
            SourceTrack::new("Help!", vec!["The Beatles"]),
            SourceTrack::new("Unknown Obscure Track", Vec::<String>::new()),
        ];

        let summary = driver(&catalog).run(&tracks);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.already_present, 1);
        assert_eq!(summary.not_found, 1);
        assert!(summary.downloads.is_none());
        assert_eq!(tally_line(&summary), "Processed 3 tracks. (2 succeeded / 1 failed)");
    }

    #[test]
    fn test_pause_only_between_tracks() {
        let delay = Duration::from_millis(50);
        let catalog = FakeCatalog::new();
        let tracks = vec![
            SourceTrack::new("One", vec!["X"]),
            SourceTrack::new("Two", vec!["X"]),
            SourceTrack::new("Three", vec!["X"]),
        ];

        let start = Instant::now();
        let summary = BatchDriver::new(Reconciler::new(&catalog, BlacklistRule::disabled()), delay)
            .run(&tracks);
        let elapsed = start.elapsed();

        assert_eq!(summary.processed(), 3);
        // Two pauses for three tracks, none before the first
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 3, "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_failed_track_does_not_stop_run() {
        let catalog = FakeCatalog::new()
            .with_failing_query("Broken X")
            .with_results("Yesterday The Beatles", vec![FakeCatalog::yesterday()]);
        let tracks = vec![
            SourceTrack::new("Broken", vec!["X"]),
            SourceTrack::new("Yesterday", vec!["The Beatles"]),
        ];

        let summary = driver(&catalog).run(&tracks);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.success_count, 1);
        assert_eq!(catalog.adds(), vec!["t1"]);
    }

    #[test]
    fn test_downloads_follow_policy() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_results("Yesterday The Beatles", vec![FakeCatalog::yesterday()])
            .with_results("Help! The Beatles", vec![CandidateTrack::new("t2", "Help!", vec!["The Beatles"])])
            .with_favorite("t2");
        let fetcher = Arc::new(FakeFetcher::default());
        let pool = DownloadPool::start(1, 2, fetcher.clone(), dir.path().to_path_buf()).unwrap();
        let policy = DownloadPolicy {
            enabled: true,
            favorites_too: false,
        };
        let tracks = vec![
            SourceTrack::new("Yesterday", vec!["The Beatles"]),
            SourceTrack::new("Help!", vec!["The Beatles"]),
        ];

        let summary = driver(&catalog).with_downloads(pool, policy).run(&tracks);
        assert_eq!(
            summary.downloads,
            Some(DownloadStats {
                completed: 1,
                skipped: 0,
                failed: 0
            })
        );
        assert_eq!(*fetcher.fetched.lock().unwrap(), vec!["t1".to_string()]);
        assert!(dir.path().join("The Beatles - Yesterday.m4a").exists());
    }

    #[test]
    fn test_report_gets_every_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.sqlite3");
        let catalog = FakeCatalog::new()
            .with_failing_query("Broken X")
            .with_results("Yesterday The Beatles", vec![FakeCatalog::yesterday()]);
        let tracks = vec![
            SourceTrack::new("Broken", vec!["X"]),
            SourceTrack::new("Yesterday", vec!["The Beatles"]),
            SourceTrack::new("Unknown Obscure Track", Vec::<String>::new()),
        ];

        let report = RunReport::create(&path, tracks.len()).unwrap();
        let run_id = report.run_id();
        driver(&catalog).with_report(report).run(&tracks);

        let reopened = RunReport::create(&path, 0).unwrap();
        let counts = status_counts(reopened.connection(), run_id).unwrap();
        assert_eq!(
            counts,
            vec![
                ("added".to_string(), 1),
                ("error".to_string(), 1),
                ("not_found".to_string(), 1)
            ]
        );
        let success: i64 = reopened
            .connection()
            .query_row("SELECT success_count FROM runs WHERE id = ?1", [run_id], |row| row.get(0))
            .unwrap();
        assert_eq!(success, 1);
    }
}
