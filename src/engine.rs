//! Reconciliation of one source track against the destination catalog.
//!
//! For each query attempt: search, drop blacklisted candidates, pick the best
//! remaining one, then add it to favorites unless it is already there. The first
//! attempt that leaves any candidate settles the track; later attempts are never
//! issued.

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::blacklist::BlacklistRule;
use crate::catalog::DestinationCatalog;
use crate::error::ReconcileError;
use crate::models::{CandidateTrack, Outcome, ScoredCandidate, SourceTrack};
use crate::scoring::best;
use crate::strategy::query_rounds;

/// Result of resolving one source track.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub matched: Option<ScoredCandidate>, // None when NotFound
    pub query: Option<String>,            // Query that produced the match
    pub attempts: usize,                  // Searches issued
}

pub struct Reconciler<C> {
    catalog: C,
    blacklist: BlacklistRule,
    // Ids added during this run. Consulted after the remote favorites answer
    // "absent" so a match shared by two source tracks is never added twice.
    added_this_run: FxHashSet<String>,
}

impl<C: DestinationCatalog> Reconciler<C> {
    pub fn new(catalog: C, blacklist: BlacklistRule) -> Self {
        Self {
            catalog,
            blacklist,
            added_this_run: FxHashSet::default(),
        }
    }

    pub fn added_this_run(&self) -> usize {
        self.added_this_run.len()
    }

    pub fn resolve(&mut self, track: &SourceTrack) -> Result<Resolution, ReconcileError> {
        let mut attempts = 0;

        for round in query_rounds(track) {
            match &round.artist {
                Some(artist) => debug!("Trying with '{}' artist name", artist),
                None => debug!("Trying without any artist name"),
            }

            for attempt in round.attempts {
                attempts += 1;
                let query = attempt.query();
                info!("Searching destination catalog (query: {})", query);

                let results = self
                    .catalog
                    .search(&query)
                    .map_err(|source| ReconcileError::Search {
                        query: query.clone(),
                        source,
                    })?;
                let found = results.len();
                let candidates = self.blacklist.filter(results);
                if candidates.len() < found {
                    debug!(
                        "Blacklist removed {} of {} candidates",
                        found - candidates.len(),
                        found
                    );
                }

                let Some(scored) = best(&candidates, &attempt.title, track.artists()) else {
                    debug!("Found nothing for '{}'", query);
                    continue;
                };

                debug!(
                    "Best candidate {} (id {}, score {:.3})",
                    scored.candidate, scored.candidate.id, scored.score
                );
                let outcome = self.settle(&scored.candidate)?;
                return Ok(Resolution {
                    outcome,
                    matched: Some(scored),
                    query: Some(query),
                    attempts,
                });
            }
        }

        Ok(Resolution {
            outcome: Outcome::NotFound,
            matched: None,
            query: None,
            attempts,
        })
    }

    fn settle(&mut self, candidate: &CandidateTrack) -> Result<Outcome, ReconcileError> {
        let present = self
            .catalog
            .favorites_contains(&candidate.id)
            .map_err(|source| ReconcileError::FavoritesCheck {
                track_id: candidate.id.clone(),
                source,
            })?;
        if present {
            return Ok(Outcome::AlreadyPresent);
        }
        // The favorites listing can lag behind an add made earlier in this run
        if self.added_this_run.contains(&candidate.id) {
            debug!("{} was added earlier in this run, not adding again", candidate);
            return Ok(Outcome::AlreadyPresent);
        }

        info!("Adding {} to favorites", candidate);
        self.catalog
            .add_to_favorites(&candidate.id)
            .map_err(|source| ReconcileError::FavoritesAdd {
                track_id: candidate.id.clone(),
                source,
            })?;
        self.added_this_run.insert(candidate.id.clone());
        Ok(Outcome::Added)
    }
}
