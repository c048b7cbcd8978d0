//! Scoring functions for matching source tracks against catalog candidates.
//!
//! This module contains:
//! - Positional character similarity between titles
//! - Element overlap between artist lists
//! - Candidate ranking and best-candidate selection

use rustc_hash::FxHashSet;

use crate::models::{is_no_artist, CandidateTrack, ScoredCandidate};

// ============================================================================
// Similarity
// ============================================================================

/// Share of positions holding the same character, over the longer string's length.
///
/// Positional only: "Song" against "Song (Remix)" scores 4/12. Case and
/// diacritics are compared as-is.
pub fn common_character_rate(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 0.0;
    }

    let equal = a
        .chars()
        .zip(b.chars())
        .filter(|(ca, cb)| ca == cb)
        .count();

    equal as f64 / longer as f64
}

/// Elements of the shorter list found anywhere in the longer one, over the
/// longer list's length. `a` counts as the shorter list when lengths are equal.
pub fn common_element_rate(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let lookup: FxHashSet<&str> = longer.iter().map(String::as_str).collect();

    let common = shorter
        .iter()
        .filter(|element| lookup.contains(element.as_str()))
        .count();

    common as f64 / longer.len() as f64
}

// ============================================================================
// Ranking
// ============================================================================

/// Score a single candidate. Title similarity always counts; artist overlap is
/// added only when both sides carry real artist data.
pub fn score_candidate(candidate: &CandidateTrack, title: &str, artists: &[String]) -> f64 {
    let mut score = common_character_rate(title, &candidate.display_name);
    if !is_no_artist(artists) && !candidate.artists.is_empty() {
        score += common_element_rate(artists, &candidate.artists);
    }
    score
}

/// Score every candidate, keeping the catalog's order.
pub fn rank(candidates: &[CandidateTrack], title: &str, artists: &[String]) -> Vec<ScoredCandidate> {
    candidates
        .iter()
        .map(|candidate| ScoredCandidate {
            score: score_candidate(candidate, title, artists),
            candidate: candidate.clone(),
        })
        .collect()
}

/// Highest-scoring candidate, first one wins on ties. `None` without candidates.
pub fn best(candidates: &[CandidateTrack], title: &str, artists: &[String]) -> Option<ScoredCandidate> {
    rank(candidates, title, artists)
        .into_iter()
        .fold(None, |best: Option<ScoredCandidate>, scored| match best {
            Some(current) if current.score >= scored.score => Some(current),
            _ => Some(scored),
        })
}
