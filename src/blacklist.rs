//! Exclusion rules applied to catalog candidates before ranking.

use crate::models::CandidateTrack;
use crate::scoring::common_element_rate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlacklistRule {
    pub enabled: bool,
    pub excluded_artists: Vec<String>,
    pub excluded_substrings: Vec<String>,
}

impl BlacklistRule {
    /// Build a rule, dropping blank entries. An empty substring would match
    /// every display name.
    pub fn new(enabled: bool, artists: Vec<String>, substrings: Vec<String>) -> Self {
        Self {
            enabled,
            excluded_artists: artists.into_iter().filter(|a| !a.trim().is_empty()).collect(),
            excluded_substrings: substrings.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// True when the candidate survives the rule.
    pub fn allows(&self, candidate: &CandidateTrack) -> bool {
        if !self.enabled {
            return true;
        }

        let artist_ok = self.excluded_artists.is_empty()
            || common_element_rate(&self.excluded_artists, &candidate.artists) == 0.0;
        let name_ok = !self
            .excluded_substrings
            .iter()
            .any(|s| candidate.display_name.contains(s.as_str()));

        artist_ok && name_ok
    }

    /// Keep the allowed candidates in their original order.
    pub fn filter(&self, candidates: Vec<CandidateTrack>) -> Vec<CandidateTrack> {
        if !self.enabled {
            return candidates;
        }
        candidates.into_iter().filter(|c| self.allows(c)).collect()
    }
}
