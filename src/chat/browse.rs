//! Browsing sequencer: a narrow state overlay over the two built-in web
//! tools. The first time browsing is enabled it forces a fixed order
//! (search, then fetch), then relaxes to free tool choice.

use crate::tools::web::{FETCH_TOOL, SEARCH_TOOL};

/// Phases of the forced two-step browsing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowsePhase {
    /// Browsing disabled
    Idle,
    /// Browsing just enabled; next directive mandates the search tool
    AwaitingSearch,
    /// A search result list is the most recent tool result; next directive
    /// mandates the fetch tool
    AwaitingFetchChoice,
    /// A page has been fetched (or there was nothing to fetch); the model
    /// chooses freely
    Free,
}

#[derive(Debug)]
pub struct BrowseSequencer {
    phase: BrowsePhase,
    search_only: bool,
    /// Set while the previous directive was a sequencer mandate; a
    /// caller-forced tool is disallowed in that window to avoid issuing
    /// conflicting directives back to back.
    after_mandate: bool,
}

impl BrowseSequencer {
    pub fn disabled() -> Self {
        Self {
            phase: BrowsePhase::Idle,
            search_only: false,
            after_mandate: false,
        }
    }

    pub fn enabled(search_only: bool) -> Self {
        Self {
            phase: BrowsePhase::AwaitingSearch,
            search_only,
            after_mandate: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != BrowsePhase::Idle
    }

    pub fn phase(&self) -> BrowsePhase {
        self.phase
    }

    /// Tool the sequencer mandates for the next request, if any.
    pub fn mandated_tool(&self) -> Option<&'static str> {
        match self.phase {
            BrowsePhase::AwaitingSearch => Some(SEARCH_TOOL),
            BrowsePhase::AwaitingFetchChoice => Some(FETCH_TOOL),
            _ => None,
        }
    }

    /// Record that the directive just issued was a sequencer mandate.
    pub fn note_mandate_issued(&mut self) {
        self.after_mandate = true;
    }

    /// Record that a free (non-mandated) directive was issued.
    pub fn note_free_directive(&mut self) {
        self.after_mandate = false;
    }

    /// A caller-forced tool is disallowed immediately after a mandated step.
    pub fn blocks_forced_tool(&self) -> bool {
        self.mandated_tool().is_some() || self.after_mandate
    }

    /// A search result was appended; an empty result set means there is
    /// nothing to fetch, and search-only mode never mandates a fetch.
    pub fn note_search_result(&mut self, hit_count: usize) {
        if self.phase == BrowsePhase::Idle {
            return;
        }
        self.phase = if hit_count == 0 || self.search_only {
            BrowsePhase::Free
        } else {
            BrowsePhase::AwaitingFetchChoice
        };
    }

    /// A page was fetched successfully; tool choice relaxes to auto.
    pub fn note_fetch_succeeded(&mut self) {
        if self.phase != BrowsePhase::Idle {
            self.phase = BrowsePhase::Free;
        }
    }
}

/// Remove the candidate matching `url` from a serialized search result
/// list, for the in-place rewrite after a failed page fetch. Returns the
/// rewritten JSON and the number of candidates left, or `None` when the
/// content is not a result list.
pub fn remove_candidate(results_json: &str, url: &str) -> Option<(String, usize)> {
    let mut hits: Vec<serde_json::Value> = serde_json::from_str(results_json).ok()?;
    hits.retain(|hit| hit.get("url").and_then(|u| u.as_str()) != Some(url));
    let remaining = hits.len();
    let rewritten = serde_json::to_string(&hits).ok()?;
    Some((rewritten, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_order_search_then_fetch_then_free() {
        let mut seq = BrowseSequencer::enabled(false);
        assert_eq!(seq.mandated_tool(), Some(SEARCH_TOOL));

        seq.note_search_result(3);
        assert_eq!(seq.mandated_tool(), Some(FETCH_TOOL));

        seq.note_fetch_succeeded();
        assert_eq!(seq.phase(), BrowsePhase::Free);
        assert_eq!(seq.mandated_tool(), None);
    }

    #[test]
    fn empty_search_result_relaxes_immediately() {
        let mut seq = BrowseSequencer::enabled(false);
        seq.note_search_result(0);
        assert_eq!(seq.phase(), BrowsePhase::Free);
    }

    #[test]
    fn search_only_mode_never_mandates_fetch() {
        let mut seq = BrowseSequencer::enabled(true);
        seq.note_search_result(5);
        assert_eq!(seq.phase(), BrowsePhase::Free);
    }

    #[test]
    fn disabled_sequencer_mandates_nothing() {
        let mut seq = BrowseSequencer::disabled();
        assert!(!seq.is_enabled());
        assert_eq!(seq.mandated_tool(), None);
        seq.note_search_result(4);
        assert_eq!(seq.phase(), BrowsePhase::Idle);
    }

    #[test]
    fn forced_tool_blocked_during_and_right_after_mandates() {
        let mut seq = BrowseSequencer::enabled(false);
        assert!(seq.blocks_forced_tool());

        seq.note_mandate_issued();
        seq.note_search_result(2);
        assert!(seq.blocks_forced_tool());

        seq.note_mandate_issued();
        seq.note_fetch_succeeded();
        // first free iteration still follows a mandate
        assert!(seq.blocks_forced_tool());

        seq.note_free_directive();
        assert!(!seq.blocks_forced_tool());
    }

    #[test]
    fn remove_candidate_filters_matching_url() {
        let results = serde_json::json!([
            { "title": "a", "url": "https://a.example", "snippet": "" },
            { "title": "b", "url": "https://b.example", "snippet": "" }
        ])
        .to_string();

        let (rewritten, remaining) = remove_candidate(&results, "https://a.example").unwrap();
        assert_eq!(remaining, 1);
        assert!(!rewritten.contains("a.example"));
        assert!(rewritten.contains("b.example"));
    }

    #[test]
    fn remove_candidate_rejects_non_list_content() {
        assert!(remove_candidate("not json", "https://a.example").is_none());
    }
}
