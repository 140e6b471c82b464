// SPDX-License-Identifier: GPL-3.0-only

//! Lookup-table paging and suggestion reconciliation.
//!
//! The input method only ever exposes one page of candidates, and only
//! accepts selection by index on the page it currently has loaded. When the
//! on-screen keyboard wants a flat list of every candidate, this session
//! pages through the whole table to collect them, then pages back to the
//! first page. Selecting a candidate by its text pages until that text is on
//! the loaded page and then selects it by index.
//!
//! # States
//!
//! - `Default`: accumulating first lines while paging down.
//! - `Reset`: paging back up to the first page after a full scan.
//! - `Search`: paging down looking for a candidate.
//! - `SearchReverse`: paging up looking for a candidate.
//!
//! The session never talks to the bus itself. Each step returns at most one
//! [`PagingRequest`] for the caller to execute.
//!
//! # Paging rounds
//!
//! Every page request is tagged with the current round. [`SuggestionSession::reset`]
//! starts a new round, so a reply to a request issued before the reset is
//! recognised as stale and ignored.

use crate::protocol::first_line;
use crate::state::LookupTable;

/// Reconciler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Default,
    Reset,
    Search,
    SearchReverse,
}

/// Action the caller must perform on the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingRequest {
    PageUp,
    PageDown,
    /// Select the candidate at this index of the loaded page.
    Select(usize),
}

/// Flattened suggestion state for one composition.
#[derive(Debug, Clone)]
pub struct SuggestionSession {
    status: Status,
    accumulated: Vec<String>,
    pending_candidate: Option<String>,
    locked: bool,
    scan_complete: bool,
    round: u64,
    in_flight: Option<u64>,
    search_visits: u32,
    max_search_pages: u32,
}

impl SuggestionSession {
    /// Creates a session that gives up a text search after `max_search_pages`.
    pub fn new(max_search_pages: u32) -> Self {
        Self {
            status: Status::Default,
            accumulated: Vec::new(),
            pending_candidate: None,
            locked: false,
            scan_complete: false,
            round: 0,
            in_flight: None,
            search_visits: 0,
            max_search_pages: max_search_pages.max(1),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Every candidate collected so far, in page order.
    pub fn accumulated(&self) -> &[String] {
        &self.accumulated
    }

    pub fn pending_candidate(&self) -> Option<&str> {
        self.pending_candidate.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_max_search_pages(&mut self, max_search_pages: u32) {
        self.max_search_pages = max_search_pages.max(1);
    }

    /// Returns to `Default` with nothing accumulated and starts a new round.
    ///
    /// A page request still outstanding becomes stale.
    pub fn reset(&mut self) {
        self.status = Status::Default;
        self.accumulated.clear();
        self.pending_candidate = None;
        self.locked = false;
        self.scan_complete = false;
        self.search_visits = 0;
        self.round = self.round.wrapping_add(1);
    }

    /// Resets and forgets any outstanding request, for when the service that
    /// would have answered it is gone.
    pub fn abandon(&mut self) {
        self.reset();
        self.in_flight = None;
    }

    /// Feeds a newly loaded page.
    ///
    /// `flatten` is whether a flat list of all suggestions is wanted; without
    /// it nothing is accumulated.
    pub fn on_page(&mut self, table: &LookupTable, flatten: bool) -> Option<PagingRequest> {
        let stale = self.in_flight.take().is_some_and(|round| round != self.round);

        if table.is_clear() {
            self.reset();
            return None;
        }
        if stale {
            tracing::debug!("Ignoring lookup table page from a previous paging round");
            return None;
        }

        let request = match self.status {
            Status::Default => self.accumulate(table, flatten),
            Status::Reset => {
                if table.has_prev {
                    Some(PagingRequest::PageUp)
                } else {
                    self.finish_scan();
                    None
                }
            }
            Status::Search | Status::SearchReverse => self.reconcile(table),
        };

        self.track(request)
    }

    /// Starts chasing `candidate` and tries the loaded page first.
    pub fn select_by_text(&mut self, candidate: &str, table: &LookupTable) -> Option<PagingRequest> {
        self.pending_candidate = Some(candidate.to_owned());
        self.status = Status::Search;
        self.search_visits = 0;

        let request = self.reconcile(table);
        self.track(request)
    }

    fn accumulate(&mut self, table: &LookupTable, flatten: bool) -> Option<PagingRequest> {
        if self.locked || !flatten {
            return None;
        }
        if self.scan_complete {
            self.accumulated.clear();
            self.scan_complete = false;
        }

        self.accumulated
            .extend(table.texts.iter().map(|text| first_line(text).to_owned()));

        if table.has_next {
            Some(PagingRequest::PageDown)
        } else if table.has_prev {
            self.status = Status::Reset;
            self.locked = true;
            Some(PagingRequest::PageUp)
        } else {
            self.finish_scan();
            None
        }
    }

    fn finish_scan(&mut self) {
        self.status = Status::Default;
        self.locked = false;
        self.scan_complete = true;
    }

    fn reconcile(&mut self, table: &LookupTable) -> Option<PagingRequest> {
        let Some(candidate) = self.pending_candidate.as_deref() else {
            self.status = Status::Default;
            return None;
        };

        if let Some(index) = table
            .texts
            .iter()
            .position(|text| first_line(text) == candidate)
        {
            self.reset();
            return Some(PagingRequest::Select(index));
        }

        self.search_visits += 1;
        if !table.has_next {
            self.status = Status::SearchReverse;
        }

        let exhausted = self.status == Status::SearchReverse && !table.has_prev;
        if exhausted || self.search_visits >= self.max_search_pages {
            tracing::warn!(
                "Candidate {:?} not found after {} pages, giving up",
                candidate,
                self.search_visits
            );
            self.reset();
            return None;
        }

        match self.status {
            Status::SearchReverse => Some(PagingRequest::PageUp),
            _ => Some(PagingRequest::PageDown),
        }
    }

    fn track(&mut self, request: Option<PagingRequest>) -> Option<PagingRequest> {
        if matches!(
            request,
            Some(PagingRequest::PageUp) | Some(PagingRequest::PageDown)
        ) {
            self.in_flight = Some(self.round);
        }
        request
    }
}

impl Default for SuggestionSession {
    fn default() -> Self {
        Self::new(crate::app_settings::DEFAULT_MAX_SEARCH_PAGES)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(texts: &[&str], has_prev: bool, has_next: bool) -> LookupTable {
        LookupTable {
            labels: (1..=texts.len()).map(|i| i.to_string()).collect(),
            texts: texts.iter().map(|s| s.to_string()).collect(),
            cursor: 0,
            has_prev,
            has_next,
            ..LookupTable::default()
        }
    }

    fn cleared() -> LookupTable {
        LookupTable::default()
    }

    /// Test: A three-page scan accumulates in order, then walks back to page one.
    #[test]
    fn test_full_scan_and_reset() {
        let mut session = SuggestionSession::default();
        let p1 = page(&["a", "b"], false, true);
        let p2 = page(&["c\nnote", "d"], true, true);
        let p3 = page(&["e"], true, false);

        assert_eq!(session.on_page(&p1, true), Some(PagingRequest::PageDown));
        assert_eq!(session.on_page(&p2, true), Some(PagingRequest::PageDown));
        assert_eq!(session.on_page(&p3, true), Some(PagingRequest::PageUp));

        assert_eq!(session.accumulated(), ["a", "b", "c", "d", "e"]);
        assert_eq!(session.status(), Status::Reset);
        assert!(session.is_locked());

        assert_eq!(session.on_page(&p2, true), Some(PagingRequest::PageUp));
        assert_eq!(session.status(), Status::Reset);
        assert!(session.is_locked(), "Still locked while walking back");

        assert_eq!(session.on_page(&p1, true), None);
        assert_eq!(session.status(), Status::Default);
        assert!(!session.is_locked(), "Unlocked once page one is reached");
        assert_eq!(session.accumulated(), ["a", "b", "c", "d", "e"]);
    }

    /// Test: A fresh table after a completed scan starts a new accumulation.
    #[test]
    fn test_new_table_after_scan_starts_over() {
        let mut session = SuggestionSession::default();
        assert_eq!(session.on_page(&page(&["a"], false, false), true), None);
        assert_eq!(session.accumulated(), ["a"]);

        assert_eq!(
            session.on_page(&page(&["x", "y"], false, true), true),
            Some(PagingRequest::PageDown)
        );
        assert_eq!(session.accumulated(), ["x", "y"]);
    }

    /// Test: Nothing is accumulated when no flat list is wanted.
    #[test]
    fn test_no_accumulation_without_flatten() {
        let mut session = SuggestionSession::default();
        assert_eq!(session.on_page(&page(&["a"], false, true), false), None);
        assert!(session.accumulated().is_empty());
    }

    /// Test: Clearing the table forces the session back to default.
    #[test]
    fn test_clear_table_resets() {
        let mut session = SuggestionSession::default();
        session.on_page(&page(&["a"], false, true), true);
        session.on_page(&page(&["b"], true, false), true);
        assert_eq!(session.status(), Status::Reset);

        assert_eq!(session.on_page(&cleared(), true), None);
        assert_eq!(session.status(), Status::Default);
        assert!(session.accumulated().is_empty());
        assert!(!session.is_locked());

        let mut blank = page(&["a", "b"], false, true);
        blank.labels = vec![String::new(), String::new()];
        session.on_page(&page(&["a"], false, true), true);
        assert_eq!(session.on_page(&blank, true), None);
        assert!(session.accumulated().is_empty(), "Blank labels also clear");
    }

    /// Test: A candidate on the loaded page is selected immediately.
    #[test]
    fn test_select_on_current_page() {
        let mut session = SuggestionSession::default();
        let p = page(&["bar", "baz", "foo\nnote"], false, true);
        session.on_page(&p, true);

        assert_eq!(session.select_by_text("foo", &p), Some(PagingRequest::Select(2)));
        assert_eq!(session.status(), Status::Default);
        assert!(session.accumulated().is_empty());
        assert_eq!(session.pending_candidate(), None);
    }

    /// Test: A candidate not on the page pages forward once.
    #[test]
    fn test_select_pages_forward() {
        let mut session = SuggestionSession::default();
        let p1 = page(&["a", "b"], false, true);

        assert_eq!(session.select_by_text("z", &p1), Some(PagingRequest::PageDown));
        assert_eq!(session.status(), Status::Search);
        assert_eq!(session.pending_candidate(), Some("z"));

        let p2 = page(&["y", "z"], true, false);
        assert_eq!(session.on_page(&p2, false), Some(PagingRequest::Select(1)));
        assert_eq!(session.status(), Status::Default);
    }

    /// Test: Reaching the last page turns the search around.
    #[test]
    fn test_select_reverses_at_end() {
        let mut session = SuggestionSession::default();
        let last = page(&["e", "f"], true, false);

        assert_eq!(session.select_by_text("a", &last), Some(PagingRequest::PageUp));
        assert_eq!(session.status(), Status::SearchReverse);

        let middle = page(&["c", "d"], true, true);
        assert_eq!(session.on_page(&middle, false), Some(PagingRequest::PageUp));
        assert_eq!(session.status(), Status::SearchReverse);

        let first = page(&["a", "b"], false, true);
        assert_eq!(session.on_page(&first, false), Some(PagingRequest::Select(0)));
    }

    /// Test: An unmatched search ends after one full traversal.
    #[test]
    fn test_unmatched_search_terminates() {
        let mut session = SuggestionSession::default();
        let p1 = page(&["a"], false, true);
        let p2 = page(&["b"], true, false);

        assert_eq!(session.select_by_text("zzz", &p1), Some(PagingRequest::PageDown));
        assert_eq!(session.on_page(&p2, false), Some(PagingRequest::PageUp));
        assert_eq!(session.on_page(&p1, false), None, "Back at page one, give up");
        assert_eq!(session.status(), Status::Default);
        assert_eq!(session.pending_candidate(), None);
    }

    /// Test: A single page with no match gives up without paging.
    #[test]
    fn test_unmatched_single_page() {
        let mut session = SuggestionSession::default();
        assert_eq!(session.select_by_text("zzz", &page(&["a"], false, false)), None);
        assert_eq!(session.status(), Status::Default);
    }

    /// Test: The page cap bounds a search whose table never ends.
    #[test]
    fn test_search_page_cap() {
        let mut session = SuggestionSession::new(3);
        let endless = page(&["a"], true, true);

        assert_eq!(session.select_by_text("zzz", &endless), Some(PagingRequest::PageDown));
        assert_eq!(session.on_page(&endless, false), Some(PagingRequest::PageDown));
        assert_eq!(session.on_page(&endless, false), None);
        assert_eq!(session.status(), Status::Default);
    }

    /// Test: A reply to a request issued before a reset is ignored.
    #[test]
    fn test_stale_reply_is_ignored() {
        let mut session = SuggestionSession::default();
        let p1 = page(&["a"], false, true);
        assert_eq!(session.on_page(&p1, true), Some(PagingRequest::PageDown));

        session.reset();

        let p2 = page(&["b"], true, false);
        assert_eq!(session.on_page(&p2, true), None, "Stale reply is dropped");
        assert!(session.accumulated().is_empty());

        assert_eq!(session.on_page(&p1, true), Some(PagingRequest::PageDown));
        assert_eq!(session.accumulated(), ["a"], "Later pages are processed");
    }

    /// Test: Abandoning forgets the outstanding request.
    #[test]
    fn test_abandon_forgets_in_flight() {
        let mut session = SuggestionSession::default();
        session.on_page(&page(&["a"], false, true), true);

        session.abandon();

        assert_eq!(
            session.on_page(&page(&["b"], false, true), true),
            Some(PagingRequest::PageDown)
        );
        assert_eq!(session.accumulated(), ["b"]);
    }

    /// Test: Selection preempts an in-progress scan.
    #[test]
    fn test_selection_preempts_scan() {
        let mut session = SuggestionSession::default();
        let p1 = page(&["a", "b"], false, true);
        session.on_page(&p1, true);

        assert_eq!(session.select_by_text("b", &p1), Some(PagingRequest::Select(1)));
        assert_eq!(session.status(), Status::Default);
        assert!(session.accumulated().is_empty());
    }
}
