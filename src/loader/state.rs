//! The accumulated feed: items, server total, page cursor, and in-flight flag.

use chrono::{DateTime, Local};

use crate::error::FetchError;
use crate::source::Page;

/// Where the feed is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded yet.
    IdleEmpty,
    /// Some items loaded, more may remain.
    IdlePartial,
    /// A page request is outstanding.
    Loading,
    /// Every record the server reported has been loaded.
    Exhausted,
}

/// Everything the presentation layer may read about the feed.
///
/// Only the loader mutates it: [`begin`](FeedState::begin) at dispatch, and
/// [`apply`](FeedState::apply) / [`fail`](FeedState::fail) at settlement.
#[derive(Debug, Clone)]
pub struct FeedState<R> {
    items: Vec<R>,
    total: u64,
    next_page: u32,
    loading: bool,
    last_error: Option<FetchError>,
    last_loaded_at: Option<DateTime<Local>>,
}

impl<R> Default for FeedState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            next_page: 1,
            loading: false,
            last_error: None,
            last_loaded_at: None,
        }
    }
}

impl<R> FeedState<R> {
    /// Records in arrival order.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Total as last reported by the server; 0 until the first response.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The page the next dispatch will request.
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn last_loaded_at(&self) -> Option<DateTime<Local>> {
        self.last_loaded_at
    }

    /// `total > 0` and every reported record is loaded.
    pub fn is_exhausted(&self) -> bool {
        self.total > 0 && self.items.len() as u64 == self.total
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.is_exhausted() {
            Phase::Exhausted
        } else if self.items.is_empty() {
            Phase::IdleEmpty
        } else {
            Phase::IdlePartial
        }
    }

    /// Mark a request as dispatched; returns the page it should ask for.
    pub(super) fn begin(&mut self) -> u32 {
        self.loading = true;
        self.next_page
    }

    /// Fold a successful page in. Returns how many records were appended.
    ///
    /// An empty response to an empty feed leaves the cursor alone: the first
    /// records a backend receives land on page 1, so that is what the next
    /// attempt must ask for.
    pub(super) fn apply(&mut self, page: Page<R>) -> usize {
        let still_empty = self.items.is_empty() && page.records.is_empty() && page.total == 0;
        let added = page.records.len();
        self.items.extend(page.records);
        self.total = page.total;
        if !still_empty {
            self.next_page += 1;
        }
        self.loading = false;
        self.last_error = None;
        self.last_loaded_at = Some(Local::now());
        added
    }

    pub(super) fn fail(&mut self, error: FetchError) {
        self.loading = false;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(records: Vec<u32>, total: u64) -> Page<u32> {
        Page { records, total }
    }

    #[test]
    fn starts_idle_empty_on_page_one() {
        let state = FeedState::<u32>::default();
        assert_eq!(state.phase(), Phase::IdleEmpty);
        assert_eq!(state.next_page(), 1);
        assert_eq!(state.total(), 0);
        assert!(!state.loading());
    }

    #[test]
    fn apply_appends_and_advances() {
        let mut state = FeedState::default();
        assert_eq!(state.begin(), 1);
        assert_eq!(state.phase(), Phase::Loading);

        assert_eq!(state.apply(page(vec![1, 2], 4)), 2);
        assert_eq!(state.phase(), Phase::IdlePartial);
        assert_eq!(state.next_page(), 2);

        state.begin();
        state.apply(page(vec![3, 4], 4));
        assert_eq!(state.items(), &[1, 2, 3, 4]);
        assert_eq!(state.phase(), Phase::Exhausted);
        assert!(state.last_loaded_at().is_some());
    }

    #[test]
    fn zero_total_is_never_exhausted() {
        let mut state = FeedState::<u32>::default();
        state.begin();
        state.apply(page(vec![], 0));
        assert!(!state.is_exhausted());
        assert_eq!(state.phase(), Phase::IdleEmpty);
    }

    #[test]
    fn empty_response_to_empty_feed_keeps_page_one() {
        let mut state = FeedState::<u32>::default();
        for _ in 0..3 {
            assert_eq!(state.begin(), 1);
            state.apply(page(vec![], 0));
        }
        assert_eq!(state.next_page(), 1);

        assert_eq!(state.begin(), 1);
        state.apply(page(vec![1, 2], 7));
        assert_eq!(state.next_page(), 2);
    }

    #[test]
    fn empty_page_past_loaded_items_still_advances() {
        let mut state = FeedState::default();
        state.begin();
        state.apply(page(vec![1], 3));
        state.begin();
        state.apply(page(vec![], 3));
        assert_eq!(state.next_page(), 3);
    }

    #[test]
    fn fail_clears_loading_and_keeps_cursor() {
        let mut state = FeedState::<u32>::default();
        state.begin();
        state.fail(FetchError::Server { status: 500 });
        assert!(!state.loading());
        assert_eq!(state.next_page(), 1);
        assert_eq!(state.last_error(), Some(&FetchError::Server { status: 500 }));
    }

    #[test]
    fn success_clears_previous_error() {
        let mut state = FeedState::default();
        state.begin();
        state.fail(FetchError::Transport("down".into()));
        state.begin();
        state.apply(page(vec![1], 3));
        assert!(state.last_error().is_none());
    }
}
