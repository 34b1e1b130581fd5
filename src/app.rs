use log::debug;
use ratatui::widgets::ListState;

use crate::loader::{Dispatch, FeedChange, IncidentFeedLoader};
use crate::source::{Incident, PageSource};

/// Scrolling within this fraction of the end of the list asks for more.
const END_REACHED_THRESHOLD: f32 = 0.2;

pub struct App<S: PageSource<Record = Incident>> {
    /// Owns the feed; the UI only ever reads it.
    pub loader: IncidentFeedLoader<S>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Incident opened with Enter, shown in the detail panel.
    pub detail: Option<Incident>,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
}

impl<S: PageSource<Record = Incident>> App<S> {
    pub fn new(loader: IncidentFeedLoader<S>) -> Self {
        Self {
            loader,
            list_state: ListState::default(),
            detail: None,
            quit: false,
            status: "Starting…".into(),
        }
    }

    pub fn incidents(&self) -> &[Incident] {
        self.loader.state().items()
    }

    /// Mount: kick off the first page.
    pub fn start(&mut self) {
        self.loader.start();
        self.status = format!("Loading {}…", self.loader.source().name());
    }

    /// Apply whatever the loader has received since the last tick.
    pub fn tick(&mut self) {
        for change in self.loader.pump() {
            self.report(change);
        }
    }

    fn report(&mut self, change: FeedChange) {
        match change {
            FeedChange::PageLoaded { page, added, total } => {
                self.status = format!(
                    "Page {page}: +{added} ({}/{total})",
                    self.incidents().len()
                );
            }
            FeedChange::PageFailed { page, error } => {
                self.status = format!("Error loading page {page}: {error}");
            }
            FeedChange::RetryFired {
                dispatch: Dispatch::Dispatched { page },
            } => {
                self.status = format!("No incidents yet, retrying (page {page})…");
            }
            FeedChange::RetryFired { .. } => {}
        }
    }

    // -- feed actions --------------------------------------------------------

    /// Explicit "load more" / refresh.
    pub fn load_more(&mut self) {
        self.status = match self.loader.load_next_page() {
            Dispatch::Dispatched { page } => format!("Loading page {page}…"),
            Dispatch::InFlight => "Already loading…".into(),
            Dispatch::Exhausted => {
                format!("All {} incidents loaded", self.loader.state().total())
            }
        };
    }

    /// Drop everything and page again from the start.
    pub fn reset(&mut self) {
        self.loader.reset();
        self.list_state.select(None);
        self.detail = None;
        self.status = "Reloading…".into();
    }

    fn end_reached(&mut self) {
        let len = self.incidents().len();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let remaining = len.saturating_sub(selected + 1);
        if (remaining as f32) <= len as f32 * END_REACHED_THRESHOLD {
            let dispatch = self.loader.load_next_page();
            debug!("end reached at {selected}/{len}: {dispatch:?}");
        }
    }

    // -- selection -----------------------------------------------------------

    pub fn selected_incident(&self) -> Option<&Incident> {
        self.list_state
            .selected()
            .and_then(|i| self.incidents().get(i))
    }

    /// Hand the selected incident to the detail view.
    pub fn open_selected(&mut self) {
        self.detail = self.selected_incident().cloned();
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        let len = self.incidents().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.end_reached();
    }

    pub fn select_previous(&mut self) {
        if self.incidents().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.incidents().is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.incidents().len();
        if len > 0 {
            self.list_state.select(Some(len - 1));
            self.end_reached();
        }
    }
}
