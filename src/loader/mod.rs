//! Incremental page loading.
//!
//! [`IncidentFeedLoader`] owns the [`FeedState`] and is the only thing that
//! mutates it.  Fetches run on spawned tokio tasks and report back over an
//! unbounded channel; the owner drains that channel on its own context
//! ([`pump`](IncidentFeedLoader::pump) from the UI tick, or
//! [`settle`](IncidentFeedLoader::settle) from async code), so state is only
//! ever touched from one place.
//!
//! ## Triggers
//!
//! * [`start`](IncidentFeedLoader::start) is the mount trigger.
//! * Every settled page that grows the item list fires the same trigger
//!   again, so the feed keeps paging until it is exhausted.
//! * While the list is empty a single repeating [retry timer](retry) calls
//!   [`load_next_page`](IncidentFeedLoader::load_next_page) every
//!   [`LoaderConfig::retry_interval`].
//!
//! All three end up in `load_next_page`, whose guards (in-flight, exhausted)
//! make redundant calls free.

mod retry;
mod state;

pub use state::{FeedState, Phase};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time;

use crate::error::FetchError;
use crate::source::{Page, PageSource};
use retry::RetryTimer;

/// Tunables for a loader instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// How often to retry while the feed is still empty.
    pub retry_interval: Duration,
    /// Upper bound on a single page request.
    pub request_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a [`load_next_page`](IncidentFeedLoader::load_next_page) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A request for `page` is now in flight.
    Dispatched { page: u32 },
    /// Another request is still outstanding; nothing was sent.
    InFlight,
    /// Every reported record is loaded; nothing was sent.
    Exhausted,
}

/// Something the presentation layer may want to report.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedChange {
    PageLoaded { page: u32, added: usize, total: u64 },
    PageFailed { page: u32, error: FetchError },
    RetryFired { dispatch: Dispatch },
}

/// Messages posted into the loader by fetch tasks and the retry timer.
///
/// Each carries the generation it was issued under; anything from an older
/// generation is dropped on arrival.
pub(crate) enum LoaderEvent<R> {
    Settled {
        generation: u64,
        page: u32,
        result: Result<Page<R>, FetchError>,
    },
    RetryTick {
        generation: u64,
    },
}

pub struct IncidentFeedLoader<S: PageSource> {
    source: Arc<S>,
    config: LoaderConfig,
    state: FeedState<S::Record>,
    /// Bumped on [`reset`](Self::reset); completions from older generations are stale.
    generation: u64,
    events_tx: UnboundedSender<LoaderEvent<S::Record>>,
    events_rx: UnboundedReceiver<LoaderEvent<S::Record>>,
    /// At most one timer; dropping it (or the loader) cancels it.
    retry: Option<RetryTimer>,
}

impl<S: PageSource> IncidentFeedLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            config,
            state: FeedState::default(),
            generation: 0,
            events_tx,
            events_rx,
            retry: None,
        }
    }

    pub fn state(&self) -> &FeedState<S::Record> {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn retry_armed(&self) -> bool {
        self.retry.is_some()
    }

    /// Mount trigger. Safe to call repeatedly.
    pub fn start(&mut self) {
        self.on_state_change();
    }

    /// Request the next page unless one is in flight or the feed is exhausted.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_next_page(&mut self) -> Dispatch {
        if self.state.loading() {
            return Dispatch::InFlight;
        }
        if self.state.is_exhausted() {
            return Dispatch::Exhausted;
        }

        let page = self.state.begin();
        info!("{}: requesting page {page}", self.source.name());

        let source = Arc::clone(&self.source);
        let timeout = self.config.request_timeout;
        let mut settle = SettleGuard {
            events: self.events_tx.clone(),
            generation: self.generation,
            page,
            sent: false,
        };
        tokio::spawn(async move {
            let result = match time::timeout(timeout, source.fetch_page(page)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Transport(format!(
                    "request timed out after {}s",
                    timeout.as_secs_f32()
                ))),
            };
            settle.send(result);
        });

        Dispatch::Dispatched { page }
    }

    /// Apply every event that has already arrived, without waiting.
    pub fn pump(&mut self) -> Vec<FeedChange> {
        let mut changes = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            changes.extend(self.handle(event));
        }
        changes
    }

    /// Wait for the next event that changes something and apply it.
    pub async fn settle(&mut self) -> Option<FeedChange> {
        loop {
            let event = self.events_rx.recv().await?;
            if let Some(change) = self.handle(event) {
                return Some(change);
            }
        }
    }

    /// Throw the feed away and start over from page 1.
    ///
    /// In-flight requests from before the reset still complete, but their
    /// results are discarded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.retry = None;
        self.state = FeedState::default();
        info!("{}: feed reset (generation {})", self.source.name(), self.generation);
        self.on_state_change();
    }

    /// Lifecycle hook, subscribed to item-list changes: load, then decide on
    /// the retry timer from the item count observed right now.
    fn on_state_change(&mut self) {
        self.load_next_page();
        let loaded = self.state.items().len();
        self.update_retry(loaded);
    }

    fn update_retry(&mut self, loaded: usize) {
        if loaded == 0 && self.retry.is_none() {
            debug!(
                "{}: feed empty, retrying every {:?}",
                self.source.name(),
                self.config.retry_interval
            );
            self.retry = Some(RetryTimer::arm(
                self.config.retry_interval,
                self.generation,
                self.events_tx.clone(),
            ));
        } else if loaded > 0 && self.retry.take().is_some() {
            debug!("{}: feed has {loaded} items, retry disarmed", self.source.name());
        }
    }

    fn handle(&mut self, event: LoaderEvent<S::Record>) -> Option<FeedChange> {
        match event {
            LoaderEvent::Settled { generation, page, .. } if generation != self.generation => {
                debug!("discarding stale page {page} from generation {generation}");
                None
            }
            LoaderEvent::Settled {
                page,
                result: Ok(fetched),
                ..
            } => {
                let total = fetched.total;
                let added = self.state.apply(fetched);
                info!(
                    "{}: page {page} added {added} items ({}/{total})",
                    self.source.name(),
                    self.state.items().len()
                );
                if added > 0 {
                    self.on_state_change();
                }
                Some(FeedChange::PageLoaded { page, added, total })
            }
            LoaderEvent::Settled {
                page,
                result: Err(error),
                ..
            } => {
                warn!("{}: page {page} failed: {error}", self.source.name());
                self.state.fail(error.clone());
                Some(FeedChange::PageFailed { page, error })
            }
            LoaderEvent::RetryTick { generation } => {
                // A tick can be queued just before the timer was disarmed.
                if generation != self.generation || self.retry.is_none() {
                    return None;
                }
                let dispatch = self.load_next_page();
                debug!("{}: retry tick -> {dispatch:?}", self.source.name());
                if !self.state.items().is_empty() {
                    self.retry = None;
                }
                Some(FeedChange::RetryFired { dispatch })
            }
        }
    }
}

/// Guarantees exactly one `Settled` event per dispatched request.
///
/// If the fetch task unwinds or is dropped by the runtime before it reports,
/// the drop posts a failure instead, so `loading` can never stay stuck.
struct SettleGuard<R> {
    events: UnboundedSender<LoaderEvent<R>>,
    generation: u64,
    page: u32,
    sent: bool,
}

impl<R> SettleGuard<R> {
    fn send(&mut self, result: Result<Page<R>, FetchError>) {
        self.sent = true;
        // Loader dropped: the result has nowhere to go.
        let _ = self.events.send(LoaderEvent::Settled {
            generation: self.generation,
            page: self.page,
            result,
        });
    }
}

impl<R> Drop for SettleGuard<R> {
    fn drop(&mut self) {
        if !self.sent {
            self.send(Err(FetchError::Transport(
                "request task ended without a response".into(),
            )));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
