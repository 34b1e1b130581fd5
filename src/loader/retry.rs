//! The empty-feed retry timer.
//!
//! A spawned task that posts a [`LoaderEvent::RetryTick`] into the loader's
//! event channel every period.  The loader owns at most one of these; dropping
//! the handle aborts the task, so a timer can never outlive its loader.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::LoaderEvent;

pub(super) struct RetryTimer {
    handle: JoinHandle<()>,
}

impl RetryTimer {
    /// Start ticking. The first tick fires one full `period` from now.
    pub(super) fn arm<R: Send + 'static>(
        period: Duration,
        generation: u64,
        events: UnboundedSender<LoaderEvent<R>>,
    ) -> Self {
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Receiver gone means the loader was dropped.
                if events.send(LoaderEvent::RetryTick { generation }).is_err() {
                    return;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
