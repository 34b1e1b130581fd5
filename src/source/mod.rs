//! Page source abstraction layer.
//!
//! This module defines the [`PageSource`] trait, the [`Page`] a source hands
//! back, and the [`Incident`] record the application displays.  The concrete
//! HTTP implementation lives in [`http`].
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `fixture.rs`).
//! 2. Define a struct and implement [`PageSource`] for it.
//! 3. Add the module below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` instead of [`HttpIncidentSource`].
//!
//! The loader, the retry timer, and the UI are all source-agnostic.

mod http;
mod incident;

pub use http::HttpIncidentSource;
pub use incident::Incident;

use std::future::Future;

use crate::error::FetchError;

/// One page of records plus the total the server reported alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub total: u64,
}

/// Trait that every paginated source must implement.
///
/// The loader calls [`fetch_page()`](PageSource::fetch_page) from a spawned
/// tokio task, so implementations must be [`Send`] + [`Sync`] and their
/// futures [`Send`].
pub trait PageSource: Send + Sync + 'static {
    /// The record type carried by each page.
    type Record: Send + 'static;

    /// Human-readable label shown in the status bar.
    fn name(&self) -> &str;

    /// Fetch page `page` (1-based).
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Page<Self::Record>, FetchError>> + Send;
}
