use thiserror::Error;

/// Why a page fetch failed.
///
/// Stored in the feed state as `last_error`, so it is cheap to clone and
/// carries messages rather than the underlying client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (unreachable host, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}")]
    Server { status: u16 },
    /// The body or the total-count header could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::Server {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
