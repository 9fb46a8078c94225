//! Error types for propsync-sync.
//!
//! Fetch failures and write failures are separate types so call sites can
//! apply different policies: a [`FetchError`] aborts the run, a [`WriteError`]
//! is recorded in the write report and the batch continues.

use thiserror::Error;

use propsync_core::{ExternalId, OperationKind};

/// Longest response body kept in a [`HttpError::Status`] message.
const BODY_SNIPPET_LEN: usize = 512;

/// A single failed HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be read or decoded.
    #[error("malformed response body: {0}")]
    Decode(#[source] std::io::Error),
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let mut body = response.into_string().unwrap_or_default();
                if body.len() > BODY_SNIPPET_LEN {
                    let mut cut = BODY_SNIPPET_LEN;
                    while !body.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    body.truncate(cut);
                    body.push('…');
                }
                HttpError::Status { status, body }
            }
            ureq::Error::Transport(transport) => HttpError::Transport(Box::new(transport)),
        }
    }
}

/// Failure retrieving one of the two datasets. Fatal for the run.
#[derive(Debug, Error)]
#[error("failed to fetch {dataset}: {source}")]
pub struct FetchError {
    pub dataset: &'static str,
    #[source]
    pub source: HttpError,
}

impl FetchError {
    pub(crate) fn new(dataset: &'static str, source: impl Into<HttpError>) -> Self {
        Self {
            dataset,
            source: source.into(),
        }
    }
}

/// Failure applying one operation to the store. Collected, never propagated.
#[derive(Debug, Error)]
#[error("{kind} of property {external_id} failed: {source}")]
pub struct WriteError {
    pub kind: OperationKind,
    pub external_id: ExternalId,
    #[source]
    pub source: HttpError,
}
