//! Symbol provider capability and the retrying fetch loop.
//!
//! Language servers often answer `documentSymbol` with an empty list while they are still
//! indexing. [`fetch_symbols`] retries with a linearly growing delay, and gives up early once
//! its [`RebuildTicket`] has been superseded by a newer edit.

use crate::error::OutlineError;
use crate::outline::{DocumentId, RebuildTicket};
use crate::symbols::DocumentSymbol;
use std::fmt::Display;
use std::time::Duration;

/// A source of raw symbols for a document (typically a language server bridge).
pub trait SymbolProvider {
    /// The error type returned by [`SymbolProvider::document_symbols`].
    type Error: Display;

    /// Fetch the document's symbols. An empty list means "not ready yet or no symbols".
    fn document_symbols(&mut self, document: &DocumentId)
    -> Result<Vec<DocumentSymbol>, Self::Error>;
}

/// Retry policy for empty provider responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of provider calls before giving up.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// The wait after the given (1-based) attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Result of [`fetch_symbols`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The provider returned symbols.
    Symbols(Vec<DocumentSymbol>),
    /// Every attempt came back empty.
    Empty,
    /// A newer rebuild was requested; the result would be discarded anyway.
    Superseded,
}

/// Ask `provider` for symbols, retrying on empty responses according to `policy`.
///
/// `sleep` performs the wait between attempts; hosts pass `std::thread::sleep` or a timer of
/// their own. When `debug` is set, exhaustion is reported as
/// [`OutlineError::SymbolsUnavailable`] instead of [`FetchOutcome::Empty`].
pub fn fetch_symbols<P: SymbolProvider + ?Sized>(
    provider: &mut P,
    ticket: &RebuildTicket,
    policy: &RetryPolicy,
    debug: bool,
    mut sleep: impl FnMut(Duration),
) -> Result<FetchOutcome, OutlineError> {
    let document = ticket.document();
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        if !ticket.is_current() {
            tracing::debug!(uri = %document.uri, attempt, "symbol fetch superseded");
            return Ok(FetchOutcome::Superseded);
        }
        let symbols = provider
            .document_symbols(document)
            .map_err(|err| OutlineError::Provider(err.to_string()))?;
        if !symbols.is_empty() {
            return Ok(FetchOutcome::Symbols(symbols));
        }
        if attempt < max_attempts {
            let delay = policy.delay(attempt);
            tracing::debug!(
                uri = %document.uri,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "no symbols yet, retrying"
            );
            sleep(delay);
        }
    }

    if debug {
        return Err(OutlineError::SymbolsUnavailable {
            document: document.uri.clone(),
            attempts: max_attempts,
        });
    }
    tracing::debug!(uri = %document.uri, "no symbols after retries");
    Ok(FetchOutcome::Empty)
}
