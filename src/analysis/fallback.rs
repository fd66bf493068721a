//! Generic first-success fallback chain.
//!
//! An ordered list of candidates is attempted one by one; the first attempt
//! that succeeds and passes the acceptance check wins and short-circuits the
//! rest. Attempt failures and rejected results are logged and skipped.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

/// Try `candidates` in order, returning the first accepted result.
///
/// `attempt` runs a candidate; `accept` decides whether its output counts as
/// a success (e.g. a non-empty listing). Returns `None` when every candidate
/// fails or is rejected.
pub async fn first_success<C, T, E, F, Fut, A>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
    mut accept: A,
) -> Option<T>
where
    C: Display,
    E: Display,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    A: FnMut(&T) -> bool,
{
    for candidate in candidates {
        let label = candidate.to_string();
        match attempt(candidate).await {
            Ok(value) if accept(&value) => {
                debug!("Candidate {} succeeded", label);
                return Some(value);
            }
            Ok(_) => {
                debug!("Candidate {} returned no usable data", label);
            }
            Err(e) => {
                warn!("Candidate {} failed: {}", label, e);
            }
        }
    }

    None
}
