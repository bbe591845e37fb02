//! Ordered endpoint probing.
//!
//! Sonar's REST paths and payload shapes drift between GG releases, so most
//! operations try a list of historically observed candidates. The rules:
//!
//! - the first candidate whose result is accepted wins;
//! - a plausible but unconvincing result (for example an empty object) is
//!   kept as a fallback and returned only if nothing is accepted;
//! - per-candidate errors are swallowed until the list is exhausted, then the
//!   last one is returned.
//!
//! There is no retry: one pass over the list is authoritative.

use tracing::debug;

use crate::error::{SonarError, SonarResult};

/// How a candidate's result is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Use this result and stop probing.
    Accept,
    /// Keep as a fallback and continue.
    Fallback,
    /// Ignore and continue.
    Reject,
}

/// Try `candidates` in order.
///
/// `attempt` performs one request; `judge` classifies a successful result.
/// `what` names the endpoint in the error when no candidate produced
/// anything and no request failed.
///
/// # Errors
/// Returns the last candidate error when nothing was accepted and there is no
/// fallback, or [`SonarError::InvalidArgument`] if there was no error either.
pub fn try_candidates_in_order<C, T>(
    candidates: impl IntoIterator<Item = C>,
    what: &str,
    mut attempt: impl FnMut(&C) -> SonarResult<T>,
    mut judge: impl FnMut(&T) -> Verdict,
) -> SonarResult<T> {
    let mut fallback = None;
    let mut last_error = None;

    for candidate in candidates {
        match attempt(&candidate) {
            Ok(result) => match judge(&result) {
                Verdict::Accept => return Ok(result),
                Verdict::Fallback => {
                    if fallback.is_none() {
                        fallback = Some(result);
                    }
                }
                Verdict::Reject => {}
            },
            Err(err) => {
                debug!(error = %err, what, "Candidate failed");
                last_error = Some(err);
            }
        }
    }

    if let Some(result) = fallback {
        return Ok(result);
    }
    Err(last_error
        .unwrap_or_else(|| SonarError::InvalidArgument(format!("could not resolve Sonar {what}"))))
}
