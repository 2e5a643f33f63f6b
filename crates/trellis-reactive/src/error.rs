#![forbid(unsafe_code)]

//! Error taxonomy for the reactive core.

use thiserror::Error;

use crate::dep::WatcherId;

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A mutation was attempted where the reactivity contract is violated,
    /// e.g. inserting into a frozen [`ReactiveMap`](crate::ReactiveMap).
    #[error("invalid mutation: {reason}")]
    InvalidMutation { reason: String },

    /// A watcher re-queued itself more than the flush threshold allows.
    /// Surfaced through [`scheduler::drain_loop_reports`](crate::scheduler::drain_loop_reports);
    /// the flush itself continues past the offender.
    #[error("infinite update loop detected in watcher {watcher:?}")]
    InfiniteUpdateLoop { watcher: WatcherId },
}

impl ReactiveError {
    pub fn invalid_mutation(reason: impl Into<String>) -> Self {
        Self::InvalidMutation {
            reason: reason.into(),
        }
    }
}

pub(crate) fn invalid_mutation(reason: impl Into<String>) -> ReactiveError {
    ReactiveError::invalid_mutation(reason)
}
