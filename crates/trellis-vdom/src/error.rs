#![forbid(unsafe_code)]

//! Patch-engine failures.
//!
//! The backend operation set is infallible, so the only structural failure
//! mode is an old tree whose realized node ids are missing or inconsistent
//! (i.e. the caller fed the engine a tree it never mounted). These are not
//! recovered locally; they propagate to the `patch` caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatchError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A node that should have been realized carries no backend node id.
    #[error("virtual node has no realized element: {context}")]
    MissingElement { context: &'static str },
}

impl PatchError {
    pub(crate) fn missing(context: &'static str) -> Self {
        Self::MissingElement { context }
    }
}
