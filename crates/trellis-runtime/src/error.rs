#![forbid(unsafe_code)]

//! Runtime failures.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The render function itself failed. The previous tree stays on
    /// screen; re-renders resume once the underlying state recovers.
    #[error("render function failed: {reason}")]
    Render { reason: String },

    /// The patch engine rejected the reconciliation.
    #[error(transparent)]
    Patch(#[from] trellis_vdom::PatchError),
}

impl RenderError {
    pub fn render(reason: impl Into<String>) -> Self {
        Self::Render {
            reason: reason.into(),
        }
    }
}
