#![forbid(unsafe_code)]

//! Runtime glue: mount roots that re-render reactively.
//!
//! [`trellis_reactive`] tracks which state a render function reads;
//! [`trellis_vdom`] reconciles what it produces. This crate binds the two:
//! a [`MountRoot`] is a render watcher whose evaluation renders and patches,
//! so state mutations flow through the scheduler into minimal backend
//! mutations, one coalesced pass per [`trellis_reactive::scheduler::flush`].

pub mod error;
pub mod mount;

pub use error::{RenderError, Result};
pub use mount::{MountRoot, RootOptions};
