#![forbid(unsafe_code)]

//! Virtual node trees and the keyed diff/patch engine.
//!
//! A render produces an immutable [`VNode`] tree; [`Patcher::patch`]
//! reconciles it against the previously realized tree, driving a pluggable
//! [`Backend`] with the minimal set of create/move/remove operations. Side
//! effects beyond structure (attributes today, classes/styles/events for
//! richer backends) hang off the [`Module`] hook points.
//!
//! The crate ships one backend, [`MemoryBackend`], an instrumented arena
//! used by the test suite and by headless rendering.

pub mod backend;
pub mod create;
pub mod error;
pub mod memory;
pub mod patch;
pub mod vnode;

pub use backend::{AttrsModule, Backend, Module, NodeId};
pub use create::{h, normalize_children, Child, Normalization};
pub use error::{PatchError, Result};
pub use memory::{MemoryBackend, OpLog};
pub use patch::{same_vnode, Patcher};
pub use vnode::{Key, NodeHooks, VNode, VNodeData, VNodeFlags, VNodeKind};
