#![forbid(unsafe_code)]

//! Trellis: a reactive rendering core.
//!
//! State lives in observable containers ([`Reactive`], [`ReactiveList`],
//! [`ReactiveMap`]); render functions read that state and return a
//! [`VNode`] tree; a [`MountRoot`] tracks exactly what each render read and
//! re-renders it when that state changes, reconciling the new tree against
//! the old one with a keyed diff so the backend sees minimal mutations.
//!
//! Mutations coalesce: any number of synchronous writes produce one
//! re-render per affected root on the next [`scheduler::flush`].
//!
//! ```
//! use trellis::prelude::*;
//!
//! let mut backend = MemoryBackend::new();
//! let container = backend.create_element("app");
//! let count = Reactive::new(0i64);
//!
//! let source = count.clone();
//! let root = MountRoot::new(Patcher::new(backend), container, move || {
//!     Ok(VNode::element(
//!         "p",
//!         None,
//!         vec![VNode::text(source.get().to_string())],
//!     ))
//! });
//!
//! count.set(1);
//! count.set(2);
//! scheduler::flush();
//!
//! assert_eq!(root.renders(), 2); // initial mount + one coalesced update
//! root.with_backend(|b| {
//!     assert_eq!(b.render_to_string(container), "<app><p>2</p></app>");
//! });
//! ```

pub use trellis_reactive as reactive;
pub use trellis_runtime as runtime;
pub use trellis_vdom as vdom;

pub use trellis_reactive::{
    scheduler, Computed, Dep, Reactive, ReactiveError, ReactiveList, ReactiveMap, Watcher,
    WatcherOptions,
};
pub use trellis_runtime::{MountRoot, RenderError, RootOptions};
pub use trellis_vdom::{
    h, Backend, Child, Key, MemoryBackend, Normalization, NodeHooks, NodeId, PatchError, Patcher,
    VNode, VNodeData, VNodeFlags, VNodeKind,
};

/// Everything a typical render-function author needs.
pub mod prelude {
    pub use trellis_reactive::{scheduler, Computed, Reactive, ReactiveList, ReactiveMap};
    pub use trellis_runtime::{MountRoot, RenderError, RootOptions};
    pub use trellis_vdom::{
        h, Backend, Child, Key, MemoryBackend, Normalization, NodeId, Patcher, VNode, VNodeData,
        VNodeFlags,
    };
}
