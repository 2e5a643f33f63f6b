#![forbid(unsafe_code)]

//! Mount roots.
//!
//! A [`MountRoot`] owns one render function, the tree it last produced, and
//! a [`Patcher`] bound to a backend container. Internally it is a render
//! watcher: the render function's reactive reads are tracked, and any
//! mutation of those values queues a re-render with the scheduler. Driving
//! a tick with [`trellis_reactive::scheduler::flush`] re-renders every
//! invalidated root exactly once.
//!
//! # Failure Modes
//!
//! A failing render is isolated to its root: the error is logged, stashed
//! for [`MountRoot::take_error`], and the previously rendered tree stays in
//! place. The screen never goes blank because one render threw.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_reactive::{Watcher, WatcherOptions};
use trellis_vdom::{Backend, NodeId, Patcher, VNode};

use crate::error::{RenderError, Result};

type RenderFn = Box<dyn Fn() -> Result<VNode>>;

struct RootState<B: Backend> {
    patcher: Patcher<B>,
    container: NodeId,
    tree: Option<VNode>,
    render: RenderFn,
    last_error: Option<RenderError>,
    renders: u64,
}

impl<B: Backend> RootState<B> {
    fn render_and_patch(&mut self) {
        let new = match (self.render)() {
            Ok(tree) => tree,
            Err(err) => {
                tracing::error!(error = %err, "render failed; keeping previous tree");
                self.last_error = Some(err);
                return;
            }
        };
        let outcome = match self.tree.as_ref() {
            Some(old) => self.patcher.patch(old, &new),
            None => self.patcher.mount(self.container, &new),
        };
        match outcome {
            Ok(()) => {
                self.tree = Some(new);
                self.renders += 1;
            }
            Err(err) => {
                tracing::error!(error = %err, "patch failed; keeping previous tree");
                self.last_error = Some(RenderError::from(err));
            }
        }
    }
}

/// One mounted render function. Dropping the root tears its watcher down;
/// the rendered tree stays in the backend unless [`unmount`] is called.
///
/// [`unmount`]: MountRoot::unmount
pub struct MountRoot<B: Backend + 'static> {
    state: Rc<RefCell<RootState<B>>>,
    watcher: Watcher<()>,
}

impl<B: Backend + 'static> MountRoot<B> {
    /// Mount `render` into `container`, rendering once immediately. An
    /// initial render failure leaves the container empty; the error is
    /// available via [`take_error`](Self::take_error) and rendering retries
    /// on the next invalidation.
    pub fn new(
        patcher: Patcher<B>,
        container: NodeId,
        render: impl Fn() -> Result<VNode> + 'static,
    ) -> Self {
        Self::with_options(patcher, container, render, RootOptions::default())
    }

    pub fn with_options(
        patcher: Patcher<B>,
        container: NodeId,
        render: impl Fn() -> Result<VNode> + 'static,
        options: RootOptions,
    ) -> Self {
        let state = Rc::new(RefCell::new(RootState {
            patcher,
            container,
            tree: None,
            render: Box::new(render),
            last_error: None,
            renders: 0,
        }));
        let getter_state = Rc::clone(&state);
        let watcher = Watcher::new(
            move || getter_state.borrow_mut().render_and_patch(),
            None,
            WatcherOptions {
                before: options.before,
                on_updated: options.on_updated,
                ..WatcherOptions::default()
            },
        );
        Self { state, watcher }
    }

    /// Number of completed render+patch passes.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.state.borrow().renders
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.borrow().tree.is_some()
    }

    /// The most recent render or patch failure, if any, clearing it.
    pub fn take_error(&self) -> Option<RenderError> {
        self.state.borrow_mut().last_error.take()
    }

    /// Inspect the backend (rendering snapshots, assertions).
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(self.state.borrow().patcher.backend())
    }

    /// Stop tracking and tear the rendered tree down.
    pub fn unmount(self) -> Result<()> {
        self.watcher.teardown();
        let mut state = self.state.borrow_mut();
        let RootState { patcher, tree, .. } = &mut *state;
        if let Some(tree) = tree.take() {
            patcher.unmount(&tree)?;
        }
        Ok(())
    }
}

/// Optional hooks around a root's re-renders, forwarded to the underlying
/// watcher: `before` runs just before a flush re-renders this root,
/// `on_updated` after the whole flush settles.
#[derive(Default)]
pub struct RootOptions {
    pub before: Option<Box<dyn Fn()>>,
    pub on_updated: Option<Box<dyn Fn()>>,
}
