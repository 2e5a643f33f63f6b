#![forbid(unsafe_code)]

//! Backend parameterization.
//!
//! The patch engine never touches a real node tree directly: it drives a
//! fixed operation set ([`Backend`]) plus a list of side-effect modules
//! ([`Module`]) invoked at create/update/destroy/remove points. The same
//! engine therefore targets any tree-shaped output (a browser-style DOM, a
//! terminal scene graph, the in-memory arena used by the test suite).

use ahash::AHashMap;

use crate::vnode::VNode;

/// Opaque handle to one realized node, minted by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// The fixed operation set the patch engine drives. All operations are
/// infallible from the engine's point of view; a backend that cannot honor
/// one has a bug upstream of this interface.
pub trait Backend {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_comment(&mut self, text: &str) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Insert `node` into `parent` before `reference`; `None` appends.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>);
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn set_text(&mut self, node: NodeId, text: &str);
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);
}

/// A side-effect module hooked into the patch engine. Attribute, class,
/// style, and event appliers register as modules; each hook defaults to a
/// no-op so a module implements only the points it cares about.
pub trait Module<B: Backend> {
    /// A node was just realized (its element exists, children attached).
    fn create(&self, backend: &mut B, vnode: &VNode) {
        let _ = (backend, vnode);
    }

    /// An in-place patch is comparing two payloads on the same element.
    fn update(&self, backend: &mut B, old: &VNode, new: &VNode) {
        let _ = (backend, old, new);
    }

    /// A node's element is about to leave the tree.
    fn remove(&self, backend: &mut B, vnode: &VNode) {
        let _ = (backend, vnode);
    }

    /// A node is being destroyed (children included, child before parent).
    fn destroy(&self, vnode: &VNode) {
        let _ = vnode;
    }
}

/// The canonical module: applies the `attrs` payload.
pub struct AttrsModule;

impl<B: Backend> Module<B> for AttrsModule {
    fn create(&self, backend: &mut B, vnode: &VNode) {
        let Some(elm) = vnode.elm() else { return };
        let Some(data) = vnode.data() else { return };
        for (name, value) in &data.attrs {
            backend.set_attribute(elm, name, value);
        }
    }

    fn update(&self, backend: &mut B, old: &VNode, new: &VNode) {
        let Some(elm) = new.elm() else { return };
        static EMPTY: std::sync::LazyLock<AHashMap<String, String>> =
            std::sync::LazyLock::new(AHashMap::new);
        let old_attrs = old.data().map_or(&*EMPTY, |d| &d.attrs);
        let new_attrs = new.data().map_or(&*EMPTY, |d| &d.attrs);

        for (name, value) in new_attrs {
            if old_attrs.get(name) != Some(value) {
                backend.set_attribute(elm, name, value);
            }
        }
        for name in old_attrs.keys() {
            if !new_attrs.contains_key(name) {
                backend.remove_attribute(elm, name);
            }
        }
    }
}
