#![forbid(unsafe_code)]

//! Virtual node trees.
//!
//! A `VNode` is an immutable-per-render description of desired structure.
//! The node kind is a closed enum, so patch logic matches exhaustively
//! instead of probing optional fields. Two slots are interior-mutable
//! because patching writes them into the *new* tree while reading the old
//! one: the realized backend node id (`elm`) and an opaque component
//! instance handle carried across patches.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use bitflags::bitflags;

use crate::backend::NodeId;

// ─── Keys and flags ──────────────────────────────────────────────────────────

/// Diff identity for children reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_owned())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

bitflags! {
    /// Render-time markers consumed by the patch engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VNodeFlags: u8 {
        /// Subtree never changes shape across renders.
        const STATIC = 1 << 0;
        /// Produced by [`VNode::cloned`] rather than a fresh render.
        const CLONED = 1 << 1;
        /// Rendered once and reused verbatim afterwards.
        const ONCE = 1 << 2;
    }
}

// ─── Data payload ────────────────────────────────────────────────────────────

/// Lifecycle hooks carried on a node's data payload. Used by component
/// collaborators to mount, update, and unmount instances bound to
/// placeholder nodes.
#[derive(Default)]
pub struct NodeHooks {
    pub init: Option<Box<dyn Fn(&VNode)>>,
    pub prepatch: Option<Box<dyn Fn(&VNode, &VNode)>>,
    pub insert: Option<Box<dyn Fn(&VNode)>>,
    pub destroy: Option<Box<dyn Fn(&VNode)>>,
}

/// Element data payload: identity key, attributes, lifecycle hooks.
#[derive(Default, Clone)]
pub struct VNodeData {
    pub key: Option<Key>,
    pub attrs: AHashMap<String, String>,
    pub hooks: Option<Rc<NodeHooks>>,
}

impl VNodeData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: NodeHooks) -> Self {
        self.hooks = Some(Rc::new(hooks));
        self
    }
}

impl std::fmt::Debug for VNodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VNodeData")
            .field("key", &self.key)
            .field("attrs", &self.attrs)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

// ─── The node itself ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum VNodeKind {
    Element {
        tag: String,
        data: Option<VNodeData>,
        children: Vec<VNode>,
    },
    Text(String),
    Comment(String),
    /// Stands in for a component whose factory has not resolved yet;
    /// realized as an empty comment. Placeholders for the same factory are
    /// patchable into each other.
    AsyncPlaceholder { factory: u64 },
}

#[derive(Clone)]
pub struct VNode {
    kind: VNodeKind,
    key: Option<Key>,
    flags: VNodeFlags,
    elm: Cell<Option<NodeId>>,
    instance: RefCell<Option<Rc<dyn Any>>>,
}

impl std::fmt::Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VNode")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("elm", &self.elm.get())
            .field("instance", &self.instance.borrow().is_some())
            .finish()
    }
}

impl VNode {
    #[must_use]
    pub fn element(tag: impl Into<String>, data: Option<VNodeData>, children: Vec<VNode>) -> Self {
        let key = data.as_ref().and_then(|d| d.key.clone());
        Self {
            kind: VNodeKind::Element {
                tag: tag.into(),
                data,
                children,
            },
            key,
            flags: VNodeFlags::empty(),
            elm: Cell::new(None),
            instance: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Text(content.into()),
            key: None,
            flags: VNodeFlags::empty(),
            elm: Cell::new(None),
            instance: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Comment(content.into()),
            key: None,
            flags: VNodeFlags::empty(),
            elm: Cell::new(None),
            instance: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn async_placeholder(factory: u64) -> Self {
        Self {
            kind: VNodeKind::AsyncPlaceholder { factory },
            key: None,
            flags: VNodeFlags::empty(),
            elm: Cell::new(None),
            instance: RefCell::new(None),
        }
    }

    /// Shallow-meaningful clone for reusing a node across renders (static
    /// subtrees, render-once caches). Carries the realized node id and marks
    /// the copy [`VNodeFlags::CLONED`].
    #[must_use]
    pub fn cloned(&self) -> Self {
        let mut copy = self.clone();
        copy.flags |= VNodeFlags::CLONED;
        copy
    }

    #[must_use]
    pub fn with_flags(mut self, flags: VNodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    // ── Accessors ──

    #[must_use]
    pub fn kind(&self) -> &VNodeKind {
        &self.kind
    }

    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn flags(&self) -> VNodeFlags {
        self.flags
    }

    #[must_use]
    pub fn elm(&self) -> Option<NodeId> {
        self.elm.get()
    }

    pub fn set_elm(&self, elm: Option<NodeId>) {
        self.elm.set(elm);
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&VNodeData> {
        match &self.kind {
            VNodeKind::Element { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[VNode] {
        match &self.kind {
            VNodeKind::Element { children, .. } => children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, VNodeKind::Comment(_))
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, VNodeKind::Text(_))
    }

    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Text(t) | VNodeKind::Comment(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data().is_some()
    }

    /// The `type` attribute, for input-element compatibility checks.
    #[must_use]
    pub fn input_type(&self) -> Option<&str> {
        self.data().and_then(|d| d.attrs.get("type").map(String::as_str))
    }

    pub fn set_instance(&self, instance: Option<Rc<dyn Any>>) {
        *self.instance.borrow_mut() = instance;
    }

    #[must_use]
    pub fn instance(&self) -> Option<Rc<dyn Any>> {
        self.instance.borrow().clone()
    }
}

impl std::fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHooks")
            .field("init", &self.init.is_some())
            .field("prepatch", &self.prepatch.is_some())
            .field("insert", &self.insert.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_comes_from_data() {
        let n = VNode::element("li", Some(VNodeData::new().key(3)), vec![]);
        assert_eq!(n.key(), Some(&Key::Int(3)));
        let n = VNode::element("li", Some(VNodeData::new().key("row")), vec![]);
        assert_eq!(n.key(), Some(&Key::Str("row".into())));
        let n = VNode::element("li", None, vec![]);
        assert_eq!(n.key(), None);
    }

    #[test]
    fn cloned_marks_and_carries_elm() {
        let n = VNode::element("div", None, vec![]).with_flags(VNodeFlags::STATIC);
        n.set_elm(Some(NodeId(7)));
        let c = n.cloned();
        assert!(c.flags().contains(VNodeFlags::CLONED | VNodeFlags::STATIC));
        assert_eq!(c.elm(), Some(NodeId(7)));
        assert!(!n.flags().contains(VNodeFlags::CLONED));
    }

    #[test]
    fn kind_accessors() {
        let t = VNode::text("hi");
        assert!(t.is_text());
        assert_eq!(t.text_content(), Some("hi"));
        assert_eq!(t.tag(), None);
        assert!(t.children().is_empty());

        let c = VNode::comment("note");
        assert!(c.is_comment());

        let e = VNode::element(
            "input",
            Some(VNodeData::new().attr("type", "text")),
            vec![],
        );
        assert_eq!(e.input_type(), Some("text"));
        assert!(e.has_data());
    }
}
