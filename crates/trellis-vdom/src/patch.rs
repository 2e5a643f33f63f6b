#![forbid(unsafe_code)]

//! The diff/patch engine.
//!
//! [`Patcher::patch`] reconciles a previously realized tree against a fresh
//! render, reusing backend nodes wherever the two trees describe the same
//! logical node, and otherwise creating, moving, or removing nodes through
//! the [`Backend`] operation set. The children reconciliation is the keyed
//! two-ended diff: four positional comparisons per step, falling back to a
//! lazily built key map (last write wins on duplicates), falling back again
//! to a linear structural scan for unkeyed children.
//!
//! # Invariants
//!
//! 1. The old tree is read-only during a patch except for interior `elm`
//!    and instance slots already populated; the new tree receives all
//!    realized node ids and becomes the retained tree afterwards.
//! 2. Insert hooks fire after the whole patch completes, in creation order.
//! 3. Destroy hooks fire child-before-parent.
//!
//! # Failure Modes
//!
//! Feeding the engine an "old" tree that was never mounted (no realized
//! ids) fails with [`PatchError::MissingElement`] before any mutation.

use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

use crate::backend::{Backend, Module, NodeId};
use crate::error::{PatchError, Result};
use crate::vnode::{Key, VNode, VNodeFlags, VNodeKind};

/// `type` attribute values that an `<input>` can switch between while
/// keeping the same backing element.
const TEXT_INPUT_TYPES: [&str; 7] = [
    "text", "number", "password", "search", "email", "tel", "url",
];

/// Nodes with insert hooks, collected during realization and flushed once
/// the whole patch completes.
type InsertQueue = SmallVec<[VNode; 4]>;

/// Whether two nodes are the same logical node, i.e. eligible for an
/// in-place patch instead of replacement.
#[must_use]
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    if a.key() != b.key() {
        return false;
    }
    match (a.kind(), b.kind()) {
        (
            VNodeKind::AsyncPlaceholder { factory: fa },
            VNodeKind::AsyncPlaceholder { factory: fb },
        ) => fa == fb,
        (VNodeKind::Element { tag: ta, .. }, VNodeKind::Element { tag: tb, .. }) => {
            ta == tb && a.has_data() == b.has_data() && (ta != "input" || same_input_type(a, b))
        }
        (VNodeKind::Text(_), VNodeKind::Text(_)) => true,
        (VNodeKind::Comment(_), VNodeKind::Comment(_)) => true,
        _ => false,
    }
}

fn same_input_type(a: &VNode, b: &VNode) -> bool {
    let (ta, tb) = (a.input_type(), b.input_type());
    ta == tb
        || matches!((ta, tb), (Some(x), Some(y))
            if TEXT_INPUT_TYPES.contains(&x) && TEXT_INPUT_TYPES.contains(&y))
}

fn check_duplicate_keys(children: &[VNode]) {
    let mut seen: AHashSet<&Key> = AHashSet::new();
    for child in children {
        if let Some(key) = child.key() {
            if !seen.insert(key) {
                tracing::warn!(?key, "duplicate key in children; diff proceeds last-write-wins");
            }
        }
    }
}

/// The patch engine, bound to one backend and a module list.
pub struct Patcher<B: Backend> {
    backend: B,
    modules: Vec<Box<dyn Module<B>>>,
}

impl<B: Backend> Patcher<B> {
    /// Engine with the canonical module set (attributes only).
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            modules: vec![Box::new(crate::backend::AttrsModule)],
        }
    }

    /// Engine with an explicit module list.
    #[must_use]
    pub fn with_modules(backend: B, modules: Vec<Box<dyn Module<B>>>) -> Self {
        Self { backend, modules }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Initial mount: realize `vnode` and append it to `container`.
    pub fn mount(&mut self, container: NodeId, vnode: &VNode) -> Result<()> {
        let mut inserted: InsertQueue = SmallVec::new();
        let elm = self.create_elm(vnode, &mut inserted);
        self.backend.append_child(container, elm);
        flush_inserted(&inserted);
        Ok(())
    }

    /// Reconcile `old` (the currently realized tree) against `new`. On
    /// return, `new` carries all realized node ids and replaces `old` as
    /// the retained tree.
    pub fn patch(&mut self, old: &VNode, new: &VNode) -> Result<()> {
        let mut inserted: InsertQueue = SmallVec::new();
        if same_vnode(old, new) {
            self.patch_vnode(old, new, &mut inserted)?;
        } else {
            // Not the same logical node: realize the new tree next to the
            // old root, then drop the old root.
            let old_elm = old.elm().ok_or(PatchError::missing("replaced root"))?;
            let parent = self.backend.parent_node(old_elm);
            let anchor = self.backend.next_sibling(old_elm);
            let new_elm = self.create_elm(new, &mut inserted);
            match parent {
                Some(parent) => {
                    self.backend.insert_before(parent, new_elm, anchor);
                    self.remove_vnodes(parent, std::slice::from_ref(old))?;
                }
                None => self.invoke_destroy(old),
            }
        }
        flush_inserted(&inserted);
        Ok(())
    }

    /// Tear a realized tree down: destroy hooks (child before parent), then
    /// detach its root from the backend tree.
    pub fn unmount(&mut self, vnode: &VNode) -> Result<()> {
        if let Some(elm) = vnode.elm() {
            if let Some(parent) = self.backend.parent_node(elm) {
                return self.remove_vnodes(parent, std::slice::from_ref(vnode));
            }
        }
        self.invoke_destroy(vnode);
        Ok(())
    }

    // ─── Realization ─────────────────────────────────────────────────────────

    fn create_elm(&mut self, vnode: &VNode, inserted: &mut InsertQueue) -> NodeId {
        match vnode.kind() {
            VNodeKind::Element { tag, data, children } => {
                if let Some(init) = data
                    .as_ref()
                    .and_then(|d| d.hooks.as_ref())
                    .and_then(|h| h.init.as_ref())
                {
                    init(vnode);
                }
                let elm = self.backend.create_element(tag);
                vnode.set_elm(Some(elm));
                for child in children {
                    let child_elm = self.create_elm(child, inserted);
                    self.backend.append_child(elm, child_elm);
                }
                if vnode.has_data() {
                    for module in &self.modules {
                        module.create(&mut self.backend, vnode);
                    }
                    let has_insert_hook = data
                        .as_ref()
                        .and_then(|d| d.hooks.as_ref())
                        .is_some_and(|h| h.insert.is_some());
                    if has_insert_hook {
                        inserted.push(vnode.clone());
                    }
                }
                elm
            }
            VNodeKind::Text(content) => {
                let elm = self.backend.create_text(content);
                vnode.set_elm(Some(elm));
                elm
            }
            VNodeKind::Comment(content) => {
                let elm = self.backend.create_comment(content);
                vnode.set_elm(Some(elm));
                elm
            }
            VNodeKind::AsyncPlaceholder { .. } => {
                let elm = self.backend.create_comment("");
                vnode.set_elm(Some(elm));
                elm
            }
        }
    }

    // ─── In-place patch ──────────────────────────────────────────────────────

    fn patch_vnode(&mut self, old: &VNode, new: &VNode, inserted: &mut InsertQueue) -> Result<()> {
        let elm = old
            .elm()
            .ok_or(PatchError::missing("in-place patch target"))?;
        new.set_elm(Some(elm));

        // Static subtrees never change shape; a clone or render-once reuse
        // needs nothing but the carried instance handle.
        if old.flags().contains(VNodeFlags::STATIC)
            && new.flags().contains(VNodeFlags::STATIC)
            && old.key() == new.key()
            && new.flags().intersects(VNodeFlags::CLONED | VNodeFlags::ONCE)
        {
            new.set_instance(old.instance());
            return Ok(());
        }

        if let Some(prepatch) = new
            .data()
            .and_then(|d| d.hooks.as_ref())
            .and_then(|h| h.prepatch.as_ref())
        {
            prepatch(old, new);
        }

        if old.has_data() || new.has_data() {
            for module in &self.modules {
                module.update(&mut self.backend, old, new);
            }
        }

        match (old.kind(), new.kind()) {
            (
                VNodeKind::Element { children: old_ch, .. },
                VNodeKind::Element { children: new_ch, .. },
            ) => {
                if !old_ch.is_empty() && !new_ch.is_empty() {
                    self.update_children(elm, old_ch, new_ch, inserted)?;
                } else if !new_ch.is_empty() {
                    for child in new_ch {
                        let child_elm = self.create_elm(child, inserted);
                        self.backend.append_child(elm, child_elm);
                    }
                } else if !old_ch.is_empty() {
                    self.remove_vnodes(elm, old_ch)?;
                }
            }
            (VNodeKind::Text(old_text), VNodeKind::Text(new_text))
            | (VNodeKind::Comment(old_text), VNodeKind::Comment(new_text)) => {
                if old_text != new_text {
                    self.backend.set_text(elm, new_text);
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ─── Keyed two-ended children diff ───────────────────────────────────────

    #[allow(clippy::too_many_lines)]
    fn update_children(
        &mut self,
        parent: NodeId,
        old_ch: &[VNode],
        new_ch: &[VNode],
        inserted: &mut InsertQueue,
    ) -> Result<()> {
        check_duplicate_keys(new_ch);

        // Old slots matched through the key map are marked consumed instead
        // of being voided in place (the old tree is read-only).
        let mut consumed: SmallVec<[bool; 16]> = SmallVec::from_elem(false, old_ch.len());
        let mut os: i64 = 0;
        let mut oe: i64 = old_ch.len() as i64 - 1;
        let mut ns: i64 = 0;
        let mut ne: i64 = new_ch.len() as i64 - 1;
        let mut key_map: Option<AHashMap<Key, usize>> = None;

        while os <= oe && ns <= ne {
            if consumed[os as usize] {
                os += 1;
                continue;
            }
            if consumed[oe as usize] {
                oe -= 1;
                continue;
            }
            let old_start = &old_ch[os as usize];
            let old_end = &old_ch[oe as usize];
            let new_start = &new_ch[ns as usize];
            let new_end = &new_ch[ne as usize];

            if same_vnode(old_start, new_start) {
                self.patch_vnode(old_start, new_start, inserted)?;
                os += 1;
                ns += 1;
            } else if same_vnode(old_end, new_end) {
                self.patch_vnode(old_end, new_end, inserted)?;
                oe -= 1;
                ne -= 1;
            } else if same_vnode(old_start, new_end) {
                // Node moved right: re-anchor it just past the old tail.
                self.patch_vnode(old_start, new_end, inserted)?;
                let moved = old_start
                    .elm()
                    .ok_or(PatchError::missing("right-moved child"))?;
                let tail = old_end.elm().ok_or(PatchError::missing("move anchor"))?;
                let anchor = self.backend.next_sibling(tail);
                self.backend.insert_before(parent, moved, anchor);
                os += 1;
                ne -= 1;
            } else if same_vnode(old_end, new_start) {
                // Node moved left: re-anchor it just before the old head.
                self.patch_vnode(old_end, new_start, inserted)?;
                let moved = old_end
                    .elm()
                    .ok_or(PatchError::missing("left-moved child"))?;
                let anchor = old_start.elm();
                self.backend.insert_before(parent, moved, anchor);
                oe -= 1;
                ns += 1;
            } else {
                // No positional match. Look the new head up in the (lazily
                // built) key map; unkeyed children fall back to a linear
                // structural scan of the live window.
                let map = key_map.get_or_insert_with(|| {
                    let mut m = AHashMap::new();
                    for (i, slot) in old_ch
                        .iter()
                        .enumerate()
                        .take(oe as usize + 1)
                        .skip(os as usize)
                    {
                        if let Some(key) = slot.key() {
                            m.insert(key.clone(), i);
                        }
                    }
                    m
                });
                let live = os as usize..=oe as usize;
                let found = match new_start.key() {
                    Some(key) => map
                        .get(key)
                        .copied()
                        .filter(|i| live.contains(i) && !consumed[*i]),
                    None => old_ch
                        .iter()
                        .enumerate()
                        .take(oe as usize + 1)
                        .skip(os as usize)
                        .find(|(i, slot)| !consumed[*i] && same_vnode(slot, new_start))
                        .map(|(i, _)| i),
                };
                let anchor = old_start.elm();
                match found {
                    Some(i) if same_vnode(&old_ch[i], new_start) => {
                        self.patch_vnode(&old_ch[i], new_start, inserted)?;
                        consumed[i] = true;
                        let moved = new_start
                            .elm()
                            .ok_or(PatchError::missing("key-matched child"))?;
                        self.backend.insert_before(parent, moved, anchor);
                    }
                    // Key found but structurally different (e.g. same key,
                    // new tag), or nothing found: brand-new node.
                    _ => {
                        let created = self.create_elm(new_start, inserted);
                        self.backend.insert_before(parent, created, anchor);
                    }
                }
                ns += 1;
            }
        }

        if os > oe {
            // Old window exhausted: everything left in the new window is an
            // insertion, anchored before the first already-patched node to
            // the right (or appended if there is none).
            let anchor = new_ch
                .get((ne + 1) as usize)
                .and_then(VNode::elm);
            for i in ns..=ne {
                let created = self.create_elm(&new_ch[i as usize], inserted);
                self.backend.insert_before(parent, created, anchor);
            }
        } else if ns > ne {
            for i in os..=oe {
                if !consumed[i as usize] {
                    self.remove_vnodes(parent, std::slice::from_ref(&old_ch[i as usize]))?;
                }
            }
        }
        Ok(())
    }

    // ─── Teardown ────────────────────────────────────────────────────────────

    fn remove_vnodes(&mut self, parent: NodeId, vnodes: &[VNode]) -> Result<()> {
        for vnode in vnodes {
            self.invoke_destroy(vnode);
            let elm = vnode.elm().ok_or(PatchError::missing("removed node"))?;
            for module in &self.modules {
                module.remove(&mut self.backend, vnode);
            }
            self.backend.remove_child(parent, elm);
        }
        Ok(())
    }

    /// Destroy hooks, child before parent.
    fn invoke_destroy(&mut self, vnode: &VNode) {
        for child in vnode.children() {
            self.invoke_destroy(child);
        }
        if let Some(destroy) = vnode
            .data()
            .and_then(|d| d.hooks.as_ref())
            .and_then(|h| h.destroy.as_ref())
        {
            destroy(vnode);
        }
        if vnode.has_data() {
            for module in &self.modules {
                module.destroy(vnode);
            }
        }
    }
}

fn flush_inserted(inserted: &[VNode]) {
    for vnode in inserted {
        if let Some(insert) = vnode
            .data()
            .and_then(|d| d.hooks.as_ref())
            .and_then(|h| h.insert.as_ref())
        {
            insert(vnode);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
