#![forbid(unsafe_code)]

//! An in-memory arena backend.
//!
//! Drives no real UI; exists so the patch engine can be tested and its DOM
//! traffic measured. Every mutating operation is tallied in an [`OpLog`], so
//! tests assert on exactly how many creations, insertions, moves, and
//! removals a diff produced. Detached nodes stay in the arena (slots are
//! never reused); "removal" only unlinks.

use std::collections::BTreeMap;

use crate::backend::{Backend, NodeId};

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tally of mutating backend operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpLog {
    pub created: u32,
    /// First attachments of a node.
    pub inserted: u32,
    /// Re-attachments of a node that already had a parent.
    pub moved: u32,
    pub removed: u32,
    pub text_sets: u32,
    pub attr_sets: u32,
    pub attr_removes: u32,
}

impl OpLog {
    /// Total structural mutations (everything except attribute/text writes).
    #[must_use]
    pub fn structural(&self) -> u32 {
        self.created + self.inserted + self.moved + self.removed
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    nodes: Vec<Node>,
    ops: OpLog,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> OpLog {
        self.ops
    }

    pub fn reset_ops(&mut self) {
        self.ops = OpLog::default();
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.ops.created += 1;
        id
    }

    /// Unlink `node` from its current parent, if any. Returns whether it was
    /// attached.
    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|c| *c != node);
        self.node_mut(node).parent = None;
        true
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let was_attached = self.detach(node);
        let children = &mut self.node_mut(parent).children;
        match reference.and_then(|r| children.iter().position(|c| *c == r)) {
            Some(pos) => children.insert(pos, node),
            None => children.push(node),
        }
        self.node_mut(node).parent = Some(parent);
        if was_attached {
            self.ops.moved += 1;
        } else {
            self.ops.inserted += 1;
        }
    }

    /// Children of a node, in order (test helper).
    #[must_use]
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    /// Attribute lookup (test helper).
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.node(node).data {
            NodeData::Element { attrs, .. } => attrs.get(name).cloned(),
            _ => None,
        }
    }

    /// Serialize a subtree to markup-ish text, for snapshot-style asserts.
    #[must_use]
    pub fn render_to_string(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                out.push('>');
                for child in &self.node(id).children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl Backend for MemoryBackend {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_owned(),
            attrs: BTreeMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_owned()))
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_owned()))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, None);
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.attach(parent, node, reference);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).parent == Some(parent) && self.detach(child) {
            self.ops.removed += 1;
        }
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        match &mut self.node_mut(node).data {
            NodeData::Text(t) | NodeData::Comment(t) => *t = text.to_owned(),
            NodeData::Element { .. } => {}
        }
        self.ops.text_sets += 1;
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(node).data {
            attrs.insert(name.to_owned(), value.to_owned());
            self.ops.attr_sets += 1;
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(node).data {
            if attrs.remove(name).is_some() {
                self.ops.attr_removes += 1;
            }
        }
    }
}
