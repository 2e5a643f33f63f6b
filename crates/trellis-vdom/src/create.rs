#![forbid(unsafe_code)]

//! VNode construction for render functions.
//!
//! [`h`] is the entry point handed to render functions. Its children
//! argument arrives in different shapes depending on who authored the
//! render function (compiled templates emit near-flat output, hand-written
//! ones nest freely), so the caller states how much normalization it needs.

use crate::vnode::{VNode, VNodeData};

/// One child as supplied by a render function: already a node, loose text,
/// or a nested batch (e.g. the output of a loop).
#[derive(Debug, Clone)]
pub enum Child {
    Node(VNode),
    Text(String),
    List(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(n: VNode) -> Self {
        Child::Node(n)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_owned())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

impl<C: Into<Child>> From<Vec<C>> for Child {
    fn from(items: Vec<C>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

/// How much reshaping the children argument needs before it becomes part of
/// the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Trust the input to be flat (compiled-template output).
    #[default]
    None,
    /// Flatten one level of nesting (compiled output containing loop
    /// results).
    Simple,
    /// Flatten recursively and merge adjacent text (hand-written render
    /// functions).
    Full,
}

/// Build an element node, normalizing children per `norm`.
#[must_use]
pub fn h(
    tag: impl Into<String>,
    data: Option<VNodeData>,
    children: Vec<Child>,
    norm: Normalization,
) -> VNode {
    VNode::element(tag, data, normalize_children(children, norm))
}

/// Reshape a children argument into a flat node list.
#[must_use]
pub fn normalize_children(children: Vec<Child>, norm: Normalization) -> Vec<VNode> {
    match norm {
        // With a typed children value there is nothing to probe at runtime;
        // both of these flatten exactly one level.
        Normalization::None | Normalization::Simple => {
            let mut out = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Child::Node(n) => out.push(n),
                    Child::Text(t) => out.push(VNode::text(t)),
                    Child::List(nested) => {
                        for inner in nested {
                            match inner {
                                Child::Node(n) => out.push(n),
                                Child::Text(t) => out.push(VNode::text(t)),
                                Child::List(_) => {
                                    tracing::warn!(
                                        "children nested deeper than simple normalization \
                                         handles; use full normalization"
                                    );
                                }
                            }
                        }
                    }
                }
            }
            out
        }
        Normalization::Full => {
            let mut out = Vec::with_capacity(children.len());
            flatten_full(children, &mut out);
            out
        }
    }
}

/// Recursive flatten with adjacent-text merging. Empty text is dropped.
fn flatten_full(children: Vec<Child>, out: &mut Vec<VNode>) {
    for child in children {
        match child {
            Child::Node(n) => {
                // Merge a text node into a preceding text node.
                if n.is_text() {
                    if let Some(prev) = out.last_mut() {
                        if prev.is_text() {
                            let merged = format!(
                                "{}{}",
                                prev.text_content().unwrap_or(""),
                                n.text_content().unwrap_or("")
                            );
                            *prev = VNode::text(merged);
                            continue;
                        }
                    }
                }
                out.push(n);
            }
            Child::Text(t) => {
                if t.is_empty() {
                    continue;
                }
                if let Some(prev) = out.last_mut() {
                    if prev.is_text() {
                        let merged = format!("{}{}", prev.text_content().unwrap_or(""), t);
                        *prev = VNode::text(merged);
                        continue;
                    }
                }
                out.push(VNode::text(t));
            }
            Child::List(nested) => flatten_full(nested, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(nodes: &[VNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| {
                n.text_content()
                    .map(str::to_owned)
                    .unwrap_or_else(|| n.tag().unwrap_or("?").to_owned())
            })
            .collect()
    }

    #[test]
    fn simple_flattens_one_level() {
        let out = normalize_children(
            vec![
                Child::from("a"),
                Child::List(vec![Child::from("b"), Child::from("c")]),
                Child::from(VNode::element("span", None, vec![])),
            ],
            Normalization::Simple,
        );
        assert_eq!(texts(&out), vec!["a", "b", "c", "span"]);
    }

    #[test]
    fn full_merges_adjacent_text() {
        let out = normalize_children(
            vec![
                Child::from("a"),
                Child::List(vec![
                    Child::from("b"),
                    Child::List(vec![Child::from("c")]),
                ]),
                Child::from(VNode::element("span", None, vec![])),
                Child::from("d"),
            ],
            Normalization::Full,
        );
        assert_eq!(texts(&out), vec!["abc", "span", "d"]);
    }

    #[test]
    fn full_drops_empty_text() {
        let out = normalize_children(
            vec![Child::from(""), Child::from("x"), Child::from("")],
            Normalization::Full,
        );
        assert_eq!(texts(&out), vec!["x"]);
    }

    #[test]
    fn h_builds_an_element() {
        let n = h(
            "ul",
            Some(VNodeData::new().key(1)),
            vec![Child::from(VNode::element("li", None, vec![]))],
            Normalization::None,
        );
        assert_eq!(n.tag(), Some("ul"));
        assert_eq!(n.children().len(), 1);
    }
}
