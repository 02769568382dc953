//! Testing utilities for tree assertions
//!
//! Checking a refined tree by hand means indexing into `children` several levels deep and
//! matching on kinds at every step. The fluent API states the expected shape instead:
//!
//! ```rust-example
//! use wikitree::wiki::testing::assert_tree;
//!
//! assert_tree(&nodes)
//!     .item_count(2)
//!     .item(0, |section| {
//!         section
//!             .kind(Kind::Section)
//!             .level(1)
//!             .child(0, |caption| caption.leaf_text("A"));
//!     });
//! ```
//!
//! Every failure message carries the path of the node (`items[0].children[1]`) and, for
//! count mismatches, a summary of what was found.

use crate::wiki::token::{Kind, Token};

/// Create an assertion builder for a list of top-level nodes.
pub fn assert_tree(nodes: &[Token]) -> TreeAssertion<'_> {
    TreeAssertion { nodes }
}

fn summarize(nodes: &[Token]) -> String {
    nodes
        .iter()
        .map(|n| match &n.tagname {
            Some(name) => format!("{}<{}>", n.kind.name(), name),
            None => n.kind.name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct TreeAssertion<'a> {
    nodes: &'a [Token],
}

impl<'a> TreeAssertion<'a> {
    pub fn item_count(self, expected: usize) -> Self {
        assert_eq!(
            self.nodes.len(),
            expected,
            "Expected {} items, found {}: [{}]",
            expected,
            self.nodes.len(),
            summarize(self.nodes)
        );
        self
    }

    pub fn item<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        assert!(
            index < self.nodes.len(),
            "Item index {} out of bounds ({} items: [{}])",
            index,
            self.nodes.len(),
            summarize(self.nodes)
        );
        assertion(NodeAssertion {
            node: &self.nodes[index],
            context: format!("items[{}]", index),
        });
        self
    }

    /// Assert the concatenated leaf text of the whole tree.
    pub fn leaf_text(self, expected: &str) -> Self {
        assert_eq!(Token::leaf_text(self.nodes), expected, "leaf text of the tree");
        self
    }
}

pub struct NodeAssertion<'a> {
    node: &'a Token,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn node(&self) -> &'a Token {
        self.node
    }

    pub fn kind(self, expected: Kind) -> Self {
        assert_eq!(
            self.node.kind,
            expected,
            "{}: expected {}, found {}",
            self.context,
            expected.name(),
            self.node.kind.name()
        );
        self
    }

    /// Assert a [Kind::Tag] node with the given tag name.
    pub fn tag(self, name: &str) -> Self {
        assert!(
            self.node.is_tag(name),
            "{}: expected tag <{}>, found {} {:?}",
            self.context,
            name,
            self.node.kind.name(),
            self.node.tagname
        );
        self
    }

    pub fn text(self, expected: &str) -> Self {
        assert_eq!(self.node.text_str(), expected, "{}: text", self.context);
        self
    }

    pub fn leaf_text(self, expected: &str) -> Self {
        assert_eq!(
            Token::leaf_text(std::slice::from_ref(self.node)),
            expected,
            "{}: leaf text",
            self.context
        );
        self
    }

    pub fn level(self, expected: usize) -> Self {
        assert_eq!(self.node.level, Some(expected), "{}: level", self.context);
        self
    }

    pub fn caption(self, expected: &str) -> Self {
        assert_eq!(
            self.node.caption.as_deref(),
            Some(expected),
            "{}: caption",
            self.context
        );
        self
    }

    pub fn block(self, expected: bool) -> Self {
        assert_eq!(self.node.blocknode, expected, "{}: block flag", self.context);
        self
    }

    pub fn attr(self, key: &str, expected: &str) -> Self {
        let actual = self.node.vlist.as_ref().and_then(|v| v.get(key));
        assert_eq!(
            actual.map(String::as_str),
            Some(expected),
            "{}: attribute {}",
            self.context,
            key
        );
        self
    }

    pub fn link_target(self, expected: &str) -> Self {
        let target = self.node.link.as_ref().map(|l| l.target.as_str());
        assert_eq!(target, Some(expected), "{}: link target", self.context);
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.node.children.len(),
            expected,
            "{}: expected {} children, found {}: [{}]",
            self.context,
            expected,
            self.node.children.len(),
            summarize(&self.node.children)
        );
        self
    }

    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let children = &self.node.children;
        assert!(
            index < children.len(),
            "{}: child index {} out of bounds ({} children: [{}])",
            self.context,
            index,
            children.len(),
            summarize(children)
        );
        assertion(NodeAssertion {
            node: &children[index],
            context: format!("{}.children[{}]", self.context, index),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_chain() {
        let tree = vec![Token::tag("p", vec![Token::text("a")]).block()];
        assert_tree(&tree).item_count(1).item(0, |p| {
            p.tag("p")
                .block(true)
                .child_count(1)
                .child(0, |t| {
                    t.kind(Kind::Text).text("a");
                });
        });
    }

    #[test]
    #[should_panic(expected = "items[0].children[0]: expected Tag, found Text")]
    fn test_failure_names_the_path() {
        let tree = vec![Token::tag("p", vec![Token::text("a")])];
        assert_tree(&tree).item(0, |p| {
            p.child(0, |t| {
                t.kind(Kind::Tag);
            });
        });
    }
}
