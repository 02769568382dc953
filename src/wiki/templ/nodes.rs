//! Macro AST
//!
//!     The macro parser produces literal text interleaved with typed macro nodes. Every subtree
//!     it returns is normalised by [optimize]:
//!
//!         - nested sequences are flattened into their parent
//!         - adjacent text is merged, empty text dropped
//!         - a sequence of one node is that node, a sequence of none is empty text
//!
//!     Normalisation is idempotent, so normalised trees compare structurally.

/// One argument of a template or switch case. `key` is set for `name=value` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: Option<MacroNode>,
    pub value: MacroNode,
}

impl Arg {
    pub fn positional(value: MacroNode) -> Self {
        Arg { key: None, value }
    }

    pub fn named(key: MacroNode, value: MacroNode) -> Self {
        Arg {
            key: Some(key),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MacroNode {
    Text(String),
    Seq(Vec<MacroNode>),
    /// `{{name|args}}`
    Template { name: Box<MacroNode>, args: Vec<Arg> },
    /// `{{{name|default}}}`
    Variable {
        name: Box<MacroNode>,
        default: Option<Box<MacroNode>>,
    },
    /// `{{#if: cond | then | else}}`
    If {
        cond: Box<MacroNode>,
        then: Option<Box<MacroNode>>,
        otherwise: Option<Box<MacroNode>>,
    },
    /// `{{#switch: value | case = result | default}}`
    Switch { value: Box<MacroNode>, cases: Vec<Arg> },
    /// Any other registered parser function, by canonical name (`#expr`, `#ifeq`, ...).
    Magic { name: String, args: Vec<MacroNode> },
}

impl MacroNode {
    pub fn text(text: impl Into<String>) -> Self {
        MacroNode::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MacroNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MacroNode::Text(_))
    }

    /// The literal text of a node without macros. `None` as soon as any macro is involved.
    pub fn literal(&self) -> Option<String> {
        match self {
            MacroNode::Text(text) => Some(text.clone()),
            MacroNode::Seq(items) => items.iter().map(MacroNode::literal).collect(),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            MacroNode::Text(_) => "Text",
            MacroNode::Seq(_) => "Seq",
            MacroNode::Template { .. } => "Template",
            MacroNode::Variable { .. } => "Variable",
            MacroNode::If { .. } => "If",
            MacroNode::Switch { .. } => "Switch",
            MacroNode::Magic { .. } => "Magic",
        }
    }
}

fn optimize_box(node: Box<MacroNode>) -> Box<MacroNode> {
    Box::new(optimize(*node))
}

fn optimize_arg(arg: Arg) -> Arg {
    Arg {
        key: arg.key.map(optimize),
        value: optimize(arg.value),
    }
}

/// Normalise a macro subtree.
pub fn optimize(node: MacroNode) -> MacroNode {
    match node {
        MacroNode::Text(text) => MacroNode::Text(text),
        MacroNode::Seq(items) => {
            let mut flat: Vec<MacroNode> = Vec::with_capacity(items.len());
            for item in items {
                match optimize(item) {
                    MacroNode::Seq(inner) => {
                        inner.into_iter().for_each(|n| push_merged(&mut flat, n))
                    }
                    other => push_merged(&mut flat, other),
                }
            }
            match flat.len() {
                0 => MacroNode::Text(String::new()),
                1 => flat.pop().unwrap_or_else(|| MacroNode::Text(String::new())),
                _ => MacroNode::Seq(flat),
            }
        }
        MacroNode::Template { name, args } => MacroNode::Template {
            name: optimize_box(name),
            args: args.into_iter().map(optimize_arg).collect(),
        },
        MacroNode::Variable { name, default } => MacroNode::Variable {
            name: optimize_box(name),
            default: default.map(optimize_box),
        },
        MacroNode::If {
            cond,
            then,
            otherwise,
        } => MacroNode::If {
            cond: optimize_box(cond),
            then: then.map(optimize_box),
            otherwise: otherwise.map(optimize_box),
        },
        MacroNode::Switch { value, cases } => MacroNode::Switch {
            value: optimize_box(value),
            cases: cases.into_iter().map(optimize_arg).collect(),
        },
        MacroNode::Magic { name, args } => MacroNode::Magic {
            name,
            args: args.into_iter().map(optimize).collect(),
        },
    }
}

fn push_merged(out: &mut Vec<MacroNode>, node: MacroNode) {
    if let MacroNode::Text(text) = &node {
        if text.is_empty() {
            return;
        }
        if let Some(MacroNode::Text(last)) = out.last_mut() {
            last.push_str(text);
            return;
        }
    }
    out.push(node);
}

/// Drop whitespace-only text at both ends, or trim a plain text node.
pub fn strip_ws(node: MacroNode) -> MacroNode {
    match node {
        MacroNode::Text(text) => MacroNode::Text(text.trim().to_string()),
        MacroNode::Seq(mut items) => {
            if matches!(items.first(), Some(MacroNode::Text(t)) if t.trim().is_empty()) {
                items.remove(0);
            }
            if matches!(items.last(), Some(MacroNode::Text(t)) if t.trim().is_empty()) {
                items.pop();
            }
            optimize(MacroNode::Seq(items))
        }
        other => other,
    }
}

/// Trim the outer ends of a node: leading whitespace of its first text, trailing of its last.
pub fn trim_edges(node: MacroNode) -> MacroNode {
    match node {
        MacroNode::Text(text) => MacroNode::Text(text.trim().to_string()),
        MacroNode::Seq(mut items) => {
            if let Some(MacroNode::Text(first)) = items.first_mut() {
                *first = first.trim_start().to_string();
            }
            if let Some(MacroNode::Text(last)) = items.last_mut() {
                *last = last.trim_end().to_string();
            }
            optimize(MacroNode::Seq(items))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> MacroNode {
        MacroNode::text(s)
    }

    #[test]
    fn test_merges_and_flattens() {
        let node = MacroNode::Seq(vec![
            t("a"),
            MacroNode::Seq(vec![t("b"), MacroNode::Seq(vec![t("c")])]),
            t(""),
        ]);
        assert_eq!(optimize(node), t("abc"));
    }

    #[test]
    fn test_singleton_and_empty() {
        assert_eq!(optimize(MacroNode::Seq(vec![])), t(""));
        let var = MacroNode::Variable {
            name: Box::new(MacroNode::Seq(vec![t("x")])),
            default: None,
        };
        assert_eq!(
            optimize(MacroNode::Seq(vec![var])),
            MacroNode::Variable {
                name: Box::new(t("x")),
                default: None
            }
        );
    }

    #[test]
    fn test_strip_ws() {
        let var = MacroNode::Variable {
            name: Box::new(t("x")),
            default: None,
        };
        let node = MacroNode::Seq(vec![t("  "), var.clone(), t(" \n")]);
        assert_eq!(strip_ws(node), var);
        assert_eq!(strip_ws(t("  a ")), t("a"));
    }

    #[test]
    fn test_literal() {
        assert_eq!(
            MacroNode::Seq(vec![t("a"), t("b")]).literal(),
            Some("ab".to_string())
        );
        let var = MacroNode::Variable {
            name: Box::new(t("x")),
            default: None,
        };
        assert_eq!(MacroNode::Seq(vec![t("a"), var]).literal(), None);
    }
}
