//! The brace parser
//!
//!     A recursive descent over [Symbol]s. An opening run of braces starts a group that ends
//!     either at end of input or when enough closing braces were consumed:
//!
//!         closing run of 2, or group opened with exactly 2   ->  template, consumes 2
//!         otherwise                                          ->  variable, consumes 3
//!
//!     A group opened with more braces than one close consumes keeps collecting, so
//!     `{{{{{x}}}}}` is a template around a variable. Whatever is left of a closing run stays in
//!     the stream for the enclosing group; a single leftover `}` is plain text. Braces that were
//!     never closed are put back as literal text in front of the group's content.
//!
//!     Inside an unclosed `[[`, `|` and `=` do not separate arguments and closing braces are
//!     text.

use super::magic::ParserFunctions;
use super::nodes::{optimize, strip_ws, trim_edges, Arg, MacroNode};
use super::scanner::Symbol;
use crate::wiki::config::AliasMap;

/// Nesting beyond this depth is kept as literal text.
const MAX_DEPTH: usize = 200;

/// Unfinalised content of a brace group.
#[derive(Debug, Clone, PartialEq)]
enum Child {
    Text(String),
    Pipe,
    Eq,
    LinkOpen,
    LinkClose,
    Node(MacroNode),
    Group(Vec<Child>),
}

impl Child {
    fn into_node(self) -> MacroNode {
        match self {
            Child::Text(text) => MacroNode::Text(text),
            Child::Pipe => MacroNode::text("|"),
            Child::Eq => MacroNode::text("="),
            Child::LinkOpen => MacroNode::text("[["),
            Child::LinkClose => MacroNode::text("]]"),
            Child::Node(node) => node,
            Child::Group(children) => seq(children),
        }
    }
}

fn seq(children: Vec<Child>) -> MacroNode {
    MacroNode::Seq(children.into_iter().map(Child::into_node).collect())
}

fn optimized(children: Vec<Child>) -> MacroNode {
    optimize(seq(children))
}

pub(super) struct BraceParser<'a> {
    symbols: Vec<Symbol>,
    pos: usize,
    depth: usize,
    aliases: &'a AliasMap,
    functions: &'a ParserFunctions,
}

impl<'a> BraceParser<'a> {
    pub(super) fn new(
        symbols: Vec<Symbol>,
        aliases: &'a AliasMap,
        functions: &'a ParserFunctions,
    ) -> Self {
        BraceParser {
            symbols,
            pos: 0,
            depth: 0,
            aliases,
            functions,
        }
    }

    pub(super) fn parse(mut self) -> Vec<MacroNode> {
        let mut children = Vec::new();
        while let Some(symbol) = self.symbols.get(self.pos).cloned() {
            match symbol {
                Symbol::Open(_) => {
                    let group = self.parse_open_brace();
                    children.push(Child::Group(group));
                }
                Symbol::NoInclude => self.pos += 1,
                other => {
                    children.push(literal(other));
                    self.pos += 1;
                }
            }
        }

        match optimized(children) {
            MacroNode::Seq(nodes) => nodes,
            MacroNode::Text(text) if text.is_empty() => Vec::new(),
            node => vec![node],
        }
    }

    fn parse_open_brace(&mut self) -> Vec<Child> {
        let Some(Symbol::Open(mut numbraces)) = self.symbols.get(self.pos).cloned() else {
            return Vec::new();
        };
        self.pos += 1;

        if self.depth >= MAX_DEPTH {
            return vec![Child::Text("{".repeat(numbraces))];
        }
        self.depth += 1;

        let mut children: Vec<Child> = Vec::new();
        let mut linkcount = 0usize;

        while let Some(symbol) = self.symbols.get(self.pos).cloned() {
            match symbol {
                Symbol::Open(_) => {
                    let group = self.parse_open_brace();
                    children.push(Child::Group(group));
                }
                Symbol::Close(closelen) if linkcount == 0 => {
                    let collected = std::mem::take(&mut children);
                    if closelen == 2 || numbraces == 2 {
                        children.push(Child::Node(self.template_from_children(collected)));
                        self.consume_closing_braces(2);
                        numbraces -= 2;
                    } else {
                        children.push(Child::Node(variable_from_children(collected)));
                        self.consume_closing_braces(3);
                        numbraces -= 3;
                    }
                    if numbraces < 2 {
                        break;
                    }
                }
                Symbol::NoInclude => self.pos += 1,
                other => {
                    match other {
                        Symbol::LinkOpen => linkcount += 1,
                        Symbol::LinkClose => linkcount = linkcount.saturating_sub(1),
                        _ => {}
                    }
                    children.push(literal(other));
                    self.pos += 1;
                }
            }
        }

        self.depth -= 1;
        if numbraces > 0 {
            children.insert(0, Child::Text("{".repeat(numbraces)));
        }
        children
    }

    fn consume_closing_braces(&mut self, num: usize) {
        let Some(Symbol::Close(len)) = self.symbols.get(self.pos).cloned() else {
            debug_assert!(false, "expected closing braces at {}", self.pos);
            return;
        };
        debug_assert!(len >= num, "closing run of {} cannot close {}", len, num);

        match len.saturating_sub(num) {
            0 => self.pos += 1,
            1 => self.symbols[self.pos] = Symbol::Text("}".to_string()),
            rest => self.symbols[self.pos] = Symbol::Close(rest),
        }
    }

    fn template_from_children(&self, mut children: Vec<Child>) -> MacroNode {
        if let Some(Child::Text(first)) = children.first() {
            let stripped = first.trim().to_lowercase();
            if let Some((name, _)) = stripped.split_once(':') {
                let name = name.trim();
                let resolved = self
                    .aliases
                    .resolve_magic_alias(name)
                    .unwrap_or(name)
                    .to_string();

                if resolved == "#if" || resolved == "#switch" || self.functions.contains(&resolved)
                {
                    if let Some(Child::Text(first)) = children.first_mut() {
                        *first = first
                            .split_once(':')
                            .map(|(_, rest)| rest.to_string())
                            .unwrap_or_default();
                    }
                    return match resolved.as_str() {
                        "#if" => if_node_from_children(children),
                        "#switch" => switch_node_from_children(children),
                        _ => magic_node_from_children(resolved, children),
                    };
                }
            }
        }

        let mut split = None;
        let mut linkcount = 0usize;
        for (idx, child) in children.iter().enumerate() {
            match child {
                Child::LinkOpen => linkcount += 1,
                Child::LinkClose => linkcount = linkcount.saturating_sub(1),
                Child::Pipe if linkcount == 0 => {
                    split = Some(idx);
                    break;
                }
                _ => {}
            }
        }

        let (name_children, rest, append_arg) = match split {
            Some(idx) => {
                let rest = children.split_off(idx + 1);
                children.pop();
                (children, rest, true)
            }
            None => (children, Vec::new(), false),
        };

        let name = match optimized(name_children.clone()) {
            MacroNode::Text(text) => MacroNode::Text(text.trim().to_string()),
            other => other,
        };

        if !is_good_name(&name) {
            let mut literal = vec![Child::Text("{{".to_string())];
            literal.extend(name_children);
            if append_arg {
                literal.push(Child::Pipe);
            }
            literal.extend(rest);
            literal.push(Child::Text("}}".to_string()));
            return optimized(literal);
        }

        let args = parse_args(rest, append_arg)
            .into_iter()
            .map(named_arg)
            .collect();

        MacroNode::Template {
            name: Box::new(name),
            args,
        }
    }
}

fn literal(symbol: Symbol) -> Child {
    match symbol {
        Symbol::Text(text) => Child::Text(text),
        Symbol::Pipe => Child::Pipe,
        Symbol::Eq => Child::Eq,
        Symbol::LinkOpen => Child::LinkOpen,
        Symbol::LinkClose => Child::LinkClose,
        Symbol::Open(n) => Child::Text("{".repeat(n)),
        Symbol::Close(n) => Child::Text("}".repeat(n)),
        Symbol::NoInclude => Child::Text(String::new()),
    }
}

fn variable_from_children(mut children: Vec<Child>) -> MacroNode {
    match children.iter().position(|c| *c == Child::Pipe) {
        Some(idx) => {
            let default = children.split_off(idx + 1);
            children.pop();
            MacroNode::Variable {
                name: Box::new(optimized(children)),
                default: Some(Box::new(optimized(default))),
            }
        }
        None => MacroNode::Variable {
            name: Box::new(optimized(children)),
            default: None,
        },
    }
}

/// Split on `|` outside of links. `=` outside of links stays an [Child::Eq] marker; inside a
/// link it is text.
fn parse_args(children: Vec<Child>, mut append_arg: bool) -> Vec<Vec<Child>> {
    let mut args = Vec::new();
    let mut arg = Vec::new();
    let mut linkcount = 0usize;

    for child in children {
        match child {
            Child::LinkOpen => linkcount += 1,
            Child::LinkClose => linkcount = linkcount.saturating_sub(1),
            Child::Pipe if linkcount == 0 => {
                args.push(std::mem::take(&mut arg));
                append_arg = true;
                continue;
            }
            Child::Eq if linkcount > 0 => {
                arg.push(Child::Text("=".to_string()));
                continue;
            }
            _ => {}
        }
        arg.push(child);
    }

    if append_arg || !arg.is_empty() {
        args.push(arg);
    }
    args
}

/// `key=value` when the argument has an `=` outside of links, positional otherwise.
fn named_arg(mut pieces: Vec<Child>) -> Arg {
    match pieces.iter().position(|c| *c == Child::Eq) {
        Some(idx) => {
            let value = pieces.split_off(idx + 1);
            pieces.pop();
            Arg::named(
                trim_edges(optimized(pieces)),
                trim_edges(optimized(value)),
            )
        }
        None => Arg::positional(optimized(pieces)),
    }
}

fn if_node_from_children(children: Vec<Child>) -> MacroNode {
    let mut args = parse_args(children, false).into_iter().map(optimized);
    let cond = strip_ws(args.next().unwrap_or_else(|| MacroNode::text("")));
    MacroNode::If {
        cond: Box::new(cond),
        then: args.next().map(Box::new),
        otherwise: args.next().map(Box::new),
    }
}

fn switch_node_from_children(children: Vec<Child>) -> MacroNode {
    let mut args = parse_args(children, false).into_iter();
    let value = args.next().map(optimized).unwrap_or_else(|| MacroNode::text(""));
    MacroNode::Switch {
        value: Box::new(strip_ws(value)),
        cases: args.map(named_arg).collect(),
    }
}

fn magic_node_from_children(name: String, children: Vec<Child>) -> MacroNode {
    MacroNode::Magic {
        name,
        args: parse_args(children, false)
            .into_iter()
            .map(optimized)
            .collect(),
    }
}

/// A name is rejected when a bracket appears before its first colon.
///
/// Only the part up to the first colon is inspected: what follows may be the argument of a
/// parser function this parser does not know about. `{{#tag:x|[[a]]}}` and `{{x:[b]}}` keep
/// their macro, `{{a[b}}` is text.
fn is_good_name(name: &MacroNode) -> bool {
    let texts: Vec<&str> = match name {
        MacroNode::Text(text) => vec![text],
        MacroNode::Seq(items) => items.iter().filter_map(MacroNode::as_text).collect(),
        _ => Vec::new(),
    };

    for text in texts {
        let (head, done) = match text.split_once(':') {
            Some((head, _)) => (head, true),
            None => (text, false),
        };
        if head.contains('[') || head.contains(']') {
            return false;
        }
        if done {
            break;
        }
    }
    true
}
