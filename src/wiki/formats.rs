//! Text renderings of trees
//!
//! The dump format has one line per node, children indented by two spaces:
//!
//!     Section level=1 block
//!       Node
//!         Text "Title"
//!       Node
//!         Tag <p> block
//!           Text "body"
//!
//! Leaves show their text quoted; compound nodes list the fields that tell them apart. The
//! format is stable and used for snapshot tests and by the inspection binary. [to_json] gives
//! the same information as a JSON value.

use crate::wiki::templ::{Arg, MacroNode};
use crate::wiki::token::{Extension, Token};
use serde_json::{json, Map, Value};
use std::fmt::Write;

fn label(token: &Token) -> String {
    let mut out = token.kind.name().to_string();
    // write! into a String cannot fail
    if let Some(name) = &token.tagname {
        let _ = write!(out, " <{}>", name);
    }
    if let Some(level) = token.level {
        let _ = write!(out, " level={}", level);
    }
    if let Some(prefix) = &token.lineprefix {
        let _ = write!(out, " prefix={:?}", prefix);
    }
    if let Some(caption) = &token.caption {
        let _ = write!(out, " caption={:?}", caption);
    }
    if let Some(link) = &token.link {
        let _ = write!(out, " target={:?}", link.target);
        if let Some(ns) = link.ns {
            let _ = write!(out, " ns={}", ns);
        }
        if let Some(prefix) = &link.interwiki {
            let _ = write!(out, " interwiki={}", prefix);
        }
    }
    if let Some(vlist) = &token.vlist {
        for (key, value) in vlist {
            let _ = write!(out, " {}={:?}", key, value);
        }
    }
    if let Some(ext) = &token.ext {
        let name = match ext.as_ref() {
            Extension::Math(_) => "math",
            Extension::Timeline(_) => "timeline",
            Extension::Inputbox(_) => "inputbox",
            Extension::ImageMap(_) => "imagemap",
        };
        let _ = write!(out, " ext={}", name);
    }
    if token.blocknode {
        out.push_str(" block");
    }
    if token.children.is_empty() {
        if let Some(text) = &token.text {
            let _ = write!(out, " {:?}", text);
        }
    }
    out
}

/// Render `tokens` in the dump format.
pub fn dump(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&Token, usize)> = tokens.iter().rev().map(|t| (t, 0)).collect();
    while let Some((token, depth)) = stack.pop() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&label(token));
        out.push('\n');
        stack.extend(token.children.iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

fn node_json(token: &Token) -> Value {
    let mut map = Map::new();
    map.insert("kind".into(), json!(token.kind.name()));
    if let Some(text) = &token.text {
        map.insert("text".into(), json!(text));
    }
    if let Some(name) = &token.tagname {
        map.insert("tagname".into(), json!(name));
    }
    if let Some(vlist) = &token.vlist {
        map.insert("vlist".into(), json!(vlist));
    }
    if let Some(level) = token.level {
        map.insert("level".into(), json!(level));
    }
    if let Some(caption) = &token.caption {
        map.insert("caption".into(), json!(caption));
    }
    if let Some(link) = &token.link {
        map.insert(
            "link".into(),
            json!({
                "target": link.target,
                "full_target": link.full_target,
                "ns": link.ns,
                "colon": link.colon,
                "interwiki": link.interwiki,
            }),
        );
    }
    if token.blocknode {
        map.insert("block".into(), json!(true));
    }
    if !token.children.is_empty() {
        map.insert("children".into(), to_json(&token.children));
    }
    Value::Object(map)
}

/// The tree as a JSON array of nodes.
pub fn to_json(tokens: &[Token]) -> Value {
    Value::Array(tokens.iter().map(node_json).collect())
}

fn macro_line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push('\n');
}

fn dump_arg(out: &mut String, arg: &Arg, depth: usize) {
    match &arg.key {
        Some(key) => {
            macro_line(out, depth, "Arg (named)");
            dump_macro(out, key, depth + 1);
        }
        None => macro_line(out, depth, "Arg"),
    }
    dump_macro(out, &arg.value, depth + 1);
}

fn dump_macro(out: &mut String, node: &MacroNode, depth: usize) {
    match node {
        MacroNode::Text(text) => macro_line(out, depth, &format!("Text {:?}", text)),
        MacroNode::Seq(items) => {
            macro_line(out, depth, "Seq");
            for item in items {
                dump_macro(out, item, depth + 1);
            }
        }
        MacroNode::Template { name, args } => {
            macro_line(out, depth, "Template");
            dump_macro(out, name, depth + 1);
            for arg in args {
                dump_arg(out, arg, depth + 1);
            }
        }
        MacroNode::Variable { name, default } => {
            macro_line(out, depth, "Variable");
            dump_macro(out, name, depth + 1);
            if let Some(default) = default {
                dump_macro(out, default, depth + 1);
            }
        }
        MacroNode::If {
            cond,
            then,
            otherwise,
        } => {
            macro_line(out, depth, "If");
            for part in [Some(cond), then.as_ref(), otherwise.as_ref()].into_iter().flatten() {
                dump_macro(out, part, depth + 1);
            }
        }
        MacroNode::Switch { value, cases } => {
            macro_line(out, depth, "Switch");
            dump_macro(out, value, depth + 1);
            for case in cases {
                dump_arg(out, case, depth + 1);
            }
        }
        MacroNode::Magic { name, args } => {
            macro_line(out, depth, &format!("Magic {}", name));
            for arg in args {
                dump_macro(out, arg, depth + 1);
            }
        }
    }
}

/// Render a macro AST, one line per node.
pub fn dump_macros(nodes: &[MacroNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        dump_macro(&mut out, node, 0);
    }
    out
}
