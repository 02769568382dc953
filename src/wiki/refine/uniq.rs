//! Tag extension subtrees
//!
//! Every [Kind::Uniq] placeholder is replaced by the node built from the region it stands for.
//! How the content is read depends on the extension:
//!
//!     nowiki                 text, entities resolved
//!     pre                    block `pre` with literal text, inner nowiki tags removed
//!     source, syntaxhighlight  literal text, block unless enclose=none
//!     ref                    wiki text, parsed as a sub-document
//!     poem                   wiki text, every line indented, leading spaces kept
//!     gallery                one media link per line
//!     imagemap               image link of the first line, the rest kept as entries
//!     math, timeline         raw text as extension payload
//!     pages                  attributes only
//!
//! A placeholder the uniquifier does not know stays as text.

use super::pipeline::Pass;
use super::{parse_nested, Context};
use crate::wiki::lexing::tags::parse_vlist;
use crate::wiki::lexing::uniq::UniqEntry;
use crate::wiki::namespace::NS_FILE;
use crate::wiki::token::{find_all, Extension, ImageMap, Kind, Token};
use once_cell::sync::Lazy;
use regex::Regex;

static NOWIKI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?nowiki\s*/?>").expect("nowiki pattern"));

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseUniq;

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// The first media link of a sub-document built from `[[line]]`.
fn media_link(line: &str, ctx: &Context) -> Option<Token> {
    let nodes = parse_nested(&format!("[[{}]]", line), ctx);
    find_all(&nodes, Kind::Link)
        .into_iter()
        .find(|link| link.link.as_ref().and_then(|info| info.ns) == Some(NS_FILE))
        .cloned()
}

impl ParseUniq {
    fn build(entry: &UniqEntry, ctx: &Context) -> Token {
        let inner = entry.inner.as_deref();
        let vlist = parse_vlist(&entry.vlist);
        let name = entry.tagname.as_str();

        let node = match name {
            "nowiki" => return Token::text(decode(inner.unwrap_or(""))),
            "pre" => {
                let text = decode(&NOWIKI.replace_all(inner.unwrap_or(""), ""));
                Token::tag(name, vec![Token::text(text)]).block()
            }
            "source" | "syntaxhighlight" => {
                let inline = vlist
                    .as_ref()
                    .and_then(|v| v.get("enclose"))
                    .is_some_and(|enclose| enclose == "none");
                let mut node = Token::tag(name, vec![Token::text(inner.unwrap_or(""))]);
                node.blocknode = !inline;
                node
            }
            "ref" => {
                let children = inner.map(|text| Self::reference(text, ctx));
                Token::tag(name, children.unwrap_or_default())
            }
            "math" => Self::payload(name, Extension::Math(inner.unwrap_or("").to_string())),
            "timeline" => {
                Self::payload(name, Extension::Timeline(inner.unwrap_or("").to_string())).block()
            }
            "gallery" => Token::tag(name, Self::gallery(inner.unwrap_or(""), ctx)).block(),
            "poem" => Token::tag(name, parse_nested(&poem_text(inner.unwrap_or("")), ctx)).block(),
            "imagemap" => {
                let map = Self::imagemap(inner.unwrap_or(""), ctx);
                Self::payload(name, Extension::ImageMap(map)).block()
            }
            "pages" => Token::tag(name, Vec::new()),
            _ => Token::tag(name, inner.map(|text| vec![Token::text(text)]).unwrap_or_default()),
        };
        node.with_vlist(vlist)
    }

    fn payload(name: &str, ext: Extension) -> Token {
        let mut node = Token::tag(name, Vec::new());
        node.ext = Some(Box::new(ext));
        node
    }

    /// Parse reference text. A `<br />` sentinel in front keeps the first line from being read
    /// as a line-start construct; it is dropped again, with the paragraph it may have opened.
    fn reference(text: &str, ctx: &Context) -> Vec<Token> {
        let mut nodes = parse_nested(&format!("<br />{}", text), ctx);
        if nodes.first().is_some_and(|first| first.is_tag("p")) {
            let paragraph = nodes.remove(0);
            nodes.splice(0..0, paragraph.children);
        }
        if nodes
            .first()
            .is_some_and(|first| {
                first.kind == Kind::HtmlTag && first.rawtagname.as_deref() == Some("br")
            })
        {
            nodes.remove(0);
        }
        nodes
    }

    fn gallery(text: &str, ctx: &Context) -> Vec<Token> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| media_link(line, ctx).unwrap_or_else(|| Token::text(line)))
            .collect()
    }

    fn imagemap(text: &str, ctx: &Context) -> ImageMap {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        let Some(image) = lines.next() else {
            return ImageMap::default();
        };
        ImageMap {
            image: Some(image.to_string()),
            imagelink: media_link(image, ctx),
            entries: lines.map(str::to_string).collect(),
        }
    }
}

/// Poem text as wiki text: every non-empty line indented with `:`, leading spaces kept as
/// non-breaking spaces.
fn poem_text(text: &str) -> String {
    let lines: Vec<String> = text
        .trim_matches('\n')
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                return String::new();
            }
            let rest = line.trim_start_matches(' ');
            let indent = line.len() - rest.len();
            format!(":{}{}", "\u{a0}".repeat(indent), rest)
        })
        .collect();
    lines.join("\n")
}

impl Pass for ParseUniq {
    fn name(&self) -> &'static str {
        "parse_uniq"
    }

    fn run(&self, tokens: &mut Vec<Token>, ctx: &Context) {
        for token in tokens.iter_mut().filter(|t| t.kind == Kind::Uniq) {
            let span = token.span.take();
            let replacement = match ctx.uniquifier.get(token.text_str()) {
                Some(entry) => Self::build(entry, ctx),
                None => Token::text(token.text_str()),
            };
            *token = replacement;
            token.span = span;
        }
    }
}
