//! Small token-level repairs
//!
//! Two of these run first on the raw stream and prepare it for the grouping passes; the last
//! one runs after everything else and tidies up list items.

use super::pipeline::Pass;
use super::walker;
use super::Context;
use crate::wiki::token::{Kind, Token};

/// A blank line that starts with a space, directly followed by a preformatted line, belongs to
/// the preformatted block.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixBreakBetweenPre;

impl Pass for FixBreakBetweenPre {
    fn name(&self) -> &'static str {
        "fix_break_between_pre"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let mut i = 0;
        while i + 1 < tokens.len() {
            let joins = tokens[i].kind == Kind::Break
                && tokens[i].text_str().starts_with(' ')
                && tokens[i + 1].kind == Kind::Pre;
            if joins {
                let span = tokens[i].span.clone();
                let mut pre = Token::with_text(Kind::Pre, " ");
                pre.span = span.clone();
                let mut newline = Token::with_text(Kind::Newline, "\n");
                newline.span = span;
                tokens.splice(i..=i, [pre, newline]);
                i += 2;
            } else {
                i += 1;
            }
        }
    }
}

/// `[[http://x y]]` is a named url in literal brackets, not a wiki link; and a named url
/// closing inside a link closes before the link does.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixNamedUrls;

impl FixNamedUrls {
    fn double_brackets(tokens: &mut [Token]) {
        for i in 0..tokens.len().saturating_sub(1) {
            if tokens[i].kind == Kind::LinkOpen && tokens[i + 1].kind == Kind::Url {
                tokens[i].kind = Kind::Special;
                tokens[i].text = Some("[".to_string());
                let url = format!("[{}", tokens[i + 1].text_str());
                tokens[i + 1].kind = Kind::UrlLink;
                tokens[i + 1].text = Some(url);
            }
        }
    }

    fn url_inside_link(tokens: &mut [Token]) {
        let mut last = None;
        for i in 0..tokens.len() {
            match tokens[i].kind {
                Kind::LinkOpen | Kind::UrlLink => last = Some(tokens[i].kind),
                Kind::LinkClose
                    if last == Some(Kind::UrlLink)
                        && tokens.get(i + 1).is_some_and(|t| t.is_special("]")) =>
                {
                    tokens.swap(i, i + 1);
                }
                _ => {}
            }
        }
    }
}

impl Pass for FixNamedUrls {
    fn name(&self) -> &'static str {
        "fix_named_url_double_brackets"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        Self::double_brackets(tokens);
        Self::url_inside_link(tokens);
    }
}

/// `<li>` items outside of any list get an implicit `<ul>` around each run of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixLiTags;

impl FixLiTags {
    fn wrap_items(tokens: &mut Vec<Token>) {
        if !tokens.iter().any(|t| t.is_tag("li")) {
            return;
        }
        let mut out = Vec::with_capacity(tokens.len());
        let mut items = Vec::new();
        for token in std::mem::take(tokens) {
            if token.is_tag("li") {
                items.push(token);
                continue;
            }
            if !items.is_empty() {
                out.push(Token::tag("ul", std::mem::take(&mut items)).block());
            }
            out.push(token);
        }
        if !items.is_empty() {
            out.push(Token::tag("ul", items).block());
        }
        *tokens = out;
    }
}

impl Pass for FixLiTags {
    fn name(&self) -> &'static str {
        "fix_li_tags"
    }

    fn uses_walker(&self) -> bool {
        false
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        // the label is whether the list belongs to an ol/ul
        walker::walk_mut(
            tokens,
            false,
            |owner| owner.is_tag("ol") || owner.is_tag("ul"),
            |in_list, list| {
                if !*in_list {
                    Self::wrap_items(list);
                }
            },
            |_, _| {},
        );
    }
}
