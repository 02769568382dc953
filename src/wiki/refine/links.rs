//! Wiki links
//!
//!     `[[target|part|...]]` becomes a [Kind::Link] node. While scanning a list, the positions
//!     of the opening bracket and each `|` of the innermost pending link are kept as marks:
//!
//!         [[File:x.png|thumb|A [[caption]] link]]
//!         ^            ^     ^
//!         marks[0]     marks[1] marks[2]
//!
//!     A second `[[` while a link with at least one `|` is pending stacks the pending marks, so
//!     links inside captions are grouped first, up to [MAX_MARKUP_DEPTH] pending links. A link
//!     whose first `|` has not been seen yet cannot span a line end.
//!
//!     The target decides the rest. An interwiki prefix wins; otherwise the namespace resolver
//!     splits the target. Media links read their parts through the image option sub-grammar
//!     and keep the last part that is not an option as caption; every other link keeps
//!     everything after the first `|`.

use super::pipeline::Pass;
use super::{Context, MAX_MARKUP_DEPTH};
use crate::wiki::namespace::NS_FILE;
use crate::wiki::token::{Frame, ImageOptions, Kind, LinkInfo, Token};
use std::ops::Range;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseLinks;

impl ParseLinks {
    /// Link information for a raw target. `None` when the target is empty.
    fn link_info(raw: &str, ctx: &Context) -> Option<LinkInfo> {
        let mut target = raw.trim().trim_matches(['\u{200e}', '\u{200f}']).trim();
        let colon = target.starts_with(':');
        if colon {
            target = target[1..].trim_start();
        }

        let resolver = &ctx.options.namespaces;
        if let Some(iw) = resolver.resolve_interwiki(target) {
            return Some(LinkInfo {
                target: target.to_string(),
                colon,
                url: Some(iw.url),
                langlink: iw.language,
                interwiki: Some(iw.prefix),
                ..Default::default()
            });
        }

        let (split, target) = match (target.strip_prefix('/'), ctx.options.title.as_deref()) {
            (Some(sub), Some(title)) => {
                let mut split = resolver.split_name(&format!("{}/{}", title, sub));
                if let Some(full) = split.full.strip_suffix('/') {
                    split.full = full.to_string();
                }
                let sub = sub.strip_suffix('/').unwrap_or(sub);
                (split, sub.to_string())
            }
            _ => (resolver.split_name(target), target.to_string()),
        };
        if split.partial.is_empty() {
            return None;
        }

        Some(LinkInfo {
            target,
            full_target: Some(split.full),
            ns: Some(split.ns),
            colon,
            ..Default::default()
        })
    }

    /// Run the `|`-separated parts through the image options. Returns the range of the caption
    /// part.
    fn image_parts(
        tokens: &[Token],
        marks: &[usize],
        ctx: &Context,
        options: &mut ImageOptions,
    ) -> Option<Range<usize>> {
        let mut caption = None;
        for pair in marks[1..].windows(2) {
            let part = pair[0] + 1..pair[1];
            let text = Token::join_as_text(&tokens[part.clone()]);
            if !ctx.options.imagemod.apply(&text, options) {
                caption = Some(part);
            }
        }
        caption
    }

    /// Try to close the link whose marks end at the `]]` at `marks.last()`. Returns the index
    /// scanning continues at, or `None` when the brackets stay literal.
    fn close(tokens: &mut Vec<Token>, marks: &[usize], ctx: &Context) -> Option<usize> {
        let start = marks[0];
        let end = *marks.last()?;
        let target_end = marks.get(1).copied().unwrap_or(end);

        let raw = Token::join_as_text(&tokens[start + 1..target_end]);
        let mut info = Self::link_info(&raw, ctx)?;

        let mut blocknode = false;
        let children = if info.ns == Some(NS_FILE) && !info.colon {
            let mut options = ImageOptions::default();
            let caption = Self::image_parts(tokens, marks, ctx, &mut options);
            blocknode =
                options.thumb || options.align.is_some() || options.frame == Some(Frame::Frame);
            info.image = Some(options);
            caption
        } else if marks.len() > 2 {
            Some(marks[1] + 1..end)
        } else {
            None
        };

        let mut region: Vec<Token> = tokens.drain(start..=end).collect();
        let children = match children {
            Some(range) => region.drain(range.start - start..range.end - start).collect(),
            None => Vec::new(),
        };

        let mut link = Token::compound(Kind::Link, children);
        link.blocknode = blocknode;
        link.span = region.first().and_then(|t| t.span.clone());
        link.link = Some(Box::new(info));
        tokens.insert(start, link);
        Some(start + 1)
    }
}

impl Pass for ParseLinks {
    fn name(&self) -> &'static str {
        "parse_links"
    }

    fn run(&self, tokens: &mut Vec<Token>, ctx: &Context) {
        let mut marks: Vec<usize> = Vec::new();
        let mut stack: Vec<Vec<usize>> = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i].kind {
                Kind::LinkOpen => {
                    if marks.len() > 1 {
                        if stack.len() == MAX_MARKUP_DEPTH {
                            // the outermost pending link stays text
                            stack.remove(0);
                        }
                        stack.push(std::mem::take(&mut marks));
                    }
                    marks = vec![i];
                    i += 1;
                }
                Kind::Newline if marks.len() < 2 => {
                    marks = stack.pop().unwrap_or_default();
                    i += 1;
                }
                Kind::Special if tokens[i].is_special("|") && !marks.is_empty() => {
                    marks.push(i);
                    i += 1;
                }
                Kind::LinkClose if !marks.is_empty() => {
                    marks.push(i);
                    i = match Self::close(tokens, &marks, ctx) {
                        Some(next) => next,
                        None => i + 1,
                    };
                    marks = stack.pop().unwrap_or_default();
                }
                _ => i += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::{self, Uniquifier};
    use crate::wiki::refine::RefineOptions;
    use crate::wiki::token::find_all;

    fn links(text: &str, title: Option<&str>) -> Vec<Token> {
        let mut options = RefineOptions::english().unwrap();
        if let Some(title) = title {
            options = options.with_title(title);
        }
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        let mut tokens = lexing::tokenize(text, &uniquifier);
        ParseLinks.run(&mut tokens, &ctx);
        tokens
    }

    fn info(token: &Token) -> &LinkInfo {
        token.link.as_deref().unwrap()
    }

    #[test]
    fn test_links_nested_past_the_limit() {
        let depth = MAX_MARKUP_DEPTH + 10;
        let text = format!("{}{}", "[[a|".repeat(depth), "]]".repeat(depth));
        let tokens = links(&text, None);
        assert_eq!(find_all(&tokens, Kind::Link).len(), MAX_MARKUP_DEPTH + 1);
    }

    #[test]
    fn test_many_unclosed_openings() {
        let text = "[[a|".repeat(50_000);
        let tokens = links(&text, None);
        assert!(find_all(&tokens, Kind::Link).is_empty());
        assert_eq!(Token::join_as_text(&tokens), text);
    }

    #[test]
    fn test_plain_link() {
        let tokens = links("see [[foo bar|the foo]].", None);
        assert_eq!(tokens[1].kind, Kind::Link);
        let link = info(&tokens[1]);
        assert_eq!(link.target, "foo bar");
        assert_eq!(link.full_target.as_deref(), Some("Foo bar"));
        assert_eq!(link.ns, Some(0));
        assert_eq!(Token::leaf_text(&tokens[1].children), "the foo");
    }

    #[test]
    fn test_category_with_colon() {
        let tokens = links("[[:Category:Birds]]", None);
        let link = info(&tokens[0]);
        assert!(link.colon);
        assert_eq!(link.ns, Some(14));
        assert!(tokens[0].children.is_empty());
    }

    #[test]
    fn test_empty_target_stays_literal() {
        let tokens = links("[[]]", None);
        assert!(tokens.iter().all(|t| t.kind != Kind::Link));
        assert_eq!(Token::join_as_text(&tokens), "[[]]");
    }

    #[test]
    fn test_image_link() {
        let tokens = links("[[File:x.png|thumb|200px|A caption]]", None);
        let link = &tokens[0];
        assert!(link.blocknode);
        let image = info(link).image.as_ref().unwrap();
        assert!(image.thumb);
        assert_eq!(image.width, Some(200));
        assert_eq!(Token::leaf_text(&link.children), "A caption");
    }

    #[test]
    fn test_nested_link_in_caption() {
        let tokens = links("[[File:x.png|see [[Foo]] here]]", None);
        assert_eq!(tokens.len(), 1);
        let caption = &tokens[0].children;
        assert!(caption.iter().any(|t| t.kind == Kind::Link));
    }

    #[test]
    fn test_link_cannot_span_newline_before_pipe() {
        let tokens = links("[[foo\nbar]]", None);
        assert!(tokens.iter().all(|t| t.kind != Kind::Link));
    }

    #[test]
    fn test_interwiki() {
        let tokens = links("[[de:Hund]]", None);
        let link = info(&tokens[0]);
        assert_eq!(link.interwiki.as_deref(), Some("de"));
        assert_eq!(link.langlink.as_deref(), Some("de"));
        assert!(link.ns.is_none());
    }

    #[test]
    fn test_subpage() {
        let tokens = links("[[/Sub/]]", Some("Main"));
        let link = info(&tokens[0]);
        assert_eq!(link.target, "Sub");
        assert_eq!(link.full_target.as_deref(), Some("Main/Sub"));
    }
}
