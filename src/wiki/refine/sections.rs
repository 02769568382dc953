//! Headings and sections
//!
//!     A heading line `== Title ==` and everything up to the next heading become a
//!     [Kind::Section] with two children, the caption and the body:
//!
//!         Section(level 2)
//!           Node   <- caption: Title
//!           Node   <- body
//!           Section(level 3) ...   <- subsections follow the body
//!
//!     The level is the shorter of the two `=` runs. The surplus of the longer run stays in the
//!     caption as literal `=`, so `==Title=` is a level 1 heading captioned `=Title`.
//!
//!     Sections are built flat first, then nested with a stack of open sections: a new section
//!     closes every open one of the same or a deeper level and becomes a child of the one left
//!     on top, or a top-level sibling when none is.

use super::pipeline::Pass;
use super::Context;
use crate::wiki::token::{Kind, Token};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseSections;

fn marker_len(token: &Token) -> usize {
    token.text_str().matches('=').count()
}

impl ParseSections {
    /// `(start, end)` of every complete heading: a [Kind::SectionStart] and the
    /// [Kind::SectionEnd] closing it.
    fn headings(tokens: &[Token]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut start = None;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                Kind::SectionStart => start = Some(i),
                Kind::SectionEnd => {
                    if let Some(s) = start.take() {
                        found.push((s, i));
                    }
                }
                Kind::Newline | Kind::Break => start = None,
                _ => {}
            }
        }
        found
    }

    /// Replace the heading `start..=end` and its body up to `stop` by a flat section.
    fn create(tokens: &mut Vec<Token>, start: usize, end: usize, stop: usize) {
        let mut region: Vec<Token> = tokens.drain(start..stop).collect();
        let body = region.split_off(end - start + 1);
        let close = region.pop();
        let open = region.remove(0);

        let l1 = marker_len(&open);
        let l2 = close.as_ref().map_or(l1, marker_len);
        let level = l1.min(l2);

        let mut caption = region;
        if l1 > level {
            caption.insert(0, Token::text("=".repeat(l1 - level)));
        }
        if l2 > level {
            caption.push(Token::text("=".repeat(l2 - level)));
        }

        let mut section = Token::compound(
            Kind::Section,
            vec![
                Token::compound(Kind::Node, caption),
                Token::compound(Kind::Node, body),
            ],
        )
        .block();
        section.level = Some(level);
        section.span = open.span;
        tokens.insert(start, section);
    }

    /// Nest the flat sections of `tokens` by level.
    fn nest(tokens: &mut Vec<Token>) {
        let Some(first) = tokens.iter().position(|t| t.kind == Kind::Section) else {
            return;
        };
        let tail = tokens.split_off(first);
        let mut stack: Vec<Token> = Vec::new();

        fn attach(stack: &mut [Token], out: &mut Vec<Token>, done: Token) {
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => out.push(done),
            }
        }

        for token in tail {
            if token.kind != Kind::Section {
                attach(&mut stack, tokens, token);
                continue;
            }
            let level = token.level.unwrap_or(1);
            while stack.last().is_some_and(|top| top.level.unwrap_or(1) >= level) {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, tokens, done);
                }
            }
            stack.push(token);
        }

        while let Some(done) = stack.pop() {
            attach(&mut stack, tokens, done);
        }
    }
}

impl Pass for ParseSections {
    fn name(&self) -> &'static str {
        "parse_sections"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let headings = Self::headings(tokens);
        if headings.is_empty() {
            return;
        }

        // back to front, so the indices of earlier headings stay valid
        let mut stop = tokens.len();
        for &(start, end) in headings.iter().rev() {
            Self::create(tokens, start, end, stop);
            stop = start;
        }
        Self::nest(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::{self, Uniquifier};
    use crate::wiki::refine::RefineOptions;
    use rstest::rstest;

    fn sections(text: &str) -> Vec<Token> {
        let options = RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        let mut tokens = lexing::tokenize(text, &uniquifier);
        ParseSections.run(&mut tokens, &ctx);
        tokens
    }

    fn caption(section: &Token) -> String {
        Token::leaf_text(&section.children[0].children)
    }

    #[test]
    fn test_nesting() {
        let tokens = sections("=A=\nx\n==B==\ny\n=C=\nz");
        assert_eq!(tokens.len(), 2);

        let a = &tokens[0];
        assert_eq!(a.level, Some(1));
        assert_eq!(caption(a), "A");
        assert_eq!(a.children.len(), 3);
        let b = &a.children[2];
        assert_eq!(b.kind, Kind::Section);
        assert_eq!(b.level, Some(2));
        assert_eq!(caption(b), "B");

        let c = &tokens[1];
        assert_eq!(c.level, Some(1));
        assert_eq!(Token::leaf_text(&c.children[1].children), "\nz");
    }

    #[test]
    fn test_text_before_first_heading_stays() {
        let tokens = sections("intro\n== H ==\nbody");
        assert_eq!(tokens[0].text_str(), "intro");
        assert_eq!(tokens.last().map(|t| t.kind), Some(Kind::Section));
    }

    #[test]
    fn test_same_level_are_siblings() {
        let tokens = sections("==A==\n==B==\n===C===\n==D==");
        let levels: Vec<_> = tokens.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![Some(2), Some(2), Some(2)]);
        assert_eq!(tokens[1].children.len(), 3);
    }

    #[rstest]
    #[case("==Title=", 1, "=Title")]
    #[case("=Title==", 1, "Title=")]
    #[case("===Title===", 3, "Title")]
    fn test_marker_compensation(#[case] text: &str, #[case] level: usize, #[case] title: &str) {
        let tokens = sections(text);
        assert_eq!(tokens[0].level, Some(level));
        assert_eq!(caption(&tokens[0]), title);
    }

    #[test]
    fn test_deeper_first_heading() {
        let tokens = sections("===A===\n=B=");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].level, Some(3));
        assert_eq!(tokens[1].level, Some(1));
    }
}
