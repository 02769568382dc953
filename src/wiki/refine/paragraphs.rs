//! Paragraph splitting
//!
//! Blank lines and block tokens end a paragraph; everything between two of them becomes a `p`
//! node. A list that contains neither is left as it is, so plain running text does not grow a
//! wrapper.

use super::pipeline::Pass;
use super::walker::{self, Opaque};
use super::Context;
use crate::wiki::token::{Kind, Token};

/// Lists that are never split into paragraphs: tables and sections are handled per cell and
/// per body, `p` and lists already are blocks.
const SKIP: Opaque = Opaque {
    kinds: &[Kind::Table, Kind::TableRow, Kind::Section],
    tags: &["p", "ol", "ul"],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseParagraphs;

impl ParseParagraphs {
    /// Wrap `tokens[first..i]` into a paragraph, also removing `delta` tokens after it.
    fn create(tokens: &mut Vec<Token>, first: usize, i: usize, delta: usize) {
        if first >= i {
            return;
        }
        let mut removed: Vec<Token> = tokens.drain(first..i + delta).collect();
        removed.truncate(i - first);
        tokens.insert(first, Token::tag("p", removed).block());
    }

    pub fn split(tokens: &mut Vec<Token>) {
        let mut first = 0;
        let mut i = 0;

        while i < tokens.len() {
            if tokens[i].kind == Kind::Break {
                Self::create(tokens, first, i, 1);
                first += 1;
                i = first;
            } else if tokens[i].blocknode {
                Self::create(tokens, first, i, 0);
                first += 1;
                i = first;
            } else {
                i += 1;
            }
        }

        if first > 0 {
            let end = tokens.len();
            Self::create(tokens, first, end, 0);
        }
    }
}

impl Pass for ParseParagraphs {
    fn name(&self) -> &'static str {
        "parse_paragraphs"
    }

    fn uses_walker(&self) -> bool {
        false
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        walker::apply(tokens, SKIP, Self::split);
    }
}
