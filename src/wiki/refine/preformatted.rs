//! Preformatted blocks
//!
//! A line starting with a space is preformatted. Consecutive such lines (and a blank line that
//! was folded into them, see [super::fixups::FixBreakBetweenPre]) become one
//! [Kind::Preformatted] block owning the lines' content and line ends. Block tokens on the
//! line cancel it.

use super::pipeline::Pass;
use super::walker::{self, Opaque};
use super::Context;
use crate::wiki::token::{Kind, Token};

/// Lists whose content never becomes preformatted.
const SKIP: Opaque = Opaque {
    kinds: &[Kind::Table, Kind::TableRow, Kind::Section],
    tags: &["li"],
};

const CANCELS: &[&str] = &["blockquote", "table", "timeline", "div"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ParsePreformatted;

impl ParsePreformatted {
    /// Turn the line from the `Pre` token at `start` through `end` (inclusive) into block
    /// content. Returns where scanning continues.
    fn close(tokens: &mut Vec<Token>, start: usize, end: usize) -> usize {
        let mut line: Vec<Token> = tokens.drain(start..=end).collect();
        line.remove(0);

        match start.checked_sub(1) {
            Some(prev) if tokens[prev].kind == Kind::Preformatted => {
                tokens[prev].children.extend(line);
                start
            }
            _ => {
                let block = Token::compound(Kind::Preformatted, line).block();
                tokens.insert(start, block);
                start + 1
            }
        }
    }

    pub fn group(tokens: &mut Vec<Token>) {
        let mut start: Option<usize> = None;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if token.kind == Kind::Pre {
                start = Some(i);
                i += 1;
            } else if token.kind == Kind::Newline && start.is_some() {
                if let Some(s) = start.take() {
                    i = Self::close(tokens, s, i);
                }
            } else if token.blocknode
                || (token.kind == Kind::Tag
                    && token
                        .tagname
                        .as_deref()
                        .is_some_and(|name| CANCELS.contains(&name)))
            {
                start = None;
                i += 1;
            } else {
                i += 1;
            }
        }

        if let Some(s) = start {
            let end = tokens.len() - 1;
            Self::close(tokens, s, end);
        }
    }
}

impl Pass for ParsePreformatted {
    fn name(&self) -> &'static str {
        "parse_preformatted"
    }

    fn uses_walker(&self) -> bool {
        false
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        walker::apply(tokens, SKIP, Self::group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre() -> Token {
        Token::with_text(Kind::Pre, " ")
    }

    fn nl() -> Token {
        Token::with_text(Kind::Newline, "\n")
    }

    #[test]
    fn test_consecutive_lines_join() {
        let mut tokens = vec![
            pre(),
            Token::text("a"),
            nl(),
            pre(),
            Token::text("b"),
            nl(),
            Token::text("c"),
        ];
        ParsePreformatted::group(&mut tokens);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, Kind::Preformatted);
        assert!(tokens[0].blocknode);
        assert_eq!(Token::join_as_text(&tokens[0].children), "a\nb\n");
        assert_eq!(tokens[1], Token::text("c"));
    }

    #[test]
    fn test_unterminated_line_is_finalized() {
        let mut tokens = vec![pre(), Token::text("a")];
        ParsePreformatted::group(&mut tokens);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].children, vec![Token::text("a")]);
    }

    #[test]
    fn test_block_cancels() {
        let mut tokens = vec![pre(), Token::tag("div", vec![]), nl()];
        ParsePreformatted::group(&mut tokens);
        assert_eq!(tokens[0].kind, Kind::Pre);
    }
}
