//! Lexing
//!
//!     Raw wiki text becomes a flat, span-addressed token stream in three steps:
//!
//!         1. [uniq]: tag extensions are cut out and replaced by markers, comments dropped
//!         2. [lines]: every physical line is classified by how it starts
//!         3. [inline]: the rest of each line is tokenized by a logos lexer
//!
//!     Adjacent text tokens are merged at the end, so a run of plain words is one token.
//!     For text without markup the concatenated token texts reproduce the input.

pub mod inline;
pub mod lines;
pub mod tags;
pub mod uniq;

use crate::wiki::token::{Kind, Token};
pub use lines::LineLexer;
pub use uniq::Uniquifier;

/// Tokenize already uniquified text.
pub fn tokenize(text: &str, uniquifier: &Uniquifier) -> Vec<Token> {
    let tokens = LineLexer::new(uniquifier).run(text);
    merge_text(tokens)
}

/// Merge runs of adjacent [Kind::Text] tokens into one.
pub fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.kind == Kind::Text {
            if let Some(last) = merged.last_mut().filter(|t| t.kind == Kind::Text) {
                last.text.get_or_insert_with(String::new).push_str(token.text_str());
                if let (Some(span), Some(next)) = (last.span.as_mut(), token.span.as_ref()) {
                    span.end = next.end;
                }
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_token() {
        let tokens = tokenize("hello, world", &Uniquifier::new());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text_str(), "hello, world");
        assert_eq!(tokens[0].span, Some(0..12));
    }

    #[test]
    fn test_spans_address_the_source() {
        let source = "a\n* [[b]]";
        let tokens = tokenize(source, &Uniquifier::new());
        for token in &tokens {
            let span = token.span.clone().unwrap();
            assert_eq!(&source[span], token.text_str());
        }
    }

    #[test]
    fn test_uniq_markers() {
        let mut uniquifier = Uniquifier::new();
        let text = uniquifier.replace_tags("x<nowiki>''y''</nowiki>z");
        let tokens = tokenize(&text, &uniquifier);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Text, Kind::Uniq, Kind::Text]);
    }
}
