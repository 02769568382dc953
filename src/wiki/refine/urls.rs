//! Named URLs
//!
//! `[http://example.org label]` arrives as a [Kind::UrlLink] (`[http://example.org`), the label
//! tokens and a closing `]`. The run becomes a [Kind::NamedUrl] whose caption is the URL and
//! whose children are the label. A `]]` closes it as well, leaving one `]` behind as text.
//! An opening that is not closed on its line falls back to a literal `[` and a bare URL.

use super::pipeline::Pass;
use super::Context;
use crate::wiki::token::{Kind, Token};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseUrls;

impl ParseUrls {
    /// `[` and a bare URL for the [Kind::UrlLink] at `at`.
    fn demote(tokens: &mut [Token], at: usize) -> Vec<Token> {
        let open = std::mem::take(&mut tokens[at]);
        let url = open.text_str().strip_prefix('[').unwrap_or(open.text_str());
        let (bracket, mut link) = (Token::special("["), Token::with_text(Kind::Url, url));
        if let Some(span) = open.span {
            link.span = Some(span.start + 1..span.end);
            return vec![bracket.with_span(span.start..span.start + 1), link];
        }
        vec![bracket, link]
    }

    /// Replace the opening at `at` by its literal form. Returns the index after it.
    fn demote_at(tokens: &mut Vec<Token>, at: usize) -> usize {
        let replacement = Self::demote(tokens, at);
        let count = replacement.len();
        tokens.splice(at..=at, replacement);
        at + count
    }

    /// Group `tokens[start..end]` into a named URL, dropping the `]` at `end` when `consume`.
    fn close(tokens: &mut Vec<Token>, start: usize, end: usize, consume: bool) {
        let stop = if consume { end + 1 } else { end };
        let mut region: Vec<Token> = tokens.drain(start..stop).collect();
        if consume {
            region.pop();
        }
        let open = region.remove(0);
        let mut node = Token::compound(Kind::NamedUrl, region);
        node.caption = Some(open.text_str().trim_start_matches('[').to_string());
        node.span = open.span;
        tokens.insert(start, node);
    }
}

impl Pass for ParseUrls {
    fn name(&self) -> &'static str {
        "parse_urls"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let mut start: Option<usize> = None;
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i].kind {
                Kind::UrlLink => {
                    // a second opening abandons the first
                    if let Some(open) = start.take() {
                        i = Self::demote_at(tokens, open) + (i - open - 1);
                    }
                    start = Some(i);
                    i += 1;
                }
                Kind::Special if tokens[i].is_special("]") => match start.take() {
                    Some(open) => {
                        Self::close(tokens, open, i, true);
                        i = open + 1;
                    }
                    None => i += 1,
                },
                Kind::LinkClose => match start.take() {
                    Some(open) => {
                        let close = &mut tokens[i];
                        close.kind = Kind::Special;
                        close.text = Some("]".to_string());
                        if let Some(span) = close.span.as_mut() {
                            span.start += 1;
                        }
                        Self::close(tokens, open, i, false);
                        i = open + 2;
                    }
                    None => i += 1,
                },
                Kind::Newline | Kind::Break => {
                    if let Some(open) = start.take() {
                        i = Self::demote_at(tokens, open) + (i - open - 1);
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }

        if let Some(open) = start {
            Self::demote_at(tokens, open);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::{self, Uniquifier};
    use crate::wiki::refine::RefineOptions;

    fn urls(text: &str) -> Vec<Token> {
        let options = RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        let mut tokens = lexing::tokenize(text, &uniquifier);
        ParseUrls.run(&mut tokens, &ctx);
        tokens
    }

    #[test]
    fn test_named_url() {
        let tokens = urls("see [http://example.org the site] now");
        assert_eq!(tokens.len(), 3);
        let node = &tokens[1];
        assert_eq!(node.kind, Kind::NamedUrl);
        assert_eq!(node.caption.as_deref(), Some("http://example.org"));
        assert_eq!(Token::leaf_text(&node.children), " the site");
    }

    #[test]
    fn test_double_bracket_close_leaves_one() {
        let tokens = urls("[http://example.org x]]");
        assert_eq!(tokens[0].kind, Kind::NamedUrl);
        assert!(tokens[1].is_special("]"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_unclosed_is_demoted() {
        let tokens = urls("[http://example.org x\ny]");
        assert!(tokens[0].is_special("["));
        assert_eq!(tokens[1].kind, Kind::Url);
        assert_eq!(tokens[1].text_str(), "http://example.org");
        assert!(tokens.iter().all(|t| t.kind != Kind::NamedUrl));
    }

    #[test]
    fn test_unclosed_at_end() {
        let tokens = urls("a [http://example.org");
        assert_eq!(tokens.last().map(|t| t.kind), Some(Kind::Url));
        assert_eq!(Token::join_as_text(&tokens), "a [http://example.org");
    }

    #[test]
    fn test_second_opening_abandons_first() {
        let tokens = urls("[http://a.org [http://b.org b]");
        assert!(tokens[0].is_special("["));
        assert_eq!(tokens[1].kind, Kind::Url);
        assert_eq!(tokens[1].text_str(), "http://a.org");
        let node = tokens.iter().find(|t| t.kind == Kind::NamedUrl).unwrap();
        assert_eq!(node.caption.as_deref(), Some("http://b.org"));
        assert_eq!(Token::leaf_text(&node.children), " b");
        assert_eq!(tokens.iter().filter(|t| t.kind == Kind::NamedUrl).count(), 1);
    }
}
