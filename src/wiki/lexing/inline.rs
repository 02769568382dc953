//! Inline tokenization
//!
//! The logos lexer for the content of a single line. Line-start constructs (headings, list
//! prefixes, table markup) are recognised by [super::lines] before this lexer sees the rest of
//! the line.

use crate::wiki::lexing::tags::analyze_tag;
use crate::wiki::lexing::uniq::Uniquifier;
use crate::wiki::token::{Kind, Token};
use logos::Logos;

/// Raw inline tokens.
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum InlineToken {
    #[token("[[")]
    LinkOpen,

    #[token("]]")]
    LinkClose,

    #[regex(r"''+")]
    Quotes,

    #[regex(r#"\[(https?://|ftp://|mailto:|news:|irc://)[^\s<>\[\]"\x7f]+"#)]
    UrlLink,

    #[regex(r#"(https?://|ftp://|mailto:|news:|irc://)[^\s<>\[\]"\x7f]+"#)]
    Url,

    #[regex(r"</?[A-Za-z][A-Za-z0-9]*(\s[^<>]*)?/?>")]
    Tag,

    #[regex(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")]
    Entity,

    #[regex(r"__[A-Z]+__")]
    MagicWord,

    #[token("||")]
    DoublePipe,

    #[token("!!")]
    DoubleBang,

    #[regex(r"\x7fUNIQ-[a-z]+-[0-9]+-QINU\x7f")]
    Uniq,

    #[regex(r"[\[\]|:]")]
    Special,

    #[regex(r"[A-Za-z0-9]+")]
    Word,

    #[regex(r"[^\[\]|:'<&_\x7f!A-Za-z0-9\n]+")]
    Other,

    // Single characters that did not start a longer token
    #[regex(r"['<&_\x7f!\n]")]
    Lone,
}

/// How cell separators are read on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellContext {
    /// Not a table cell line: `||` is two pipes, `!!` is text.
    #[default]
    None,
    /// A `|` cell line: `||` starts a new cell.
    Data,
    /// A `!` cell line: `||` and `!!` start new cells.
    Header,
}

/// Characters stripped from the end of a bare URL and given back as text.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\''];

/// Tokenize the inline content `text`, which starts at byte `offset` of the source.
pub fn tokenize_inline(
    text: &str,
    offset: usize,
    cells: CellContext,
    uniquifier: &Uniquifier,
    out: &mut Vec<Token>,
) {
    let mut lexer = InlineToken::lexer(text);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let abs = offset + span.start..offset + span.end;

        let Ok(token) = result else {
            out.push(Token::text(slice).with_span(abs));
            continue;
        };

        match token {
            InlineToken::LinkOpen => {
                out.push(Token::with_text(Kind::LinkOpen, slice).with_span(abs))
            }
            InlineToken::LinkClose => {
                out.push(Token::with_text(Kind::LinkClose, slice).with_span(abs))
            }
            InlineToken::Quotes => {
                out.push(Token::with_text(Kind::SingleQuote, slice).with_span(abs))
            }
            InlineToken::UrlLink => {
                out.push(Token::with_text(Kind::UrlLink, slice).with_span(abs))
            }
            InlineToken::Url => {
                let url = slice.trim_end_matches(URL_TRAILING);
                let cut = abs.start + url.len();
                out.push(Token::with_text(Kind::Url, url).with_span(abs.start..cut));
                if url.len() < slice.len() {
                    out.push(Token::text(&slice[url.len()..]).with_span(cut..abs.end));
                }
            }
            InlineToken::Tag => {
                let raw = uniquifier.replace_uniq(slice);
                let tag = analyze_tag(&raw).unwrap_or_else(|| Token::text(slice));
                out.push(tag.with_span(abs));
            }
            InlineToken::Entity => {
                let decoded = html_escape::decode_html_entities(slice);
                out.push(Token::text(decoded).with_span(abs));
            }
            InlineToken::MagicWord => {
                out.push(Token::with_text(Kind::MagicWord, slice).with_span(abs))
            }
            InlineToken::DoublePipe => match cells {
                CellContext::None => {
                    out.push(Token::special("|").with_span(abs.start..abs.start + 1));
                    out.push(Token::special("|").with_span(abs.start + 1..abs.end));
                }
                _ => out.push(Token::with_text(Kind::Column, slice).with_span(abs)),
            },
            InlineToken::DoubleBang => match cells {
                CellContext::Header => {
                    out.push(Token::with_text(Kind::Column, slice).with_span(abs))
                }
                _ => out.push(Token::text(slice).with_span(abs)),
            },
            InlineToken::Uniq => out.push(Token::with_text(Kind::Uniq, slice).with_span(abs)),
            InlineToken::Special => out.push(Token::special(slice).with_span(abs)),
            InlineToken::Word | InlineToken::Other | InlineToken::Lone => {
                out.push(Token::text(slice).with_span(abs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str, cells: CellContext) -> Vec<(Kind, String)> {
        let mut out = Vec::new();
        tokenize_inline(text, 0, cells, &Uniquifier::new(), &mut out);
        out.into_iter()
            .map(|t| (t.kind, t.text.unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_links_and_quotes() {
        let tokens = kinds("''[[a|b]]''", CellContext::None);
        let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::SingleQuote,
                Kind::LinkOpen,
                Kind::Text,
                Kind::Special,
                Kind::Text,
                Kind::LinkClose,
                Kind::SingleQuote,
            ]
        );
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let tokens = kinds("see http://example.org/x.", CellContext::None);
        assert!(tokens.contains(&(Kind::Url, "http://example.org/x".to_string())));
        assert_eq!(tokens.last(), Some(&(Kind::Text, ".".to_string())));
    }

    #[test]
    fn test_named_url_opening() {
        let tokens = kinds("[http://example.org label]", CellContext::None);
        assert_eq!(tokens[0], (Kind::UrlLink, "[http://example.org".to_string()));
        assert_eq!(tokens.last(), Some(&(Kind::Special, "]".to_string())));
    }

    #[test]
    fn test_entities_resolve() {
        let tokens = kinds("a&amp;b", CellContext::None);
        let text: String = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text, "a&b");
    }

    #[test]
    fn test_double_pipe_depends_on_cell_context() {
        let outside = kinds("a||b", CellContext::None);
        assert_eq!(outside[1], (Kind::Special, "|".to_string()));
        assert_eq!(outside[2], (Kind::Special, "|".to_string()));

        let inside = kinds("a||b", CellContext::Data);
        assert_eq!(inside[1], (Kind::Column, "||".to_string()));

        assert_eq!(kinds("a!!b", CellContext::Data)[1].0, Kind::Text);
        assert_eq!(kinds("a!!b", CellContext::Header)[1].0, Kind::Column);
    }

    #[test]
    fn test_unknown_tags_are_text() {
        let tokens = kinds("<blink>x</blink>", CellContext::None);
        assert!(tokens.iter().all(|(k, _)| *k == Kind::Text));
    }

    #[test]
    fn test_magic_word() {
        let tokens = kinds("__NOTOC__", CellContext::None);
        assert_eq!(tokens, vec![(Kind::MagicWord, "__NOTOC__".to_string())]);
    }
}
