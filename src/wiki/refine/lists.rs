//! Line prefix lists
//!
//!     Lines starting with `*`, `#`, `:` or `;` are collected into [Kind::Line] tokens that
//!     remember their prefix, then grouped by the first prefix character, recursively on the
//!     rest of the prefix:
//!
//!         *  ->  ul > li           #  ->  ol > li
//!         :  ->  Style(":") > Node     ;  ->  Style(";") > Node, with `; term : def`
//!                                               split into a following Style(":")
//!
//!     A run of prefixed lines ends at a blank line or at the first token that is not part of
//!     a prefixed line. An end tag of the enclosing list (`</ul>` inside a `*` item) ends the
//!     item; the rest of that line becomes a paragraph line of its own.
//!
//!     Only the first [MAX_MARKUP_DEPTH] prefix characters open levels, the others are text.

use super::pipeline::Pass;
use super::{Context, MAX_MARKUP_DEPTH};
use crate::wiki::token::{Kind, Token};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseLines;

fn prefix_char(line: &Token) -> Option<char> {
    line.lineprefix.as_deref().and_then(|p| p.chars().next())
}

fn prefix_len(line: &Token) -> usize {
    line.lineprefix.as_deref().map_or(0, str::len)
}

fn style(caption: &str) -> Token {
    let mut node = Token::new(Kind::Style);
    node.caption = Some(caption.to_string());
    node.blocknode = true;
    node
}

/// The container for a prefix character, the item it holds and the end tag that closes it.
fn container(prefix: char) -> (Token, fn() -> Token, Option<&'static str>) {
    fn node_item() -> Token {
        Token::new(Kind::Node).block()
    }
    fn li_item() -> Token {
        Token::tag("li", Vec::new()).block()
    }
    match prefix {
        '*' => (Token::tag("ul", Vec::new()).block(), li_item, Some("ul")),
        '#' => (Token::tag("ol", Vec::new()).block(), li_item, Some("ol")),
        ';' => (style(";"), node_item, None),
        _ => (style(":"), node_item, None),
    }
}

impl ParseLines {
    /// Build [Kind::Line] tokens from `region`. Each range is `(item, end)` relative to the
    /// region: the prefix token at `item`, its content up to `end` (exclusive).
    fn make_lines(mut region: Vec<Token>, ranges: &[(usize, usize)]) -> Vec<Token> {
        let mut lines = Vec::with_capacity(ranges.len());
        for &(item, end) in ranges.iter().rev() {
            let mut content = region.split_off(item);
            content.truncate(end - item);
            if content.is_empty() {
                continue;
            }
            let prefix = content.remove(0);
            let mut marks = prefix.text_str().trim().to_string();
            if let Some((at, _)) = marks.char_indices().nth(MAX_MARKUP_DEPTH) {
                content.insert(0, Token::text(marks.split_off(at)));
            }
            let mut line = Token::compound(Kind::Line, content);
            line.lineprefix = Some(marks);
            line.span = prefix.span;
            lines.push(line);
        }
        lines.reverse();
        lines
    }

    /// Replace `tokens[first..end]` with the analysed lines. Returns the index after them.
    fn flush(
        tokens: &mut Vec<Token>,
        first: usize,
        end: usize,
        ranges: &[(usize, usize)],
    ) -> usize {
        let region: Vec<Token> = tokens.drain(first..end).collect();
        let relative: Vec<(usize, usize)> = ranges
            .iter()
            .map(|&(item, end)| (item - first, end - first))
            .collect();
        let mut lines = Self::make_lines(region, &relative);
        analyze(&mut lines);
        let count = lines.len();
        tokens.splice(first..first, lines);
        first + count
    }
}

/// Whether the next line has `prefix` as its first prefix character.
fn next_has(lines: &VecDeque<Token>, prefix: char) -> bool {
    lines.front().and_then(prefix_char) == Some(prefix)
}

/// Group the lines of `lines` in place by their first prefix character.
fn analyze(lines: &mut Vec<Token>) {
    let mut input: VecDeque<Token> = std::mem::take(lines).into();
    while let Some(next) = input.front() {
        let Some(prefix) = prefix_char(next) else {
            if let Some(mut line) = input.pop_front() {
                line.lineprefix = None;
                line.kind = if line.tagname.is_some() {
                    Kind::Tag
                } else {
                    Kind::Node
                };
                lines.push(line);
            }
            continue;
        };

        let (mut node, new_item, endtag) = container(prefix);
        let mut dd = None;
        while next_has(&input, prefix) {
            let (found, stop) = collect_items(&mut input, prefix, &mut node, new_item, endtag);
            dd = found;
            if stop {
                break;
            }
        }

        lines.push(node);
        lines.extend(dd);
    }
}

/// Move items from the front of `lines` into `node`. Returns the definition split off a `;`
/// item and whether grouping under `node` has to stop.
fn collect_items(
    lines: &mut VecDeque<Token>,
    prefix: char,
    node: &mut Token,
    new_item: fn() -> Token,
    endtag: Option<&str>,
) -> (Option<Token>, bool) {
    while next_has(lines, prefix) {
        let mut item = new_item();
        append_line(lines, &mut item, endtag);
        while next_has(lines, prefix) && lines.front().map_or(0, prefix_len) > 1 {
            append_line(lines, &mut item, endtag);
        }

        for line in &mut item.children {
            if let Some(prefix) = line.lineprefix.as_mut().filter(|p| !p.is_empty()) {
                prefix.remove(0);
            }
        }
        analyze(&mut item.children);
        node.children.push(item);

        if prefix == ';' {
            let first = node
                .children
                .last_mut()
                .and_then(|item| item.children.first_mut())
                .filter(|first| first.kind == Kind::Node);
            if let Some(dd) = first.and_then(split_definition) {
                return (Some(dd), true);
            }
        }
        if prefix == ':' || prefix == ';' {
            return (None, true);
        }
    }
    (None, false)
}

/// Move the next line into `item`. With an end tag on the line, only the part before it
/// moves; the rest stays in front as an unprefixed paragraph line.
fn append_line(lines: &mut VecDeque<Token>, item: &mut Token, endtag: Option<&str>) {
    if let (Some(endtag), Some(line)) = (endtag, lines.front_mut()) {
        let at = line.children.iter().position(|t| {
            t.kind == Kind::HtmlTagEnd && t.rawtagname.as_deref() == Some(endtag)
        });
        if let Some(at) = at {
            let rest = line.children.split_off(at + 1);
            line.children.truncate(at);
            let mut after = Token::compound(Kind::Line, rest);
            after.tagname = Some("p".to_string());
            let head = std::mem::replace(line, after);
            item.children.push(head);
            return;
        }
    }
    if let Some(line) = lines.pop_front() {
        item.children.push(line);
    }
}

/// Split `; term : definition` at the first `:` of the term line.
fn split_definition(term: &mut Token) -> Option<Token> {
    let at = term.children.iter().position(|t| t.is_special(":"))?;
    let rest = term.children.split_off(at + 1);
    term.children.truncate(at);
    let mut dd = style(":");
    dd.children = rest;
    Some(dd)
}

impl Pass for ParseLines {
    fn name(&self) -> &'static str {
        "parse_lines"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        // (item index, end) of the complete lines of the current run
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut first: Option<usize> = None;
        let mut line_start: Option<usize> = None;
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i].kind {
                Kind::Item => {
                    if let Some(start) = line_start {
                        // an item without content up to here
                        ranges.push((start, i));
                    }
                    first.get_or_insert(i);
                    line_start = Some(i);
                    i += 1;
                }
                Kind::Newline if line_start.is_some() => {
                    if let Some(start) = line_start.take() {
                        ranges.push((start, i + 1));
                    }
                    i += 1;
                }
                Kind::Break => {
                    if let Some(start) = line_start.take() {
                        ranges.push((start, i));
                    }
                    match first.take() {
                        Some(f) if !ranges.is_empty() => {
                            i = Self::flush(tokens, f, i, &ranges);
                            ranges.clear();
                        }
                        _ => {}
                    }
                    i += 1;
                }
                _ if line_start.is_none() && !ranges.is_empty() => {
                    if let Some(f) = first.take() {
                        i = Self::flush(tokens, f, i, &ranges);
                    }
                    ranges.clear();
                }
                _ => i += 1,
            }
        }

        if let Some(start) = line_start {
            ranges.push((start, tokens.len()));
        }
        if let Some(f) = first {
            if !ranges.is_empty() {
                let end = tokens.len();
                Self::flush(tokens, f, end, &ranges);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::Uniquifier;
    use crate::wiki::refine::RefineOptions;
    use crate::wiki::token::find_all;

    fn item(prefix: &str) -> Token {
        Token::with_text(Kind::Item, prefix)
    }

    fn nl() -> Token {
        Token::with_text(Kind::Newline, "\n")
    }

    fn run(tokens: &mut Vec<Token>) {
        let options = RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        ParseLines.run(tokens, &ctx);
    }

    #[test]
    fn test_prefix_past_the_limit_is_text() {
        let mut tokens = vec![item(&"*".repeat(3000)), Token::text(" x"), nl()];
        run(&mut tokens);
        assert_eq!(tokens.len(), 1);
        let levels = find_all(&tokens, Kind::Tag)
            .into_iter()
            .filter(|t| t.is_tag("ul"))
            .count();
        assert_eq!(levels, MAX_MARKUP_DEPTH);
        assert_eq!(
            Token::leaf_text(&tokens),
            format!("{} x\n", "*".repeat(3000 - MAX_MARKUP_DEPTH))
        );
    }

    #[test]
    fn test_bullets() {
        let mut tokens = vec![
            item("*"),
            Token::text("a"),
            nl(),
            item("*"),
            Token::text("b"),
            nl(),
        ];
        run(&mut tokens);
        assert_eq!(tokens.len(), 1);
        let ul = &tokens[0];
        assert!(ul.is_tag("ul"));
        assert_eq!(ul.children.len(), 2);
        assert!(ul.children.iter().all(|li| li.is_tag("li")));
        assert_eq!(Token::leaf_text(&ul.children[1].children), "b\n");
    }

    #[test]
    fn test_nested_list() {
        let mut tokens = vec![
            item("#"),
            Token::text("a"),
            nl(),
            item("##"),
            Token::text("b"),
            nl(),
        ];
        run(&mut tokens);
        let ol = &tokens[0];
        assert_eq!(ol.children.len(), 1);
        let li = &ol.children[0];
        // the item's own line, then the nested list
        assert_eq!(li.children.len(), 2);
        assert_eq!(li.children[0].kind, Kind::Node);
        assert!(li.children[1].is_tag("ol"));
    }

    #[test]
    fn test_definition_list() {
        let mut tokens = vec![
            item(";"),
            Token::text("term "),
            Token::special(":"),
            Token::text(" def"),
            nl(),
        ];
        run(&mut tokens);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].caption.as_deref(), Some(";"));
        assert_eq!(tokens[1].caption.as_deref(), Some(":"));
        assert_eq!(Token::leaf_text(&tokens[1].children), " def\n");
    }

    #[test]
    fn test_run_ends_at_plain_text() {
        let mut tokens = vec![item(":"), Token::text("a"), nl(), Token::text("b")];
        run(&mut tokens);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, Kind::Style);
        assert_eq!(tokens[1], Token::text("b"));
    }

    #[test]
    fn test_unterminated_line_at_end() {
        let mut tokens = vec![item("*"), Token::text("a")];
        run(&mut tokens);
        assert!(tokens[0].is_tag("ul"));
        assert_eq!(Token::leaf_text(&tokens), "a");
    }

    #[test]
    fn test_end_tag_splits_item() {
        let end = crate::wiki::lexing::tags::analyze_tag("</ul>").unwrap();
        let mut tokens = vec![item("*"), Token::text("a"), end, Token::text("b"), nl()];
        run(&mut tokens);
        assert!(tokens[0].is_tag("ul"));
        assert_eq!(Token::leaf_text(&tokens[0].children), "a");
        assert!(tokens[1].is_tag("p"));
        assert_eq!(Token::leaf_text(&tokens[1].children), "b\n");
    }
}
