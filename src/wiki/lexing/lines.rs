//! Line-start classification
//!
//! Wiki markup decides most structure by what a line starts with. Each physical line is
//! classified here, the line-start token is emitted, and the rest of the line goes to the
//! inline lexer. Classification order (first match wins):
//!
//!     1. whitespace-only line            Break
//!     2. table markup (inside a table)   EndTable | Row | TableCaption | Column
//!     3. table start                     [Item] BeginTable
//!     4. heading                         SectionStart ... SectionEnd
//!     5. list prefix                     Item
//!     6. leading space                   Pre
//!     7. four or more dashes             HRule
//!
//! Every line except a blank one ends with a Newline token when the source line had one.

use super::inline::{tokenize_inline, CellContext};
use super::tags::parse_vlist;
use super::uniq::Uniquifier;
use crate::wiki::token::{Kind, Token};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(=+)(.+?)(=+)(\s*)$").expect("heading pattern"));

static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[*#:;]+").expect("item pattern"));

static TABLE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)\{\|(.*)$").expect("table start pattern"));

static HRULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{4,}").expect("hrule pattern"));

/// Lexer state carried from line to line.
#[derive(Debug)]
pub struct LineLexer<'a> {
    uniquifier: &'a Uniquifier,
    table_depth: usize,
    out: Vec<Token>,
}

impl<'a> LineLexer<'a> {
    pub fn new(uniquifier: &'a Uniquifier) -> Self {
        LineLexer {
            uniquifier,
            table_depth: 0,
            out: Vec::new(),
        }
    }

    pub fn run(mut self, text: &str) -> Vec<Token> {
        let mut offset = 0;
        for raw in text.split_inclusive('\n') {
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            let has_newline = line.len() < raw.len();
            self.line(line, offset, has_newline);
            offset += raw.len();
        }
        self.out
    }

    fn inline(&mut self, text: &str, offset: usize, cells: CellContext) {
        tokenize_inline(text, offset, cells, self.uniquifier, &mut self.out);
    }

    fn push(&mut self, kind: Kind, text: &str, start: usize) {
        self.out
            .push(Token::with_text(kind, text).with_span(start..start + text.len()));
    }

    fn line(&mut self, line: &str, offset: usize, has_newline: bool) {
        if has_newline && line.trim().is_empty() {
            let text = format!("{}\n", line);
            let len = text.len();
            self.out
                .push(Token::with_text(Kind::Break, text).with_span(offset..offset + len));
            return;
        }

        self.classify(line, offset);

        if has_newline {
            self.push(Kind::Newline, "\n", offset + line.len());
        }
    }

    fn classify(&mut self, line: &str, offset: usize) {
        if self.table_depth > 0 && self.table_line(line, offset) {
            return;
        }

        if let Some(caps) = TABLE_START.captures(line) {
            self.begin_table(line, &caps[2], offset);
            return;
        }

        if let Some(caps) = HEADING.captures(line) {
            let (open, body, close, trailing) = (&caps[1], &caps[2], &caps[3], &caps[4]);
            self.push(Kind::SectionStart, open, offset);
            self.inline(body, offset + open.len(), CellContext::None);
            let close_at = offset + open.len() + body.len();
            self.out.push(
                Token::with_text(Kind::SectionEnd, format!("{}{}", close, trailing))
                    .with_span(close_at..offset + line.len()),
            );
            return;
        }

        if let Some(prefix) = ITEM.find(line) {
            self.push(Kind::Item, prefix.as_str(), offset);
            let rest = &line[prefix.end()..];
            if let Some(caps) = TABLE_START.captures(rest) {
                self.begin_table(rest, &caps[2], offset + prefix.end());
            } else {
                self.inline(rest, offset + prefix.end(), CellContext::None);
            }
            return;
        }

        if line.starts_with(' ') {
            self.push(Kind::Pre, " ", offset);
            self.inline(&line[1..], offset + 1, CellContext::None);
            return;
        }

        if let Some(rule) = HRULE.find(line) {
            self.push(Kind::HRule, rule.as_str(), offset);
            self.inline(&line[rule.end()..], offset + rule.end(), CellContext::None);
            return;
        }

        self.inline(line, offset, CellContext::None);
    }

    fn begin_table(&mut self, line: &str, attrs: &str, offset: usize) {
        self.table_depth += 1;
        let mut token = Token::with_text(Kind::BeginTable, line.trim_start())
            .with_span(offset..offset + line.len());
        token.vlist = parse_vlist(attrs);
        self.out.push(token);
    }

    /// Markup that only exists inside a table. Returns false when the line is not table markup.
    fn table_line(&mut self, line: &str, offset: usize) -> bool {
        let body = line.trim_start();
        let at = offset + line.len() - body.len();

        if let Some(rest) = body.strip_prefix("|}") {
            self.table_depth -= 1;
            self.push(Kind::EndTable, "|}", at);
            self.inline(rest, at + 2, CellContext::None);
        } else if let Some(rest) = body.strip_prefix("|-") {
            let mut token =
                Token::with_text(Kind::Row, body).with_span(at..offset + line.len());
            token.vlist = parse_vlist(rest.trim_start_matches('-'));
            self.out.push(token);
        } else if let Some(rest) = body.strip_prefix("|+") {
            self.push(Kind::TableCaption, "|+", at);
            self.inline(rest, at + 2, CellContext::None);
        } else if let Some(rest) = body.strip_prefix('|') {
            self.push(Kind::Column, "|", at);
            self.inline(rest, at + 1, CellContext::Data);
        } else if let Some(rest) = body.strip_prefix('!') {
            self.push(Kind::Column, "!", at);
            self.inline(rest, at + 1, CellContext::Header);
        } else {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Kind> {
        LineLexer::new(&Uniquifier::new())
            .run(text)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_heading() {
        let tokens = LineLexer::new(&Uniquifier::new()).run("== Title ==  \n");
        assert_eq!(tokens[0].kind, Kind::SectionStart);
        assert_eq!(tokens[0].text_str(), "==");
        let end = tokens.iter().find(|t| t.kind == Kind::SectionEnd).unwrap();
        assert_eq!(end.text_str(), "==  ");
        assert_eq!(tokens.last().unwrap().kind, Kind::Newline);
    }

    #[test]
    fn test_blank_line_is_break() {
        assert_eq!(
            kinds("a\n\nb"),
            vec![Kind::Text, Kind::Newline, Kind::Break, Kind::Text]
        );
    }

    #[test]
    fn test_list_items_and_pre() {
        assert_eq!(
            kinds("*# x\n y"),
            vec![Kind::Item, Kind::Text, Kind::Text, Kind::Newline, Kind::Pre, Kind::Text]
        );
    }

    #[test]
    fn test_table_markup_only_inside_tables() {
        assert_eq!(kinds("| a")[0], Kind::Special);

        let kinds = kinds("{| class=x\n|-\n! h !! h2\n| a || b\n|}");
        assert_eq!(kinds[0], Kind::BeginTable);
        assert!(kinds.contains(&Kind::Row));
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Column).count(), 4);
        assert_eq!(kinds.last(), Some(&Kind::EndTable));
    }

    #[test]
    fn test_indented_table() {
        let tokens = LineLexer::new(&Uniquifier::new()).run(":{|\n|}");
        assert_eq!(tokens[0].kind, Kind::Item);
        assert_eq!(tokens[0].text_str(), ":");
        assert_eq!(tokens[1].kind, Kind::BeginTable);
    }

    #[test]
    fn test_table_attributes() {
        let tokens = LineLexer::new(&Uniquifier::new()).run("{| class=\"wikitable\"\n|}");
        assert_eq!(tokens[0].vlist.as_ref().unwrap()["class"], "wikitable");
    }

    #[test]
    fn test_hrule() {
        assert_eq!(kinds("----"), vec![Kind::HRule]);
    }
}
