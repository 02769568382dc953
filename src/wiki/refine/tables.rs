//! Tables
//!
//!     Three passes, in the order they run:
//!
//!         TableParser            {| ... |} into Table > TableRow > TableCell
//!         TableFixer             cells outside a row get an implicit one, stray markup is text
//!         TableGarbageRemover    blank filler goes, stray content moves in front of the table
//!
//!     The walker never shows a table's own list or a row's own list to a pass, so the two
//!     cleanup passes reach into every table they find in a visible list. Cell contents are
//!     visible lists of their own and are refined cell by cell.
//!
//!     Cell markers:
//!
//!         |  ||      data cell (`||` is a header cell on a `!` line)
//!         !  !!      header cell
//!         |-         row, with the row's attributes
//!         |+         caption
//!
//!     `| align="left" | text` gives the cell attributes: a `|` on the cell's first line,
//!     preceded by plain text only, separates them from the content.

use super::pipeline::Pass;
use super::{Context, MAX_MARKUP_DEPTH};
use crate::wiki::lexing::tags::parse_vlist;
use crate::wiki::token::{Kind, Token};

#[derive(Debug, Clone, Copy, Default)]
pub struct TableParser;

/// Cell and row state while the body of one table is laid out.
#[derive(Default)]
struct Layout {
    children: Vec<Token>,
    row: Option<Token>,
    cell: Option<Token>,
    header_line: bool,
}

impl Layout {
    fn close_cell(&mut self) {
        let Some(mut cell) = self.cell.take() else {
            return;
        };
        if cell.kind == Kind::TableCell {
            split_cell_attributes(&mut cell);
        }
        match (&mut self.row, cell.kind) {
            (Some(row), Kind::TableCell) => row.children.push(cell),
            _ => self.children.push(cell),
        }
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(row) = self.row.take() {
            self.children.push(row);
        }
    }

    fn push(&mut self, token: Token) {
        if let Some(cell) = self.cell.as_mut() {
            cell.children.push(token);
        } else if let Some(row) = self.row.as_mut() {
            row.children.push(token);
        } else {
            self.children.push(token);
        }
    }

    fn open_cell(&mut self, marker: &Token) {
        self.close_cell();
        let header = match marker.text_str() {
            "!" => {
                self.header_line = true;
                true
            }
            "|" => {
                self.header_line = false;
                false
            }
            "!!" => true,
            _ => self.header_line,
        };
        let mut cell = Token::compound(Kind::TableCell, Vec::new());
        cell.tagname = Some(if header { "th" } else { "td" }.to_string());
        cell.span = marker.span.clone();
        self.cell = Some(cell);
    }

    fn open_caption(&mut self, marker: &Token) {
        self.close_row();
        let mut caption = Token::compound(Kind::Caption, Vec::new());
        caption.tagname = Some("caption".to_string());
        caption.span = marker.span.clone();
        self.cell = Some(caption);
    }

    fn open_row(&mut self, marker: Token) {
        self.close_row();
        let mut row = Token::compound(Kind::TableRow, Vec::new()).with_vlist(marker.vlist);
        row.tagname = Some("tr".to_string());
        row.span = marker.span;
        self.row = Some(row);
    }
}

/// Move `attrs |` at the start of a cell into the cell's attributes.
fn split_cell_attributes(cell: &mut Token) {
    let mut at = None;
    for (i, token) in cell.children.iter().enumerate() {
        match token.kind {
            Kind::Special if token.is_special("|") => {
                at = Some(i);
                break;
            }
            Kind::Text | Kind::Special => {}
            _ => break,
        }
    }
    let Some(at) = at else { return };

    let content = cell.children.split_off(at + 1);
    cell.children.truncate(at);
    cell.vlist = parse_vlist(&Token::join_as_text(&cell.children));
    cell.children = content;
}

impl TableParser {
    fn build(begin: Token, body: Vec<Token>) -> Token {
        let mut layout = Layout::default();
        for token in body {
            match token.kind {
                Kind::Row => layout.open_row(token),
                Kind::Column => layout.open_cell(&token),
                Kind::TableCaption => layout.open_caption(&token),
                _ => layout.push(token),
            }
        }
        layout.close_row();

        let mut table = Token::compound(Kind::Table, layout.children)
            .with_vlist(begin.vlist)
            .block();
        table.tagname = Some("table".to_string());
        table.span = begin.span;
        table
    }

    /// Group every `{| ... |}` in `tokens` into a [Kind::Table], inner tables first.
    ///
    /// A table left open at the end takes the rest of the input. Tables nested deeper than
    /// [MAX_MARKUP_DEPTH] keep their `{|` and `|}` as text.
    pub fn group(tokens: &mut Vec<Token>) {
        if !tokens.iter().any(|t| t.kind == Kind::BeginTable) {
            return;
        }

        // open tables, innermost last: the `{|` and the body collected so far
        let mut open: Vec<(Token, Vec<Token>)> = Vec::new();
        let mut literal = 0usize;
        let input = std::mem::take(tokens);

        for mut token in input {
            match token.kind {
                Kind::BeginTable if literal > 0 || open.len() >= MAX_MARKUP_DEPTH => {
                    literal += 1;
                    token.kind = Kind::Text;
                    token.vlist = None;
                    Self::emit(&mut open, tokens, token);
                }
                Kind::BeginTable => open.push((token, Vec::new())),
                Kind::EndTable if literal > 0 => {
                    literal -= 1;
                    token.kind = Kind::Text;
                    Self::emit(&mut open, tokens, token);
                }
                Kind::EndTable => match open.pop() {
                    Some((begin, body)) => {
                        let table = Self::build(begin, body);
                        Self::emit(&mut open, tokens, table);
                    }
                    None => tokens.push(token),
                },
                _ => Self::emit(&mut open, tokens, token),
            }
        }

        while let Some((begin, body)) = open.pop() {
            let table = Self::build(begin, body);
            Self::emit(&mut open, tokens, table);
        }
    }

    fn emit(open: &mut [(Token, Vec<Token>)], out: &mut Vec<Token>, token: Token) {
        match open.last_mut() {
            Some((_, body)) => body.push(token),
            None => out.push(token),
        }
    }
}

impl Pass for TableParser {
    fn name(&self) -> &'static str {
        "parse_tables"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        Self::group(tokens);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableFixer;

impl TableFixer {
    /// Wrap runs of cells sitting directly in `table` into rows.
    fn wrap_cells(table: &mut Token) {
        let children = std::mem::take(&mut table.children);
        let mut row: Option<Token> = None;
        for child in children {
            if child.kind == Kind::TableCell {
                row.get_or_insert_with(|| {
                    let mut row = Token::compound(Kind::TableRow, Vec::new());
                    row.tagname = Some("tr".to_string());
                    row
                })
                .children
                .push(child);
                continue;
            }
            if let Some(done) = row.take() {
                table.children.push(done);
            }
            table.children.push(child);
        }
        if let Some(done) = row {
            table.children.push(done);
        }
    }
}

impl Pass for TableFixer {
    fn name(&self) -> &'static str {
        "fix_tables"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        for token in tokens.iter_mut() {
            if token.kind == Kind::Table {
                Self::wrap_cells(token);
            } else if token.kind.is_table_markup() {
                token.kind = Kind::Text;
                token.vlist = None;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableGarbageRemover;

impl TableGarbageRemover {
    /// Keep the children of `parent` that are of `keep`; return the others that carry content.
    fn sift(parent: &mut Token, keep: &[Kind], out: &mut Vec<Token>) {
        let children = std::mem::take(&mut parent.children);
        for child in children {
            if keep.contains(&child.kind) {
                parent.children.push(child);
            } else if !child.is_blank() {
                out.push(child);
            }
        }
    }

    /// Clean `table` and return the stray content to put in front of it.
    fn clean(table: &mut Token) -> Vec<Token> {
        let mut stray = Vec::new();
        Self::sift(table, &[Kind::TableRow, Kind::Caption], &mut stray);
        for row in table.children.iter_mut().filter(|t| t.kind == Kind::TableRow) {
            Self::sift(row, &[Kind::TableCell], &mut stray);
        }
        stray
    }
}

impl Pass for TableGarbageRemover {
    fn name(&self) -> &'static str {
        "remove_table_garbage"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].kind != Kind::Table {
                i += 1;
                continue;
            }
            let stray = Self::clean(&mut tokens[i]);
            let moved = stray.len();
            if moved > 0 {
                tracing::trace!(moved, "content moved out of table");
            }
            tokens.splice(i..i, stray);
            i += moved + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::{self, Uniquifier};
    use crate::wiki::token::{find_all, walk_leaves};

    fn tables(text: &str) -> Vec<Token> {
        let mut tokens = lexing::tokenize(text, &Uniquifier::new());
        TableParser::group(&mut tokens);
        tokens
    }

    fn cells(row: &Token) -> Vec<(String, String)> {
        row.children
            .iter()
            .filter(|t| t.kind == Kind::TableCell)
            .map(|c| {
                (
                    c.tagname.clone().unwrap_or_default(),
                    Token::leaf_text(&c.children).trim().to_string(),
                )
            })
            .collect()
    }

    fn first_cell(table: &Token) -> &Token {
        table
            .children
            .iter()
            .filter(|t| t.kind == Kind::TableRow)
            .flat_map(|row| row.children.iter())
            .find(|t| t.kind == Kind::TableCell)
            .unwrap()
    }

    #[test]
    fn test_rows_and_cells() {
        let tokens = tables("{| class=\"t\"\n|-\n! h1 !! h2\n|-\n| a || b\n|}\nafter");
        let table = &tokens[0];
        assert_eq!(table.kind, Kind::Table);
        assert!(table.blocknode);
        assert_eq!(table.vlist.as_ref().unwrap()["class"], "t");

        let rows: Vec<&Token> = table
            .children
            .iter()
            .filter(|t| t.kind == Kind::TableRow)
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            cells(rows[0]),
            vec![("th".into(), "h1".into()), ("th".into(), "h2".into())]
        );
        assert_eq!(
            cells(rows[1]),
            vec![("td".into(), "a".into()), ("td".into(), "b".into())]
        );
        assert_eq!(Token::leaf_text(&tokens[1..]), "\nafter");
    }

    #[test]
    fn test_header_line_double_pipe() {
        let tokens = tables("{|\n|-\n! a || b\n|}");
        let row = &tokens[0].children[1];
        assert_eq!(
            cells(row),
            vec![("th".into(), "a".into()), ("th".into(), "b".into())]
        );
    }

    #[test]
    fn test_cell_attributes() {
        let tokens = tables("{|\n|-\n| align=\"left\" | text\n|}");
        let cell = first_cell(&tokens[0]);
        assert_eq!(cell.vlist.as_ref().unwrap()["align"], "left");
        assert_eq!(Token::leaf_text(&cell.children).trim(), "text");
    }

    #[test]
    fn test_link_pipe_is_not_an_attribute() {
        let tokens = tables("{|\n|-\n| [[a|b]]\n|}");
        let cell = first_cell(&tokens[0]);
        assert!(cell.vlist.is_none());
        assert!(cell.children.iter().any(|t| t.kind == Kind::LinkOpen));
    }

    #[test]
    fn test_caption() {
        let tokens = tables("{|\n|+ Title\n|-\n| x\n|}");
        let caption = tokens[0]
            .children
            .iter()
            .find(|t| t.kind == Kind::Caption)
            .unwrap();
        assert_eq!(Token::leaf_text(&caption.children).trim(), "Title");
    }

    #[test]
    fn test_nested_table() {
        let tokens = tables("{|\n|-\n| outer\n{|\n|-\n| inner\n|}\n|}");
        assert_eq!(tokens.len(), 1);
        let cell = first_cell(&tokens[0]);
        assert!(cell.children.iter().any(|t| t.kind == Kind::Table));
    }

    #[test]
    fn test_tables_nested_past_the_limit_stay_text() {
        let tokens = tables(&"{|\n|\n".repeat(1000));
        assert_eq!(tokens.len(), 1);
        assert_eq!(find_all(&tokens, Kind::Table).len(), MAX_MARKUP_DEPTH);
        let literal = walk_leaves(&tokens)
            .filter(|t| t.text_str().starts_with("{|"))
            .count();
        assert_eq!(literal, 1000 - MAX_MARKUP_DEPTH);
    }

    #[test]
    fn test_unterminated_inner_table_closes_with_outer() {
        let tokens = tables("{|\n| a\n{|\n| b\n|}\n| c");
        assert_eq!(tokens.len(), 1);
        let found = find_all(&tokens, Kind::Table);
        assert_eq!(found.len(), 2);
        let inner = Token::leaf_text(&found[1].children);
        assert!(inner.contains('b') && !inner.contains('c'));
        assert!(Token::leaf_text(&found[0].children).contains('c'));
    }

    #[test]
    fn test_unterminated_table_takes_the_rest() {
        let tokens = tables("{|\n|-\n| a\nb");
        assert_eq!(tokens.len(), 1);
        assert_eq!(Token::leaf_text(&tokens[0].children).trim(), "a\nb");
    }

    #[test]
    fn test_fixer_wraps_loose_cells() {
        let mut tokens = tables("{|\n| a\n| b\n|}");
        let options = crate::wiki::refine::RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        TableFixer.run(&mut tokens, &ctx);
        let table = &tokens[0];
        let row = table.children.iter().find(|t| t.kind == Kind::TableRow).unwrap();
        assert_eq!(cells(row).len(), 2);
    }

    #[test]
    fn test_fixer_demotes_stray_markup() {
        let mut tokens = vec![Token::with_text(Kind::EndTable, "|}")];
        let options = crate::wiki::refine::RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        TableFixer.run(&mut tokens, &ctx);
        assert_eq!(tokens[0], Token::text("|}"));
    }

    #[test]
    fn test_garbage_is_removed_and_content_hoisted() {
        let mut tokens = tables("{|\nstray\n|-\n| a\n|}");
        let options = crate::wiki::refine::RefineOptions::english().unwrap();
        let uniquifier = Uniquifier::new();
        let ctx = Context {
            options: &options,
            uniquifier: &uniquifier,
            depth: 0,
        };
        TableGarbageRemover.run(&mut tokens, &ctx);
        assert_eq!(tokens[0].text_str(), "stray");
        let table = tokens.iter().find(|t| t.kind == Kind::Table).unwrap();
        assert!(table.children.iter().all(|t| t.kind == Kind::TableRow));
        let row = &table.children[0];
        assert!(row.children.iter().all(|t| t.kind == Kind::TableCell));
    }
}
