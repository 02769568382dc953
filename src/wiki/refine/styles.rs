//! Inline styles
//!
//!     Two passes live here. [MarkStyleTags] turns html style tags (`<b>`, `<sup>`, ...) into
//!     nested [Kind::Tag] spans, [ParseSingleQuote] turns apostrophe runs into [Kind::Style]
//!     spans decided by [crate::wiki::quotes::compute_path].
//!
//!     Html style tags do not have to nest properly and may span paragraphs, list items or
//!     links. The tag pass therefore keeps the set of open styles across the whole tree instead
//!     of per sibling list: whenever a run of siblings ends (at a tag, or at a token with
//!     children) the run is wrapped in one span per open style. Table structure starts a fresh
//!     set, so a style never leaks from one cell into the next.

use super::pipeline::Pass;
use super::Context;
use crate::wiki::quotes::compute_path;
use crate::wiki::token::{Kind, Token, Vlist};

const STYLE_TAGS: &[&str] = &[
    "abbr", "tt", "strike", "ins", "del", "small", "sup", "sub", "b", "strong", "cite", "i", "u",
    "em", "big", "font", "s", "var", "kbd",
];

fn is_style_tag(token: &Token) -> bool {
    token
        .rawtagname
        .as_deref()
        .is_some_and(|name| STYLE_TAGS.contains(&name))
}

/// Open styles in the order they were opened.
type StyleState = Vec<(String, Option<Vlist>)>;

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkStyleTags;

/// A sibling list being rebuilt, with the style state it shares.
struct Frame {
    input: std::vec::IntoIter<Token>,
    out: Vec<Token>,
    /// Tokens since the last tag or compound, wrapped when the run ends.
    run: Vec<Token>,
    state: usize,
}

impl Frame {
    fn new(list: Vec<Token>, state: usize) -> Self {
        Frame {
            out: Vec::with_capacity(list.len()),
            input: list.into_iter(),
            run: Vec::new(),
            state,
        }
    }

    /// Move the pending run to the output, in one span per open style; the first opened is
    /// innermost.
    fn flush(&mut self, state: &StyleState) {
        if self.run.is_empty() {
            return;
        }
        let mut children = std::mem::take(&mut self.run);
        for (name, vlist) in state {
            children = vec![Token::tag(name.clone(), children).with_vlist(vlist.clone())];
        }
        self.out.extend(children);
    }
}

impl MarkStyleTags {
    /// Continue `frame` up to its end or to the next token with children. In the latter case
    /// the token is moved to the output without its children, which come back as the frame
    /// to descend into.
    fn process(frame: &mut Frame, states: &mut Vec<StyleState>) -> Option<Frame> {
        let sid = frame.state;

        while let Some(mut token) = frame.input.next() {
            if token.kind == Kind::HtmlTag && is_style_tag(&token) {
                if token.self_closing {
                    continue;
                }
                frame.flush(&states[sid]);
                let name = token.rawtagname.unwrap_or_default();
                let state = &mut states[sid];
                match state.iter().position(|(open, _)| *open == name) {
                    Some(pos) => {
                        state.remove(pos);
                    }
                    None => state.push((name, token.vlist)),
                }
            } else if token.kind == Kind::HtmlTagEnd && is_style_tag(&token) {
                let mut name = token.rawtagname.unwrap_or_default();
                if !states[sid].iter().any(|(open, _)| *open == name) {
                    // </sup> closing a <sub> and the reverse are common typos
                    name = match name.as_str() {
                        "sup" => "sub".to_string(),
                        "sub" => "sup".to_string(),
                        _ => name,
                    };
                }
                if let Some(pos) = states[sid].iter().position(|(open, _)| *open == name) {
                    frame.flush(&states[sid]);
                    states[sid].remove(pos);
                }
            } else if !token.children.is_empty() {
                frame.flush(&states[sid]);
                let child_state = match token.kind {
                    Kind::Table | Kind::TableRow | Kind::TableCell => {
                        states.push(StyleState::new());
                        states.len() - 1
                    }
                    _ => sid,
                };
                let children = std::mem::take(&mut token.children);
                frame.out.push(token);
                return Some(Frame::new(children, child_state));
            } else {
                frame.run.push(token);
            }
        }

        frame.flush(&states[sid]);
        None
    }
}

impl Pass for MarkStyleTags {
    fn name(&self) -> &'static str {
        "mark_style_tags"
    }

    fn uses_walker(&self) -> bool {
        false
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let mut states: Vec<StyleState> = vec![StyleState::new()];
        let mut stack = vec![Frame::new(std::mem::take(tokens), 0)];

        // A child list is finished before its parent continues, so the state flows through
        // the tree in document order.
        while let Some(top) = stack.last_mut() {
            if let Some(child) = Self::process(top, &mut states) {
                stack.push(child);
                continue;
            }
            let Some(done) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => {
                    if let Some(owner) = parent.out.last_mut() {
                        owner.children = done.out;
                    }
                }
                None => *tokens = done.out,
            }
        }
    }
}

/// Apostrophe runs into bold / italic spans.
///
/// Every run starts a span reaching to the next run or the end of the line. Once a line is
/// complete its runs are decided together and each span gets its style: `'''` (bold), `''`
/// (italic), `'''` around `''` (both), or a plain [Kind::Node]. Apostrophes a run gives back
/// as text are put at the front of its span.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseSingleQuote;

impl ParseSingleQuote {
    /// Replace the quote at `start` and what follows up to `end` by one span.
    fn span(tokens: &mut Vec<Token>, start: usize, end: usize, spans: &mut Vec<usize>) {
        let children: Vec<Token> = tokens.drain(start + 1..end).collect();
        let quote = std::mem::take(&mut tokens[start]);
        let mut span = Token::compound(Kind::Style, children);
        span.span = quote.span;
        tokens[start] = span;
        spans.push(start);
    }

    fn finish(tokens: &mut [Token], counts: &[usize], spans: &[usize]) {
        for (state, &idx) in compute_path(counts).iter().zip(spans) {
            let Some(span) = tokens.get_mut(idx) else {
                continue;
            };
            if state.apocount > 0 {
                span.children.insert(0, Token::text("'".repeat(state.apocount)));
            }
            match (state.is_bold, state.is_italic) {
                (true, true) => {
                    let children = std::mem::take(&mut span.children);
                    let mut inner = Token::compound(Kind::Style, children);
                    inner.caption = Some("''".to_string());
                    span.children = vec![inner];
                    span.caption = Some("'''".to_string());
                }
                (true, false) => span.caption = Some("'''".to_string()),
                (false, true) => span.caption = Some("''".to_string()),
                (false, false) => span.kind = Kind::Node,
            }
        }
    }
}

impl Pass for ParseSingleQuote {
    fn name(&self) -> &'static str {
        "parse_single_quote"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        let mut counts: Vec<usize> = Vec::new();
        let mut spans: Vec<usize> = Vec::new();
        let mut start: Option<usize> = None;
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i].kind {
                Kind::SingleQuote => {
                    if let Some(s) = start {
                        Self::span(tokens, s, i, &mut spans);
                        i = s + 1;
                    }
                    start = Some(i);
                    counts.push(tokens[i].text_str().len());
                    i += 1;
                }
                Kind::Newline => {
                    if let Some(s) = start.take() {
                        Self::span(tokens, s, i, &mut spans);
                        i = s + 1;
                    }
                    Self::finish(tokens, &counts, &spans);
                    counts.clear();
                    spans.clear();
                    i += 1;
                }
                _ => i += 1,
            }
        }

        if let Some(s) = start {
            let end = tokens.len();
            Self::span(tokens, s, end, &mut spans);
        }
        Self::finish(tokens, &counts, &spans);
    }
}
