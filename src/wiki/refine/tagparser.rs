//! Grouping of html start and end tags
//!
//!     A [TagParser] owns a set of tag names. Within one sibling list it pairs their
//!     [Kind::HtmlTag] and [Kind::HtmlTagEnd] tokens and replaces each pair and everything in
//!     between by a single [Kind::Tag] node. Open tags live on a stack, each collecting what
//!     follows it:
//!
//!         - a non-nested tag closes an open tag of the same name before opening
//!         - an end tag closes every tag opened after its match, innermost first, unless one
//!           of those has a higher priority; then the end tag is dropped
//!         - end tags without an open match are dropped
//!         - self-closing tags become empty nodes
//!         - tags still open at the end of the list take the rest of it
//!         - past [MAX_MARKUP_DEPTH] open tags, a start tag and its end tag stay text

use super::pipeline::Pass;
use super::{Context, MAX_MARKUP_DEPTH};
use crate::wiki::token::{Extension, Kind, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    pub priority: usize,
    pub blocknode: bool,
    /// Whether a tag of this name may open inside another one.
    pub nested: bool,
}

impl TagSpec {
    pub fn new(name: impl Into<String>, priority: usize) -> Self {
        TagSpec {
            name: name.into(),
            priority,
            blocknode: false,
            nested: true,
        }
    }

    pub fn block(mut self) -> Self {
        self.blocknode = true;
        self
    }

    pub fn not_nested(mut self) -> Self {
        self.nested = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TagParser {
    name: &'static str,
    specs: Vec<TagSpec>,
}

/// A start tag waiting for its end tag, with what was collected since.
struct Open {
    spec: usize,
    start: Token,
    children: Vec<Token>,
}

fn emit(open: &mut [Open], out: &mut Vec<Token>, token: Token) {
    match open.last_mut() {
        Some(top) => top.children.push(token),
        None => out.push(token),
    }
}

impl TagParser {
    pub fn new(name: &'static str, specs: Vec<TagSpec>) -> Self {
        TagParser { name, specs }
    }

    fn spec_of(&self, token: &Token) -> Option<usize> {
        if !matches!(token.kind, Kind::HtmlTag | Kind::HtmlTagEnd) {
            return None;
        }
        let raw = token.rawtagname.as_deref()?;
        self.specs.iter().position(|spec| spec.name == raw)
    }

    pub fn group(&self, tokens: &mut Vec<Token>) {
        if !tokens.iter().any(|t| self.spec_of(t).is_some()) {
            return;
        }

        let mut out = Vec::with_capacity(tokens.len());
        let mut open: Vec<Open> = Vec::new();
        // specs of start tags kept as text past the depth limit
        let mut literal: Vec<usize> = Vec::new();

        for mut token in std::mem::take(tokens) {
            let Some(spec) = self.spec_of(&token) else {
                emit(&mut open, &mut out, token);
                continue;
            };

            if token.kind == Kind::HtmlTag {
                if token.self_closing {
                    let node = self.node(spec, token, Vec::new());
                    emit(&mut open, &mut out, node);
                    continue;
                }
                if !self.specs[spec].nested {
                    if let Some(k) = open.iter().rposition(|o| o.spec == spec) {
                        self.close(&mut open, &mut out, k);
                    }
                }
                if open.len() >= MAX_MARKUP_DEPTH {
                    token.kind = Kind::Text;
                    token.vlist = None;
                    literal.push(spec);
                    emit(&mut open, &mut out, token);
                    continue;
                }
                open.push(Open {
                    spec,
                    start: token,
                    children: Vec::new(),
                });
                continue;
            }

            // end tag
            if literal.last() == Some(&spec) {
                literal.pop();
                token.kind = Kind::Text;
                emit(&mut open, &mut out, token);
                continue;
            }
            let priority = self.specs[spec].priority;
            let matching = open.iter().rposition(|o| o.spec == spec);
            let blocked = matching.map_or(true, |k| {
                open[k + 1..]
                    .iter()
                    .any(|o| self.specs[o.spec].priority > priority)
            });
            if let (Some(k), false) = (matching, blocked) {
                self.close(&mut open, &mut out, k);
            }
        }

        self.close(&mut open, &mut out, 0);
        *tokens = out;
    }

    /// Close `open[k..]`, innermost first, each into the one below it.
    fn close(&self, open: &mut Vec<Open>, out: &mut Vec<Token>, k: usize) {
        while open.len() > k {
            let Some(top) = open.pop() else { break };
            let node = self.node(top.spec, top.start, top.children);
            emit(open, out, node);
        }
    }

    fn node(&self, spec: usize, start: Token, children: Vec<Token>) -> Token {
        let spec = &self.specs[spec];
        let mut node = Token::tag(spec.name.clone(), children).with_vlist(start.vlist);
        node.blocknode = spec.blocknode;
        node.span = start.span;
        node
    }
}

impl Pass for TagParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        self.group(tokens);
    }
}

/// Groups `<inputbox>` and keeps its content as raw text.
#[derive(Debug, Clone)]
pub struct InputboxParser {
    tags: TagParser,
}

impl InputboxParser {
    pub fn new() -> Self {
        InputboxParser {
            tags: TagParser::new("inputbox", vec![TagSpec::new("inputbox", 10)]),
        }
    }
}

impl Default for InputboxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for InputboxParser {
    fn name(&self) -> &'static str {
        "parse_inputbox"
    }

    fn run(&self, tokens: &mut Vec<Token>, _ctx: &Context) {
        self.tags.group(tokens);
        for token in tokens.iter_mut().filter(|t| t.is_tag("inputbox")) {
            let text = Token::join_as_text(&token.children);
            token.children.clear();
            token.ext = Some(Box::new(Extension::Inputbox(text)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::lexing::tags::analyze_tag;
    use crate::wiki::token::find_all;

    fn tag(raw: &str) -> Token {
        analyze_tag(raw).unwrap()
    }

    fn parser() -> TagParser {
        TagParser::new(
            "test",
            vec![
                TagSpec::new("span", 20),
                TagSpec::new("p", 30).block().not_nested(),
                TagSpec::new("center", 45).block(),
            ],
        )
    }

    fn grouped(mut tokens: Vec<Token>) -> Vec<Token> {
        parser().group(&mut tokens);
        tokens
    }

    #[test]
    fn test_pair_becomes_node() {
        let tokens = grouped(vec![
            Token::text("a"),
            tag("<span class=\"x\">"),
            Token::text("b"),
            tag("</span>"),
            Token::text("c"),
        ]);
        assert_eq!(tokens.len(), 3);
        assert!(tokens[1].is_tag("span"));
        assert_eq!(tokens[1].vlist.as_ref().unwrap()["class"], "x");
        assert_eq!(tokens[1].children, vec![Token::text("b")]);
    }

    #[test]
    fn test_unclosed_takes_the_rest() {
        let tokens = grouped(vec![tag("<center>"), Token::text("a"), Token::text("b")]);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].blocknode);
        assert_eq!(tokens[0].children.len(), 2);
    }

    #[test]
    fn test_stray_end_tag_is_dropped() {
        let tokens = grouped(vec![Token::text("a"), tag("</span>"), Token::text("b")]);
        assert_eq!(tokens, vec![Token::text("a"), Token::text("b")]);
    }

    #[test]
    fn test_non_nested_tag_closes_previous() {
        let tokens = grouped(vec![
            tag("<p>"),
            Token::text("a"),
            tag("<p>"),
            Token::text("b"),
        ]);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].children, vec![Token::text("a")]);
        assert_eq!(tokens[1].children, vec![Token::text("b")]);
    }

    #[test]
    fn test_higher_priority_blocks_end_tag() {
        // </p> cannot close across the still open <center>
        let tokens = grouped(vec![
            tag("<p>"),
            tag("<center>"),
            Token::text("a"),
            tag("</p>"),
            Token::text("b"),
        ]);
        assert_eq!(tokens.len(), 1);
        let center = &tokens[0].children[0];
        assert!(center.is_tag("center"));
        assert_eq!(center.children, vec![Token::text("a"), Token::text("b")]);
    }

    #[test]
    fn test_end_tag_closes_inner_tags() {
        let tokens = grouped(vec![
            tag("<center>"),
            tag("<span>"),
            Token::text("a"),
            tag("</center>"),
            Token::text("b"),
        ]);
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].children[0].is_tag("span"));
        assert_eq!(tokens[1], Token::text("b"));
    }

    #[test]
    fn test_tags_nested_past_the_limit_stay_text() {
        let depth = MAX_MARKUP_DEPTH + 5;
        let mut tokens: Vec<Token> = (0..depth).map(|_| tag("<span>")).collect();
        tokens.push(Token::text("a"));
        tokens.extend((0..depth).map(|_| tag("</span>")));

        let tokens = grouped(tokens);
        assert_eq!(tokens.len(), 1);
        let nodes = find_all(&tokens, Kind::Tag);
        assert_eq!(nodes.len(), MAX_MARKUP_DEPTH);
        let inner = nodes[MAX_MARKUP_DEPTH - 1];
        assert_eq!(inner.children.len(), 2 * 5 + 1);
        assert_eq!(Token::join_as_text(&inner.children[..5]), "<span>".repeat(5));
        assert_eq!(Token::join_as_text(&inner.children[6..]), "</span>".repeat(5));
    }

    #[test]
    fn test_many_stray_end_tags() {
        let mut tokens = vec![Token::text("a")];
        tokens.extend((0..50_000).map(|_| tag("</span>")));
        assert_eq!(grouped(tokens), vec![Token::text("a")]);
    }

    #[test]
    fn test_self_closing_is_empty() {
        let tokens = grouped(vec![tag("<span/>"), Token::text("a")]);
        assert!(tokens[0].is_tag("span"));
        assert!(tokens[0].children.is_empty());
    }
}
