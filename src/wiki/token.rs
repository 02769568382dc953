//! Tokens and tree nodes
//!
//!     A single `Token` type is used both for the flat stream produced by the lexer and for the
//!     nodes of the refined tree. Refinement passes replace a contiguous run of sibling tokens by
//!     one compound token that owns them as children, so the same value moves from the flat
//!     stream into the tree without copying.
//!
//!     The kind is a closed enum fixed at construction time. Everything that depends on the kind
//!     (is it compound, is it part of a table, how it is named in dumps) is a method on [Kind]
//!     rather than something attached to the token later.
//!
//!     Passes address tokens by index into their sibling list, never by identity: once a range is
//!     replaced, indices after it shift and must be recomputed by the pass that did the replace.

use std::collections::BTreeMap;
use std::ops::Range;

/// Attribute map of a tag-like token (`<div class="x">` gives `{"class": "x"}`).
pub type Vlist = BTreeMap<String, String>;

/// The kind of a token.
///
/// The first group is produced by the lexer, the second group only by refinement passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    // Flat kinds
    #[default]
    Text,
    /// A single significant character: `[`, `]`, `|` or `:`.
    Special,
    /// Behaviour switch like `__TOC__`.
    MagicWord,
    /// `[[`
    LinkOpen,
    /// `]]`
    LinkClose,
    /// Bare URL.
    Url,
    /// A blank line.
    Break,
    /// `{|` with the attributes of the table line.
    BeginTable,
    /// `|}`
    EndTable,
    HtmlTag,
    HtmlTagEnd,
    /// A run of two or more apostrophes.
    SingleQuote,
    /// The leading space of a preformatted line.
    Pre,
    /// The `=` run opening a heading.
    SectionStart,
    /// The `=` run closing a heading.
    SectionEnd,
    /// A `[*#:;]+` line prefix.
    Item,
    /// `----`
    HRule,
    Newline,
    /// A table cell marker: `|`, `!`, `||` or `!!`.
    Column,
    /// `|-` with the attributes of the row line.
    Row,
    /// `|+`
    TableCaption,
    /// `[http://...`, the opening of a named URL.
    UrlLink,
    /// Placeholder standing in for a protected tag extension.
    Uniq,

    // Compound kinds
    Table,
    Caption,
    TableRow,
    TableCell,
    Tag,
    Link,
    Section,
    Line,
    NamedUrl,
    Style,
    Node,
    Preformatted,
}

impl Kind {
    /// Whether tokens of this kind are only ever created by refinement passes.
    pub fn is_compound(self) -> bool {
        matches!(
            self,
            Kind::Table
                | Kind::Caption
                | Kind::TableRow
                | Kind::TableCell
                | Kind::Tag
                | Kind::Link
                | Kind::Section
                | Kind::Line
                | Kind::NamedUrl
                | Kind::Style
                | Kind::Node
                | Kind::Preformatted
        )
    }

    /// Flat table markup that only has meaning inside `{| ... |}`.
    pub fn is_table_markup(self) -> bool {
        matches!(
            self,
            Kind::EndTable | Kind::Column | Kind::Row | Kind::TableCaption
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Text => "Text",
            Kind::Special => "Special",
            Kind::MagicWord => "MagicWord",
            Kind::LinkOpen => "LinkOpen",
            Kind::LinkClose => "LinkClose",
            Kind::Url => "Url",
            Kind::Break => "Break",
            Kind::BeginTable => "BeginTable",
            Kind::EndTable => "EndTable",
            Kind::HtmlTag => "HtmlTag",
            Kind::HtmlTagEnd => "HtmlTagEnd",
            Kind::SingleQuote => "SingleQuote",
            Kind::Pre => "Pre",
            Kind::SectionStart => "SectionStart",
            Kind::SectionEnd => "SectionEnd",
            Kind::Item => "Item",
            Kind::HRule => "HRule",
            Kind::Newline => "Newline",
            Kind::Column => "Column",
            Kind::Row => "Row",
            Kind::TableCaption => "TableCaption",
            Kind::UrlLink => "UrlLink",
            Kind::Uniq => "Uniq",
            Kind::Table => "Table",
            Kind::Caption => "Caption",
            Kind::TableRow => "TableRow",
            Kind::TableCell => "TableCell",
            Kind::Tag => "Tag",
            Kind::Link => "Link",
            Kind::Section => "Section",
            Kind::Line => "Line",
            Kind::NamedUrl => "NamedUrl",
            Kind::Style => "Style",
            Kind::Node => "Node",
            Kind::Preformatted => "Preformatted",
        }
    }
}

/// Link target information attached to [Kind::Link] tokens.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkInfo {
    /// The target as written, without a leading colon.
    pub target: String,
    /// Namespace-qualified, normalised target. `None` for interwiki links.
    pub full_target: Option<String>,
    /// Namespace id. `None` for interwiki links.
    pub ns: Option<i32>,
    /// `[[:Category:Foo]]` style link that must not embed or categorise.
    pub colon: bool,
    pub interwiki: Option<String>,
    /// Language code when the interwiki prefix is a language link.
    pub langlink: Option<String>,
    pub url: Option<String>,
    /// Options of media links.
    pub image: Option<ImageOptions>,
}

/// Frame style of an image link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Frame,
    Frameless,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageOptions {
    pub thumb: bool,
    /// Explicit thumbnail image given with `thumb=...`.
    pub thumb_source: Option<String>,
    pub frame: Option<Frame>,
    pub border: bool,
    pub align: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `upright` scaling factor, `Some(None)` when given without a value.
    pub upright: Option<Option<f64>>,
    pub link: Option<String>,
    pub alt: Option<String>,
    pub page: Option<String>,
}

/// Payload of tag extensions whose content is not a token tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Math(String),
    Timeline(String),
    Inputbox(String),
    ImageMap(ImageMap),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageMap {
    /// Image line of the map, without brackets.
    pub image: Option<String>,
    /// The image line parsed as a link, when it resolves to a media link.
    pub imagelink: Option<Token>,
    /// Remaining shape / default / desc lines, trimmed.
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Token {
    pub kind: Kind,
    pub text: Option<String>,
    /// Byte range in the (uniquified) source, for tokens coming from the lexer.
    pub span: Option<Range<usize>>,
    pub children: Vec<Token>,
    pub vlist: Option<Vlist>,
    /// Semantic tag name of compound tags (`p`, `ul`, `li`, `td`, ...).
    pub tagname: Option<String>,
    /// Lower-cased tag name of a raw html tag token.
    pub rawtagname: Option<String>,
    pub self_closing: bool,
    /// Layout block; paragraph splitting breaks around these.
    pub blocknode: bool,
    /// Heading level of sections.
    pub level: Option<usize>,
    /// Remaining `[*#:;]` prefix of a [Kind::Line].
    pub lineprefix: Option<String>,
    /// Style marker (`''`, `'''`, `:`, `;`) or the URL of a named URL.
    pub caption: Option<String>,
    pub link: Option<Box<LinkInfo>>,
    pub ext: Option<Box<Extension>>,
}

impl Token {
    pub fn new(kind: Kind) -> Self {
        Token {
            kind,
            ..Default::default()
        }
    }

    pub fn with_text(kind: Kind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Plain text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_text(Kind::Text, text)
    }

    pub fn special(text: impl Into<String>) -> Self {
        Self::with_text(Kind::Special, text)
    }

    /// Compound token owning `children`.
    pub fn compound(kind: Kind, children: Vec<Token>) -> Self {
        Token {
            kind,
            children,
            ..Default::default()
        }
    }

    /// A [Kind::Tag] node named `tagname`.
    pub fn tag(tagname: impl Into<String>, children: Vec<Token>) -> Self {
        Token {
            kind: Kind::Tag,
            tagname: Some(tagname.into()),
            children,
            ..Default::default()
        }
    }

    pub fn block(mut self) -> Self {
        self.blocknode = true;
        self
    }

    pub fn with_vlist(mut self, vlist: Option<Vlist>) -> Self {
        self.vlist = vlist;
        self
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tagname.as_deref() == Some(name)
    }

    pub fn is_special(&self, text: &str) -> bool {
        self.kind == Kind::Special && self.text.as_deref() == Some(text)
    }

    /// Whitespace-only leaves: blank text, newlines and blank lines.
    pub fn is_blank(&self) -> bool {
        match self.kind {
            Kind::Newline | Kind::Break => true,
            Kind::Text => self.text_str().trim().is_empty(),
            _ => false,
        }
    }

    /// Concatenated text of the given tokens, not descending into children.
    pub fn join_as_text(tokens: &[Token]) -> String {
        tokens.iter().map(Token::text_str).collect()
    }

    /// Concatenated text of every leaf below (and including) `tokens`, in document order.
    pub fn leaf_text(tokens: &[Token]) -> String {
        let mut out = String::new();
        for leaf in walk_leaves(tokens) {
            out.push_str(leaf.text_str());
        }
        out
    }
}

/// Iterate over all tokens without children below `tokens`, in document order.
pub fn walk_leaves(tokens: &[Token]) -> impl Iterator<Item = &Token> {
    let mut stack: Vec<std::slice::Iter<'_, Token>> = vec![tokens.iter()];
    std::iter::from_fn(move || loop {
        let top = stack.last_mut()?;
        match top.next() {
            Some(token) if token.children.is_empty() => return Some(token),
            Some(token) => stack.push(token.children.iter()),
            None => {
                stack.pop();
            }
        }
    })
}

/// Every token of `kind` below `tokens`, in document order.
pub fn find_all(tokens: &[Token], kind: Kind) -> Vec<&Token> {
    let mut found = Vec::new();
    let mut stack: Vec<&Token> = tokens.iter().rev().collect();
    while let Some(token) = stack.pop() {
        if token.kind == kind {
            found.push(token);
        }
        stack.extend(token.children.iter().rev());
    }
    found
}
