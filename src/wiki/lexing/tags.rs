//! HTML tag analysis
//!
//! Raw `<...>` text becomes an [Kind::HtmlTag] or [Kind::HtmlTagEnd] token when its name is on
//! the allow-list. Everything else stays literal text.

use crate::wiki::token::{Kind, Token, Vlist};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tags that survive as markup. Anything else is rendered as the literal text it was written as.
pub const ALLOWED_TAGS: &[&str] = &[
    "abbr", "b", "big", "blockquote", "br", "center", "cite", "code", "del", "div", "em",
    "endfeed", "font", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "index", "inputbox", "ins",
    "kbd", "li", "ol", "p", "pages", "references", "rss", "s", "small", "span", "startfeed",
    "strike", "strong", "sub", "sup", "caption", "table", "td", "th", "tr", "tt", "u", "ul",
    "var", "dl", "dt", "dd",
];

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*(\w+)(.*)$").expect("tag name pattern"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:.-]+)\s*(?:=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+)))?"#)
        .expect("attribute pattern")
});

pub fn is_allowed(name: &str) -> bool {
    ALLOWED_TAGS.contains(&name)
}

/// Parse an attribute string (`class="a" width=3 nowrap`) into a map.
///
/// Keys are lower-cased; values have their entities resolved. Attributes without a value map to
/// an empty string.
pub fn parse_params(text: &str) -> Vlist {
    let mut vlist = Vlist::new();
    for caps in ATTRIBUTE.captures_iter(text) {
        let key = caps[1].to_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
            .unwrap_or_default();
        vlist.insert(key, value);
    }
    vlist
}

/// Like [parse_params], but `None` when there are no attributes.
pub fn parse_vlist(text: &str) -> Option<Vlist> {
    let vlist = parse_params(text);
    (!vlist.is_empty()).then_some(vlist)
}

/// Classify raw tag text. `None` when the tag is not on the allow-list.
pub fn analyze_tag(raw: &str) -> Option<Token> {
    let (inner, is_end, self_closing) = if let Some(rest) = raw.strip_prefix("</") {
        (rest.strip_suffix('>').unwrap_or(rest), true, false)
    } else if let Some(rest) = raw.strip_suffix("/>") {
        (rest.strip_prefix('<').unwrap_or(rest), false, true)
    } else {
        let rest = raw.strip_prefix('<').unwrap_or(raw);
        (rest.strip_suffix('>').unwrap_or(rest), false, false)
    };

    let caps = TAG_NAME.captures(inner)?;
    let name = caps[1].to_lowercase();
    if !is_allowed(&name) {
        return None;
    }

    // </br> is a line break all the same
    let is_end = is_end && name != "br";
    let kind = if is_end {
        Kind::HtmlTagEnd
    } else {
        Kind::HtmlTag
    };

    let mut token = Token::with_text(kind, raw);
    token.vlist = parse_vlist(&caps[2]);
    token.rawtagname = Some(name);
    token.self_closing = self_closing;
    Some(token)
}
