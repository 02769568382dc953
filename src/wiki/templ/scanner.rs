//! Brace-aware scanning of macro text
//!
//!     The macro parser only cares about braces, link brackets, `|` and `=`. Everything else is
//!     literal text. Before the logos lexer runs, a string pass handles the regions that are not
//!     scanned at all:
//!
//!         - comments are removed
//!         - `<noinclude>`, `<includeonly>` and `<onlyinclude>` select what is kept depending on
//!           whether the text is being transcluded, and leave a [Symbol::NoInclude] marker so
//!           that braces on either side of a removed region never join
//!         - protected tags (`<nowiki>`, `<pre>`, ... as configured by [TagRules]) are kept as
//!           literal text, braces and all

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A run of two or more `{`.
    Open(usize),
    /// A run of two or more `}`.
    Close(usize),
    LinkOpen,
    LinkClose,
    Pipe,
    Eq,
    Text(String),
    NoInclude,
}

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
enum Brace {
    #[regex(r"\{\{+")]
    Open,

    #[regex(r"\}\}+")]
    Close,

    #[token("[[")]
    LinkOpen,

    #[token("]]")]
    LinkClose,

    #[token("|")]
    Pipe,

    #[token("=")]
    Eq,

    #[regex(r"[^{}\[\]|=]+")]
    Text,

    #[regex(r"[{}\[\]]")]
    Lone,
}

/// Tags whose content the macro parser leaves alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRules {
    protected: Vec<String>,
}

impl Default for TagRules {
    fn default() -> Self {
        TagRules::new(["nowiki", "pre", "math", "source", "syntaxhighlight"])
    }
}

impl TagRules {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagRules {
            protected: tags.into_iter().map(|t| t.into().to_lowercase()).collect(),
        }
    }

    /// No protected tags at all.
    pub fn none() -> Self {
        TagRules {
            protected: Vec::new(),
        }
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

static INCLUDE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<(/?)(noinclude|includeonly|onlyinclude)\s*(/?)>")
        .expect("include tag pattern")
});

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([A-Za-z]+)(\s[^>]*)?>").expect("open tag pattern"));

static CLOSE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</([A-Za-z]+)\s*>").expect("close tag pattern"));

/// Scan `text` into symbols.
///
/// `included` is true when the text is being transcluded into another page.
pub fn tokenize(text: &str, included: bool, rules: &TagRules) -> Vec<Symbol> {
    let selected = if included { only_include(text) } else { None };
    let mut scanner = Scanner {
        out: Vec::new(),
        included,
        rules,
    };
    scanner.run(selected.as_deref().unwrap_or(text));
    scanner.out
}

struct Scanner<'a> {
    out: Vec<Symbol>,
    included: bool,
    rules: &'a TagRules,
}

impl Scanner<'_> {
    fn run(&mut self, text: &str) {
        let mut pos = 0;
        let mut literal_start = 0;

        while let Some(found) = text[pos..].find('<') {
            let at = pos + found;
            let rest = &text[at..];

            if rest.starts_with("<!--") {
                self.scan(&text[literal_start..at]);
                pos = match rest[4..].find("-->") {
                    Some(end) => at + 4 + end + 3,
                    None => text.len(),
                };
                literal_start = pos;
                continue;
            }

            if let Some(caps) = INCLUDE_TAG.captures(rest) {
                self.scan(&text[literal_start..at]);
                self.out.push(Symbol::NoInclude);

                let end = at + caps[0].len();
                let name = caps[2].to_lowercase();
                let opens_region = caps[1].is_empty() && caps[3].is_empty();
                let dropped = if self.included {
                    name == "noinclude"
                } else {
                    name == "includeonly"
                };
                pos = if opens_region && dropped {
                    find_close(text, end, &name).map_or(text.len(), |(_, close_end)| close_end)
                } else {
                    end
                };
                literal_start = pos;
                continue;
            }

            if let Some(caps) = OPEN_TAG.captures(rest) {
                if self.rules.is_protected(&caps[1]) {
                    let open_end = at + caps[0].len();
                    if let Some((_, close_end)) = find_close(text, open_end, &caps[1]) {
                        self.scan(&text[literal_start..at]);
                        self.push_text(&text[at..close_end]);
                        pos = close_end;
                        literal_start = pos;
                        continue;
                    }
                }
            }

            pos = at + 1;
        }

        self.scan(&text[literal_start..]);
    }

    fn scan(&mut self, segment: &str) {
        let mut lexer = Brace::lexer(segment);
        while let Some(result) = lexer.next() {
            let slice = lexer.slice();
            match result {
                Ok(Brace::Open) => self.out.push(Symbol::Open(slice.len())),
                Ok(Brace::Close) => self.out.push(Symbol::Close(slice.len())),
                Ok(Brace::LinkOpen) => self.out.push(Symbol::LinkOpen),
                Ok(Brace::LinkClose) => self.out.push(Symbol::LinkClose),
                Ok(Brace::Pipe) => self.out.push(Symbol::Pipe),
                Ok(Brace::Eq) => self.out.push(Symbol::Eq),
                Ok(Brace::Text) | Ok(Brace::Lone) | Err(_) => self.push_text(slice),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Symbol::Text(last)) = self.out.last_mut() {
            last.push_str(text);
        } else {
            self.out.push(Symbol::Text(text.to_string()));
        }
    }
}

fn find_close(text: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    CLOSE_TAG
        .captures_iter(&text[from..])
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(0))
        .map(|m| (from + m.start(), from + m.end()))
}

/// Content of the `<onlyinclude>` regions, when there are any.
fn only_include(text: &str) -> Option<String> {
    static ONLY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?is)<onlyinclude\s*>(.*?)(?:</onlyinclude\s*>|$)")
            .expect("onlyinclude pattern")
    });
    let mut regions = ONLY.captures_iter(text).peekable();
    regions.peek()?;
    Some(regions.map(|caps| caps[1].to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<Symbol> {
        tokenize(text, false, &TagRules::default())
    }

    fn txt(s: &str) -> Symbol {
        Symbol::Text(s.to_string())
    }

    #[test]
    fn test_braces_and_separators() {
        assert_eq!(
            scan("{{a|b=[[c]]}}}"),
            vec![
                Symbol::Open(2),
                txt("a"),
                Symbol::Pipe,
                txt("b"),
                Symbol::Eq,
                Symbol::LinkOpen,
                txt("c"),
                Symbol::LinkClose,
                Symbol::Close(3),
            ]
        );
    }

    #[test]
    fn test_single_braces_are_text() {
        assert_eq!(scan("a{b}c"), vec![txt("a{b}c")]);
    }

    #[test]
    fn test_protected_tags_are_literal() {
        assert_eq!(
            scan("x<nowiki>{{y}}</nowiki>z"),
            vec![txt("x<nowiki>{{y}}</nowiki>z")]
        );
        // unterminated protection does not protect
        assert_eq!(scan("<nowiki>{{y}}")[1], Symbol::Open(2));
    }

    #[test]
    fn test_comments_are_removed() {
        assert_eq!(scan("a<!-- {{x}} -->b"), vec![txt("ab")]);
        assert_eq!(scan("a<!-- open {{x}}"), vec![txt("a")]);
    }

    #[test]
    fn test_noinclude_when_included() {
        let symbols = tokenize("a<noinclude>{{doc}}</noinclude>b", true, &TagRules::default());
        assert_eq!(symbols, vec![txt("a"), Symbol::NoInclude, txt("b")]);

        let symbols = tokenize("a<noinclude>b</noinclude>", false, &TagRules::default());
        assert_eq!(
            symbols,
            vec![txt("a"), Symbol::NoInclude, txt("b"), Symbol::NoInclude]
        );
    }

    #[test]
    fn test_includeonly_when_not_included() {
        let symbols = tokenize("a<includeonly>b</includeonly>c", false, &TagRules::default());
        assert_eq!(symbols, vec![txt("a"), Symbol::NoInclude, txt("c")]);
    }

    #[test]
    fn test_onlyinclude_selects_regions() {
        let symbols = tokenize(
            "x<onlyinclude>a</onlyinclude>y<onlyinclude>b</onlyinclude>",
            true,
            &TagRules::default(),
        );
        assert_eq!(symbols, vec![txt("ab")]);
    }
}
