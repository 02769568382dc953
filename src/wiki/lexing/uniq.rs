//! Protection of tag extensions
//!
//!     Tag extensions (`<nowiki>`, `<ref>`, `<math>`, ...) hold content that must not be read
//!     as wiki markup. Before lexing, every such region is cut out of the text and replaced by an
//!     opaque marker:
//!
//!         a<ref>b ''c''</ref>d   ->   a\x7fUNIQ-ref-0-QINU\x7fd
//!
//!     The lexer turns the marker into a single [crate::wiki::token::Kind::Uniq] token, and a
//!     late refinement pass swaps it for the subtree built from the recorded region. Comments
//!     are dropped in the same scan.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Tag extensions whose content is protected.
pub const EXTENSION_TAGS: &[&str] = &[
    "nowiki",
    "pre",
    "math",
    "ref",
    "gallery",
    "imagemap",
    "poem",
    "source",
    "syntaxhighlight",
    "pages",
    "timeline",
];

static OPENING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)<!--|<({})(\s[^>]*?)?(/?)>",
        EXTENSION_TAGS.join("|")
    ))
    .expect("extension tag pattern")
});

static CLOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)</({})\s*>", EXTENSION_TAGS.join("|")))
        .expect("extension close pattern")
});

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x7fUNIQ-[a-z]+-[0-9]+-QINU\x7f").expect("marker pattern"));

/// One protected region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqEntry {
    /// Lower-cased tag name.
    pub tagname: String,
    /// Raw attribute text of the opening tag.
    pub vlist: String,
    /// Content between the tags, `None` for a self-closing tag.
    pub inner: Option<String>,
    /// The region exactly as written.
    pub complete: String,
}

#[derive(Debug, Clone, Default)]
pub struct Uniquifier {
    entries: HashMap<String, UniqEntry>,
    counter: usize,
}

impl Uniquifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every complete extension region of `text` by a marker and drop comments.
    ///
    /// An opening tag without a matching close is left in place as text.
    pub fn replace_tags(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while let Some(caps) = OPENING.captures_at(text, pos) {
            let Some(whole) = caps.get(0) else { break };
            out.push_str(&text[pos..whole.start()]);

            let Some(name) = caps.get(1) else {
                // comment: an unterminated one runs to the end of the text
                pos = match text[whole.end()..].find("-->") {
                    Some(end) => whole.end() + end + 3,
                    None => text.len(),
                };
                continue;
            };

            let tagname = name.as_str().to_lowercase();
            let vlist = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            if !caps[3].is_empty() {
                let marker = self.insert(UniqEntry {
                    tagname,
                    vlist,
                    inner: None,
                    complete: whole.as_str().to_string(),
                });
                out.push_str(&marker);
                pos = whole.end();
                continue;
            }

            match find_close(text, whole.end(), &tagname) {
                Some((close_start, close_end)) => {
                    let marker = self.insert(UniqEntry {
                        tagname,
                        vlist,
                        inner: Some(text[whole.end()..close_start].to_string()),
                        complete: text[whole.start()..close_end].to_string(),
                    });
                    out.push_str(&marker);
                    pos = close_end;
                }
                None => {
                    out.push_str(whole.as_str());
                    pos = whole.end();
                }
            }
        }

        out.push_str(&text[pos..]);
        out
    }

    fn insert(&mut self, entry: UniqEntry) -> String {
        let marker = format!("\x7fUNIQ-{}-{}-QINU\x7f", entry.tagname, self.counter);
        self.counter += 1;
        tracing::trace!(marker = %marker.escape_debug(), "protected tag extension");
        self.entries.insert(marker.clone(), entry);
        marker
    }

    pub fn get(&self, marker: &str) -> Option<&UniqEntry> {
        self.entries.get(marker)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Put the original regions back in place of the markers of `text`.
    pub fn replace_uniq(&self, text: &str) -> String {
        if self.entries.is_empty() || !text.contains('\x7f') {
            return text.to_string();
        }
        MARKER
            .replace_all(text, |caps: &regex::Captures| {
                self.get(&caps[0])
                    .map(|entry| entry.complete.clone())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn find_close(text: &str, from: usize, tagname: &str) -> Option<(usize, usize)> {
    CLOSING
        .captures_iter(&text[from..])
        .find(|caps| caps[1].eq_ignore_ascii_case(tagname))
        .and_then(|caps| caps.get(0))
        .map(|m| (from + m.start(), from + m.end()))
}
