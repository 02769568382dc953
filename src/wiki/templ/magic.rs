//! Registry of parser functions
//!
//! Names the macro parser turns into [super::MacroNode::Magic] nodes instead of templates.
//! `#if` and `#switch` have dedicated node types and are not listed here.

use std::collections::BTreeSet;

const DEFAULT_FUNCTIONS: &[&str] = &[
    "#expr",
    "#ifeq",
    "#iferror",
    "#ifexpr",
    "#ifexist",
    "#time",
    "#timel",
    "#rel2abs",
    "#titleparts",
    "#tag",
    "#invoke",
    "#language",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserFunctions {
    names: BTreeSet<String>,
}

impl Default for ParserFunctions {
    fn default() -> Self {
        ParserFunctions::new(DEFAULT_FUNCTIONS.iter().copied())
    }
}

impl ParserFunctions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParserFunctions {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical (alias-resolved, lower-case) name lookup.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let functions = ParserFunctions::default();
        assert!(functions.contains("#expr"));
        assert!(!functions.contains("#if"));
        assert!(!functions.contains("expr"));
    }
}
