//! Macro parsing
//!
//!     Turns `{{...}}` and `{{{...}}}` constructs into a typed AST of templates, variables and
//!     parser functions. Only the structure is produced; nothing here expands or evaluates a
//!     macro.
//!
//!     File layout:
//!
//!         templ/
//!         ├── scanner.rs   # brace-aware symbols, include control, protected tags
//!         ├── parser.rs    # recursive brace parser
//!         ├── nodes.rs     # MacroNode and normalisation
//!         ├── magic.rs     # parser function registry
//!         └── cache.rs     # digest-keyed LRU memoization
//!
//!     Malformed input never fails: unbalanced braces come back as literal text. The only error
//!     is configuration that lacks a magic word table, reported when a [MacroParser] is built.

pub mod cache;
pub mod magic;
pub mod nodes;
mod parser;
pub mod scanner;

pub use cache::MacroCache;
pub use magic::ParserFunctions;
pub use nodes::{optimize, Arg, MacroNode};
pub use scanner::TagRules;

use crate::wiki::config::{AliasMap, SiteConfig};
use crate::wiki::error::ConfigError;
use parser::BraceParser;
use std::sync::Arc;

/// Parse `text` into literal text and macro nodes.
///
/// `included` is true when the text is transcluded into another page, which decides what
/// `<noinclude>`, `<includeonly>` and `<onlyinclude>` keep. The alias map is required: without
/// one, localised parser functions would silently parse as templates, so a missing map is a
/// [ConfigError::MissingMagicWords] instead.
pub fn parse(
    text: &str,
    included: bool,
    rules: &TagRules,
    aliases: Option<&AliasMap>,
) -> Result<Vec<MacroNode>, ConfigError> {
    let aliases = aliases.ok_or(ConfigError::MissingMagicWords)?;
    let functions = ParserFunctions::default();
    Ok(parse_with(text, included, rules, aliases, &functions))
}

fn parse_with(
    text: &str,
    included: bool,
    rules: &TagRules,
    aliases: &AliasMap,
    functions: &ParserFunctions,
) -> Vec<MacroNode> {
    let symbols = scanner::tokenize(text, included, rules);
    BraceParser::new(symbols, aliases, functions).parse()
}

/// A configured macro parser, cheap to share between threads.
#[derive(Debug, Clone)]
pub struct MacroParser {
    aliases: Arc<AliasMap>,
    functions: Arc<ParserFunctions>,
    rules: TagRules,
    cache: Option<Arc<MacroCache>>,
}

impl MacroParser {
    /// Build a parser for `site`. Fails when the site has no magic word table.
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(MacroParser {
            aliases: Arc::new(AliasMap::from_site(site)?),
            functions: Arc::new(ParserFunctions::default()),
            rules: TagRules::default(),
            cache: None,
        })
    }

    /// Memoize parses in a shared LRU cache of `capacity` entries.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(Arc::new(MacroCache::new(capacity)));
        self
    }

    pub fn with_shared_cache(mut self, cache: Arc<MacroCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_rules(mut self, rules: TagRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_functions(mut self, functions: ParserFunctions) -> Self {
        self.functions = Arc::new(functions);
        self
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn parse(&self, text: &str, included: bool) -> Vec<MacroNode> {
        let Some(cache) = &self.cache else {
            return self.parse_uncached(text, included);
        };

        let key = MacroCache::key(text, included);
        if let Some(nodes) = cache.get(&key) {
            tracing::trace!(len = text.len(), "macro cache hit");
            return nodes;
        }
        tracing::trace!(len = text.len(), "macro cache miss");
        let nodes = self.parse_uncached(text, included);
        cache.insert(key, nodes.clone());
        nodes
    }

    fn parse_uncached(&self, text: &str, included: bool) -> Vec<MacroNode> {
        parse_with(
            text,
            included,
            &self.rules,
            &self.aliases,
            &self.functions,
        )
    }
}
