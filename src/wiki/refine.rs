//! Structural refinement
//!
//!     The lexer's flat token list is turned into the final tree by a fixed sequence of
//!     in-place rewriting passes. Each pass looks at one sibling list at a time and replaces
//!     contiguous runs of siblings by a single compound token owning them.
//!
//!     File layout:
//!
//!         refine/
//!         ├── pipeline.rs       # Pass trait, the ordered pass list, driver
//!         ├── walker.rs         # scoped traversal skipping opaque containers
//!         ├── tagparser.rs      # generic html start/end tag grouping
//!         ├── fixups.rs         # bracket/url adjacency, break before pre, stray li
//!         ├── uniq.rs           # placeholder substitution for tag extensions
//!         ├── tables.rs         # table grouping, cell fixup, garbage removal
//!         ├── sections.rs       # =heading= into nested sections
//!         ├── urls.rs           # [http://... caption]
//!         ├── links.rs          # [[target|...]]
//!         ├── imagemod.rs       # image option sub-grammar of media links
//!         ├── lists.rs          # *#:; line prefixes
//!         ├── paragraphs.rs     # paragraph splitting
//!         ├── preformatted.rs   # leading-space blocks
//!         └── styles.rs         # html style tags and apostrophe runs
//!
//!     Order matters: later passes assume the groupings of earlier ones exist. See
//!     [pipeline::Pipeline::standard] for the order and why it runs back to front.
//!
//!     Some tag extensions (`ref`, `poem`, `gallery`, `imagemap`) contain wiki text of their
//!     own. Their content is parsed as an independent sub-document with [parse_nested], bounded
//!     by [MAX_NESTING].

pub mod fixups;
pub mod imagemod;
pub mod links;
pub mod lists;
pub mod paragraphs;
pub mod pipeline;
pub mod preformatted;
pub mod sections;
pub mod styles;
pub mod tables;
pub mod tagparser;
pub mod uniq;
pub mod urls;
pub mod walker;

pub use imagemod::ImageModifiers;
pub use pipeline::{Pass, Pipeline};

use crate::wiki::config::SiteConfig;
use crate::wiki::error::ConfigError;
use crate::wiki::lexing::{self, Uniquifier};
use crate::wiki::namespace::{NamespaceResolver, SiteNamespaces};
use crate::wiki::token::Token;
use std::fmt;
use std::sync::Arc;

/// Sub-documents nested deeper than this are kept as plain text.
pub const MAX_NESTING: usize = 16;

/// Containers a single pass may open inside each other: tables in tables, list levels, open
/// html tags, links in link captions. Markup nested deeper stays text.
pub const MAX_MARKUP_DEPTH: usize = 32;

/// Everything the passes need to know about the page and the site.
#[derive(Clone)]
pub struct RefineOptions {
    /// Title of the page being parsed, used to resolve `[[/Subpage]]` links.
    pub title: Option<String>,
    pub lang: String,
    pub namespaces: Arc<dyn NamespaceResolver>,
    pub imagemod: Arc<ImageModifiers>,
}

impl fmt::Debug for RefineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefineOptions")
            .field("title", &self.title)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

impl RefineOptions {
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(RefineOptions {
            title: None,
            lang: site.lang().to_string(),
            namespaces: Arc::new(SiteNamespaces::from_site(site)?),
            imagemod: Arc::new(ImageModifiers::from_site(site)?),
        })
    }

    /// Options for the embedded English site configuration.
    pub fn english() -> Result<Self, ConfigError> {
        Self::new(&SiteConfig::english()?)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn NamespaceResolver>) -> Self {
        self.namespaces = resolver;
        self
    }
}

/// Per-parse state handed to every pass.
pub struct Context<'a> {
    pub options: &'a RefineOptions,
    /// Placeholder table of the text being refined.
    pub uniquifier: &'a Uniquifier,
    /// Nesting level of sub-documents; 0 for the page itself.
    pub depth: usize,
}

/// Run the standard pipeline over `tokens`.
pub fn refine(tokens: Vec<Token>, options: &RefineOptions, uniquifier: &Uniquifier) -> Vec<Token> {
    let ctx = Context {
        options,
        uniquifier,
        depth: 0,
    };
    refine_in(tokens, &ctx)
}

fn refine_in(mut tokens: Vec<Token>, ctx: &Context) -> Vec<Token> {
    Pipeline::standard().run(&mut tokens, ctx);
    tokens
}

/// Parse `text` as an independent sub-document of the one `ctx` belongs to.
pub(crate) fn parse_nested(text: &str, ctx: &Context) -> Vec<Token> {
    if ctx.depth >= MAX_NESTING {
        tracing::debug!(depth = ctx.depth, "nesting limit reached, keeping text");
        return vec![Token::text(text)];
    }

    let mut uniquifier = Uniquifier::new();
    let uniquified = uniquifier.replace_tags(text);
    let tokens = lexing::tokenize(&uniquified, &uniquifier);
    let nested = Context {
        options: ctx.options,
        uniquifier: &uniquifier,
        depth: ctx.depth + 1,
    };
    refine_in(tokens, &nested)
}
