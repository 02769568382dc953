//! Main module for wiki parsing
//!
//!     A page goes through two independent paths:
//!
//!         text ──► templ::parse ─────────────────────────────► macro AST
//!         text ──► Uniquifier ──► lexing::tokenize ──► refine ──► document tree
//!
//!     The macro path reads `{{...}}` constructs without expanding them. The document path cuts
//!     out tag extensions, classifies the text into a flat token stream and then rewrites that
//!     stream into a tree with a fixed list of passes.
//!
//!     Configuration ([config::SiteConfig]) is read once and turned into immutable tables
//!     ([config::AliasMap], [refine::RefineOptions]) that every parse borrows.

pub mod config;
pub mod error;
pub mod formats;
pub mod lexing;
pub mod namespace;
pub mod quotes;
pub mod refine;
pub mod templ;
pub mod testing;
pub mod token;

use lexing::Uniquifier;
use refine::RefineOptions;
use token::Token;

/// Parse wiki text into its document tree.
pub fn parse_txt(text: &str, options: &RefineOptions) -> Vec<Token> {
    let mut uniquifier = Uniquifier::new();
    let uniquified = uniquifier.replace_tags(text);
    let tokens = lexing::tokenize(&uniquified, &uniquifier);
    tracing::debug!(
        tokens = tokens.len(),
        protected = uniquifier.len(),
        "tokenized"
    );
    refine::refine(tokens, options, &uniquifier)
}
