//! Errors surfaced to callers.
//!
//! Malformed markup is never an error: every parse entry point absorbs it by keeping literal
//! text or finalising unterminated constructs. What does reach the caller is configuration that
//! cannot be used to parse at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The site configuration carries no `magicwords` table, so parser functions and their
    /// aliases cannot be recognised.
    #[error("site configuration has no magic word table")]
    MissingMagicWords,

    #[error("invalid siteinfo document: {source}")]
    InvalidSiteinfo {
        #[from]
        source: serde_json::Error,
    },

    /// A namespace alias refers to a namespace id the site does not define.
    #[error("namespace alias {alias:?} refers to unknown namespace {id}")]
    UnknownNamespace { alias: String, id: i32 },

    #[error("invalid alias {alias:?} for magic word {name:?}: {source}")]
    InvalidAlias {
        name: String,
        alias: String,
        source: regex::Error,
    },
}
