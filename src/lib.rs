//! # wikitree
//!
//! A parser turning wiki markup into a structured document tree.
//!
//! File Layout
//!
//! The crate is organised around the two independent parse paths a wiki source goes through:
//!
//! src/wiki
//!   ├── templ      Macro brace parser: `{{...}}` / `{{{...}}}` into a macro AST
//!   ├── lexing     Flat, classified token stream from source text
//!   ├── quotes     Apostrophe run disambiguation into bold / italic spans
//!   ├── refine     Ordered rewriting passes turning the flat stream into the tree
//!   └── <common>   Tokens, configuration, namespaces, formatting and testing helpers
//!
//! For testing helpers, see the [testing module](wiki::testing).

#![allow(rustdoc::invalid_html_tags)]

pub mod wiki;
