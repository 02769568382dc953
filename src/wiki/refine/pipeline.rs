//! The pass list and its driver
//!
//!     A pass rewrites one sibling list in place. By default the driver hands it every list the
//!     [walker](super::walker) makes visible; a pass that needs to see across container
//!     boundaries says so with [Pass::uses_walker] and receives the root list instead.
//!
//!     The list is declared in document order of the grammar (list items first, cosmetic fixups
//!     last) and executed from the end, the way a stack of passes is popped. Tables and
//!     sections are therefore built before paragraphs are split, and each cell or section body
//!     gets paragraphs of its own.

use super::fixups::{FixBreakBetweenPre, FixLiTags, FixNamedUrls};
use super::links::ParseLinks;
use super::lists::ParseLines;
use super::paragraphs::ParseParagraphs;
use super::preformatted::ParsePreformatted;
use super::sections::ParseSections;
use super::styles::{MarkStyleTags, ParseSingleQuote};
use super::tables::{TableFixer, TableGarbageRemover, TableParser};
use super::tagparser::{InputboxParser, TagParser, TagSpec};
use super::uniq::ParseUniq;
use super::urls::ParseUrls;
use super::walker::{self, Opaque};
use super::Context;
use crate::wiki::token::Token;
use once_cell::sync::Lazy;

pub trait Pass: Send + Sync {
    /// Lowercase name with underscores, used in logs.
    fn name(&self) -> &'static str;

    /// Whether the pass runs on each visible list (true) or once on the root list.
    fn uses_walker(&self) -> bool {
        true
    }

    fn run(&self, tokens: &mut Vec<Token>, ctx: &Context);
}

pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

static STANDARD: Lazy<Pipeline> = Lazy::new(Pipeline::build_standard);

impl Pipeline {
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Pipeline { passes }
    }

    /// The standard pass list, built once.
    pub fn standard() -> &'static Pipeline {
        &STANDARD
    }

    fn build_standard() -> Pipeline {
        Pipeline::new(vec![
            Box::new(FixLiTags),
            Box::new(MarkStyleTags),
            Box::new(ParseSingleQuote),
            Box::new(ParsePreformatted),
            Box::new(TagParser::new(
                "inline_tags",
                vec![
                    TagSpec::new("code", 10),
                    TagSpec::new("span", 20),
                    TagSpec::new("li", 25).block().not_nested(),
                    TagSpec::new("dl", 28).block(),
                    TagSpec::new("dt", 26).block().not_nested(),
                    TagSpec::new("dd", 26).block(),
                ],
            )),
            Box::new(ParseParagraphs),
            Box::new(TagParser::new(
                "block_tags",
                vec![
                    TagSpec::new("blockquote", 5),
                    TagSpec::new("references", 15),
                    TagSpec::new("p", 30).block().not_nested(),
                    TagSpec::new("ul", 35).block(),
                    TagSpec::new("ol", 40).block(),
                    TagSpec::new("center", 45).block(),
                ],
            )),
            Box::new(ParseLines),
            Box::new(TagParser::new("div_tags", vec![TagSpec::new("div", 10).block()])),
            Box::new(ParseLinks),
            Box::new(ParseUrls),
            Box::new(InputboxParser::new()),
            Box::new(TagParser::new(
                "heading_tags",
                (1..=6)
                    .map(|level| TagSpec::new(format!("h{}", level), level).block())
                    .collect(),
            )),
            Box::new(ParseSections),
            Box::new(TableGarbageRemover),
            Box::new(TableFixer),
            Box::new(TableParser),
            Box::new(ParseUniq),
            Box::new(FixNamedUrls),
            Box::new(FixBreakBetweenPre),
        ])
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    pub fn run(&self, tokens: &mut Vec<Token>, ctx: &Context) {
        for pass in self.passes.iter().rev() {
            let lists = if pass.uses_walker() {
                walker::apply(tokens, Opaque::DEFAULT, |list| pass.run(list, ctx))
            } else {
                pass.run(tokens, ctx);
                1
            };
            tracing::debug!(
                pass = pass.name(),
                walker = pass.uses_walker(),
                lists,
                depth = ctx.depth,
                "refine pass"
            );
        }
    }
}
