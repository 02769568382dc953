//! Macro parser tests over whole documents
//!
//! The unit tests in `wiki::templ` cover single constructs. These check how constructs
//! combine with surrounding text and each other, and that a parser shared between threads
//! gives the same trees it gives sequentially.

use rstest::rstest;
use std::sync::Arc;
use wikitree::wiki::config::SiteConfig;
use wikitree::wiki::formats::dump_macros;
use wikitree::wiki::templ::{Arg, MacroCache, MacroNode, MacroParser};

fn parser() -> MacroParser {
    MacroParser::new(&SiteConfig::english().unwrap()).unwrap()
}

fn t(s: &str) -> MacroNode {
    MacroNode::text(s)
}

#[test]
fn test_text_around_template() {
    let nodes = parser().parse("a {{b}} c", false);
    assert_eq!(
        nodes,
        vec![
            t("a "),
            MacroNode::Template {
                name: Box::new(t("b")),
                args: vec![],
            },
            t(" c"),
        ]
    );
}

#[test]
fn test_nested_template_argument() {
    let nodes = parser().parse("{{a|{{b}}}}", false);
    assert_eq!(
        nodes,
        vec![MacroNode::Template {
            name: Box::new(t("a")),
            args: vec![Arg::positional(MacroNode::Template {
                name: Box::new(t("b")),
                args: vec![],
            })],
        }]
    );
}

#[test]
fn test_pipe_inside_link_does_not_split() {
    let nodes = parser().parse("{{a|[[b|c]]}}", false);
    let MacroNode::Template { args, .. } = &nodes[0] else {
        panic!("expected a template, got {:?}", nodes);
    };
    assert_eq!(args.len(), 1);
    assert!(args[0].key.is_none());
    assert_eq!(args[0].value.literal().as_deref(), Some("[[b|c]]"));
}

#[rstest]
#[case::template("{{foo|a|b=c}}", "Template")]
#[case::variable("{{{x|default}}}", "Variable")]
#[case::condition("{{#if: |yes|no}}", "If")]
fn test_construct_kind(#[case] text: &str, #[case] expected: &str) {
    let nodes = parser().parse(text, false);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind_name(), expected);
}

#[test]
fn test_unclosed_braces_stay_literal() {
    assert_eq!(parser().parse("{{unclosed", false), vec![t("{{unclosed")]);
}

#[test]
fn test_dump_of_template() {
    let nodes = parser().parse("{{foo|a|b=c}}", false);
    insta::assert_snapshot!(dump_macros(&nodes).trim_end(), @r#"
    Template
      Text "foo"
      Arg
        Text "a"
      Arg (named)
        Text "b"
        Text "c"
    "#);
}

#[test]
fn test_shared_cache_across_threads() {
    let cache = Arc::new(MacroCache::new(16));
    let shared = parser().with_shared_cache(Arc::clone(&cache));
    let texts = ["{{a|b}}", "x {{{y}}} z", "{{#if:c|d}}"];
    let expected: Vec<_> = texts.iter().map(|t| parser().parse(t, false)).collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let shared = shared.clone();
            let expected = &expected;
            scope.spawn(move || {
                for (text, want) in texts.iter().zip(expected) {
                    assert_eq!(&shared.parse(text, false), want);
                }
            });
        }
    });
    assert_eq!(cache.len(), texts.len());
}
