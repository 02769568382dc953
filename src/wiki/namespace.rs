//! Namespace and interwiki resolution for link targets
//!
//!     Link classification only needs two questions answered about a target: which namespace
//!     does it live in, and is its prefix an interwiki prefix. [NamespaceResolver] is that seam;
//!     [SiteNamespaces] answers it from a [SiteConfig].

use crate::wiki::config::SiteConfig;
use crate::wiki::error::ConfigError;
use std::collections::HashMap;

pub const NS_MEDIA: i32 = -2;
pub const NS_SPECIAL: i32 = -1;
pub const NS_MAIN: i32 = 0;
pub const NS_FILE: i32 = 6;
pub const NS_CATEGORY: i32 = 14;

/// A target split into namespace and page name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    pub ns: i32,
    /// Page name without the namespace prefix. Empty when nothing follows the prefix.
    pub partial: String,
    /// Normalised, namespace-qualified name.
    pub full: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interwiki {
    pub prefix: String,
    pub url: String,
    pub partial: String,
    /// Language code when the prefix is a language link.
    pub language: Option<String>,
}

pub trait NamespaceResolver: Send + Sync {
    fn split_name(&self, name: &str) -> SplitName;
    fn resolve_interwiki(&self, name: &str) -> Option<Interwiki>;
}

/// Resolver backed by the namespace and interwiki tables of a site.
#[derive(Debug, Clone, Default)]
pub struct SiteNamespaces {
    by_name: HashMap<String, i32>,
    display: HashMap<i32, String>,
    interwiki: HashMap<String, (String, bool)>,
}

impl SiteNamespaces {
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::new();
        let mut display = HashMap::new();
        for ns in site.namespaces.values() {
            if !ns.name.is_empty() {
                by_name.insert(normalize(&ns.name).to_lowercase(), ns.id);
            }
            if let Some(canonical) = &ns.canonical {
                by_name.insert(normalize(canonical).to_lowercase(), ns.id);
            }
            display.insert(ns.id, ns.name.clone());
        }
        for alias in &site.namespace_aliases {
            if !display.contains_key(&alias.id) {
                return Err(ConfigError::UnknownNamespace {
                    alias: alias.alias.clone(),
                    id: alias.id,
                });
            }
            by_name.insert(normalize(&alias.alias).to_lowercase(), alias.id);
        }

        let interwiki = site
            .interwiki_map
            .iter()
            .map(|entry| {
                (
                    entry.prefix.to_lowercase(),
                    (entry.url.clone(), entry.language.is_some()),
                )
            })
            .collect();

        Ok(SiteNamespaces {
            by_name,
            display,
            interwiki,
        })
    }

    pub fn namespace_name(&self, ns: i32) -> Option<&str> {
        self.display.get(&ns).map(String::as_str)
    }
}

impl NamespaceResolver for SiteNamespaces {
    fn split_name(&self, name: &str) -> SplitName {
        let name = normalize(name);
        if let Some((prefix, rest)) = name.split_once(':') {
            if let Some(&ns) = self.by_name.get(&prefix.trim().to_lowercase()) {
                let partial = capitalize(rest.trim());
                let full = match self.namespace_name(ns) {
                    Some(display) if !display.is_empty() => format!("{}:{}", display, partial),
                    _ => partial.clone(),
                };
                return SplitName { ns, partial, full };
            }
        }
        let partial = capitalize(&name);
        SplitName {
            ns: NS_MAIN,
            full: partial.clone(),
            partial,
        }
    }

    fn resolve_interwiki(&self, name: &str) -> Option<Interwiki> {
        let (prefix, rest) = name.split_once(':')?;
        let prefix = prefix.trim().to_lowercase();
        let (url, is_language) = self.interwiki.get(&prefix)?;
        let partial = rest.trim().to_string();
        Some(Interwiki {
            url: url.replace("$1", &partial.replace(' ', "_")),
            language: is_language.then(|| prefix.clone()),
            prefix,
            partial,
        })
    }
}

/// Underscores are spaces and runs of whitespace collapse, like page titles on a wiki.
fn normalize(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn english() -> SiteNamespaces {
        SiteNamespaces::from_site(&SiteConfig::english().unwrap()).unwrap()
    }

    #[test]
    fn test_alias_to_unknown_namespace() {
        let site = SiteConfig::from_json(
            r#"{"namespaces": {"0": {"id": 0, "*": ""}}, "namespacealiases": [{"id": 6, "*": "Image"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SiteNamespaces::from_site(&site),
            Err(ConfigError::UnknownNamespace { id: 6, .. })
        ));
    }

    #[rstest]
    #[case("Foo bar", 0, "Foo bar", "Foo bar")]
    #[case("foo_bar", 0, "Foo bar", "Foo bar")]
    #[case("Image:Foo.png", 6, "Foo.png", "File:Foo.png")]
    #[case("file: foo.png", 6, "Foo.png", "File:Foo.png")]
    #[case("Category:Birds", 14, "Birds", "Category:Birds")]
    #[case("Unknown:Thing", 0, "Unknown:Thing", "Unknown:Thing")]
    #[case("File:", 6, "", "File:")]
    fn test_split_name(
        #[case] input: &str,
        #[case] ns: i32,
        #[case] partial: &str,
        #[case] full: &str,
    ) {
        let split = english().split_name(input);
        assert_eq!(split.ns, ns);
        assert_eq!(split.partial, partial);
        assert_eq!(split.full, full);
    }

    #[test]
    fn test_interwiki() {
        let resolver = english();
        let iw = resolver.resolve_interwiki("wikt:big dog").unwrap();
        assert_eq!(iw.prefix, "wikt");
        assert_eq!(iw.partial, "big dog");
        assert!(iw.url.ends_with("big_dog"));
        assert_eq!(iw.language, None);

        let lang = resolver.resolve_interwiki("de:Hund").unwrap();
        assert_eq!(lang.language.as_deref(), Some("de"));

        assert!(resolver.resolve_interwiki("Category:Birds").is_none());
        assert!(resolver.resolve_interwiki("plain").is_none());
    }
}
