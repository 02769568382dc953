//! Site configuration
//!
//!     Everything a parse needs to know about the wiki it parses for: magic words and their
//!     aliases, namespaces and interwiki prefixes. The shape mirrors a MediaWiki `siteinfo`
//!     document so a dump of a real site can be loaded as is:
//!
//!         SiteConfig::from_json(&std::fs::read_to_string("siteinfo.json")?)?
//!
//!     A configuration is built once and shared by reference. Nothing in a parse mutates it.

use crate::wiki::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const ENGLISH_SITEINFO: &str = include_str!("config/siteinfo_en.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub general: General,
    /// `None` when the document has no `magicwords` key at all.
    #[serde(rename = "magicwords", default)]
    pub magic_words: Option<Vec<MagicWord>>,
    /// Keyed by the namespace id as a string, like in siteinfo dumps.
    #[serde(default)]
    pub namespaces: BTreeMap<String, Namespace>,
    #[serde(rename = "namespacealiases", default)]
    pub namespace_aliases: Vec<NamespaceAlias>,
    #[serde(rename = "interwikimap", default)]
    pub interwiki_map: Vec<InterwikiEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct General {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub mainpage: Option<String>,
    #[serde(default)]
    pub sitename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicWord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i32,
    #[serde(rename = "*")]
    pub name: String,
    #[serde(default)]
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceAlias {
    pub id: i32,
    #[serde(rename = "*")]
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterwikiEntry {
    pub prefix: String,
    pub url: String,
    /// Set for language links (`[[de:...]]`); holds the language's display name.
    #[serde(default)]
    pub language: Option<String>,
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The embedded English configuration.
    pub fn english() -> Result<Self, ConfigError> {
        Self::from_json(ENGLISH_SITEINFO)
    }

    pub fn lang(&self) -> &str {
        if self.general.lang.is_empty() {
            "en"
        } else {
            &self.general.lang
        }
    }
}

/// Resolution of magic word aliases to their canonical names.
///
/// Every alias maps to its magic word name, and `#alias` maps to `#name` so that parser
/// functions written with a localised name (`{{#si:...}}`) resolve to the canonical one.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    map: HashMap<String, String>,
    name2aliases: HashMap<String, Vec<String>>,
}

impl AliasMap {
    /// Build the map from the site's magic word table.
    ///
    /// Fails when the site has no magic word table at all: parsing without one would silently
    /// classify every localised parser function as a plain template.
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        let words = site
            .magic_words
            .as_ref()
            .ok_or(ConfigError::MissingMagicWords)?;
        Ok(Self::from_words(words))
    }

    pub fn from_words(words: &[MagicWord]) -> Self {
        let mut map = HashMap::new();
        let mut name2aliases = HashMap::new();
        for word in words {
            name2aliases.insert(word.name.clone(), word.aliases.clone());
            for alias in &word.aliases {
                let alias = normalize_alias(alias);
                map.insert(format!("#{}", alias), format!("#{}", word.name));
                map.insert(alias, word.name.clone());
            }
        }
        AliasMap { map, name2aliases }
    }

    /// Canonical name for `name`, keeping a leading `#` on both sides.
    pub fn resolve_magic_alias(&self, name: &str) -> Option<&str> {
        self.map.get(&normalize_alias(name)).map(String::as_str)
    }

    pub fn get_aliases(&self, name: &str) -> &[String] {
        self.name2aliases
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Aliases are matched case-insensitively and without the trailing colon some sites carry
/// (`LC:`), since the parser splits names at the first colon.
fn normalize_alias(alias: &str) -> String {
    alias.trim().trim_end_matches(':').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_config_loads() {
        let site = SiteConfig::english().expect("embedded siteinfo parses");
        assert_eq!(site.lang(), "en");
        assert!(site.magic_words.is_some());
        assert_eq!(site.namespaces["6"].name, "File");
    }

    #[test]
    fn test_alias_resolution() {
        let aliases = AliasMap::from_words(&[MagicWord {
            name: "if".into(),
            aliases: vec!["si".into(), "if".into()],
        }]);
        assert_eq!(aliases.resolve_magic_alias("#si"), Some("#if"));
        assert_eq!(aliases.resolve_magic_alias("#SI"), Some("#if"));
        assert_eq!(aliases.resolve_magic_alias("si"), Some("if"));
        assert_eq!(aliases.resolve_magic_alias("#nope"), None);
        assert_eq!(aliases.get_aliases("if"), &["si".to_string(), "if".to_string()]);
        assert!(aliases.get_aliases("switch").is_empty());
    }

    #[test]
    fn test_trailing_colon_aliases() {
        let aliases = AliasMap::from_words(&[MagicWord {
            name: "lc".into(),
            aliases: vec!["LC:".into()],
        }]);
        assert_eq!(aliases.resolve_magic_alias("lc"), Some("lc"));
    }

    #[test]
    fn test_missing_magic_words_is_an_error() {
        let site = SiteConfig::from_json(r#"{"general": {"lang": "de"}}"#).unwrap();
        assert!(matches!(
            AliasMap::from_site(&site),
            Err(ConfigError::MissingMagicWords)
        ));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            SiteConfig::from_json("{"),
            Err(ConfigError::InvalidSiteinfo { .. })
        ));
    }
}
