//! Image option sub-grammar
//!
//! Each `|`-separated part of a media link may be an option (`thumb`, `left`, `200px`,
//! `link=Foo`, ...). Which words are options comes from the `img_*` magic words of the site, so
//! localised wikis recognise their own spellings. An alias containing `$1` takes a value.

use crate::wiki::config::{MagicWord, SiteConfig};
use crate::wiki::error::ConfigError;
use crate::wiki::token::{Frame, ImageOptions};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMod {
    Thumbnail,
    ManualThumb,
    Right,
    Left,
    None,
    Center,
    Framed,
    Frameless,
    Page,
    Upright,
    Border,
    Width,
    Alt,
    Link,
}

impl ImageMod {
    fn from_magic_word(name: &str) -> Option<Self> {
        Some(match name {
            "img_thumbnail" => ImageMod::Thumbnail,
            "img_manualthumb" => ImageMod::ManualThumb,
            "img_right" => ImageMod::Right,
            "img_left" => ImageMod::Left,
            "img_none" => ImageMod::None,
            "img_center" => ImageMod::Center,
            "img_framed" => ImageMod::Framed,
            "img_frameless" => ImageMod::Frameless,
            "img_page" => ImageMod::Page,
            "img_upright" => ImageMod::Upright,
            "img_border" => ImageMod::Border,
            "img_width" => ImageMod::Width,
            "img_alt" => ImageMod::Alt,
            "img_link" => ImageMod::Link,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageModifiers {
    patterns: Vec<(ImageMod, Regex)>,
}

impl ImageModifiers {
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        let words = site
            .magic_words
            .as_ref()
            .ok_or(ConfigError::MissingMagicWords)?;
        Self::from_words(words)
    }

    pub fn from_words(words: &[MagicWord]) -> Result<Self, ConfigError> {
        let mut patterns = Vec::new();
        for word in words {
            let Some(kind) = ImageMod::from_magic_word(&word.name) else {
                continue;
            };
            for alias in &word.aliases {
                let pattern = alias_pattern(alias);
                let regex = Regex::new(&pattern).map_err(|source| ConfigError::InvalidAlias {
                    name: word.name.clone(),
                    alias: alias.clone(),
                    source,
                })?;
                patterns.push((kind, regex));
            }
        }
        Ok(ImageModifiers { patterns })
    }

    /// The option `text` stands for and its value, if it is one.
    pub fn parse(&self, text: &str) -> Option<(ImageMod, Option<String>)> {
        let text = text.trim();
        self.patterns.iter().find_map(|(kind, regex)| {
            let caps = regex.captures(text)?;
            let value = caps.get(1).map(|m| m.as_str().trim().to_string());
            // `$1px` matches almost anything ending in px
            if *kind == ImageMod::Width && value.as_deref().and_then(parse_size).is_none() {
                return None;
            }
            Some((*kind, value))
        })
    }

    /// Apply `text` to `options`. Returns false when `text` is not an option (a caption).
    pub fn apply(&self, text: &str, options: &mut ImageOptions) -> bool {
        let Some((kind, value)) = self.parse(text) else {
            return false;
        };
        match kind {
            ImageMod::Thumbnail => options.thumb = true,
            ImageMod::ManualThumb => {
                options.thumb = true;
                options.thumb_source = value;
            }
            ImageMod::Right => options.align = Some("right".to_string()),
            ImageMod::Left => options.align = Some("left".to_string()),
            ImageMod::None => options.align = Some("none".to_string()),
            ImageMod::Center => options.align = Some("center".to_string()),
            ImageMod::Framed => options.frame = Some(Frame::Frame),
            ImageMod::Frameless => options.frame = Some(Frame::Frameless),
            ImageMod::Page => options.page = value,
            ImageMod::Upright => {
                options.upright = Some(value.and_then(|v| v.parse::<f64>().ok()));
            }
            ImageMod::Border => options.border = true,
            ImageMod::Width => {
                let Some((width, height)) = value.as_deref().and_then(parse_size) else {
                    return false;
                };
                options.width = width;
                options.height = height;
            }
            ImageMod::Alt => options.alt = value,
            ImageMod::Link => options.link = value,
        }
        true
    }
}

/// `thumb=$1` becomes `^thumb=(.*)$`; everything but `$1` is literal.
fn alias_pattern(alias: &str) -> String {
    let parts: Vec<String> = alias.split("$1").map(regex::escape).collect();
    format!("(?s)^{}$", parts.join("(.*)"))
}

/// `200`, `200x100` or `x100`.
fn parse_size(value: &str) -> Option<(Option<u32>, Option<u32>)> {
    let (width, height) = match value.split_once('x') {
        Some((w, h)) => (w.trim(), Some(h.trim())),
        None => (value.trim(), None),
    };
    let width = match width {
        "" => None,
        w => Some(w.parse().ok()?),
    };
    let height = match height {
        Some(h) => Some(h.parse().ok()?),
        None => None,
    };
    if width.is_none() && height.is_none() {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn english() -> ImageModifiers {
        ImageModifiers::from_site(&SiteConfig::english().unwrap()).unwrap()
    }

    #[rstest]
    #[case("thumb", ImageMod::Thumbnail, None)]
    #[case(" left ", ImageMod::Left, None)]
    #[case("200px", ImageMod::Width, Some("200"))]
    #[case("link=Main Page", ImageMod::Link, Some("Main Page"))]
    #[case("upright=0.5", ImageMod::Upright, Some("0.5"))]
    fn test_parse(#[case] text: &str, #[case] kind: ImageMod, #[case] value: Option<&str>) {
        let (found, found_value) = english().parse(text).unwrap();
        assert_eq!(found, kind);
        assert_eq!(found_value.as_deref(), value);
    }

    #[test]
    fn test_caption_is_not_an_option() {
        assert!(english().parse("A caption").is_none());
    }

    #[test]
    fn test_apply_sizes() {
        let modifiers = english();
        let mut options = ImageOptions::default();
        assert!(modifiers.apply("300x200px", &mut options));
        assert_eq!((options.width, options.height), (Some(300), Some(200)));
        assert!(!modifiers.apply("bigpx", &mut options));
    }

    #[test]
    fn test_apply_frame_and_upright() {
        let modifiers = english();
        let mut options = ImageOptions::default();
        modifiers.apply("frame", &mut options);
        modifiers.apply("upright", &mut options);
        assert_eq!(options.frame, Some(Frame::Frame));
        assert_eq!(options.upright, Some(None));
    }
}
