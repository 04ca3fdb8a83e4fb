//! Bilingual (English/Bengali) text.

use serde::{Deserialize, Serialize};

/// Display language for storefront responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    /// ISO 639-1 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Bn => "bn",
        }
    }

    /// Parse a `lang` query value, defaulting to English for anything unknown.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.eq_ignore_ascii_case("bn") || code.to_ascii_lowercase().starts_with("bn-") {
            Self::Bn
        } else {
            Self::En
        }
    }

    /// Pick a language from an `Accept-Language` header.
    ///
    /// Returns the first of `bn`/`en` in preference order; quality weights
    /// are honoured, entries with `q=0` are skipped.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Self {
        let mut best: Option<(Self, f32)> = None;

        for entry in header.split(',') {
            let mut parts = entry.split(';');
            let tag = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            if quality <= 0.0 {
                continue;
            }

            let lang = if tag == "bn" || tag.starts_with("bn-") {
                Self::Bn
            } else if tag == "en" || tag.starts_with("en-") {
                Self::En
            } else {
                continue;
            };

            if best.is_none_or(|(_, q)| quality > q) {
                best = Some((lang, quality));
            }
        }

        best.map_or(Self::En, |(lang, _)| lang)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A string in both English and Bengali.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default)]
    pub bn: String,
}

impl LocalizedText {
    /// Create from both translations.
    #[must_use]
    pub fn new(en: impl Into<String>, bn: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            bn: bn.into(),
        }
    }

    /// The text for `lang`, falling back to English when the Bengali
    /// translation is blank.
    #[must_use]
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Bn if !self.bn.trim().is_empty() => &self.bn,
            _ => &self.en,
        }
    }

    /// Whether neither translation has any content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty() && self.bn.trim().is_empty()
    }
}

/// Turn a display name into a URL slug.
///
/// ASCII letters and digits are kept (lowercased), everything else collapses
/// into single dashes. Non-ASCII letters such as Bengali script are kept
/// as-is so a Bengali-only name still yields a usable slug.
///
/// ```
/// use dokan_core::slugify;
///
/// assert_eq!(slugify("Men's Panjabi & Kurta"), "men-s-panjabi-kurta");
/// assert_eq!(slugify("  --Sale!!  "), "sale");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric()) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if !c.is_ascii() && is_combining_mark(c) {
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Bengali vowel signs and other marks that are not alphanumeric on their own.
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0981..=0x0983 | 0x09BC | 0x09BE..=0x09CD | 0x09D7 | 0x0300..=0x036F)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_code() {
        assert_eq!(Language::from_code("bn"), Language::Bn);
        assert_eq!(Language::from_code("BN-bd"), Language::Bn);
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code("fr"), Language::En);
    }

    #[test]
    fn test_language_from_accept_language() {
        assert_eq!(Language::from_accept_language("bn-BD,bn;q=0.9,en;q=0.8"), Language::Bn);
        assert_eq!(Language::from_accept_language("en-US,bn;q=0.5"), Language::En);
        assert_eq!(Language::from_accept_language("fr,bn;q=0.3"), Language::Bn);
        assert_eq!(Language::from_accept_language("bn;q=0"), Language::En);
        assert_eq!(Language::from_accept_language(""), Language::En);
    }

    #[test]
    fn test_localized_text_falls_back_to_english() {
        let text = LocalizedText::new("Saree", "শাড়ি");
        assert_eq!(text.get(Language::Bn), "শাড়ি");
        assert_eq!(text.get(Language::En), "Saree");

        let untranslated = LocalizedText::new("Saree", "  ");
        assert_eq!(untranslated.get(Language::Bn), "Saree");
    }

    #[test]
    fn test_localized_text_bn_optional_in_json() {
        let text: LocalizedText = serde_json::from_str(r#"{"en":"Home"}"#).unwrap();
        assert_eq!(text.bn, "");
        assert!(!text.is_blank());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Winter Collection 2024"), "winter-collection-2024");
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("শাড়ি"), "শাড়ি");
    }
}
