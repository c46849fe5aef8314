//! Localized display text

use serde::{Deserialize, Serialize};

/// Display text with per-locale variants
///
/// `default` is always present; locale lookups fall back to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub default: String,
    pub en: Option<String>,
    pub th: Option<String>,
}

impl LocalizedText {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            en: None,
            th: None,
        }
    }

    /// Resolve the text for a locale hint, falling back to `default`
    pub fn get(&self, locale: &str) -> &str {
        let variant = match locale {
            "en" => self.en.as_deref(),
            "th" => self.th.as_deref(),
            _ => None,
        };
        variant.unwrap_or(&self.default)
    }
}
