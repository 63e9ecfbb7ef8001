//! Comment text normalization
//!
//! Cleaning runs in a fixed order:
//! 1. HTML-like tags (`<...>`) become a space
//! 2. characters outside the allowed set become a space
//! 3. lowercase
//! 4. trim
//! 5. runs of whitespace collapse to a single space
//!
//! The allowed set is ASCII digits and letters, the `À-ỹ` block that covers
//! Vietnamese diacritics, whitespace, and `, . ! ?`. Punctuation is kept on
//! purpose: urgency and emphasis marks are useful downstream signal.

use regex::Regex;
use scamlens_core::{Error, Result};

const TAG_PATTERN: &str = r"<[^>]+>";
const DISALLOWED_PATTERN: &str = r"[^0-9A-Za-zÀ-ỹ\s,.!?]";
const WHITESPACE_PATTERN: &str = r"\s+";

/// Deterministic text cleaner
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    tag_regex: Regex,
    disallowed_regex: Regex,
    whitespace_regex: Regex,
}

impl TextNormalizer {
    /// Create a new normalizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag_regex: Regex::new(TAG_PATTERN)
                .map_err(|e| Error::internal(format!("Failed to compile tag regex: {}", e)))?,
            disallowed_regex: Regex::new(DISALLOWED_PATTERN).map_err(|e| {
                Error::internal(format!("Failed to compile character filter regex: {}", e))
            })?,
            whitespace_regex: Regex::new(WHITESPACE_PATTERN).map_err(|e| {
                Error::internal(format!("Failed to compile whitespace regex: {}", e))
            })?,
        })
    }

    /// Clean raw comment text. Idempotent.
    pub fn clean(&self, text: &str) -> String {
        let text = self.tag_regex.replace_all(text, " ");
        let text = self.disallowed_regex.replace_all(&text, " ");

        // Some capitals inside the allowed block lowercase to characters outside
        // it (Cherokee U+13A0 becomes U+AB70), so filter again.
        let lowered = text.to_lowercase();
        let lowered = self.disallowed_regex.replace_all(&lowered, " ");

        self.whitespace_regex
            .replace_all(lowered.trim(), " ")
            .into_owned()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new().expect("Failed to create text normalizer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_tags_and_lowercases() {
        let normalizer = TextNormalizer::new().unwrap();
        let cleaned = normalizer.clean("<b>Nhận QUÀ</b> ngay<br/>hôm nay!!!");
        assert_eq!(cleaned, "nhận quà ngay hôm nay!!!");
    }

    #[test]
    fn test_removes_emoji_and_symbols() {
        let normalizer = TextNormalizer::new().unwrap();
        let cleaned = normalizer.clean("Liên hệ 🔥🔥 zalo: 0901-234-567 @admin #hot");
        assert_eq!(cleaned, "liên hệ zalo 0901 234 567 admin hot");
    }

    #[test]
    fn test_keeps_punctuation() {
        let normalizer = TextNormalizer::new().unwrap();
        assert_eq!(normalizer.clean("Thật sao?  Tuyệt, quá."), "thật sao? tuyệt, quá.");
    }

    #[test]
    fn test_url_characters_are_removed() {
        let normalizer = TextNormalizer::new().unwrap();
        assert_eq!(
            normalizer.clean("xem tại http://abc.com/xyz"),
            "xem tại http abc.com xyz"
        );
    }

    #[test]
    fn test_whitespace_only() {
        let normalizer = TextNormalizer::new().unwrap();
        assert_eq!(normalizer.clean(" \t\n "), "");
        assert_eq!(normalizer.clean(""), "");
    }

    #[test]
    fn test_lowercase_outside_block_is_dropped() {
        let normalizer = TextNormalizer::new().unwrap();
        let once = normalizer.clean("\u{13A0} Abc");
        assert_eq!(once, "abc");
        assert_eq!(normalizer.clean(&once), once);
    }

    proptest! {
        #[test]
        fn prop_clean_is_idempotent(text in any::<String>()) {
            let normalizer = TextNormalizer::default();
            let once = normalizer.clean(&text);
            prop_assert_eq!(normalizer.clean(&once), once);
        }

        #[test]
        fn prop_clean_is_idempotent_vietnamese(text in "[a-zA-ZÀ-ỹ0-9 ,.!?<>/:@]{0,80}") {
            let normalizer = TextNormalizer::default();
            let once = normalizer.clean(&text);
            prop_assert_eq!(normalizer.clean(&once), once);
        }
    }
}
