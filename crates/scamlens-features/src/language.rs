//! Language identification gate
//!
//! Only comments detected as the target language continue through the
//! pipeline. Short comments are often misdetected; that loss is accepted.

use scamlens_core::{Error, Result};
use std::sync::Arc;

/// Anything that can guess the language of a text
pub trait LanguageDetector: Send + Sync {
    /// Return an ISO 639-1 tag (`vi`, `en`, ...) or a detection failure
    fn detect(&self, text: &str) -> Result<String>;

    /// Get the detector name
    fn name(&self) -> &str;
}

/// Statistical detector backed by `whatlang`
#[derive(Debug, Clone, Default)]
pub struct WhatlangDetector {
    require_reliable: bool,
}

impl WhatlangDetector {
    /// Create a detector that accepts the best guess
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject guesses `whatlang` does not consider reliable
    pub fn with_require_reliable(mut self, require: bool) -> Self {
        self.require_reliable = require;
        self
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::language_detection("no text to detect"));
        }

        let info = whatlang::detect(text)
            .ok_or_else(|| Error::language_detection("no language features found"))?;

        if self.require_reliable && !info.is_reliable() {
            return Err(Error::language_detection(format!(
                "unreliable guess '{}' (confidence {:.2})",
                info.lang().code(),
                info.confidence()
            )));
        }

        Ok(iso_639_1(info.lang()).to_string())
    }

    fn name(&self) -> &str {
        "whatlang"
    }
}

/// Map a `whatlang` language to its two-letter code when one exists
fn iso_639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang;

    match lang {
        Lang::Vie => "vi",
        Lang::Eng => "en",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Ind => "id",
        Lang::Tha => "th",
        Lang::Khm => "km",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Hin => "hi",
        Lang::Ara => "ar",
        Lang::Tgl => "tl",
        other => other.code(),
    }
}

/// Outcome of the language gate for one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageVerdict {
    /// Detected as the target language
    Target,

    /// Detected as some other language
    Other(String),

    /// Detection failed; treated as not the target
    Undetected(String),
}

impl LanguageVerdict {
    /// Whether the record proceeds
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target)
    }
}

/// Gate that keeps only target-language text
#[derive(Clone)]
pub struct LanguageFilter {
    detector: Arc<dyn LanguageDetector>,
    target: String,
}

impl LanguageFilter {
    /// Create a filter for the given target tag
    pub fn new(detector: Arc<dyn LanguageDetector>, target: impl Into<String>) -> Self {
        Self {
            detector,
            target: target.into(),
        }
    }

    /// Target language tag
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Decide whether a text belongs to the target language
    pub fn check(&self, text: &str) -> LanguageVerdict {
        match self.detector.detect(text) {
            Ok(tag) if tag.eq_ignore_ascii_case(&self.target) => LanguageVerdict::Target,
            Ok(tag) => LanguageVerdict::Other(tag),
            Err(e) => LanguageVerdict::Undetected(e.to_string()),
        }
    }
}

impl std::fmt::Debug for LanguageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageFilter")
            .field("detector", &self.detector.name())
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Option<&'static str>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::language_detection("fixed failure"))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_whatlang_vietnamese() {
        let detector = WhatlangDetector::new();
        let tag = detector
            .detect("Chương trình tặng quà miễn phí cho tất cả mọi người, hãy liên hệ ngay hôm nay để nhận thưởng")
            .unwrap();
        assert_eq!(tag, "vi");
    }

    #[test]
    fn test_whatlang_english() {
        let detector = WhatlangDetector::new();
        let tag = detector
            .detect("This is a wonderful video and I really enjoyed watching it with my whole family")
            .unwrap();
        assert_eq!(tag, "en");
    }

    #[test]
    fn test_whatlang_empty_is_failure() {
        let detector = WhatlangDetector::new();
        let err = detector.detect("   ").unwrap_err();
        assert_eq!(err.kind(), scamlens_core::ErrorKind::LanguageDetection);

        assert!(detector.detect("12345 !!!").is_err());
    }

    #[test]
    fn test_filter_verdicts() {
        let vi = LanguageFilter::new(Arc::new(FixedDetector(Some("vi"))), "vi");
        assert_eq!(vi.check("anything"), LanguageVerdict::Target);

        let en = LanguageFilter::new(Arc::new(FixedDetector(Some("en"))), "vi");
        assert_eq!(en.check("anything"), LanguageVerdict::Other("en".to_string()));

        let failing = LanguageFilter::new(Arc::new(FixedDetector(None)), "vi");
        let verdict = failing.check("anything");
        assert!(matches!(verdict, LanguageVerdict::Undetected(_)));
        assert!(!verdict.is_target());
    }
}
