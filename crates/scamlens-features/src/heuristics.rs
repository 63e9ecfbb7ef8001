//! Heuristic features: URLs, domains and scam keywords
//!
//! The two extractions take different inputs. URL matching needs the raw
//! text because cleaning removes `:` and `/`; keyword scoring runs on the
//! cleaned, lowercased text.

use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use scamlens_core::{Error, Result};

/// Default scam lexicon, matched as substrings of cleaned text
pub const DEFAULT_SCAM_KEYWORDS: &[&str] = &[
    "giveaway",
    "đầu tư",
    "trúng thưởng",
    "miễn phí",
    "link",
    "bitcoin",
    "ether",
    "crypto",
    "liên hệ",
    "zalo",
];

/// URLs and hosts found in raw text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlFeatures {
    /// Matched URLs in order of occurrence
    pub urls: Vec<String>,

    /// Host of each URL that has one, in order, duplicates kept
    pub domains: Vec<String>,
}

impl UrlFeatures {
    /// Number of matched URLs (not distinct domains)
    pub fn num_urls(&self) -> usize {
        self.urls.len()
    }
}

/// Extracts absolute http(s) URLs and their hosts
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    url_regex: Regex,
    domain_regex: Regex,
}

impl UrlExtractor {
    /// Create a new URL extractor
    pub fn new() -> Result<Self> {
        Ok(Self {
            url_regex: Regex::new(r"https?://\S+")
                .map_err(|e| Error::internal(format!("Failed to compile URL regex: {}", e)))?,
            domain_regex: Regex::new(r"^https?://([^/]+)")
                .map_err(|e| Error::internal(format!("Failed to compile domain regex: {}", e)))?,
        })
    }

    /// Extract URLs and domains from raw, uncleaned text
    pub fn extract(&self, raw: &str) -> UrlFeatures {
        let mut features = UrlFeatures::default();

        for url in self.url_regex.find_iter(raw) {
            let url = url.as_str();
            if let Some(host) = self.domain_regex.captures(url).and_then(|c| c.get(1)) {
                features.domains.push(host.as_str().to_string());
            }
            features.urls.push(url.to_string());
        }

        features
    }
}

/// Counts distinct scam lexicon entries present in cleaned text
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    matcher: AhoCorasick,
    keywords: Vec<String>,
}

impl KeywordScorer {
    /// Build a scorer from a lexicon. Entries are lowercased and deduplicated.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !lexicon.contains(&keyword) {
                lexicon.push(keyword);
            }
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&lexicon)
            .map_err(|e| Error::internal(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            matcher,
            keywords: lexicon,
        })
    }

    /// Scorer over [`DEFAULT_SCAM_KEYWORDS`]
    pub fn with_default_keywords() -> Result<Self> {
        Self::new(DEFAULT_SCAM_KEYWORDS.iter().copied())
    }

    /// Lexicon entries present at least once, in lexicon order
    pub fn matched_keywords(&self, cleaned: &str) -> Vec<&str> {
        let mut seen = vec![false; self.keywords.len()];
        for m in self.matcher.find_overlapping_iter(cleaned) {
            seen[m.pattern().as_usize()] = true;
        }

        self.keywords
            .iter()
            .zip(seen)
            .filter_map(|(keyword, hit)| hit.then_some(keyword.as_str()))
            .collect()
    }

    /// Number of distinct lexicon entries present; repeats do not add up
    pub fn score(&self, cleaned: &str) -> usize {
        self.matched_keywords(cleaned).len()
    }

    /// Lexicon entries
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Both heuristic extractions behind one handle
#[derive(Debug, Clone)]
pub struct HeuristicFeatureExtractor {
    urls: UrlExtractor,
    keywords: KeywordScorer,
}

impl HeuristicFeatureExtractor {
    /// Create an extractor with the given keyword scorer
    pub fn new(keywords: KeywordScorer) -> Result<Self> {
        Ok(Self {
            urls: UrlExtractor::new()?,
            keywords,
        })
    }

    /// URL/domain features; pass the raw text
    pub fn url_features(&self, raw: &str) -> UrlFeatures {
        self.urls.extract(raw)
    }

    /// Keyword presence count; pass the cleaned text
    pub fn scam_keyword_count(&self, cleaned: &str) -> usize {
        self.keywords.score(cleaned)
    }

    /// Access the keyword scorer
    pub fn keyword_scorer(&self) -> &KeywordScorer {
        &self.keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_and_domains_in_order() {
        let extractor = UrlExtractor::new().unwrap();
        let features = extractor.extract("xem tại http://abc.com/xyz và https://Def.COM");

        assert_eq!(features.num_urls(), 2);
        assert_eq!(features.domains, vec!["abc.com", "Def.COM"]);
    }

    #[test]
    fn test_duplicate_domains_are_kept() {
        let extractor = UrlExtractor::new().unwrap();
        let features = extractor.extract("https://a.vn/1 https://a.vn/2 http://a.vn");

        assert_eq!(features.num_urls(), 3);
        assert_eq!(features.domains, vec!["a.vn", "a.vn", "a.vn"]);
    }

    #[test]
    fn test_url_without_host() {
        let extractor = UrlExtractor::new().unwrap();
        let features = extractor.extract("lạ quá http:///path");

        assert_eq!(features.num_urls(), 1);
        assert!(features.domains.is_empty());
    }

    #[test]
    fn test_no_urls_in_cleaned_text() {
        let extractor = UrlExtractor::new().unwrap();
        assert_eq!(extractor.extract("xem tại http abc.com xyz").num_urls(), 0);
        assert_eq!(extractor.extract("HTTP://UPPER.COM").num_urls(), 0);
    }

    #[test]
    fn test_keyword_presence_not_frequency() {
        let scorer = KeywordScorer::with_default_keywords().unwrap();
        let text = "zalo zalo zalo zalo zalo";
        assert_eq!(scorer.score(text), 1);
    }

    #[test]
    fn test_multiple_keywords() {
        let scorer = KeywordScorer::with_default_keywords().unwrap();
        let text = "trúng thưởng iphone miễn phí, liên hệ zalo ngay";
        assert_eq!(
            scorer.matched_keywords(text),
            vec!["trúng thưởng", "miễn phí", "liên hệ", "zalo"]
        );
        assert_eq!(scorer.score(text), 4);
    }

    #[test]
    fn test_overlapping_keywords_each_count() {
        let scorer = KeywordScorer::new(["ether", "ethereum"]).unwrap();
        assert_eq!(scorer.score("mua ethereum"), 2);
        assert_eq!(scorer.score("mua ether"), 1);
    }

    #[test]
    fn test_lexicon_normalized() {
        let scorer = KeywordScorer::new(["Zalo", "zalo ", "", "LINK"]).unwrap();
        assert_eq!(scorer.keywords(), &["zalo".to_string(), "link".to_string()]);
        assert_eq!(scorer.score("bấm link zalo"), 2);
    }

    #[test]
    fn test_clean_text_scores_zero() {
        let extractor =
            HeuristicFeatureExtractor::new(KeywordScorer::with_default_keywords().unwrap()).unwrap();
        assert_eq!(extractor.scam_keyword_count("video hay quá"), 0);
        assert_eq!(extractor.url_features("video hay quá").num_urls(), 0);
    }
}
