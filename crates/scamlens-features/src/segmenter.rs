//! Vietnamese word segmentation
//!
//! Vietnamese writes one syllable per space-separated unit, so words made of
//! several syllables have to be recovered. The [`LexiconSegmenter`] does this
//! with greedy longest matching against a lexicon of multi-syllable words and
//! joins the syllables of each match with a joiner (`_` by default):
//!
//! ```text
//! "nhận quà miễn phí, liên hệ ngay!" -> "nhận quà miễn_phí , liên_hệ ngay !"
//! ```
//!
//! Punctuation becomes its own token and `. ! ?` close a sentence; matches
//! never cross punctuation or sentence boundaries.

use scamlens_core::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Default character joining the syllables of one word
pub const DEFAULT_JOINER: char = '_';

/// Default longest word, in syllables, the matcher will try
pub const DEFAULT_MAX_WORD_SYLLABLES: usize = 4;

const BUILTIN_LEXICON: &str = include_str!("../data/vi_lexicon.txt");

/// Word segmentation engine
pub trait WordSegmenter: Send + Sync {
    /// Segment cleaned text into space-separated tokens
    fn segment(&self, text: &str) -> Result<String>;

    /// Character joining syllables of one token
    fn joiner(&self) -> char;

    /// Get the segmenter name
    fn name(&self) -> &str;
}

/// Set of known multi-syllable words, stored lowercase with single spaces
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
    max_syllables: usize,
}

impl Lexicon {
    /// Build from an iterator of words; syllables may be separated by spaces
    /// or underscores. Single-syllable entries are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        for word in words {
            lexicon.insert(word.as_ref());
        }
        lexicon
    }

    /// Parse lexicon text: one word per line, `#` starts a comment line
    pub fn parse(content: &str) -> Self {
        Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Load a lexicon file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::segmentation(format!("Failed to read lexicon {}: {}", path.display(), e))
        })?;

        let lexicon = Self::parse(&content);
        if lexicon.is_empty() {
            return Err(Error::segmentation(format!(
                "Lexicon {} contains no multi-syllable words",
                path.display()
            )));
        }
        Ok(lexicon)
    }

    /// Lexicon compiled into the crate
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_LEXICON)
    }

    fn insert(&mut self, word: &str) {
        let syllables: Vec<String> = word
            .split(|c: char| c.is_whitespace() || c == DEFAULT_JOINER)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect();

        if syllables.len() < 2 {
            return;
        }

        self.max_syllables = self.max_syllables.max(syllables.len());
        self.words.insert(syllables.join(" "));
    }

    /// Whether the syllables form a known word
    pub fn contains(&self, syllables: &[&str]) -> bool {
        syllables.len() >= 2 && self.words.contains(&syllables.join(" "))
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the lexicon has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Longest word length in syllables
    pub fn max_syllables(&self) -> usize {
        self.max_syllables
    }
}

/// Greedy longest-match segmenter over a lexicon
#[derive(Debug, Clone)]
pub struct LexiconSegmenter {
    lexicon: Lexicon,
    joiner: char,
    max_syllables: usize,
}

impl LexiconSegmenter {
    /// Create a segmenter with the default joiner and word length limit
    pub fn new(lexicon: Lexicon) -> Self {
        let max_syllables = lexicon.max_syllables().min(DEFAULT_MAX_WORD_SYLLABLES);
        Self {
            lexicon,
            joiner: DEFAULT_JOINER,
            max_syllables,
        }
    }

    /// Load the lexicon from a file, or the built-in one when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let lexicon = match path {
            Some(path) => Lexicon::from_file(path)?,
            None => Lexicon::builtin(),
        };

        let source = path.map_or_else(|| "builtin".to_string(), |p| p.display().to_string());
        info!(words = lexicon.len(), source = %source, "Loaded segmentation lexicon");

        Ok(Self::new(lexicon))
    }

    /// Set the joiner character
    pub fn with_joiner(mut self, joiner: char) -> Self {
        self.joiner = joiner;
        self
    }

    /// Cap the longest word the matcher will try
    pub fn with_max_syllables(mut self, max: usize) -> Self {
        self.max_syllables = max.min(self.lexicon.max_syllables()).max(1);
        self
    }

    /// Access the lexicon
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn segment_sentence(&self, tokens: &[Token<'_>], out: &mut Vec<String>) {
        let mut i = 0;
        while i < tokens.len() {
            let Token::Syllable(first) = tokens[i] else {
                out.push(tokens[i].as_str().to_string());
                i += 1;
                continue;
            };

            let run_end = tokens[i..]
                .iter()
                .position(|t| matches!(t, Token::Punct(_)))
                .map_or(tokens.len(), |offset| i + offset);
            let longest = self.max_syllables.min(run_end - i);

            let mut matched = 1;
            if longest >= 2 {
                let window: Vec<&str> = tokens[i..i + longest].iter().map(Token::as_str).collect();
                for n in (2..=longest).rev() {
                    if self.lexicon.contains(&window[..n]) {
                        matched = n;
                        break;
                    }
                }
            }

            if matched == 1 {
                out.push(first.to_string());
            } else {
                let mut joiner = [0u8; 4];
                let joiner: &str = self.joiner.encode_utf8(&mut joiner);
                let word = tokens[i..i + matched]
                    .iter()
                    .map(Token::as_str)
                    .collect::<Vec<_>>()
                    .join(joiner);
                out.push(word);
            }
            i += matched;
        }
    }
}

impl WordSegmenter for LexiconSegmenter {
    fn segment(&self, text: &str) -> Result<String> {
        if text.contains(self.joiner) {
            return Err(Error::segmentation(format!(
                "input already contains the joiner '{}'",
                self.joiner
            )));
        }

        let tokens = tokenize(text);
        let mut out = Vec::with_capacity(tokens.len());
        for sentence in split_sentences(&tokens) {
            self.segment_sentence(sentence, &mut out);
        }
        Ok(out.join(" "))
    }

    fn joiner(&self) -> char {
        self.joiner
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Syllable(&'a str),
    Punct(&'a str),
}

impl<'a> Token<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Self::Syllable(s) | Self::Punct(s) => s,
        }
    }

    fn ends_sentence(&self) -> bool {
        matches!(self, Self::Punct(p) if p.chars().any(|c| matches!(c, '.' | '!' | '?')))
    }
}

fn is_punct(c: char) -> bool {
    matches!(c, ',' | '.' | '!' | '?')
}

/// Split on whitespace, then peel punctuation runs off each chunk. A `,`
/// between two digits stays inside the token (`2,5`), as does a `.` between
/// two letters or digits (`1.000`, `bit.ly`).
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for chunk in text.split_whitespace() {
        let chars: Vec<(usize, char)> = chunk.char_indices().collect();
        let mut start = 0;
        let mut k = 0;

        while k < chars.len() {
            let (pos, c) = chars[k];
            let between = |keep: fn(char) -> bool| {
                k > 0 && k + 1 < chars.len() && keep(chars[k - 1].1) && keep(chars[k + 1].1)
            };
            let inside_word = match c {
                '.' => between(char::is_alphanumeric),
                ',' => between(|c| c.is_ascii_digit()),
                _ => false,
            };

            if !is_punct(c) || inside_word {
                k += 1;
                continue;
            }

            if start < pos {
                tokens.push(Token::Syllable(&chunk[start..pos]));
            }
            let mut end = k;
            while end < chars.len() && is_punct(chars[end].1) {
                end += 1;
            }
            let end_pos = chars.get(end).map_or(chunk.len(), |(p, _)| *p);
            tokens.push(Token::Punct(&chunk[pos..end_pos]));
            start = end_pos;
            k = end;
        }

        if start < chunk.len() {
            tokens.push(Token::Syllable(&chunk[start..]));
        }
    }

    tokens
}

fn split_sentences<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.ends_sentence() {
            sentences.push(&tokens[start..=i]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        sentences.push(&tokens[start..]);
    }
    sentences
}
