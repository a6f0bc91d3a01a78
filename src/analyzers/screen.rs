//! OCR-backed screen analysis
//!
//! Wraps a raw OCR engine, filters garbled recognition output and flags
//! harmful keywords in what remains.

use super::text::match_harmful_keywords;
use super::ScreenAnalyzer;
use crate::config::{MonitorConfig, DEFAULT_HARMFUL_KEYWORDS};
use crate::error::ComputeError;
use crate::types::{ScreenReport, ScreenStatus};

/// Characters that count as readable besides alphanumerics
const READABLE_SYMBOLS: &str = " .,!?;:()[]{}'\"-+=@#$%&*";

/// Punctuation stripped from both ends of a kept line
const EDGE_SYMBOLS: &str = ".,!?;:()[]{}'\"-+=@#$%&*";

/// Lines with a lower readable-character ratio are dropped
const MIN_READABLE_RATIO: f64 = 0.6;

const MIN_LINE_CHARS: usize = 3;
const MAX_CONSONANT_RUN: usize = 5;
const MAX_LONE_WORD_CHARS: usize = 10;

/// Raw OCR engine
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an encoded frame.
    ///
    /// Return [`ComputeError::Unavailable`] when the engine is not installed
    /// or failed to load, so the pass is reported as `unavailable` rather
    /// than `error`.
    fn recognize(&self, frame: &[u8]) -> Result<String, ComputeError>;

    /// True while models are still being downloaded or loaded
    fn is_initializing(&self) -> bool {
        false
    }
}

/// [`ScreenAnalyzer`] built on an [`OcrEngine`]
pub struct OcrScreenAnalyzer<E> {
    engine: E,
    harmful_keywords: Vec<String>,
}

impl<E: OcrEngine> OcrScreenAnalyzer<E> {
    pub fn new(engine: E, harmful_keywords: Vec<String>) -> Self {
        Self {
            engine,
            harmful_keywords,
        }
    }

    /// Flag the keywords configured in `config`
    pub fn from_config(engine: E, config: &MonitorConfig) -> Self {
        Self::new(engine, config.harmful_keywords.clone())
    }

    pub fn with_default_keywords(engine: E) -> Self {
        Self::new(
            engine,
            DEFAULT_HARMFUL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl<E: OcrEngine> ScreenAnalyzer for OcrScreenAnalyzer<E> {
    fn analyze(&self, frame: &[u8]) -> Result<ScreenReport, ComputeError> {
        if frame.is_empty() {
            return Ok(ScreenReport::with_status(
                ScreenStatus::NoFrame,
                "No screen frame supplied",
            ));
        }

        let raw = match self.engine.recognize(frame) {
            Ok(raw) => raw,
            Err(ComputeError::Unavailable(reason)) => {
                return Ok(ScreenReport::with_status(
                    ScreenStatus::Unavailable,
                    format!("OCR unavailable: {reason}"),
                ));
            }
            Err(err) => {
                return Ok(ScreenReport::with_status(ScreenStatus::Error, err.to_string()));
            }
        };

        let text = clean_ocr_text(&raw);
        if !has_readable_word(&text) {
            return Ok(ScreenReport::with_status(
                ScreenStatus::NoText,
                "No readable text on screen",
            ));
        }

        let harmful_hits = match_harmful_keywords(&text, &self.harmful_keywords);
        Ok(ScreenReport::ok(text, harmful_hits))
    }

    fn is_initializing(&self) -> bool {
        self.engine.is_initializing()
    }
}

/// Drop garbled OCR lines and tidy the rest.
///
/// A line is kept only if it is mostly readable characters, has no long run
/// of consonants, and is not a single overlong token.
pub fn clean_ocr_text(raw: &str) -> String {
    let mut kept: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let total = line.chars().count();
        let readable = line
            .chars()
            .filter(|c| c.is_alphanumeric() || READABLE_SYMBOLS.contains(*c))
            .count();
        if (readable as f64) / (total as f64) < MIN_READABLE_RATIO {
            continue;
        }
        if total < MIN_LINE_CHARS {
            continue;
        }
        if longest_consonant_run(line) > MAX_CONSONANT_RUN {
            continue;
        }

        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        let stripped = collapsed.trim_matches(|c| EDGE_SYMBOLS.contains(c));
        if stripped.chars().count() < MIN_LINE_CHARS {
            continue;
        }

        let words: Vec<&str> = stripped.split_whitespace().collect();
        if words.len() < 2 && words.iter().any(|w| w.chars().count() > MAX_LONE_WORD_CHARS) {
            continue;
        }

        kept.push(stripped.to_string());
    }

    kept.join("\n")
}

/// True if any word has a letter and at least two characters
pub fn has_readable_word(text: &str) -> bool {
    text.split_whitespace()
        .any(|w| w.chars().count() >= 2 && w.chars().any(char::is_alphabetic))
}

fn longest_consonant_run(line: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in line.chars() {
        if c.is_ascii_alphabetic() && !"aeiouAEIOU".contains(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
