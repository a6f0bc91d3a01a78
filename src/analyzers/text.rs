//! Sentiment-backed text analysis
//!
//! Wraps a raw sentiment classifier and derives mood, harmful keyword hits and
//! insights from its output.

use super::TextAnalyzer;
use crate::config::{MonitorConfig, DEFAULT_HARMFUL_KEYWORDS};
use crate::error::ComputeError;
use crate::types::{Mood, SentimentLabel, TextReport, TextSource};
use std::collections::BTreeSet;

/// Maximum characters handed to the classifier
pub const MAX_CLASSIFIER_CHARS: usize = 512;

/// Above this classifier score the mood is read as strong
const STRONG_SENTIMENT: f64 = 0.8;

/// Raw sentiment classifier, e.g. a fine-tuned transformer
pub trait SentimentModel: Send + Sync {
    /// Return the predicted label and its probability (0-1)
    fn classify(&self, text: &str) -> Result<(SentimentLabel, f64), ComputeError>;
}

/// [`TextAnalyzer`] built on a [`SentimentModel`]
pub struct SentimentTextAnalyzer<M> {
    model: M,
    harmful_keywords: Vec<String>,
}

impl<M: SentimentModel> SentimentTextAnalyzer<M> {
    pub fn new(model: M, harmful_keywords: Vec<String>) -> Self {
        Self {
            model,
            harmful_keywords,
        }
    }

    /// Flag the keywords configured in `config`
    pub fn from_config(model: M, config: &MonitorConfig) -> Self {
        Self::new(model, config.harmful_keywords.clone())
    }

    pub fn with_default_keywords(model: M) -> Self {
        Self::new(
            model,
            DEFAULT_HARMFUL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl<M: SentimentModel> TextAnalyzer for SentimentTextAnalyzer<M> {
    fn analyze(&self, text: &str) -> Result<TextReport, ComputeError> {
        if text.trim().is_empty() {
            return Ok(TextReport {
                label: SentimentLabel::Neutral,
                score: 0.0,
                mood: Mood::Neutral,
                harmful_hits: BTreeSet::new(),
                insights: vec!["Share a bit more so I can understand how you feel.".to_string()],
                source: TextSource::Direct,
                note: None,
            });
        }

        let head: String = text.chars().take(MAX_CLASSIFIER_CHARS).collect();
        let (label, score) = self.model.classify(&head)?;
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.5
        };

        let mood = derive_mood(label, score);
        let harmful_hits = match_harmful_keywords(text, &self.harmful_keywords);
        let insights = text_insights(mood, &harmful_hits);

        Ok(TextReport {
            label,
            score,
            mood,
            harmful_hits,
            insights,
            source: TextSource::Direct,
            note: None,
        })
    }
}

/// Map a classifier label and strength to a mood
pub fn derive_mood(label: SentimentLabel, score: f64) -> Mood {
    match label {
        SentimentLabel::Positive if score > STRONG_SENTIMENT => Mood::Calm,
        SentimentLabel::Positive => Mood::Positive,
        SentimentLabel::Negative if score > STRONG_SENTIMENT => Mood::Stressed,
        SentimentLabel::Negative => Mood::Sad,
        SentimentLabel::Neutral | SentimentLabel::Unknown => Mood::Neutral,
    }
}

/// Case-insensitive substring match of `keywords` in `text`
pub fn match_harmful_keywords(text: &str, keywords: &[String]) -> BTreeSet<String> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| haystack.contains(&k.to_lowercase()))
        .cloned()
        .collect()
}

fn text_insights(mood: Mood, harmful_hits: &BTreeSet<String>) -> Vec<String> {
    let mut insights = Vec::new();
    if !harmful_hits.is_empty() {
        insights.push(
            "Your text mentions potentially harmful themes. Consider contacting a trusted person."
                .to_string(),
        );
    }
    if mood.is_distressed() {
        insights.push("Try reframing negative thoughts and take a short break.".to_string());
    }
    if insights.is_empty() {
        insights.push("Keep reflecting on your feelings, you are doing great.".to_string());
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Returns a fixed prediction and records what it was asked to classify
    struct FixedModel {
        label: SentimentLabel,
        score: f64,
        seen: Mutex<Vec<String>>,
    }

    impl FixedModel {
        fn new(label: SentimentLabel, score: f64) -> Self {
            Self {
                label,
                score,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SentimentModel for FixedModel {
        fn classify(&self, text: &str) -> Result<(SentimentLabel, f64), ComputeError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok((self.label, self.score))
        }
    }

    struct BrokenModel;

    impl SentimentModel for BrokenModel {
        fn classify(&self, _text: &str) -> Result<(SentimentLabel, f64), ComputeError> {
            Err(ComputeError::Analyzer("model not loaded".to_string()))
        }
    }

    #[test]
    fn test_blank_text_short_circuits() {
        let analyzer =
            SentimentTextAnalyzer::with_default_keywords(FixedModel::new(SentimentLabel::Negative, 0.9));
        let report = analyzer.analyze("   ").unwrap();

        assert_eq!(report.label, SentimentLabel::Neutral);
        assert_eq!(report.score, 0.0);
        assert!(analyzer.model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_strong_negative_with_harmful_keyword() {
        let analyzer =
            SentimentTextAnalyzer::with_default_keywords(FixedModel::new(SentimentLabel::Negative, 0.95));
        let report = analyzer.analyze("I feel WORTHLESS and close to panic").unwrap();

        assert_eq!(report.mood, Mood::Stressed);
        assert_eq!(
            report.harmful_hits.into_iter().collect::<Vec<_>>(),
            vec!["panic".to_string(), "worthless".to_string()]
        );
        assert_eq!(report.insights.len(), 2);
        assert!(report.insights[0].contains("harmful themes"));
    }

    #[test]
    fn test_configured_keywords_replace_defaults() {
        let config = MonitorConfig {
            harmful_keywords: vec!["doomscrolling".to_string()],
            ..Default::default()
        };
        let analyzer =
            SentimentTextAnalyzer::from_config(FixedModel::new(SentimentLabel::Negative, 0.7), &config);
        let report = analyzer.analyze("Another night of doomscrolling and panic").unwrap();

        assert_eq!(
            report.harmful_hits.into_iter().collect::<Vec<_>>(),
            vec!["doomscrolling".to_string()]
        );
    }

    #[test]
    fn test_mild_positive() {
        let analyzer =
            SentimentTextAnalyzer::with_default_keywords(FixedModel::new(SentimentLabel::Positive, 0.7));
        let report = analyzer.analyze("Pretty good afternoon").unwrap();

        assert_eq!(report.mood, Mood::Positive);
        assert!(report.harmful_hits.is_empty());
        assert_eq!(
            report.insights,
            vec!["Keep reflecting on your feelings, you are doing great.".to_string()]
        );
    }

    #[test]
    fn test_classifier_input_capped() {
        let analyzer =
            SentimentTextAnalyzer::with_default_keywords(FixedModel::new(SentimentLabel::Positive, 0.6));
        let long = "ok ".repeat(400);
        analyzer.analyze(&long).unwrap();

        let seen = analyzer.model.seen.lock().unwrap();
        assert_eq!(seen[0].chars().count(), MAX_CLASSIFIER_CHARS);
    }

    #[test]
    fn test_model_error_propagates() {
        let analyzer = SentimentTextAnalyzer::with_default_keywords(BrokenModel);
        assert!(analyzer.analyze("hello").is_err());
    }

    #[test]
    fn test_derive_mood() {
        assert_eq!(derive_mood(SentimentLabel::Positive, 0.81), Mood::Calm);
        assert_eq!(derive_mood(SentimentLabel::Positive, 0.8), Mood::Positive);
        assert_eq!(derive_mood(SentimentLabel::Negative, 0.5), Mood::Sad);
        assert_eq!(derive_mood(SentimentLabel::Neutral, 0.99), Mood::Neutral);
    }
}
