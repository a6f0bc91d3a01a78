//! Core types for wellness fusion
//!
//! This module defines the data that flows through a monitor cycle: the
//! per-modality reports produced by analyzers, the snapshot handed to the
//! synthesis engine, and the synthesis result returned to callers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Input channel analyzed independently of the others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Speech,
    Face,
    Screen,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Speech => "speech",
            Modality::Face => "face",
            Modality::Screen => "screen",
        }
    }
}

// ============================================================================
// Text
// ============================================================================

/// Sentiment classifier label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    #[serde(alias = "positive")]
    Positive,
    #[serde(alias = "negative")]
    Negative,
    #[serde(alias = "neutral")]
    Neutral,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Mood derived from the sentiment label and its strength
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Sad,
    Stressed,
    Calm,
    Positive,
    #[default]
    #[serde(other)]
    Neutral,
}

impl Mood {
    /// Moods that add a severity point during synthesis
    pub fn is_distressed(&self) -> bool {
        matches!(self, Mood::Sad | Mood::Stressed)
    }
}

/// Where the analyzed text came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    #[default]
    Direct,
    ScreenOcr,
    Default,
}

fn default_text_score() -> f64 {
    0.5
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_text_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(default_text_score))
}

/// Text sentiment report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: SentimentLabel,
    /// Classifier confidence in `label` (0-1)
    #[serde(default = "default_text_score", deserialize_with = "null_as_text_score")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mood: Mood,
    /// Harmful keywords matched in the text
    #[serde(default, deserialize_with = "null_as_default")]
    pub harmful_hits: BTreeSet<String>,
    /// Short human-readable observations, most relevant first
    #[serde(default, deserialize_with = "null_as_default")]
    pub insights: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: TextSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TextReport {
    /// Neutral stand-in used when there is no real text signal this cycle
    pub fn neutral_placeholder(source: TextSource, insight: &str) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
            mood: Mood::Neutral,
            harmful_hits: BTreeSet::new(),
            insights: vec![insight.to_string()],
            source,
            note: None,
        }
    }

    /// Report for a failed analysis; never contributes to synthesis
    pub fn unknown(note: impl Into<String>) -> Self {
        Self {
            label: SentimentLabel::Unknown,
            score: 0.5,
            mood: Mood::Neutral,
            harmful_hits: BTreeSet::new(),
            insights: Vec::new(),
            source: TextSource::Direct,
            note: Some(note.into()),
        }
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Emotion inferred from voice features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEmotion {
    Calm,
    Excited,
    Sad,
    Anxious,
    Waiting,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Speech affect report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub emotion: SpeechEmotion,
    #[serde(default, deserialize_with = "null_as_default")]
    pub energy: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pitch: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tempo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SpeechReport {
    pub fn new(emotion: SpeechEmotion) -> Self {
        Self {
            emotion,
            energy: 0.0,
            pitch: 0.0,
            tempo: 0.0,
            note: None,
        }
    }

    /// No audio has been received for this cycle
    pub fn waiting(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::new(SpeechEmotion::Waiting)
        }
    }

    pub fn unknown(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::new(SpeechEmotion::Unknown)
        }
    }
}

// ============================================================================
// Face
// ============================================================================

/// Facial expression classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceEmotion {
    Happy,
    Neutral,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FaceEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceEmotion::Happy => "happy",
            FaceEmotion::Neutral => "neutral",
            FaceEmotion::Sad => "sad",
            FaceEmotion::Angry => "angry",
            FaceEmotion::Fear => "fear",
            FaceEmotion::Surprise => "surprise",
            FaceEmotion::Disgust => "disgust",
            FaceEmotion::Unknown => "unknown",
        }
    }
}

/// Facial expression report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dominant_emotion: FaceEmotion,
    /// Classifier confidence in `dominant_emotion` (0-1)
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FaceReport {
    pub fn new(dominant_emotion: FaceEmotion, confidence: f64) -> Self {
        Self {
            dominant_emotion,
            confidence,
            note: None,
        }
    }

    /// Decode or detection failure
    pub fn unknown(note: impl Into<String>) -> Self {
        Self {
            dominant_emotion: FaceEmotion::Unknown,
            confidence: 0.0,
            note: Some(note.into()),
        }
    }
}

// ============================================================================
// Screen
// ============================================================================

/// Outcome of a screen OCR pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStatus {
    Ok,
    Error,
    Timeout,
    Initializing,
    NoText,
    NoFrame,
    Throttled,
    #[default]
    #[serde(other)]
    Unavailable,
}

impl ScreenStatus {
    /// Statuses that mean a pass was actually attempted
    pub fn was_processed(&self) -> bool {
        matches!(
            self,
            ScreenStatus::Ok | ScreenStatus::Error | ScreenStatus::Timeout
        )
    }
}

/// Screen content report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ScreenStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub harmful_hits: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScreenReport {
    pub fn ok(text: impl Into<String>, harmful_hits: BTreeSet<String>) -> Self {
        Self {
            status: ScreenStatus::Ok,
            text: text.into(),
            harmful_hits,
            note: None,
        }
    }

    /// Report carrying no text, only a status and an explanation
    pub fn with_status(status: ScreenStatus, note: impl Into<String>) -> Self {
        Self {
            status,
            text: String::new(),
            harmful_hits: BTreeSet::new(),
            note: Some(note.into()),
        }
    }
}

// ============================================================================
// Snapshot and result
// ============================================================================

/// The modality reports available for one synthesis cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalitySnapshot {
    #[serde(default)]
    pub text: Option<TextReport>,
    #[serde(default)]
    pub speech: Option<SpeechReport>,
    #[serde(default)]
    pub face: Option<FaceReport>,
    #[serde(default)]
    pub screen: Option<ScreenReport>,
}

/// Categorical risk, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// Whether this level should be escalated to the alert log
    pub fn is_elevated(&self) -> bool {
        *self >= RiskLevel::High
    }
}

/// Overall wellness state label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallState {
    Calm,
    Steady,
    ModerateStress,
    HighAnxiety,
}

impl OverallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallState::Calm => "calm",
            OverallState::Steady => "steady",
            OverallState::ModerateStress => "moderate_stress",
            OverallState::HighAnxiety => "high_anxiety",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "calm" => Some(OverallState::Calm),
            "steady" => Some(OverallState::Steady),
            "moderate_stress" => Some(OverallState::ModerateStress),
            "high_anxiety" => Some(OverallState::HighAnxiety),
            _ => None,
        }
    }
}

/// Fused wellness assessment for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Wellness score (0-100, one decimal place)
    pub score: f64,
    pub overall_state: OverallState,
    pub risk_level: RiskLevel,
    /// At most four observations, in the order they were produced
    pub notes: Vec<String>,
    /// At most three suggested actions
    pub actions: Vec<String>,
}

impl SynthesisResult {
    /// Safe neutral result substituted when synthesis itself fails
    pub fn fallback(reason: &str) -> Self {
        Self {
            score: 50.0,
            overall_state: OverallState::Steady,
            risk_level: RiskLevel::Low,
            notes: vec![format!("Synthesis error: {reason}")],
            actions: vec!["Check system logs for details".to_string()],
        }
    }
}

// ============================================================================
// Coordinator request/response
// ============================================================================

/// Decoded audio handed to the speech analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInput {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// One inbound monitor request; every modality is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub audio: Option<AudioInput>,
    /// Encoded camera frame for facial analysis
    #[serde(default)]
    pub frame: Option<Vec<u8>>,
    /// Encoded screen capture for OCR
    #[serde(default)]
    pub screen: Option<Vec<u8>>,
}

/// Result of one monitor cycle: the fused assessment plus the raw reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorResponse {
    pub cycle_id: Uuid,
    pub synthesis: SynthesisResult,
    pub text: Option<TextReport>,
    pub speech: Option<SpeechReport>,
    pub face: Option<FaceReport>,
    pub screen: Option<ScreenReport>,
}
