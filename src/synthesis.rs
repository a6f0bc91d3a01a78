//! Wellness synthesis
//!
//! Fuses one snapshot of modality reports into a single assessment. Each
//! modality that yields usable signal contributes a weighted wellness value
//! and may add severity points; the weighted mean is then damped toward the
//! neutral baseline when evidence is sparse, and the risk and state ladders
//! are evaluated from (score, severity points, data quality).
//!
//! Synthesis is pure and total: malformed or out-of-range fields are treated
//! as absent, never as errors.

use crate::recommend::recommend;
use crate::types::{
    FaceEmotion, FaceReport, Modality, ModalitySnapshot, OverallState, RiskLevel, ScreenReport,
    ScreenStatus, SentimentLabel, SpeechEmotion, SpeechReport, SynthesisResult, TextReport,
};
use serde::{Deserialize, Serialize};

/// Neutral baseline score
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Maximum notes kept in a result
pub const MAX_NOTES: usize = 4;

/// Note appended when nothing contributed to the weighted mean
pub const INSUFFICIENT_DATA_NOTE: &str = "Insufficient data for accurate assessment.";

const TEXT_WEIGHT: f64 = 0.30;
const TEXT_SPREAD: f64 = 30.0;
const MAX_TEXT_INSIGHTS: usize = 2;

const SPEECH_WEIGHT: f64 = 0.25;

const FACE_WEIGHT: f64 = 0.25;
const FACE_MIN_CONFIDENCE: f64 = 0.2;
const FACE_CONFIDENT: f64 = 0.5;

const SCREEN_HARMFUL_VALUE: f64 = 30.0;
const SCREEN_HARMFUL_WEIGHT: f64 = 0.20;
const SCREEN_OK_VALUE: f64 = 50.0;
const SCREEN_OK_WEIGHT: f64 = 0.10;
const SCREEN_TEXT_NOTE_MIN_CHARS: usize = 10;

/// One weighted entry in the fused mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub modality: Modality,
    /// Wellness value on the 0-100 scale
    pub value: f64,
    /// Raw (unnormalized) weight
    pub weight: f64,
}

/// Synthesis result plus the intermediate quantities that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub result: SynthesisResult,
    pub severity_points: u32,
    /// Number of modalities that yielded usable signal
    pub data_quality: u32,
    pub contributions: Vec<Contribution>,
}

impl Assessment {
    /// Weights actually applied in the mean; sums to 1 when anything contributed
    pub fn normalized_weights(&self) -> Vec<f64> {
        let total: f64 = self.contributions.iter().map(|c| c.weight).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        self.contributions.iter().map(|c| c.weight / total).collect()
    }
}

/// Synthesize a snapshot into a wellness result.
///
/// # Example
/// ```ignore
/// let result = synthesize(&ModalitySnapshot::default());
/// assert_eq!(result.score, 50.0);
/// ```
pub fn synthesize(snapshot: &ModalitySnapshot) -> SynthesisResult {
    SynthesisEngine::assess(snapshot).result
}

/// Fusion policy over modality reports
pub struct SynthesisEngine;

impl SynthesisEngine {
    /// Assess a snapshot, keeping the explainable intermediate values
    pub fn assess(snapshot: &ModalitySnapshot) -> Assessment {
        let mut acc = Accumulator::default();

        if let Some(text) = &snapshot.text {
            acc.add_text(text);
        }
        if let Some(speech) = &snapshot.speech {
            acc.add_speech(speech);
        }
        if let Some(face) = &snapshot.face {
            acc.add_face(face);
        }
        if let Some(screen) = &snapshot.screen {
            acc.add_screen(screen);
        }

        acc.finish()
    }
}

#[derive(Default)]
struct Accumulator {
    contributions: Vec<Contribution>,
    severity_points: u32,
    data_quality: u32,
    notes: Vec<String>,
}

impl Accumulator {
    fn contribute(&mut self, modality: Modality, value: f64, weight: f64) {
        self.contributions.push(Contribution {
            modality,
            value,
            weight,
        });
    }

    fn add_text(&mut self, text: &TextReport) {
        if text.label == SentimentLabel::Unknown {
            return;
        }

        let strength = unit_or(text.score, 0.5);
        let value = if text.label == SentimentLabel::Positive {
            NEUTRAL_SCORE + strength * TEXT_SPREAD
        } else {
            NEUTRAL_SCORE - strength * TEXT_SPREAD
        };
        self.contribute(Modality::Text, value, TEXT_WEIGHT);
        self.data_quality += 1;

        self.notes
            .extend(text.insights.iter().take(MAX_TEXT_INSIGHTS).cloned());

        if !text.harmful_hits.is_empty() {
            self.severity_points += 2;
            self.notes
                .push("Harmful content detected in text.".to_string());
        }

        if text.mood.is_distressed() {
            self.severity_points += 1;
        }
    }

    fn add_speech(&mut self, speech: &SpeechReport) {
        let value = match speech_value(speech.emotion) {
            Some(value) => value,
            None => return,
        };
        self.contribute(Modality::Speech, value, SPEECH_WEIGHT);
        self.data_quality += 1;

        match speech.emotion {
            SpeechEmotion::Sad => {
                self.severity_points += 1;
                self.notes.push("Voice tone indicates sad.".to_string());
            }
            SpeechEmotion::Anxious => {
                self.severity_points += 1;
                self.notes.push("Voice tone indicates anxious.".to_string());
            }
            SpeechEmotion::Excited => {
                self.notes.push("Voice tone appears positive.".to_string());
            }
            _ => {}
        }
    }

    fn add_face(&mut self, face: &FaceReport) {
        let emotion = face.dominant_emotion;
        if emotion == FaceEmotion::Unknown {
            return;
        }
        let confidence = if face.confidence.is_finite() {
            face.confidence
        } else {
            0.0
        };
        if confidence <= FACE_MIN_CONFIDENCE {
            return;
        }

        // Shrink toward neutral in proportion to classifier confidence
        let value = NEUTRAL_SCORE + (face_value(emotion) - NEUTRAL_SCORE) * confidence.min(1.0);
        self.contribute(Modality::Face, value, FACE_WEIGHT);
        self.data_quality += 1;

        let confident = confidence > FACE_CONFIDENT;
        let pct = confidence.min(1.0) * 100.0;
        match emotion {
            FaceEmotion::Sad if confident => {
                self.severity_points += 2;
                self.notes.push(format!(
                    "Sad facial expression detected (confidence: {pct:.1}%)."
                ));
            }
            FaceEmotion::Sad => {
                self.severity_points += 1;
                self.notes.push(format!(
                    "Facial expression appears sad (confidence: {pct:.1}%)."
                ));
            }
            FaceEmotion::Angry | FaceEmotion::Fear if confident => {
                self.severity_points += 2;
                self.notes.push(format!(
                    "{} facial expression detected.",
                    capitalize(emotion.as_str())
                ));
            }
            FaceEmotion::Angry | FaceEmotion::Fear => {
                self.severity_points += 1;
            }
            FaceEmotion::Neutral => {}
            other if confident => {
                self.notes
                    .push(format!("Facial expression: {}.", other.as_str()));
            }
            _ => {}
        }
    }

    fn add_screen(&mut self, screen: &ScreenReport) {
        if screen.status.was_processed() {
            self.data_quality += 1;
        }

        if !screen.harmful_hits.is_empty() {
            self.contribute(Modality::Screen, SCREEN_HARMFUL_VALUE, SCREEN_HARMFUL_WEIGHT);
            self.severity_points += 2;
            self.notes
                .push("Potentially harmful content on screen.".to_string());
        } else if screen.status == ScreenStatus::Ok {
            self.contribute(Modality::Screen, SCREEN_OK_VALUE, SCREEN_OK_WEIGHT);
            if screen.text.chars().count() > SCREEN_TEXT_NOTE_MIN_CHARS {
                self.notes.push("Screen content analyzed.".to_string());
            }
        }
    }

    fn finish(mut self) -> Assessment {
        let total_weight: f64 = self.contributions.iter().map(|c| c.weight).sum();

        let raw_score = if self.contributions.is_empty() || total_weight <= 0.0 {
            self.notes.push(INSUFFICIENT_DATA_NOTE.to_string());
            self.severity_points = 0;
            NEUTRAL_SCORE
        } else {
            let mean: f64 = self
                .contributions
                .iter()
                .map(|c| c.value * (c.weight / total_weight))
                .sum();
            dampen(mean, self.data_quality)
        };

        let score = round_one_decimal(raw_score).clamp(0.0, 100.0);
        let risk_level = classify_risk(score, self.severity_points, self.data_quality);
        let overall_state = classify_state(risk_level, score, self.severity_points);

        self.notes.truncate(MAX_NOTES);

        Assessment {
            result: SynthesisResult {
                score,
                overall_state,
                risk_level,
                notes: self.notes,
                actions: recommend(overall_state, risk_level),
            },
            severity_points: self.severity_points,
            data_quality: self.data_quality,
            contributions: self.contributions,
        }
    }
}

/// Shrink a score toward neutral when few modalities contributed
pub fn dampen(score: f64, data_quality: u32) -> f64 {
    let factor = match data_quality {
        1 => 0.9,
        2 => 0.95,
        _ => 1.0,
    };
    NEUTRAL_SCORE + (score - NEUTRAL_SCORE) * factor
}

/// Risk ladder; the first matching rung wins
pub fn classify_risk(score: f64, severity_points: u32, data_quality: u32) -> RiskLevel {
    if data_quality == 0 {
        RiskLevel::Low
    } else if severity_points >= 4 || score < 20.0 {
        RiskLevel::Critical
    } else if severity_points >= 3 || (severity_points >= 2 && score < 40.0) || score < 30.0 {
        RiskLevel::High
    } else if severity_points >= 2 || (severity_points >= 1 && score < 50.0) || score < 45.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// State ladder; the first matching rung wins
pub fn classify_state(risk: RiskLevel, score: f64, severity_points: u32) -> OverallState {
    if risk == RiskLevel::Critical || score < 25.0 {
        OverallState::HighAnxiety
    } else if risk == RiskLevel::High || (score < 40.0 && severity_points >= 2) {
        OverallState::ModerateStress
    } else if risk == RiskLevel::Medium || score < 75.0 {
        OverallState::Steady
    } else {
        OverallState::Calm
    }
}

fn speech_value(emotion: SpeechEmotion) -> Option<f64> {
    match emotion {
        SpeechEmotion::Calm => Some(65.0),
        SpeechEmotion::Excited => Some(70.0),
        SpeechEmotion::Sad => Some(35.0),
        SpeechEmotion::Anxious => Some(30.0),
        SpeechEmotion::Unknown | SpeechEmotion::Waiting => None,
    }
}

fn face_value(emotion: FaceEmotion) -> f64 {
    match emotion {
        FaceEmotion::Happy => 70.0,
        FaceEmotion::Neutral => 55.0,
        FaceEmotion::Sad => 35.0,
        FaceEmotion::Angry => 25.0,
        FaceEmotion::Fear => 30.0,
        FaceEmotion::Surprise => 60.0,
        FaceEmotion::Disgust => 40.0,
        FaceEmotion::Unknown => NEUTRAL_SCORE,
    }
}

/// Clamp to 0-1, replacing non-finite input with `default`
fn unit_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        default
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
