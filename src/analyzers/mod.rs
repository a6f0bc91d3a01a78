//! Modality analyzers
//!
//! Model inference is external to this crate. These traits are the boundary
//! every analyzer implementation plugs into; the coordinator calls them on the
//! blocking pool, so implementations may be CPU-heavy and may lazily construct
//! their models behind a `std::sync::OnceLock` or similar.
//!
//! Analyzers are expected to be total. They still return `Result` so that a
//! misbehaving implementation degrades to an unknown report at the call site
//! instead of breaking the snapshot.

mod screen;
mod text;

pub use screen::{clean_ocr_text, has_readable_word, OcrEngine, OcrScreenAnalyzer};
pub use text::{derive_mood, match_harmful_keywords, SentimentModel, SentimentTextAnalyzer};

use crate::error::ComputeError;
use crate::types::{FaceReport, ScreenReport, SpeechReport, TextReport};

/// Text sentiment analysis
pub trait TextAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<TextReport, ComputeError>;
}

/// Speech affect analysis over decoded mono samples
pub trait SpeechAnalyzer: Send + Sync {
    fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<SpeechReport, ComputeError>;
}

/// Facial expression analysis over an encoded camera frame.
///
/// Decode or detection failures should yield [`FaceReport::unknown`].
pub trait FaceAnalyzer: Send + Sync {
    fn analyze(&self, frame: &[u8]) -> Result<FaceReport, ComputeError>;
}

/// Screen content analysis over an encoded screen capture.
///
/// Implementations report failures through [`ScreenReport::status`].
pub trait ScreenAnalyzer: Send + Sync {
    fn analyze(&self, frame: &[u8]) -> Result<ScreenReport, ComputeError>;

    /// True while the underlying OCR engine is still being constructed
    fn is_initializing(&self) -> bool {
        false
    }
}
