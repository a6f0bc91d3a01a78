//! Wellness Fusion - Multimodal wellness signal fusion engine
//!
//! Fuses per-modality affect reports (text sentiment, speech tone, facial
//! expression, on-screen content) into a single wellness assessment: a 0-100
//! score, a categorical risk level, an overall state label, explanatory notes
//! and recommended actions.
//!
//! ## Modules
//!
//! - **Synthesis**: Pure fusion policy over a snapshot of modality reports
//! - **Coordinator**: Per-request orchestration with bounded waits, screen
//!   throttling, fallback text sourcing and record keeping
//! - **Analyzers**: Boundaries for external ML analyzers, plus sentiment and
//!   OCR building blocks

pub mod analyzers;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod recommend;
pub mod sink;
pub mod synthesis;
pub mod throttle;
pub mod types;

pub use config::MonitorConfig;
pub use coordinator::{Analyzers, FusionCoordinator};
pub use error::ComputeError;
pub use recommend::{recommend, recommend_for_labels};
pub use sink::{MemorySink, SqliteSink, WellnessSink};
pub use synthesis::{synthesize, Assessment, SynthesisEngine};
pub use types::{ModalitySnapshot, MonitorRequest, MonitorResponse, SynthesisResult};

/// Crate version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "wellness-fusion";
