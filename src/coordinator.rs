//! Fusion coordinator
//!
//! Runs one monitor cycle: dispatches the supplied modalities to their
//! analyzers, freezes the resulting snapshot, synthesizes it, and records the
//! cycle in the sink. Every failure below this level degrades to an absent or
//! neutral report; `monitor` itself never fails.

use crate::analyzers::{FaceAnalyzer, ScreenAnalyzer, SpeechAnalyzer, TextAnalyzer};
use crate::config::MonitorConfig;
use crate::error::ComputeError;
use crate::sink::{WellnessSink, MONITOR_CHANNEL};
use crate::synthesis::synthesize;
use crate::throttle::{Clock, ScreenPass, ScreenThrottle, SystemClock};
use crate::types::{
    AudioInput, FaceReport, ModalitySnapshot, MonitorRequest, MonitorResponse, ScreenReport,
    ScreenStatus, SpeechReport, SynthesisResult, TextReport, TextSource,
};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio::time;
use uuid::Uuid;

const NO_AUDIO_NOTE: &str = "No audio data received yet";
const EMPTY_AUDIO_NOTE: &str = "audio decode failed - no audio data";
const SCREEN_PLACEHOLDER_INSIGHT: &str = "No meaningful text on screen.";
const DEFAULT_TEXT_INSIGHT: &str = "No text input provided.";

/// The analyzer set a coordinator dispatches to
#[derive(Clone)]
pub struct Analyzers {
    pub text: Arc<dyn TextAnalyzer>,
    pub speech: Arc<dyn SpeechAnalyzer>,
    pub face: Arc<dyn FaceAnalyzer>,
    pub screen: Arc<dyn ScreenAnalyzer>,
}

/// How a bounded analyzer task ended
enum TaskOutcome<T> {
    Done(T),
    Failed(String),
    TimedOut,
}

/// Run `f` on the blocking pool, optionally bounded by `limit`.
///
/// A task that outlives `limit` is detached; its result is dropped.
async fn run_blocking<T, F>(f: F, limit: Option<Duration>) -> TaskOutcome<T>
where
    F: FnOnce() -> Result<T, ComputeError> + Send + 'static,
    T: Send + 'static,
{
    let handle = task::spawn_blocking(f);
    let joined = match limit {
        Some(limit) => match time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => return TaskOutcome::TimedOut,
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(value)) => TaskOutcome::Done(value),
        Ok(Err(err)) => TaskOutcome::Failed(err.to_string()),
        Err(err) if err.is_panic() => TaskOutcome::Failed("analyzer panicked".to_string()),
        Err(err) => TaskOutcome::Failed(err.to_string()),
    }
}

/// Orchestrates analyzers, synthesis and record keeping for monitor cycles.
///
/// One coordinator is shared by all in-flight requests; it owns the screen
/// throttle window.
pub struct FusionCoordinator {
    analyzers: Analyzers,
    sink: Arc<dyn WellnessSink>,
    config: MonitorConfig,
    throttle: ScreenThrottle,
}

impl FusionCoordinator {
    pub fn new(analyzers: Analyzers, sink: Arc<dyn WellnessSink>, config: MonitorConfig) -> Self {
        Self::with_clock(analyzers, sink, config, Arc::new(SystemClock))
    }

    /// Construct with an explicit time source for the screen throttle
    pub fn with_clock(
        analyzers: Analyzers,
        sink: Arc<dyn WellnessSink>,
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let throttle = ScreenThrottle::new(config.screen_interval(), clock);
        Self {
            analyzers,
            sink,
            config,
            throttle,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one monitor cycle
    pub async fn monitor(&self, request: MonitorRequest) -> MonitorResponse {
        let cycle_id = Uuid::new_v4();
        let MonitorRequest {
            text,
            audio,
            frame,
            screen,
        } = request;

        let mut text_report = match text.filter(|t| !t.is_empty()) {
            Some(text) => Some(self.analyze_text(text).await),
            None => None,
        };

        let (speech_report, face_report) =
            tokio::join!(self.analyze_speech(audio), self.analyze_face(frame));

        let screen_report = match screen.filter(|s| !s.is_empty()) {
            Some(frame) => Some(self.analyze_screen(frame).await),
            None => None,
        };

        if text_report.is_none() {
            if let Some(screen) = &screen_report {
                text_report = self.text_from_screen(screen).await;
            }
        }
        let text_report = text_report.unwrap_or_else(|| {
            TextReport::neutral_placeholder(TextSource::Default, DEFAULT_TEXT_INSIGHT)
        });

        let snapshot = ModalitySnapshot {
            text: Some(text_report),
            speech: Some(speech_report),
            face: face_report,
            screen: screen_report,
        };
        let synthesis = synthesize_guarded(&snapshot);

        debug!(
            "Cycle {cycle_id}: score={:.1} risk={} state={} text={:?} speech={:?} face={} screen={}",
            synthesis.score,
            synthesis.risk_level.as_str(),
            synthesis.overall_state.as_str(),
            snapshot.text.as_ref().map(|t| t.source),
            snapshot.speech.as_ref().map(|s| s.emotion),
            snapshot
                .face
                .as_ref()
                .map_or("absent", |f| f.dominant_emotion.as_str()),
            snapshot
                .screen
                .as_ref()
                .map_or_else(|| "absent".to_string(), |s| format!("{:?}", s.status)),
        );

        if synthesis.risk_level.is_elevated() {
            info!(
                "Cycle {cycle_id}: escalating {} risk",
                synthesis.risk_level.as_str()
            );
            self.record_alert(&synthesis).await;
        }
        self.record_interaction(&snapshot, &synthesis).await;

        let ModalitySnapshot {
            text,
            speech,
            face,
            screen,
        } = snapshot;
        MonitorResponse {
            cycle_id,
            synthesis,
            text,
            speech,
            face,
            screen,
        }
    }

    async fn analyze_text(&self, text: String) -> TextReport {
        let analyzer = Arc::clone(&self.analyzers.text);
        match run_blocking(move || analyzer.analyze(&text), None).await {
            TaskOutcome::Done(report) => report,
            TaskOutcome::Failed(reason) => {
                warn!("Text analysis failed: {reason}");
                TextReport::unknown(reason)
            }
            TaskOutcome::TimedOut => TextReport::unknown("timed out"),
        }
    }

    async fn analyze_speech(&self, audio: Option<AudioInput>) -> SpeechReport {
        let Some(AudioInput {
            samples,
            sample_rate,
        }) = audio
        else {
            return SpeechReport::waiting(NO_AUDIO_NOTE);
        };
        if samples.is_empty() {
            debug!("Speech analysis skipped: empty audio signal");
            return SpeechReport::unknown(EMPTY_AUDIO_NOTE);
        }

        let analyzer = Arc::clone(&self.analyzers.speech);
        let limit = self.config.speech_timeout();
        match run_blocking(move || analyzer.analyze(&samples, sample_rate), Some(limit)).await {
            TaskOutcome::Done(report) => report,
            TaskOutcome::Failed(reason) => {
                warn!("Speech analysis failed: {reason}");
                SpeechReport::unknown(format!("error: {reason}"))
            }
            TaskOutcome::TimedOut => {
                warn!("Speech analysis exceeded {limit:?}, continuing without it");
                SpeechReport::unknown("timed out")
            }
        }
    }

    async fn analyze_face(&self, frame: Option<Vec<u8>>) -> Option<FaceReport> {
        let frame = frame.filter(|f| !f.is_empty())?;

        let analyzer = Arc::clone(&self.analyzers.face);
        let limit = self.config.face_timeout();
        match run_blocking(move || analyzer.analyze(&frame), Some(limit)).await {
            TaskOutcome::Done(report) => Some(report),
            TaskOutcome::Failed(reason) => {
                warn!("Face analysis failed: {reason}");
                Some(FaceReport::unknown(reason))
            }
            TaskOutcome::TimedOut => {
                warn!("Face analysis exceeded {limit:?}, continuing without it");
                None
            }
        }
    }

    async fn analyze_screen(&self, frame: Vec<u8>) -> ScreenReport {
        let engine_ready = !self.analyzers.screen.is_initializing();
        let (limit, remaining) = match self.throttle.acquire(engine_ready) {
            ScreenPass::NotReady => {
                return ScreenReport::with_status(
                    ScreenStatus::Initializing,
                    "Screen OCR engine is initializing. Screen analysis will be available shortly.",
                );
            }
            ScreenPass::Full => (self.config.screen_full_timeout(), None),
            ScreenPass::Quick { remaining } => (self.config.screen_quick_timeout(), Some(remaining)),
        };

        let analyzer = Arc::clone(&self.analyzers.screen);
        match run_blocking(move || analyzer.analyze(&frame), Some(limit)).await {
            TaskOutcome::Done(report) => report,
            TaskOutcome::Failed(reason) => {
                warn!("Screen analysis failed: {reason}");
                ScreenReport::with_status(ScreenStatus::Error, reason)
            }
            TaskOutcome::TimedOut => match remaining {
                Some(remaining) => ScreenReport::with_status(
                    ScreenStatus::Throttled,
                    format!(
                        "Screen analysis updating every {}s. Next update in {}s.",
                        self.throttle.interval().as_secs(),
                        remaining.as_secs()
                    ),
                ),
                None => {
                    warn!("Screen analysis exceeded {limit:?}, result will be dropped");
                    ScreenReport::with_status(
                        ScreenStatus::Timeout,
                        "Screen analysis taking longer than expected.",
                    )
                }
            },
        }
    }

    /// Source a text report from screen OCR when no literal text was supplied
    async fn text_from_screen(&self, screen: &ScreenReport) -> Option<TextReport> {
        let condensed = screen.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let condensed: String = condensed
            .chars()
            .take(self.config.fallback_max_chars)
            .collect();

        if condensed.chars().count() > self.config.fallback_min_chars {
            let analyzer = Arc::clone(&self.analyzers.text);
            return match run_blocking(move || analyzer.analyze(&condensed), None).await {
                TaskOutcome::Done(mut report) => {
                    report.source = TextSource::ScreenOcr;
                    Some(report)
                }
                TaskOutcome::Failed(reason) => {
                    warn!("Screen text sentiment failed: {reason}");
                    None
                }
                TaskOutcome::TimedOut => None,
            };
        }

        (screen.status == ScreenStatus::Ok).then(|| {
            TextReport::neutral_placeholder(TextSource::ScreenOcr, SCREEN_PLACEHOLDER_INSIGHT)
        })
    }

    async fn record_alert(&self, synthesis: &SynthesisResult) {
        let metadata = match serde_json::to_value(synthesis) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Alert metadata could not be encoded: {err}");
                return;
            }
        };
        let level = synthesis.risk_level;
        let reason = self.config.alert_reason.clone();
        let sink = Arc::clone(&self.sink);
        self.append(move || sink.append_alert(level, &reason, &metadata), "alert")
            .await;
    }

    async fn record_interaction(&self, snapshot: &ModalitySnapshot, synthesis: &SynthesisResult) {
        let payload = match interaction_payload(snapshot, synthesis) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Interaction payload could not be encoded: {err}");
                return;
            }
        };
        let sink = Arc::clone(&self.sink);
        self.append(
            move || sink.append_interaction(MONITOR_CHANNEL, &payload),
            "interaction",
        )
        .await;
    }

    async fn append<F>(&self, f: F, what: &str)
    where
        F: FnOnce() -> Result<(), ComputeError> + Send + 'static,
    {
        let limit = self.config.sink_timeout();
        match run_blocking(f, Some(limit)).await {
            TaskOutcome::Done(()) => {}
            TaskOutcome::Failed(reason) => warn!("Failed to append {what} record: {reason}"),
            TaskOutcome::TimedOut => {
                warn!("Appending {what} record exceeded {limit:?}, continuing without it")
            }
        }
    }
}

fn interaction_payload(
    snapshot: &ModalitySnapshot,
    synthesis: &SynthesisResult,
) -> Result<Value, ComputeError> {
    Ok(json!({
        "modules": serde_json::to_value(snapshot)?,
        "synthesis": serde_json::to_value(synthesis)?,
    }))
}

fn synthesize_guarded(snapshot: &ModalitySnapshot) -> SynthesisResult {
    synthesize_or_fallback(snapshot, synthesize)
}

/// Run `engine`, substituting the neutral fallback if it panics
fn synthesize_or_fallback<F>(snapshot: &ModalitySnapshot, engine: F) -> SynthesisResult
where
    F: FnOnce(&ModalitySnapshot) -> SynthesisResult,
{
    match panic::catch_unwind(AssertUnwindSafe(|| engine(snapshot))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!("Synthesis failed, substituting neutral result: {reason}");
            SynthesisResult::fallback(&reason)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
