//! Wellness CLI - Command-line interface for Wellness Fusion
//!
//! Commands:
//! - synthesize: Fuse modality snapshots into wellness results (batch mode)
//! - recommend: Look up actions for a state and risk level
//! - doctor: Diagnose configuration and record storage
//! - schema: Print input/output schema information
//! - config: Print the default monitor configuration

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wellness_fusion::config::DEFAULT_ALERT_REASON;
use wellness_fusion::sink::WellnessSink;
use wellness_fusion::types::{ModalitySnapshot, SynthesisResult};
use wellness_fusion::{
    recommend_for_labels, synthesize, ComputeError, MonitorConfig, SqliteSink, PRODUCER_NAME,
    VERSION,
};

/// Wellness - Fuse multimodal affect signals into a wellness assessment
#[derive(Parser)]
#[command(name = "wellness")]
#[command(author = "Synheart AI Inc")]
#[command(version = VERSION)]
#[command(about = "Fuse modality reports into wellness results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse modality snapshots into wellness results (batch mode)
    Synthesize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Record interactions and alerts in this SQLite database
        #[arg(long)]
        alerts_db: Option<PathBuf>,

        /// Monitor configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Look up recommended actions for a state and risk level
    Recommend {
        /// Overall state (calm, steady, moderate_stress, high_anxiety)
        #[arg(long)]
        state: String,

        /// Risk level (low, medium, high, critical)
        #[arg(long, default_value = "low")]
        risk: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and record storage
    Doctor {
        /// Check a monitor configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a record database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Print the default monitor configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
    /// JSON array of snapshots
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (modality snapshot)
    Input,
    /// Output schema (synthesis result)
    Output,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WellnessCliError> {
    match cli.command {
        Commands::Synthesize {
            input,
            output,
            input_format,
            output_format,
            alerts_db,
            config,
        } => cmd_synthesize(
            &input,
            &output,
            input_format,
            output_format,
            alerts_db.as_deref(),
            config.as_deref(),
        ),

        Commands::Recommend { state, risk, json } => cmd_recommend(&state, &risk, json),

        Commands::Doctor { config, db, json } => cmd_doctor(config.as_deref(), db.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Config => {
            println!("{}", MonitorConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_synthesize(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    alerts_db: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), WellnessCliError> {
    let input_data = read_input(input)?;

    let snapshots = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => serde_json::from_str::<Vec<ModalitySnapshot>>(&input_data)?,
    };

    if snapshots.is_empty() {
        return Err(WellnessCliError::NoSnapshots);
    }

    let alert_reason = match config {
        Some(path) => MonitorConfig::from_file(path)?.alert_reason,
        None => DEFAULT_ALERT_REASON.to_string(),
    };
    let sink = alerts_db.map(SqliteSink::open).transpose()?;

    let results = synthesize_batch(
        &snapshots,
        sink.as_ref().map(|s| s as &dyn WellnessSink),
        &alert_reason,
    );
    debug!("Synthesized {} snapshots", results.len());

    let output_data = format_output(&results, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

/// Synthesize every snapshot, recording each one when a sink is given.
///
/// Record failures are logged and skipped; they never drop a result.
fn synthesize_batch(
    snapshots: &[ModalitySnapshot],
    sink: Option<&dyn WellnessSink>,
    alert_reason: &str,
) -> Vec<SynthesisResult> {
    snapshots
        .iter()
        .map(|snapshot| {
            let result = synthesize(snapshot);
            if let Some(sink) = sink {
                record_result(sink, snapshot, &result, alert_reason);
            }
            result
        })
        .collect()
}

fn record_result(
    sink: &dyn WellnessSink,
    snapshot: &ModalitySnapshot,
    result: &SynthesisResult,
    alert_reason: &str,
) {
    if result.risk_level.is_elevated() {
        info!("Recording {} risk alert", result.risk_level.as_str());
        let appended = serde_json::to_value(result)
            .map_err(ComputeError::from)
            .and_then(|metadata| sink.append_alert(result.risk_level, alert_reason, &metadata));
        if let Err(e) = appended {
            warn!("Failed to record alert: {e}");
        }
    }

    let payload = json!({ "modules": snapshot, "synthesis": result });
    if let Err(e) = sink.append_interaction("synthesize", &payload) {
        warn!("Failed to record interaction: {e}");
    }
}

fn cmd_recommend(state: &str, risk: &str, json: bool) -> Result<(), WellnessCliError> {
    let actions = recommend_for_labels(state, risk);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "state": state,
                "risk": risk,
                "actions": actions,
            }))?
        );
    } else {
        for action in &actions {
            println!("- {}", action);
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, db: Option<&Path>, json: bool) -> Result<(), WellnessCliError> {
    let mut checks = vec![DoctorCheck::new(
        "version",
        CheckStatus::Ok,
        format!("{PRODUCER_NAME} {VERSION}"),
    )];

    if let Some(path) = config {
        checks.push(match MonitorConfig::from_file(path) {
            Ok(config) => DoctorCheck::new(
                "config",
                CheckStatus::Ok,
                format!(
                    "screen interval {}s, sink timeout {}ms, {} harmful keywords",
                    config.screen_interval().as_secs(),
                    config.sink_timeout_ms,
                    config.harmful_keywords.len()
                ),
            ),
            Err(e) => DoctorCheck::new("config", CheckStatus::Error, e.to_string()),
        });
    }

    if let Some(path) = db {
        checks.push(check_database(path));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for check in &report.checks {
            println!("{:<5} {:<8} {}", check.status.label(), check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| c.status == CheckStatus::Error) {
        return Err(WellnessCliError::DoctorFailed);
    }
    Ok(())
}

fn check_database(path: &Path) -> DoctorCheck {
    let existed = path.exists();
    let counts = SqliteSink::open(path)
        .and_then(|sink| Ok((sink.interaction_count()?, sink.alert_count()?)));

    match counts {
        Ok(_) if !existed => DoctorCheck::new(
            "database",
            CheckStatus::Warning,
            format!("{} was created empty", path.display()),
        ),
        Ok((interactions, alerts)) => DoctorCheck::new(
            "database",
            CheckStatus::Ok,
            format!("{interactions} interactions, {alerts} alerts"),
        ),
        Err(e) => DoctorCheck::new("database", CheckStatus::Error, e.to_string()),
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), WellnessCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", input_json_schema());
            } else {
                println!("Input: modality snapshot (every field optional)");
                println!();
                println!("- text:   {{ label, score, mood, harmful_hits, insights, source }}");
                println!("  - label: POSITIVE | NEGATIVE | NEUTRAL | UNKNOWN");
                println!("- speech: {{ emotion, energy, pitch, tempo }}");
                println!("  - emotion: calm | excited | sad | anxious | waiting | unknown");
                println!("- face:   {{ dominant_emotion, confidence }}");
                println!("  - dominant_emotion: happy | neutral | sad | angry | fear | surprise | disgust | unknown");
                println!("- screen: {{ status, text, harmful_hits }}");
                println!("  - status: ok | error | timeout | initializing | unavailable | no_text | no_frame | throttled");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", output_json_schema());
            } else {
                println!("Output: synthesis result");
                println!();
                println!("- score: Wellness score (0-100, one decimal)");
                println!("- overall_state: calm | steady | moderate_stress | high_anxiety");
                println!("- risk_level: low | medium | high | critical");
                println!("- notes: Up to 4 observations");
                println!("- actions: Up to 3 recommended actions");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, WellnessCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("Reading snapshots from the terminal; finish with Ctrl-D or pipe a file in");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_ndjson(data: &str) -> Result<Vec<ModalitySnapshot>, WellnessCliError> {
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                WellnessCliError::ParseError(format!("Line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn format_output(
    results: &[SynthesisResult],
    format: &OutputFormat,
) -> Result<String, WellnessCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

fn input_json_schema() -> String {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "wellness.snapshot",
        "description": "Per-modality reports for one synthesis cycle",
        "type": "object",
        "properties": {
            "text": {
                "type": "object",
                "properties": {
                    "label": { "enum": ["POSITIVE", "NEGATIVE", "NEUTRAL", "UNKNOWN"] },
                    "score": { "type": "number", "minimum": 0, "maximum": 1 },
                    "mood": { "enum": ["sad", "stressed", "calm", "positive", "neutral"] },
                    "harmful_hits": { "type": "array", "items": { "type": "string" } },
                    "insights": { "type": "array", "items": { "type": "string" } },
                    "source": { "enum": ["direct", "screen_ocr", "default"] }
                }
            },
            "speech": {
                "type": "object",
                "properties": {
                    "emotion": { "enum": ["calm", "excited", "sad", "anxious", "waiting", "unknown"] },
                    "energy": { "type": "number" },
                    "pitch": { "type": "number" },
                    "tempo": { "type": "number" }
                }
            },
            "face": {
                "type": "object",
                "properties": {
                    "dominant_emotion": {
                        "enum": ["happy", "neutral", "sad", "angry", "fear", "surprise", "disgust", "unknown"]
                    },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                }
            },
            "screen": {
                "type": "object",
                "properties": {
                    "status": {
                        "enum": ["ok", "error", "timeout", "initializing", "unavailable", "no_text", "no_frame", "throttled"]
                    },
                    "text": { "type": "string" },
                    "harmful_hits": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
    .to_string()
}

fn output_json_schema() -> String {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "wellness.synthesis",
        "description": "Fused wellness assessment",
        "type": "object",
        "required": ["score", "overall_state", "risk_level", "notes", "actions"],
        "properties": {
            "score": { "type": "number", "minimum": 0, "maximum": 100 },
            "overall_state": { "enum": ["calm", "steady", "moderate_stress", "high_anxiety"] },
            "risk_level": { "enum": ["low", "medium", "high", "critical"] },
            "notes": { "type": "array", "items": { "type": "string" }, "maxItems": 4 },
            "actions": { "type": "array", "items": { "type": "string" }, "maxItems": 3 }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug, thiserror::Error)]
enum WellnessCliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("input held no snapshots")]
    NoSnapshots,
    #[error("doctor reported at least one failing check")]
    DoctorFailed,
    #[error("{0}")]
    ParseError(String),
}

impl WellnessCliError {
    fn code(&self) -> &'static str {
        match self {
            WellnessCliError::Io(_) => "IO_ERROR",
            WellnessCliError::Compute(ComputeError::Config(_)) => "CONFIG_ERROR",
            WellnessCliError::Compute(ComputeError::Storage(_)) => "STORAGE_ERROR",
            WellnessCliError::Compute(_) => "COMPUTE_ERROR",
            WellnessCliError::Json(_) => "JSON_ERROR",
            WellnessCliError::NoSnapshots => "NO_SNAPSHOTS",
            WellnessCliError::DoctorFailed => "DOCTOR_FAILED",
            WellnessCliError::ParseError(_) => "PARSE_ERROR",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            WellnessCliError::Io(_) => Some("Is the input path readable and the output path writable?"),
            WellnessCliError::Compute(ComputeError::Config(_)) => {
                Some("`wellness config` prints a configuration to start from")
            }
            WellnessCliError::Compute(ComputeError::Storage(_)) => {
                Some("`wellness doctor --db <path>` inspects the database")
            }
            WellnessCliError::Compute(_) => None,
            WellnessCliError::Json(_) | WellnessCliError::ParseError(_) => {
                Some("`wellness schema input` describes one snapshot")
            }
            WellnessCliError::NoSnapshots => Some("Supply at least one snapshot per run"),
            WellnessCliError::DoctorFailed => None,
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WellnessCliError> for CliError {
    fn from(e: WellnessCliError) -> Self {
        CliError {
            code: e.code().to_string(),
            message: e.to_string(),
            hint: e.hint().map(str::to_string),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, message: String) -> Self {
        Self {
            name,
            status,
            message,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    fn label(self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warning => "warn",
            CheckStatus::Error => "FAIL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use wellness_fusion::types::{RiskLevel, SentimentLabel, TextReport, TextSource};
    use wellness_fusion::MemorySink;

    struct ReadOnlySink;

    impl WellnessSink for ReadOnlySink {
        fn append_interaction(&self, _channel: &str, _payload: &Value) -> Result<(), ComputeError> {
            Err(ComputeError::Sink("attempt to write a readonly database".to_string()))
        }

        fn append_alert(
            &self,
            _level: RiskLevel,
            _reason: &str,
            _metadata: &Value,
        ) -> Result<(), ComputeError> {
            Err(ComputeError::Sink("attempt to write a readonly database".to_string()))
        }
    }

    fn negative_snapshot() -> ModalitySnapshot {
        ModalitySnapshot {
            text: Some(TextReport {
                label: SentimentLabel::Negative,
                score: 0.99,
                ..TextReport::neutral_placeholder(TextSource::Direct, "")
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_sink_failure_keeps_every_result() {
        let snapshots = vec![negative_snapshot(), ModalitySnapshot::default()];
        let results = synthesize_batch(&snapshots, Some(&ReadOnlySink), DEFAULT_ALERT_REASON);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], synthesize(&snapshots[0]));
        assert!(results[0].risk_level.is_elevated());
    }

    #[test]
    fn test_batch_records_alerts_and_interactions() {
        let sink = MemorySink::new();
        let snapshots = vec![negative_snapshot(), ModalitySnapshot::default()];
        synthesize_batch(&snapshots, Some(&sink), "flagged");

        assert_eq!(sink.interactions().len(), 2);
        let alerts = sink.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, "flagged");
    }

    #[test]
    fn test_cli_error_codes_and_hints() {
        let err = CliError::from(WellnessCliError::Compute(ComputeError::Config(
            "sink_timeout_ms must be positive".to_string(),
        )));
        assert_eq!(err.code, "CONFIG_ERROR");
        assert_eq!(
            err.message,
            "Invalid configuration: sink_timeout_ms must be positive"
        );
        assert!(err.hint.is_some());

        assert_eq!(CliError::from(WellnessCliError::DoctorFailed).hint, None);
    }
}
