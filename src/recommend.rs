//! Action recommendation
//!
//! Maps an overall state and risk level to a short, ordered list of
//! suggestions. Elevated risk always wins over the state table.

use crate::types::{OverallState, RiskLevel};

/// Maximum number of actions returned
pub const MAX_ACTIONS: usize = 3;

const ELEVATED_RISK_ACTIONS: [&str; 3] = [
    "Take a moment to breathe deeply - 4 seconds in, 4 seconds out.",
    "Step away from the screen and do a quick physical stretch.",
    "Consider reaching out to a trusted friend or support resource.",
];

const HIGH_ANXIETY_ACTIONS: [&str; 3] = [
    "Try the 4-7-8 breathing technique: breathe in 4, hold 7, out 8.",
    "Take a short walk or move your body for 2-3 minutes.",
    "Focus on 5 things you can see, 4 you can touch, 3 you can hear.",
];

const MODERATE_STRESS_ACTIONS: [&str; 3] = [
    "Take a 2-minute break: stretch, hydrate, or step outside.",
    "Write down 3 things you're grateful for right now.",
    "Switch to a lighter task or listen to calming music.",
];

const STEADY_ACTIONS: [&str; 2] = [
    "Keep doing what works and acknowledge your current state.",
    "Take a moment to appreciate your self-awareness.",
];

const CALM_ACTIONS: [&str; 2] = [
    "Acknowledge this moment of calm.",
    "Note what helped you feel this way today.",
];

const GENERIC_ACTION: &str = "Take 3 deep breaths and check in with yourself.";

/// Recommend actions for a state and risk level
pub fn recommend(state: OverallState, risk: RiskLevel) -> Vec<String> {
    if risk.is_elevated() {
        return to_owned(&ELEVATED_RISK_ACTIONS);
    }
    to_owned(state_actions(state))
}

/// Recommend actions from string labels, as supplied by JSON or CLI callers.
///
/// An unrecognized state falls back to a single generic action; an
/// unrecognized risk is treated as low.
pub fn recommend_for_labels(state: &str, risk: &str) -> Vec<String> {
    let risk = RiskLevel::from_label(risk).unwrap_or(RiskLevel::Low);
    if risk.is_elevated() {
        return to_owned(&ELEVATED_RISK_ACTIONS);
    }
    match OverallState::from_label(state) {
        Some(state) => to_owned(state_actions(state)),
        None => vec![GENERIC_ACTION.to_string()],
    }
}

fn state_actions(state: OverallState) -> &'static [&'static str] {
    match state {
        OverallState::HighAnxiety => &HIGH_ANXIETY_ACTIONS,
        OverallState::ModerateStress => &MODERATE_STRESS_ACTIONS,
        OverallState::Steady => &STEADY_ACTIONS,
        OverallState::Calm => &CALM_ACTIONS,
    }
}

fn to_owned(actions: &[&str]) -> Vec<String> {
    actions
        .iter()
        .take(MAX_ACTIONS)
        .map(|a| a.to_string())
        .collect()
}
