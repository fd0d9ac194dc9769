use crate::models::RecoveryResult;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"));

/// Stage at which JSON recovery gave up, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    BoundaryExtraction,
    PrimaryParse,
    FlattenedParse,
    Serialization,
}

impl fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryStage::BoundaryExtraction => "boundary_extraction",
            RecoveryStage::PrimaryParse => "primary_parse",
            RecoveryStage::FlattenedParse => "flattened_parse",
            RecoveryStage::Serialization => "serialization",
        };
        f.write_str(name)
    }
}

/// Recover a single JSON object from free-form model output.
///
/// Stages run from least to most destructive: isolate the outermost `{...}`,
/// drop trailing commas, parse; if that fails, flatten raw line breaks and parse
/// again. Success yields pretty-printed JSON. Anything else hands back `raw`
/// untouched as a fallback.
pub fn recover_json(raw: &str) -> RecoveryResult {
    let Some(span) = extract_object_span(raw) else {
        tracing::warn!(
            stage = %RecoveryStage::BoundaryExtraction,
            sample = %super::log_sample(raw),
            "No JSON object boundaries in model output, returning raw text"
        );
        return RecoveryResult::Fallback(raw.to_string());
    };

    let cleaned = strip_trailing_commas(span);

    let primary_err = match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(value) => return pretty(raw, &value),
        Err(e) => e,
    };

    tracing::debug!(
        stage = %RecoveryStage::PrimaryParse,
        error = %primary_err,
        "Primary JSON parse failed, retrying with flattened line breaks"
    );

    let flattened = flatten_newlines(&cleaned);
    match serde_json::from_str::<serde_json::Value>(&flattened) {
        Ok(value) => pretty(raw, &value),
        Err(flattened_err) => {
            tracing::warn!(
                stage = %RecoveryStage::FlattenedParse,
                primary_error = %primary_err,
                flattened_error = %flattened_err,
                sample = %super::log_sample(raw),
                "JSON recovery exhausted, returning raw text"
            );
            RecoveryResult::Fallback(raw.to_string())
        }
    }
}

fn pretty(raw: &str, value: &serde_json::Value) -> RecoveryResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => RecoveryResult::Structured(json),
        Err(e) => {
            tracing::warn!(stage = %RecoveryStage::Serialization, error = %e, "Could not re-serialize recovered JSON");
            RecoveryResult::Fallback(raw.to_string())
        }
    }
}

/// Slice from the first `{` through the last `}` inclusive.
pub fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Remove commas that directly precede a closing `}` or `]`, ignoring whitespace.
pub fn strip_trailing_commas(json: &str) -> String {
    TRAILING_COMMA.replace_all(json, "$1").into_owned()
}

/// Replace every CR and LF with a single space.
pub fn flatten_newlines(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Drop control characters except tab, newline and carriage return.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .collect()
}
