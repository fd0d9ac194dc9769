pub mod generation;
pub mod json_repair;
pub mod llm;
pub mod prompts;
pub mod worksheets;

const LOG_SAMPLE_CHARS: usize = 200;

/// First few hundred characters of model output, for diagnostics.
pub(crate) fn log_sample(text: &str) -> String {
    match text.char_indices().nth(LOG_SAMPLE_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
