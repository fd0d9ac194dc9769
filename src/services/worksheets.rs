use crate::models::{RecoveryResult, WorksheetCollection, WorksheetRecord};
use regex::Regex;
use std::sync::LazyLock;

/// Separator the prompt asks the model to put between grade blocks.
pub const WORKSHEET_DELIMITER: &str = "_!_!_!_";

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// Split a delimited response into per-grade worksheets, in order of appearance.
///
/// Each block is `<grade label>\n<content...>`. Blocks that are empty, have no
/// content line, or trim down to an empty label or body are skipped.
pub fn parse_worksheet_blocks(raw: &str, delimiter: &str) -> Vec<WorksheetRecord> {
    let mut records = Vec::new();

    for block in raw.split(delimiter) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let lines: Vec<&str> = block.lines().collect();
        if lines.len() < 2 {
            tracing::debug!(label = %lines[0].trim(), "Skipping worksheet block without content");
            continue;
        }

        let grade_level = lines[0].trim();
        let content = lines[1..].join("\n");
        let content = content.trim();

        if grade_level.is_empty() || content.is_empty() {
            continue;
        }

        records.push(WorksheetRecord {
            grade_level: grade_level.to_string(),
            worksheet_content: collapse_blank_lines(content),
        });
    }

    records
}

/// Collapse any run of three or more newlines down to one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    EXCESS_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}

/// Turn a worksheet response into the final envelope, or hand the raw text back
/// when no block could be recovered.
pub fn recover_worksheets(raw: &str, delimiter: &str) -> RecoveryResult {
    let records = parse_worksheet_blocks(raw, delimiter);
    if records.is_empty() {
        tracing::warn!(
            stage = "delimiter_blocks",
            sample = %super::log_sample(raw),
            "Could not parse any worksheet blocks from model output, returning raw text"
        );
        return RecoveryResult::Fallback(raw.to_string());
    }

    let collection = WorksheetCollection {
        differentiated_materials: records,
    };
    match serde_json::to_string_pretty(&collection) {
        Ok(json) => RecoveryResult::Structured(json),
        Err(e) => {
            tracing::warn!(stage = "serialization", error = %e, "Could not serialize worksheet envelope");
            RecoveryResult::Fallback(raw.to_string())
        }
    }
}
