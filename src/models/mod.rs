pub mod lesson_plan;

use serde::{Deserialize, Serialize};

pub use lesson_plan::LessonPlan;

/// One grade's worksheet, as recovered from a delimited model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRecord {
    pub grade_level: String,
    pub worksheet_content: String,
}

/// Envelope handed to the caller when at least one worksheet survived parsing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetCollection {
    pub differentiated_materials: Vec<WorksheetRecord>,
}

/// Outcome of a recovery pipeline. `Structured` carries validated, pretty-printed
/// JSON; `Fallback` carries the model's text exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum RecoveryResult {
    Structured(String),
    Fallback(String),
}

impl RecoveryResult {
    pub fn is_structured(&self) -> bool {
        matches!(self, RecoveryResult::Structured(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecoveryResult::Structured(body) | RecoveryResult::Fallback(body) => body,
        }
    }
}

/// What gets sent to the model: prompt text plus optional base64 images.
#[derive(Debug, Clone, Default)]
pub struct ModelPrompt {
    pub text: String,
    pub images: Vec<String>,
}

impl ModelPrompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }
}

/// Raw model reply. `text` is `None` when the backend returned nothing usable.
#[derive(Debug, Clone, Default)]
pub struct ModelOutput {
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorksheetRequest {
    /// Base64-encoded textbook page.
    pub textbook_page_image: String,
    /// Only logged: Ollama's `images` field takes bare base64 with no media type.
    pub mime_type: String,
    pub grade_levels: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanRequest {
    pub topic: String,
    pub grade_level: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    pub request: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    pub question: String,
    #[serde(default)]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_result_serializes_with_kind_tag() {
        let structured = serde_json::to_value(RecoveryResult::Structured("{}".into())).unwrap();
        assert_eq!(structured["kind"], "structured");
        assert_eq!(structured["body"], "{}");

        let fallback = serde_json::to_value(RecoveryResult::Fallback("raw".into())).unwrap();
        assert_eq!(fallback["kind"], "fallback");
        assert_eq!(fallback["body"], "raw");
    }

    #[test]
    fn worksheet_record_uses_camel_case_keys() {
        let record = WorksheetRecord {
            grade_level: "4".into(),
            worksheet_content: "Count the apples.".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["gradeLevel"], "4");
        assert_eq!(value["worksheetContent"], "Count the apples.");
    }

    #[test]
    fn lesson_plan_request_defaults_language() {
        let req: LessonPlanRequest =
            serde_json::from_str(r#"{"topic":"Plants","gradeLevel":"3"}"#).unwrap();
        assert_eq!(req.grade_level, "3");
        assert!(req.language.is_empty());
    }
}
