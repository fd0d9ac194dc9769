use crate::error::{AppError, Result};
use crate::models::{
    ContentRequest, ExplainRequest, LessonPlanRequest, ModelPrompt, RecoveryResult,
    WorksheetRequest,
};
use crate::services::json_repair::{self, strip_control_chars};
use crate::services::llm::TextGenerator;
use crate::services::prompts;
use crate::services::worksheets::{self, WORKSHEET_DELIMITER};

/// Worksheets for each requested grade from a textbook page image.
pub async fn generate_worksheets(
    generator: &dyn TextGenerator,
    req: &WorksheetRequest,
) -> Result<RecoveryResult> {
    tracing::info!(grades = %req.grade_levels, mime = %req.mime_type, "Generating differentiated worksheets");
    let raw = generate_text(generator, &prompts::worksheet_prompt(req)).await?;
    Ok(worksheets::recover_worksheets(&raw, WORKSHEET_DELIMITER))
}

/// Weekly lesson plan, recovered into pretty JSON when the model cooperates.
pub async fn generate_lesson_plan(
    generator: &dyn TextGenerator,
    req: &LessonPlanRequest,
) -> Result<RecoveryResult> {
    tracing::info!(topic = %req.topic, grade = %req.grade_level, "Generating lesson plan");
    let raw = generate_text(generator, &prompts::lesson_plan_prompt(req)).await?;
    Ok(json_repair::recover_json(&raw))
}

pub async fn generate_content(generator: &dyn TextGenerator, req: &ContentRequest) -> Result<String> {
    let raw = generate_text(generator, &prompts::content_prompt(req)).await?;
    Ok(clean_plain_text(&raw))
}

pub async fn explain_concept(generator: &dyn TextGenerator, req: &ExplainRequest) -> Result<String> {
    let raw = generate_text(generator, &prompts::explain_prompt(req)).await?;
    Ok(clean_plain_text(&raw))
}

/// Call the model once. Only missing or zero-length text is fatal; anything
/// else, whitespace included, goes on to recovery.
async fn generate_text(generator: &dyn TextGenerator, prompt: &ModelPrompt) -> Result<String> {
    let output = generator.generate(prompt).await.map_err(AppError::Model)?;
    match output.text {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(AppError::GenerationEmpty),
    }
}

/// Tidy free-text output for display: drop a wrapping code fence, control
/// characters and excess blank lines.
pub fn clean_plain_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = strip_code_fence(trimmed).unwrap_or(trimmed);
    let cleaned = strip_control_chars(unfenced).replace("\r\n", "\n");
    worksheets::collapse_blank_lines(&cleaned).trim().to_string()
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let body = rest.strip_suffix("```")?;
    // Skip the info string (```markdown) on the opening line.
    let (_, body) = body.split_once('\n')?;
    Some(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ModelOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned generator that records the prompts it was given.
    pub(crate) struct StubGenerator {
        reply: Option<String>,
        fail: bool,
        pub prompts: Mutex<Vec<ModelPrompt>>,
    }

    impl StubGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                fail: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn silent() -> Self {
            Self {
                reply: None,
                fail: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                fail: true,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &ModelPrompt) -> anyhow::Result<ModelOutput> {
            self.prompts.lock().unwrap().push(prompt.clone());
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(ModelOutput {
                text: self.reply.clone(),
            })
        }
    }

    fn worksheet_request() -> WorksheetRequest {
        WorksheetRequest {
            textbook_page_image: "aW1hZ2U=".into(),
            mime_type: "image/jpeg".into(),
            grade_levels: "9, 10".into(),
            language: "English".into(),
        }
    }

    fn lesson_request() -> LessonPlanRequest {
        LessonPlanRequest {
            topic: "Photosynthesis".into(),
            grade_level: "7".into(),
            language: "English".into(),
        }
    }

    #[tokio::test]
    async fn worksheets_structured_on_delimited_reply() {
        let stub = StubGenerator::replying("9\nContent for nine\n_!_!_!_\n10\nContent for ten");
        let result = generate_worksheets(&stub, &worksheet_request()).await.unwrap();
        assert!(result.is_structured());
        assert!(result.as_str().contains("\"differentiatedMaterials\""));

        let prompts = stub.prompts.lock().unwrap();
        assert_eq!(prompts[0].images, vec!["aW1hZ2U=".to_string()]);
    }

    #[tokio::test]
    async fn worksheets_fall_back_when_every_block_is_degenerate() {
        let raw = "9\n_!_!_!_\n10";
        let stub = StubGenerator::replying(raw);
        let result = generate_worksheets(&stub, &worksheet_request()).await.unwrap();
        assert_eq!(result, RecoveryResult::Fallback(raw.to_string()));
    }

    #[tokio::test]
    async fn lesson_plan_recovers_json_from_prose() {
        let stub = StubGenerator::replying("Here you go:\n{\"title\": \"Leaves\", \"materials\": [\"Leaf\",],}\n");
        let result = generate_lesson_plan(&stub, &lesson_request()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(result.as_str()).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Leaves", "materials": ["Leaf"]}));
    }

    #[tokio::test]
    async fn lesson_plan_falls_back_to_raw_prose() {
        let raw = "Monday: plant seeds. Tuesday: water them.";
        let stub = StubGenerator::replying(raw);
        let result = generate_lesson_plan(&stub, &lesson_request()).await.unwrap();
        assert_eq!(result, RecoveryResult::Fallback(raw.to_string()));
    }

    #[tokio::test]
    async fn empty_reply_is_fatal_for_both_pipelines() {
        for stub in [StubGenerator::silent(), StubGenerator::replying("")] {
            assert!(matches!(
                generate_worksheets(&stub, &worksheet_request()).await,
                Err(AppError::GenerationEmpty)
            ));
            assert!(matches!(
                generate_lesson_plan(&stub, &lesson_request()).await,
                Err(AppError::GenerationEmpty)
            ));
        }
    }

    #[tokio::test]
    async fn whitespace_only_reply_degrades_to_fallback() {
        let raw = "  \n\t ";
        let stub = StubGenerator::replying(raw);
        assert_eq!(
            generate_worksheets(&stub, &worksheet_request()).await.unwrap(),
            RecoveryResult::Fallback(raw.to_string())
        );
        assert_eq!(
            generate_lesson_plan(&stub, &lesson_request()).await.unwrap(),
            RecoveryResult::Fallback(raw.to_string())
        );
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_model_error() {
        let stub = StubGenerator::failing();
        assert!(matches!(
            generate_lesson_plan(&stub, &lesson_request()).await,
            Err(AppError::Model(_))
        ));
    }

    #[tokio::test]
    async fn explain_returns_cleaned_text() {
        let stub = StubGenerator::replying("```markdown\nPlants eat light.\n\n\n\nLike solar panels.\n```");
        let req = ExplainRequest {
            question: "How do plants eat?".into(),
            language: "English".into(),
        };
        let text = explain_concept(&stub, &req).await.unwrap();
        assert_eq!(text, "Plants eat light.\n\nLike solar panels.");
    }

    #[tokio::test]
    async fn content_empty_reply_is_fatal() {
        let req = ContentRequest {
            request: "A story about monsoon farming".into(),
            language: "Marathi".into(),
        };
        assert!(matches!(
            generate_content(&StubGenerator::silent(), &req).await,
            Err(AppError::GenerationEmpty)
        ));
    }

    #[test]
    fn clean_plain_text_leaves_unfenced_text() {
        assert_eq!(clean_plain_text("  A\r\nB\u{0}  "), "A\nB");
        assert_eq!(clean_plain_text("```not closed"), "```not closed");
    }
}
