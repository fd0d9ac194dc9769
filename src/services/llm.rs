use crate::config::LlmConfig;
use crate::models::{ModelOutput, ModelPrompt};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Anything that can turn a prompt into text. The recovery pipelines only ever
/// see the returned text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &ModelPrompt) -> Result<ModelOutput>;
}

/// Client for an Ollama-style `/api/generate` endpoint.
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl LLMClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building HTTP client")?;

        Ok(LLMClient {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request_body(&self, prompt: &ModelPrompt) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt.text,
            "stream": false,
            "options": {
                "temperature": self.temperature
            }
        });
        if !prompt.images.is_empty() {
            body["images"] = json!(prompt.images);
        }
        body
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, prompt: &ModelPrompt) -> Result<ModelOutput> {
        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt));

        if let Some(key) = &self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        tracing::debug!(model = %self.model, images = prompt.images.len(), "Sending generation request");

        let response = request_builder
            .send()
            .await
            .context("sending generation request")?
            .error_for_status()
            .context("model backend returned an error status")?;

        let response_text = response.text().await.context("reading model response")?;

        // Some backends answer with plain text instead of the JSON envelope.
        let text = match serde_json::from_str::<GenerateResponse>(&response_text) {
            Ok(parsed) => parsed.response,
            Err(_) => Some(response_text),
        };

        Ok(ModelOutput { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> LLMClient {
        let config = LlmConfig {
            api_key: api_key.map(str::to_string),
            model: "llava".into(),
            temperature: 0.2,
            ..LlmConfig::default()
        };
        LLMClient::new(&config).unwrap()
    }

    #[test]
    fn body_without_images_omits_field() {
        let body = client(None).request_body(&ModelPrompt::text("hello"));
        assert_eq!(body["model"], "llava");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        assert!(body.get("images").is_none());
    }

    #[test]
    fn body_includes_images() {
        let prompt = ModelPrompt {
            text: "describe".into(),
            images: vec!["aGVsbG8=".into()],
        };
        let body = client(Some("k")).request_body(&prompt);
        assert_eq!(body["images"][0], "aGVsbG8=");
    }

    #[test]
    fn generate_response_tolerates_missing_field() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parsed.response.is_none());
    }
}
