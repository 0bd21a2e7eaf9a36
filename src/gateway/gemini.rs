use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{classify_upstream, TextGenerator, TextRequest};
use crate::config::GeminiConfig;
use crate::error::GenerationError;

/// `generateContent` client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn request_body(req: &TextRequest) -> Value {
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": req.prompt }] }],
    });
    if let Some(obj) = body.as_object_mut() {
        if let Some(system) = &req.system_instruction {
            obj.insert(
                "systemInstruction".to_owned(),
                json!({ "parts": [{ "text": system }] }),
            );
        }
        if req.json {
            obj.insert(
                "generationConfig".to_owned(),
                json!({ "responseMimeType": "application/json" }),
            );
        }
    }
    body
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

/// Concatenates the text parts of the first candidate.
fn extract_text(value: &Value) -> Result<String, GenerationError> {
    let parts = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::Malformed("Empty response from AI service".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, req: TextRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::Unconfigured)?;
        let endpoint = self.endpoint();

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request_body(&req))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Upstream(format!(
                        "AI service did not respond within {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    classify_upstream(&format!("POST {endpoint}: {e}"))
                }
            })?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| GenerationError::Upstream(format!("read AI response body: {e}")))?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            tracing::warn!(%status, %message, "AI service returned an error");
            return Err(classify_upstream(&format!("Gemini API error ({status}): {message}")));
        }

        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            GenerationError::Malformed(format!("AI service envelope is not JSON: {e}"))
        })?;
        extract_text(&value)
    }
}
