use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, error};

use crate::models::Layout;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no generation credential configured")]
    Config,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Schema(String),
}

/// Remote text generation behind one seam. Both profiles take the prompt pair
/// and return the raw response text; parsing it as a deck is the validator's
/// job, not the client's.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerateError>;
    fn profile(&self) -> &'static str;
}

/// Pick the backend profile once at startup from whichever credential is
/// configured. `GROQ_API_KEY` selects the chat-completion profile,
/// `GEMINI_API_KEY` the schema-constrained one. Neither present means no
/// client; callers degrade to the configuration-error slide.
pub fn from_env() -> Option<Arc<dyn TextGenerator>> {
    if let Ok(key) = std::env::var("GROQ_API_KEY") {
        if !key.is_empty() {
            return Some(Arc::new(GroqClient::new(key)));
        }
    }
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return Some(Arc::new(GeminiClient::new(key)));
        }
    }
    None
}

// --- Chat-completion profile (Groq-hosted, OpenAI-compatible) ---

const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("GROQ_API_BASE")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());
        Self { client: Client::new(), api_key, base_url }
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerateError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = json!({
            "model": GROQ_MODEL,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "response_format": {"type": "json_object"},
            "temperature": 0.7
        });

        info!("📤 chat-completion request to {} ({} prompt chars)", url, system.len() + user.len());

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("❌ chat-completion API error: status={} body={}", status, body);
            return Err(GenerateError::Transport(format!("status={status} body={body}")));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Schema(format!("envelope parse error: {e}")))?;
        let text = chat_completion_text(&parsed)?;
        info!("📥 chat-completion response ({} chars)", text.len());
        Ok(text)
    }

    fn profile(&self) -> &'static str { "chat-completion" }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn chat_completion_text(resp: &ChatCompletionResponse) -> Result<String, GenerateError> {
    resp.choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GenerateError::Schema("no message content in response".into()))
}

// --- Schema-constrained profile (Gemini generateContent) ---

const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());
        Self { client: Client::new(), api_key, base_url }
    }
}

/// Response schema declared to the Gemini API: the `slides` object shape,
/// with the layout field enumerated so the model cannot stray from the tags.
pub fn slides_response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "STRING"},
                        "content": {"type": "STRING"},
                        "bulletPoints": {"type": "ARRAY", "items": {"type": "STRING"}},
                        "layout": {"type": "STRING", "enum": Layout::RECOGNIZED},
                        "imagePrompt": {"type": "STRING"}
                    },
                    "required": ["title", "content", "bulletPoints", "layout"]
                }
            }
        },
        "required": ["slides"]
    })
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerateError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        info!("📤 schema-constrained request to {}", url.replace(&self.api_key, "***"));

        let request_body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": [{"parts": [{"text": user}]}],
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "responseMimeType": "application/json",
                "responseSchema": slides_response_schema()
            }
        });

        let response = self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("❌ generateContent API error: status={} body={}", status, body);
            return Err(GenerateError::Transport(format!("status={status} body={body}")));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Schema(format!("envelope parse error: {e}")))?;
        let text = gemini_text(&parsed)?;
        info!("📥 schema-constrained response ({} chars)", text.len());
        Ok(text)
    }

    fn profile(&self) -> &'static str { "schema-constrained" }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn gemini_text(resp: &GeminiResponse) -> Result<String, GenerateError> {
    for candidate in &resp.candidates {
        for part in &candidate.content.parts {
            if let Part::Text { text } = part {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }
    }
    Err(GenerateError::Schema("no text content in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chat_completion_envelope_extracts_content() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  {\"slides\":[]} "}}]}"#,
        )
        .unwrap();
        assert_eq!(chat_completion_text(&resp).unwrap(), r#"{"slides":[]}"#);
    }

    #[test]
    fn chat_completion_empty_content_is_schema_error() {
        let resp: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
        assert!(matches!(
            chat_completion_text(&resp),
            Err(GenerateError::Schema(_))
        ));
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(chat_completion_text(&empty).is_err());
    }

    #[test]
    fn gemini_envelope_extracts_first_text_part() {
        let resp: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"x"}},{"text":"deck json"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(gemini_text(&resp).unwrap(), "deck json");
    }

    #[test]
    fn gemini_envelope_without_text_is_schema_error() {
        let resp: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(gemini_text(&resp), Err(GenerateError::Schema(_))));
    }

    #[test]
    fn response_schema_declares_slides_shape() {
        let schema = slides_response_schema();
        assert_eq!(schema["required"][0], "slides");
        let slide = &schema["properties"]["slides"]["items"];
        assert_eq!(slide["required"].as_array().unwrap().len(), 4);
        let layouts = slide["properties"]["layout"]["enum"].as_array().unwrap();
        assert_eq!(layouts.len(), Layout::RECOGNIZED.len());
    }
}
