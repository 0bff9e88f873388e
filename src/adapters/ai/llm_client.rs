//! LLM client - chat-completions implementation of the AI ports.
//!
//! Speaks the OpenAI-compatible `/chat/completions` shape. Field extraction
//! asks the model for a strict JSON object and parses it; reply generation
//! is a plain completion over a persona prompt. Both stay fully behind the
//! ports, so the rest of the crate never sees provider shapes.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::chat::{ExtractedField, ExtractedFields};
use crate::ports::{
    AiError, FieldExtraction, GeneratedReply, GenerativeResponder, ResponderRequest,
};

const EXTRACTION_PROMPT: &str = "Extract customer details from the message. Reply with \
only a JSON object of the shape {\"name\": {\"value\": string, \"confidence\": number} | null, \
\"phone\": ..., \"location\": ..., \"problem\": ...}. Confidences are 0.0 to 1.0. Use null \
for anything not present. The customer writes in Indian English; phone numbers are Indian \
mobiles.";

/// Configuration for the LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Persona paragraph prepended to reply-generation prompts.
    pub persona: String,
}

impl LlmConfig {
    /// Creates a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(15),
            persona: "You are the friendly support assistant of a local home-appliance \
                      repair shop in Kerala. Answer briefly and helpfully."
                .to_string(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the persona paragraph.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Chat-completions client implementing both AI ports.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Creates the client.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the HTTP client cannot be constructed
    pub fn new(config: LlmConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::InvalidRequest(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, AiError> {
        let request = WireRequest {
            model: self.config.model.clone(),
            messages,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    AiError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AiError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(AiError::unavailable(format!("status {}", status)));
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| AiError::parse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AiError::parse("response carried no choices"))
    }
}

#[async_trait]
impl FieldExtraction for LlmClient {
    async fn extract_fields(&self, text: &str) -> Result<ExtractedFields, AiError> {
        let messages = vec![
            WireMessage::system(EXTRACTION_PROMPT),
            WireMessage::user(text),
        ];
        let content = self.complete(messages).await?;

        // Models occasionally wrap JSON in a code fence.
        let json = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        let wire: WireExtraction =
            serde_json::from_str(json).map_err(|e| AiError::parse(e.to_string()))?;
        Ok(wire.into())
    }
}

#[async_trait]
impl GenerativeResponder for LlmClient {
    async fn respond(&self, request: &ResponderRequest) -> Result<GeneratedReply, AiError> {
        let mut system = self.config.persona.clone();
        system.push_str(&format!(
            "\nThe current message was classified as \"{}\".",
            request.category.name()
        ));
        if !request.history.is_empty() {
            system.push_str("\nRecent conversation:\n");
            system.push_str(&request.history.join("\n"));
        }

        let messages = vec![
            WireMessage::system(system),
            WireMessage::user(&request.message),
        ];
        let content = self.complete(messages).await?;
        Ok(GeneratedReply::text(content.trim()))
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl WireMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireExtraction {
    name: Option<WireField>,
    phone: Option<WireField>,
    location: Option<WireField>,
    problem: Option<WireField>,
}

#[derive(Debug, Deserialize)]
struct WireField {
    value: String,
    confidence: f32,
}

impl From<WireExtraction> for ExtractedFields {
    fn from(wire: WireExtraction) -> Self {
        let field = |f: Option<WireField>| {
            f.filter(|f| !f.value.trim().is_empty())
                .map(|f| ExtractedField::new(f.value, f.confidence.clamp(0.0, 1.0)))
        };
        ExtractedFields {
            name: field(wire.name),
            phone: field(wire.phone),
            location: field(wire.location),
            problem: field(wire.problem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_extraction_parses_model_output() {
        let json = r#"{
            "name": {"value": "Ravi", "confidence": 0.9},
            "phone": null,
            "location": {"value": "Thiruvalla", "confidence": 0.8},
            "problem": null
        }"#;
        let wire: WireExtraction = serde_json::from_str(json).unwrap();
        let fields: ExtractedFields = wire.into();

        assert_eq!(fields.name.as_ref().unwrap().value, "Ravi");
        assert!(fields.phone.is_none());
        assert_eq!(fields.location.as_ref().unwrap().value, "Thiruvalla");
    }

    #[test]
    fn empty_values_are_dropped() {
        let json = r#"{"name": {"value": "  ", "confidence": 0.9},
                       "phone": null, "location": null, "problem": null}"#;
        let wire: WireExtraction = serde_json::from_str(json).unwrap();
        let fields: ExtractedFields = wire.into();
        assert!(fields.is_empty());
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let json = r#"{"name": {"value": "Ravi", "confidence": 1.7},
                       "phone": null, "location": null, "problem": null}"#;
        let wire: WireExtraction = serde_json::from_str(json).unwrap();
        let fields: ExtractedFields = wire.into();
        assert_eq!(fields.name.unwrap().confidence, 1.0);
    }
}
