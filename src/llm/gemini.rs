//! Gemini 生成后端

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::Generator;
use crate::config::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::models::message::{Message, Sender};

/// Gemini generateContent 客户端
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
    api_key: String,
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    /// 创建客户端
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn request_body(&self, directive: &str, message: &str, history: &[Message]) -> serde_json::Value {
        let mut contents = Vec::new();
        for msg in history {
            let role = match msg.sender {
                Sender::Agent => "model",
                _ => "user",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": msg.text }],
            }));
        }
        contents.push(json!({
            "role": "user",
            "parts": [{ "text": message }],
        }));

        json!({
            "system_instruction": { "parts": [{ "text": directive }] },
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            },
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(
        &self,
        directive: &str,
        message: &str,
        history: &[Message],
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model_name, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(directive, message, history))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "generation request failed: {status}: {body}"
            )));
        }

        let decoded: GenerateResponse = response.json().await?;
        let text = decoded
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::Generation("empty generation response".to_string()))?;

        Ok(text)
    }
}
