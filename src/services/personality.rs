//! Big Five personality analysis backed by an LLM.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::models::chat_entry::BigFiveScores;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed analysis: {0}")]
    Malformed(String),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait PersonalityAnalyzer: Send + Sync {
    async fn analyze(&self, conversation: &str) -> Result<BigFiveScores, AnalyzerError>;
}

/// Runs the analyzer under `limit`.
pub async fn analyze_with_timeout(
    analyzer: &dyn PersonalityAnalyzer,
    conversation: &str,
    limit: Duration,
) -> Result<BigFiveScores, AnalyzerError> {
    tokio::time::timeout(limit, analyzer.analyze(conversation))
        .await
        .map_err(|_| AnalyzerError::Timeout(limit))?
}

pub struct OpenAiAnalyzer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl PersonalityAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, conversation: &str) -> Result<BigFiveScores, AnalyzerError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a psychologist who scores personality traits from text.",
                },
                {
                    "role": "user",
                    "content": build_prompt(conversation),
                },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api(format!("OpenAI error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AnalyzerError::Malformed("response has no message content".into()))?;

        parse_scores(content)
    }
}

fn build_prompt(conversation: &str) -> String {
    format!(
        r#"Score the speaker in the conversation below on each Big Five trait from 0.0 to 1.0.

Conversation:
{}

Respond with JSON only, using this exact schema:
{{
  "openness": 0.85,
  "conscientiousness": 0.65,
  "extraversion": 0.40,
  "agreeableness": 0.70,
  "neuroticism": 0.45
}}"#,
        conversation
    )
}

/// Extracts the score object from a model reply, tolerating prose or code
/// fences around it.
pub fn parse_scores(content: &str) -> Result<BigFiveScores, AnalyzerError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let raw = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => return Err(AnalyzerError::Malformed("no JSON object in reply".into())),
    };

    let scores: BigFiveScores =
        serde_json::from_str(raw).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

    if !scores.is_in_range() {
        return Err(AnalyzerError::Malformed("scores must be between 0.0 and 1.0".into()));
    }
    Ok(scores)
}
