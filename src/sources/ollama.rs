use crate::sources::AdvisoryModel;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f64 = 0.2;

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

/// `POST /api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Non-streaming generate response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama client for the advisory model.
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
    temperature: f64,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("WhaleRadar/1.0")
            .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
impl AdvisoryModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("advisory service returned {}", response.status()));
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}
