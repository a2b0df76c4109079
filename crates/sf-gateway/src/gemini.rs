//! Gemini `generateContent` adapter.
//!
//! All pending entries go out in batched prompts; the reply is a JSON array
//! of `{index, text}` objects. HTTP 429 and 5xx are retried with exponential
//! backoff; any other failure is returned for every entry of the batch so the
//! pipeline can leave those entries unresolved and carry on.

use crate::prompt::{build_prompt, extract_replies};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sf_core::{GatewayConfig, GatewayError, ShortenRequest, Shortener, Shortening};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const BATCH_SIZE: usize = 40;
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiShortener {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
    max_retries: u32,
    backoff: Duration,
}

impl GeminiShortener {
    pub fn new(api_key: &str, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.trim().to_string(),
            model: config.model.clone(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries.max(1),
            backoff: Duration::from_secs(1),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Base delay for the first retry; doubled per attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait before retrying after failed `attempt` (1-based): doubles each
    /// time, capped at one minute.
    pub(crate) fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.checked_mul(factor).map_or(MAX_BACKOFF, |wait| wait.min(MAX_BACKOFF))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one prompt and return the concatenated text of the first candidate.
    pub async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let body = GenerateRequest {
            contents: vec![Content { role: Some("user".into()), parts: vec![Part { text: prompt.to_string() }] }],
            generation_config: GenerationConfig { temperature: 0.2, response_mime_type: "application/json".into() },
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        GatewayError::Timeout(self.timeout_secs)
                    } else {
                        GatewayError::Http(e.to_string())
                    }
                })?;

            let status = res.status();
            if status.is_success() {
                let parsed: GenerateResponse =
                    res.json().await.map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
                let text: String = parsed
                    .candidates
                    .into_iter()
                    .next()
                    .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
                    .unwrap_or_default();
                if text.is_empty() {
                    return Err(GatewayError::MalformedResponse("empty candidate".into()));
                }
                return Ok(text);
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if retryable && attempt < self.max_retries {
                let wait = self.backoff_for(attempt);
                warn!(status = status.as_u16(), attempt, wait_ms = wait.as_millis() as u64, "gemini request failed, retrying");
                tokio::time::sleep(wait).await;
                continue;
            }

            let detail = res.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => GatewayError::RateLimited { attempts: attempt },
                401 | 403 => GatewayError::Auth(format!("{}: {}", status, detail)),
                _ if status.is_server_error() => GatewayError::Unavailable(format!("{}: {}", status, detail)),
                _ => GatewayError::Http(format!("{}: {}", status, detail)),
            });
        }
    }

    async fn shorten_chunk(&self, requests: &[ShortenRequest]) -> Vec<(usize, Result<Shortening, GatewayError>)> {
        let prompt = build_prompt(requests);
        debug!(entries = requests.len(), prompt_chars = prompt.len(), "sending batch to gemini");

        let replies = match self.generate(&prompt).await.and_then(|raw| extract_replies(&raw)) {
            Ok(replies) => replies,
            Err(e) => {
                warn!(error = %e, entries = requests.len(), "gemini batch failed");
                return requests.iter().map(|r| (r.index, Err(e.clone()))).collect();
            }
        };

        let mut by_index: HashMap<usize, String> = replies.into_iter().map(|r| (r.index, r.text)).collect();
        requests
            .iter()
            .map(|req| {
                let outcome = match by_index.remove(&req.index) {
                    None => Err(GatewayError::MalformedResponse(format!("no reply for entry {}", req.index))),
                    Some(text) if text.trim().is_empty() || text.trim() == req.text.trim() => {
                        Ok(Shortening::NoSafeShortening)
                    }
                    Some(text) => Ok(Shortening::Shortened(text)),
                };
                (req.index, outcome)
            })
            .collect()
    }
}

#[async_trait]
impl Shortener for GeminiShortener {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn shorten(&self, request: &ShortenRequest) -> Result<Shortening, GatewayError> {
        self.shorten_chunk(std::slice::from_ref(request))
            .await
            .pop()
            .map(|(_, outcome)| outcome)
            .unwrap_or(Err(GatewayError::MalformedResponse("no reply".into())))
    }

    async fn shorten_batch(&self, requests: &[ShortenRequest]) -> Vec<(usize, Result<Shortening, GatewayError>)> {
        let mut out = Vec::with_capacity(requests.len());
        for chunk in requests.chunks(BATCH_SIZE) {
            out.extend(self.shorten_chunk(chunk).await);
        }
        let shortened = out.iter().filter(|(_, r)| matches!(r, Ok(Shortening::Shortened(_)))).count();
        info!(model = %self.model, requested = requests.len(), shortened, "gemini shortening done");
        out
    }
}
