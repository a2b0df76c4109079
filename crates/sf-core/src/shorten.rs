//! Contract for the external text-shortening oracle.
//!
//! The optimizer only sees [`Shortener`]; whether a reply comes from an API
//! call or from a manifest edited by hand is the adapter's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An entry the local strategies could not bring under target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub index: usize,
    pub text: String,
    pub current_cps: f64,
    /// Characters the reply may hold, line breaks included. A reply within
    /// it still fits after surplus lines are joined with spaces.
    pub char_budget: usize,
    pub target_cps: f64,
    pub chars_to_reduce: usize,
    #[serde(default)]
    pub context_before: String,
    #[serde(default)]
    pub context_after: String,
    /// Whether the following entry opens with an uppercase letter; decides
    /// if the shortened text may end with a period.
    #[serde(default = "default_true")]
    pub next_is_uppercase: bool,
}

fn default_true() -> bool {
    true
}

/// Oracle reply for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortening {
    Shortened(String),
    /// No answer yet; the request has been exported for a later round-trip.
    Deferred,
    /// The oracle found no shortening that keeps the meaning.
    NoSafeShortening,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Shortener: Send + Sync {
    /// Adapter name for logs.
    fn name(&self) -> &str;

    async fn shorten(&self, request: &ShortenRequest) -> Result<Shortening, GatewayError>;

    /// Shorten many entries. Results are keyed by entry index; adapters that
    /// can answer in one round-trip override this.
    async fn shorten_batch(
        &self,
        requests: &[ShortenRequest],
    ) -> Vec<(usize, Result<Shortening, GatewayError>)> {
        let mut out = Vec::with_capacity(requests.len());
        for req in requests {
            out.push((req.index, self.shorten(req).await));
        }
        out
    }
}
