//! Shortening gateway adapters for subfit.
//!
//! Two implementations of [`sf_core::Shortener`]:
//! - [`ManifestGateway`]: replies read back from a JSON manifest edited offline
//! - [`GeminiShortener`]: direct calls to the Gemini `generateContent` API

pub mod gemini;
pub mod manifest;
pub mod prompt;

pub use gemini::GeminiShortener;
pub use manifest::{load_manifest, parse_manifest, to_manifest_json, write_manifest, ManifestGateway, ManifestItem};
pub use prompt::{build_prompt, extract_replies, Reply};
