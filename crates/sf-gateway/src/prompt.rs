//! Prompt construction and reply extraction for LLM-backed shortening.

use regex::Regex;
use serde::Deserialize;
use sf_core::{GatewayError, ShortenRequest};
use std::fmt::Write;
use std::sync::LazyLock;

static RE_JSON_ARRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

const PROMPT_CONTEXT_CHARS: usize = 50;

const INSTRUCTIONS: &str = "You edit subtitles for reading speed. Shorten each subtitle below so it fits \
its character budget while keeping what is said.

Rules:
1. Preserve the meaning and the speaker's intent.
2. Drop words that carry nothing (very, really, just, actually).
3. Prefer shorter synonyms and contractions.
4. Keep the phrasing natural for spoken dialogue.
5. Keep line breaks only where a new speaker starts.
6. Only end with \".\" when next_is_uppercase is true; otherwise leave the sentence open.
7. If no shortening keeps the meaning, return the text unchanged.
8. Answer with a JSON array only, one object per subtitle with \"index\" and \"text\".
";

fn excerpt(text: &str, placeholder: &str) -> String {
    if text.is_empty() {
        return placeholder.to_string();
    }
    let flat = text.replace('\n', " ");
    let mut out: String = flat.chars().take(PROMPT_CONTEXT_CHARS).collect();
    if flat.chars().count() > PROMPT_CONTEXT_CHARS {
        out.push_str("...");
    }
    out
}

/// One prompt covering every request in `requests`.
pub fn build_prompt(requests: &[ShortenRequest]) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\nSubtitles:\n");
    for req in requests {
        let chars = req.text.chars().filter(|c| *c != '\n').count();
        let _ = write!(
            prompt,
            "\n---\nIndex: {}\nText ({} chars, budget {}, remove at least {}): \"{}\"\nBefore: \"{}\"\nAfter: \"{}\"\nnext_is_uppercase: {}\n",
            req.index,
            chars,
            req.char_budget,
            req.chars_to_reduce,
            req.text,
            excerpt(&req.context_before, "(start)"),
            excerpt(&req.context_after, "(end)"),
            req.next_is_uppercase,
        );
    }
    prompt.push_str("---\n\nAnswer format: [{\"index\": 1, \"text\": \"shortened text\"}]\n");
    prompt
}

/// One `{index, text}` object from a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reply {
    pub index: usize,
    #[serde(alias = "shortened_text")]
    pub text: String,
}

/// Pull the JSON array out of a model reply. Models often wrap it in a
/// markdown fence or add a sentence before it.
pub fn extract_replies(raw: &str) -> Result<Vec<Reply>, GatewayError> {
    let array = RE_JSON_ARRAY
        .find(raw)
        .ok_or_else(|| GatewayError::MalformedResponse("no JSON array in reply".into()))?;
    serde_json::from_str(array.as_str()).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}
