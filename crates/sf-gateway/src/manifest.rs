//! Manual round-trip: export unresolved entries to a JSON manifest, let a
//! person or an external tool fill in `shortened_text`, read it back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sf_core::{Entry, GatewayError, Result, ShortenRequest, Shortener, Shortening, SubFitError};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// One manifest record. Only `index` and `shortened_text` are needed on
/// import; the rest is there to help whoever edits the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub index: usize,
    #[serde(default, alias = "original_text")]
    pub text: String,
    #[serde(default)]
    pub current_cps: f64,
    #[serde(default)]
    pub char_budget: usize,
    #[serde(default)]
    pub target_cps: f64,
    #[serde(default)]
    pub chars_to_reduce: usize,
    #[serde(default)]
    pub context_before: String,
    #[serde(default)]
    pub context_after: String,
    #[serde(default = "default_true")]
    pub next_is_uppercase: bool,
    #[serde(default)]
    pub shortened_text: Option<String>,
}

fn default_true() -> bool {
    true
}

impl From<&ShortenRequest> for ManifestItem {
    fn from(req: &ShortenRequest) -> Self {
        Self {
            index: req.index,
            text: req.text.clone(),
            current_cps: (req.current_cps * 100.0).round() / 100.0,
            char_budget: req.char_budget,
            target_cps: req.target_cps,
            chars_to_reduce: req.chars_to_reduce,
            context_before: req.context_before.clone(),
            context_after: req.context_after.clone(),
            next_is_uppercase: req.next_is_uppercase,
            shortened_text: None,
        }
    }
}

pub fn to_manifest_json(requests: &[ShortenRequest]) -> Result<String> {
    let items: Vec<ManifestItem> = requests.iter().map(ManifestItem::from).collect();
    Ok(serde_json::to_string_pretty(&items)?)
}

pub fn write_manifest(path: &Path, requests: &[ShortenRequest]) -> Result<()> {
    let json = to_manifest_json(requests)?;
    std::fs::write(path, json + "\n")?;
    tracing::info!(path = %path.display(), entries = requests.len(), "wrote shortening manifest");
    Ok(())
}

/// Parse a manifest. Anything that is not an array of items is a mismatch,
/// not a crash.
pub fn parse_manifest(content: &str) -> Result<Vec<ManifestItem>> {
    serde_json::from_str(content).map_err(|e| SubFitError::ManifestMismatch(format!("unreadable manifest: {}", e)))
}

pub fn load_manifest(path: &Path) -> Result<Vec<ManifestItem>> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

/// Serves replies from a filled-in manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestGateway {
    replies: HashMap<usize, String>,
    listed: BTreeSet<usize>,
}

impl ManifestGateway {
    /// Items whose `shortened_text` is `null` carry no reply but their index
    /// is still checked by [`ManifestGateway::validate`]. A blank reply or a
    /// repeated index is rejected.
    pub fn from_items(items: &[ManifestItem]) -> Result<Self> {
        let mut replies = HashMap::new();
        let mut listed = BTreeSet::new();
        for item in items {
            if !listed.insert(item.index) {
                return Err(SubFitError::ManifestMismatch(format!("entry {} listed twice", item.index)));
            }
            let Some(text) = &item.shortened_text else { continue };
            if text.trim().is_empty() {
                return Err(SubFitError::ManifestMismatch(format!("entry {} has blank shortened_text", item.index)));
            }
            replies.insert(item.index, text.trim().to_string());
        }
        Ok(Self { replies, listed })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_items(&load_manifest(path)?)
    }

    /// Indices with a reply, ascending.
    pub fn indices(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.replies.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Every listed item, answered or not, must name an entry of the current
    /// sequence.
    pub fn validate(&self, entries: &[Entry]) -> Result<()> {
        for &index in &self.listed {
            if !entries.iter().any(|e| e.index == index) {
                return Err(SubFitError::ManifestMismatch(format!(
                    "entry {} not found ({} entries in input)",
                    index,
                    entries.len()
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Shortener for ManifestGateway {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn shorten(&self, request: &ShortenRequest) -> std::result::Result<Shortening, GatewayError> {
        Ok(match self.replies.get(&request.index) {
            Some(text) => Shortening::Shortened(text.clone()),
            None => Shortening::Deferred,
        })
    }
}
