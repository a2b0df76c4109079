use sf_core::{Entry, Result};
use std::path::Path;

use crate::decode::decode_text;

/// Trait for subtitle file formats.
pub trait SubtitleFormat: Send + Sync {
    /// Parse decoded file content.
    fn parse_content(&self, content: &str) -> Result<Vec<Entry>>;

    /// Render entries in file order.
    fn serialize(&self, entries: &[Entry]) -> String;

    /// Read, decode and parse a file.
    fn parse_file(&self, path: &Path) -> Result<Vec<Entry>> {
        let bytes = std::fs::read(path)?;
        self.parse_content(&decode_text(&bytes))
    }

    fn write_file(&self, entries: &[Entry], path: &Path) -> Result<()> {
        std::fs::write(path, self.serialize(entries))?;
        Ok(())
    }

    /// Supported file extensions.
    fn supported_extensions(&self) -> Vec<String>;

    /// Check if a file can be parsed.
    fn can_parse(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let ext_with_dot = format!(".{}", ext);
        self.supported_extensions().contains(&ext_with_dot)
    }
}
