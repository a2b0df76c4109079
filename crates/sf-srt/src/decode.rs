//! Byte decoding for subtitle files of unknown encoding.

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode file bytes to text with `\n` line endings.
///
/// UTF-8 (with or without BOM) is tried first; anything else is read as
/// Latin-1, which maps every byte to a char and cannot fail.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    };
    normalize_line_endings(&text)
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
