//! Layer 1: Filler removal of disfluency tokens ("uh", "um") from entry text.
//!
//! Matching is per whitespace-separated token: markup tags and surrounding
//! punctuation are stripped, the remainder is lowercased and must equal a
//! list entry exactly. "Umbrella" never matches "um", "uh-oh" never matches "uh".

use regex::Regex;
use sf_core::{Entry, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>|\{[^}]*\}").unwrap());

const SENTENCE_END: &[char] = &['.', '!', '?', '\u{2026}'];
const DANGLING: &[char] = &[',', ';', ':'];

/// Default English disfluency list.
pub const FILLERS_EN: &[&str] = &[
    "ah", "ahem", "ahh", "ahhh", "ahhhh", "eh", "ehh", "ehhh", "er", "err", "erm", "gah",
    "hm", "hmm", "hmmm", "hmmmm", "huh", "mm", "mm-hmm", "mm-hm", "mmm", "mmmm", "nuh-uh",
    "oh", "ohh", "ohhh", "ow", "oww", "owww", "pff", "pfft", "phew", "tsk", "ugh", "ughh",
    "uh", "uhh", "uhhh", "uh-huh", "um", "umm", "ummm", "whew", "wow",
];

/// Case-insensitive set of filler tokens for one language.
#[derive(Debug, Clone)]
pub struct FillerList {
    words: HashSet<String>,
}

impl FillerList {
    pub fn english() -> Self {
        Self::from_words(FILLERS_EN.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load a list file: one token per line, `#` starts a comment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let list = Self::from_words(
            content
                .lines()
                .map(|l| l.split('#').next().unwrap_or(""))
                .filter(|l| !l.trim().is_empty()),
        );
        tracing::debug!(path = %path.display(), words = list.len(), "loaded filler list");
        Ok(list)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for FillerList {
    fn default() -> Self {
        Self::english()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillerOptions {
    /// Only drop lines made entirely of fillers; leave inline fillers alone.
    pub only_separated_lines: bool,
    /// Uppercase the first remaining word when a line-opening filler was removed.
    pub capitalize_after_removal: bool,
}

/// Token text with markup removed and outer punctuation trimmed.
fn token_core(word: &str) -> String {
    let bare = RE_TAG.replace_all(word, "");
    bare.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
}

fn is_filler(word: &str, list: &FillerList) -> bool {
    let core = token_core(word);
    !core.is_empty() && list.contains(&core)
}

/// Sentence-ending punctuation trailing a token, e.g. `"."` for `"um."`.
fn sentence_end_suffix(word: &str) -> String {
    let bare = RE_TAG.replace_all(word, "");
    let body = bare.trim_end_matches(|c: char| !c.is_alphanumeric());
    bare[body.len()..].chars().filter(|c| SENTENCE_END.contains(c)).collect()
}

fn has_content(s: &str) -> bool {
    s.chars().any(|c| c.is_alphanumeric())
}

fn capitalize_first(s: &str) -> String {
    match s.char_indices().find(|(_, c)| c.is_alphabetic()) {
        Some((i, c)) => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..i]);
            out.extend(c.to_uppercase());
            out.push_str(&s[i + c.len_utf8()..]);
            out
        }
        None => s.to_string(),
    }
}

/// Split a leading dialogue dash from the line body.
fn split_dash(line: &str) -> (&str, &str) {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('-') {
        if !rest.starts_with('-') {
            let body = rest.trim_start();
            let dash_len = trimmed.len() - body.len();
            return (&trimmed[..dash_len], body);
        }
    }
    ("", trimmed)
}

/// Remove fillers from one line body. Returns `None` when nothing matched.
fn strip_line(body: &str, list: &FillerList, opts: FillerOptions) -> Option<String> {
    let words: Vec<&str> = body.split_whitespace().collect();
    if !words.iter().any(|w| is_filler(w, list)) {
        return None;
    }

    if opts.only_separated_lines {
        let all_filler = words.iter().all(|w| is_filler(w, list) || !has_content(w));
        return if all_filler { Some(String::new()) } else { None };
    }

    let mut kept: Vec<String> = Vec::with_capacity(words.len());
    let mut pending_tags = String::new();
    let mut removed_at_start = false;
    let mut just_removed = false;

    for word in &words {
        if is_filler(word, list) {
            if kept.is_empty() {
                removed_at_start = true;
            }
            // Keep markup so italics still open and close.
            for tag in RE_TAG.find_iter(word) {
                let tag = tag.as_str();
                match kept.last_mut() {
                    Some(prev) if tag.starts_with("</") => prev.push_str(tag),
                    _ => pending_tags.push_str(tag),
                }
            }
            let ending = sentence_end_suffix(word);
            if !ending.is_empty() {
                if let Some(prev) = kept.last_mut() {
                    let trimmed_len = prev.trim_end_matches(DANGLING).len();
                    prev.truncate(trimmed_len);
                    if !prev.ends_with(SENTENCE_END) {
                        prev.push_str(&ending);
                    }
                }
            }
            just_removed = true;
            continue;
        }

        if just_removed && !has_content(word) && !RE_TAG.is_match(word) {
            // Orphaned punctuation such as the "," in "uh , so".
            continue;
        }

        let mut w = std::mem::take(&mut pending_tags);
        w.push_str(word);
        kept.push(w);
        just_removed = false;
    }

    if just_removed {
        while let Some(last) = kept.last_mut() {
            let trimmed_len = last.trim_end_matches(DANGLING).len();
            last.truncate(trimmed_len);
            if !last.is_empty() {
                break;
            }
            kept.pop();
        }
    }
    if !pending_tags.is_empty() {
        if let Some(last) = kept.last_mut() {
            last.push_str(&pending_tags);
        }
    }

    let joined = kept.join(" ");
    if !has_content(&joined) {
        return Some(String::new());
    }
    if opts.capitalize_after_removal && removed_at_start {
        return Some(capitalize_first(&joined));
    }
    Some(joined)
}

/// Remove fillers from a list of lines. `None` means the text is unchanged.
pub fn remove_from_lines(lines: &[String], list: &FillerList, opts: FillerOptions) -> Option<Vec<String>> {
    let dialogue_lines = lines.iter().filter(|l| !split_dash(l).0.is_empty()).count();
    let mut changed = false;
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let (dash, body) = split_dash(line);
        match strip_line(body, list, opts) {
            None => out.push(line.clone()),
            Some(stripped) => {
                changed = true;
                if !stripped.is_empty() {
                    out.push(format!("{}{}", dash, stripped));
                }
            }
        }
    }

    if !changed {
        return None;
    }
    // A lone surviving dialogue line no longer needs its dash.
    if dialogue_lines >= 2 && out.len() == 1 {
        let (dash, body) = split_dash(&out[0]);
        if !dash.is_empty() {
            out[0] = body.to_string();
        }
    }
    Some(out)
}

/// Remove fillers from an entry in place; timing is untouched.
pub fn remove_fillers(entry: &mut Entry, list: &FillerList, opts: FillerOptions) -> bool {
    match remove_from_lines(&entry.lines, list, opts) {
        Some(lines) => {
            entry.set_lines(lines);
            true
        }
        None => false,
    }
}

/// Convenience for plain newline-separated text.
pub fn remove_from_text(text: &str, list: &FillerList, opts: FillerOptions) -> String {
    let lines: Vec<String> = text.split('\n').map(|l| l.to_string()).collect();
    match remove_from_lines(&lines, list, opts) {
        Some(out) => out.join("\n"),
        None => text.to_string(),
    }
}
