//! Caption cleanup: deterministic normalization of raw model output.
//!
//! Even well-prompted caption models occasionally leak formatting-control
//! artifacts — LaTeX-style escapes (`\textbf`), stray brace/bracket
//! delimiters, irregular whitespace, missing capitalization or terminal
//! punctuation. This module applies four cheap, deterministic rules that fix
//! those quirks without touching content. Keeping them here rather than in
//! the prompt means the prompt stays focused on *what to describe*, not on
//! formatting edge-cases.
//!
//! ## Rule Order
//!
//! Artifact stripping runs first so whitespace collapse sees the gaps it
//! leaves; capitalization runs on the trimmed string; the terminal period is
//! appended last.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Markup-escape artifacts: backslash commands (`\word`) and bare
/// brace/bracket/dollar delimiters.
static RE_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[A-Za-z]+|[{}\[\]$]").unwrap());

/// Clean one raw caption.
///
/// Pure and total: every input string maps to exactly one output string.
/// Rules (applied in order):
/// 1. Strip markup-escape artifacts
/// 2. Collapse consecutive whitespace to single spaces, trim the ends
/// 3. Uppercase the first alphabetic character
/// 4. Append a period unless the caption already ends in `.`, `!`, or `?`
///
/// An input with no content left after stripping becomes a bare `"."` —
/// callers that consider that degenerate filter it with [`is_degenerate`].
pub fn clean_caption(raw: &str) -> String {
    let stripped = RE_MARKUP.replace_all(raw, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let capitalized = capitalize_first(&collapsed);
    ensure_terminal_punctuation(capitalized)
}

/// True when a cleaned caption carries no information — nothing alphanumeric
/// survived cleanup (e.g. the bare `"."` produced from an empty raw caption).
pub fn is_degenerate(caption: &str) -> bool {
    !caption.chars().any(|c| c.is_alphanumeric())
}

/// Remove duplicate captions, keeping each distinct value's first position.
pub fn dedup_captions(captions: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    captions
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

// ── Rule 3: Uppercase the first alphabetic character ─────────────────────────

fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() && !first.is_uppercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => input.to_string(),
    }
}

// ── Rule 4: Terminal sentence punctuation ────────────────────────────────────

fn ensure_terminal_punctuation(mut caption: String) -> String {
    if !caption.ends_with(['.', '!', '?']) {
        caption.push('.');
    }
    caption
}
