//! Prompts for VLM-based caption generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the default behaviour (caption
//!    register, length hints) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without spinning up a real VLM.

/// Default system prompt for describing an image.
///
/// The hard "no markup" rules exist because some models still leak LaTeX-ish
/// escapes or bracketed annotations; the deterministic cleanup pass in
/// [`crate::pipeline::cleanup`] catches what slips through.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert image captioner. Describe the visual content of the image in short natural English.

Follow these rules precisely:

1. CONTENT
   - Describe only what is visible; never invent objects, names, or text
   - Focus on the main subject and action, then the setting
   - One sentence per caption, at most ~15 words

2. OUTPUT FORMAT
   - Output ONLY the captions, one per line
   - Do NOT number the lines or add bullets
   - Do NOT use any markup: no backslash commands, braces, brackets, or dollar signs
   - Do NOT add commentary or explanations"#;

/// Build the user instruction asking for `n` caption candidates.
///
/// Sent as the text of the image-bearing user message. Distinct phrasing for
/// the single-caption case keeps models from emitting list scaffolding.
pub fn caption_request(n: usize) -> String {
    if n <= 1 {
        "Write one caption for this image.".to_string()
    } else {
        format!("Write {n} distinct captions for this image, one per line.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_request_has_no_count() {
        let p = caption_request(1);
        assert!(!p.contains('1'));
    }

    #[test]
    fn multi_request_names_the_count() {
        let p = caption_request(3);
        assert!(p.contains('3'));
        assert!(p.contains("one per line"));
    }

    #[test]
    fn system_prompt_forbids_markup() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("markup"));
    }
}
