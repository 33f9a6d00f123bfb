//! Error types for share link extraction.

use thiserror::Error;

/// Maximum number of input characters echoed back in error messages.
pub const MAX_INPUT_PREVIEW: usize = 40;

/// Errors that can occur while extracting a share link from pasted text.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// No http(s) link was found anywhere in the input.
    #[error("no share link found in input '{input_preview}'\n  Suggestion: {suggestion}")]
    NoLinkFound {
        /// Truncated input for display
        input_preview: String,
        /// How to fix the issue
        suggestion: &'static str,
    },
}

impl ParseError {
    /// Creates a `NoLinkFound` error for the given input text.
    #[must_use]
    pub fn no_link_found(input: &str) -> Self {
        let trimmed = input.trim();
        let mut input_preview: String = trimmed.chars().take(MAX_INPUT_PREVIEW).collect();
        if trimmed.chars().count() > MAX_INPUT_PREVIEW {
            input_preview.push_str("...");
        }
        Self::NoLinkFound {
            input_preview,
            suggestion: "Paste the full share text including the https:// link",
        }
    }
}
