//! Share link extraction from free-form pasted text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::error::ParseError;

/// Characters that terminate a link when it is embedded in share text:
/// whitespace, CJK ideographs, ASCII double quotes and common full-width
/// punctuation.
const LINK_BODY: &str = r#"[^\s\x{4e00}-\x{9fa5}，。！？；：“”‘’"（）【】]+"#;

/// Platform-specific short link (`xhslink.com`), tried first.
#[allow(clippy::expect_used)]
static SHORT_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)https?://xhslink\.com/{LINK_BODY}"))
        .expect("short link regex is valid") // Static pattern, safe to panic
});

/// Any http(s) link, used when no platform short link is present.
#[allow(clippy::expect_used)]
static GENERIC_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)https?://{LINK_BODY}")).expect("generic link regex is valid")
});

/// A link pulled out of user-pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// The raw text as pasted by the user.
    pub raw: String,
    /// The extracted URL, empty when none was found.
    pub url: String,
}

impl ShareLink {
    /// Returns true when no URL could be extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    /// Converts an empty extraction into [`ParseError::NoLinkFound`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoLinkFound`] when no URL was extracted.
    pub fn require(self) -> Result<Self, ParseError> {
        if self.is_empty() {
            Err(ParseError::no_link_found(&self.raw))
        } else {
            Ok(self)
        }
    }
}

/// Extracts the first usable link from pasted share text.
///
/// The `xhslink.com` short link pattern wins when present; otherwise the
/// first generic `http(s)://` link is returned. Reachability is not checked.
///
/// # Examples
///
/// ```
/// use linkgrab_core::parser::extract_share_link;
///
/// let link = extract_share_link("看这个 https://xhslink.com/abc123 超好看");
/// assert_eq!(link.url, "https://xhslink.com/abc123");
/// ```
#[tracing::instrument(skip(text), fields(input_len = text.len()))]
#[must_use]
pub fn extract_share_link(text: &str) -> ShareLink {
    let url = first_match(&SHORT_LINK_PATTERN, text)
        .or_else(|| {
            trace!("no short link match, trying generic pattern");
            first_match(&GENERIC_LINK_PATTERN, text)
        })
        .unwrap_or_default();

    if url.is_empty() {
        debug!("no link found in input");
    } else {
        debug!(url = %url, "extracted share link");
    }

    ShareLink {
        raw: text.to_string(),
        url,
    }
}

fn first_match(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .find(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}
