//! Reconciled, displayable image entries.

use serde::Serialize;

use super::builder::normalize_url;

/// One image ready for preview and download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    /// Original candidate from the backend, kept for the unproxied fallback.
    pub raw_url: String,
    /// URL used for preview and download.
    pub display_url: String,
    /// Toggled by the user through the session's selection.
    pub selected: bool,
    /// Position in the filtered list.
    pub index: usize,
    /// True for the retained occurrence of the cover image.
    pub is_cover: bool,
}

impl ImageEntry {
    /// True when the display URL differs from the direct URL, i.e. it was
    /// routed through the backend proxy.
    #[must_use]
    pub fn is_proxied(&self) -> bool {
        self.display_url != self.direct_url()
    }

    /// The normalized, unproxied form of [`raw_url`](Self::raw_url).
    #[must_use]
    pub fn direct_url(&self) -> String {
        normalize_url(&self.raw_url)
    }
}
