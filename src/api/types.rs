//! Wire types exchanged with the parse backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source platform of a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Xiaohongshu notes served from the `xhscdn.com` family of CDNs.
    Xhs,
    /// Doubao generated images.
    Doubao,
}

impl Platform {
    /// Infers the platform from link content when the backend omits it.
    #[must_use]
    pub fn infer_from_link(link: &str) -> Self {
        if link.to_ascii_lowercase().contains("doubao") {
            Self::Doubao
        } else {
            Self::Xhs
        }
    }

    /// Returns the stable lowercase label used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xhs => "xhs",
            Self::Doubao => "doubao",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xhs" => Ok(Self::Xhs),
            "doubao" => Ok(Self::Doubao),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Successful parse payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParseResult {
    /// Source platform. Filled in from the link by the client when absent.
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Primary (cover) image candidate.
    pub image_url: String,
    /// Every candidate the backend found, in page order. May contain noise.
    #[serde(default)]
    pub all_images: Vec<String>,
    /// Clean original, only fetchable with a caller credential.
    #[serde(default)]
    pub no_watermark_image_url: Option<String>,
    /// Note identifier extracted from the resolved page URL.
    #[serde(default)]
    pub note_id: Option<String>,
    /// Page the short link redirected to.
    #[serde(default)]
    pub target_url: Option<String>,
}

impl ParseResult {
    /// Returns the platform, inferring it from `link` when the backend omitted it.
    #[must_use]
    pub fn platform_or_infer(&self, link: &str) -> Platform {
        self.platform
            .unwrap_or_else(|| Platform::infer_from_link(link))
    }
}

/// Request body for `POST /api/parse`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ParseRequest<'a> {
    pub(crate) short_link: &'a str,
    pub(crate) cookie: &'a str,
}

/// Request body for `POST /api/doubao_cookie`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CookieExchangeRequest<'a> {
    pub(crate) cookie: &'a str,
}

/// Payload of a successful cookie exchange.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CookieExchangeData {
    #[serde(default)]
    pub(crate) sid: String,
}

/// Response envelope shared by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}
