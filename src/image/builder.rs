//! Final image URL construction: direct or through the backend image proxy.
//!
//! Some CDN asset classes enforce referrer/cookie checks a plain client
//! request cannot satisfy. The backend's `/api/image_proxy` endpoint
//! attaches the required credentials server-side, so those assets are
//! routed through it instead of being fetched from origin.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use url::{Host, Url};

use crate::api::Platform;

/// Path of the backend image-forwarding endpoint.
pub const IMAGE_PROXY_PATH: &str = "/api/image_proxy";

/// Whether media URLs are fetched from origin or through the backend proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyMode {
    /// Route through the backend image proxy when the backend is remote.
    #[default]
    Proxy,
    /// Always fetch from the origin CDN.
    Direct,
}

impl ProxyMode {
    /// Returns the stable config label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxy" => Ok(Self::Proxy),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "unknown proxy mode '{other}' (expected \"proxy\" or \"direct\")"
            )),
        }
    }
}

/// Normalizes a raw candidate: trims, adds a missing scheme, forces https.
///
/// # Examples
///
/// ```
/// use linkgrab_core::image::normalize_url;
///
/// assert_eq!(normalize_url("cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
/// assert_eq!(normalize_url("http://cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
/// assert_eq!(normalize_url(""), "");
/// ```
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if let Some(rest) = strip_prefix_ignore_case(trimmed, "http://") {
        return format!("https://{rest}");
    }
    if strip_prefix_ignore_case(trimmed, "http").is_some() {
        return trimmed.to_string();
    }
    format!("https://{trimmed}")
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// True when `base` is a plain-http loopback or `localhost` address.
#[must_use]
pub fn is_loopback_http(base: &str) -> bool {
    let Ok(parsed) = Url::parse(base) else {
        return false;
    };
    if parsed.scheme() != "http" {
        return false;
    }
    match parsed.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(addr)) => IpAddr::V4(addr).is_loopback(),
        Some(Host::Ipv6(addr)) => IpAddr::V6(addr).is_loopback(),
        None => false,
    }
}

/// Builds the URL used to preview and download each image.
///
/// Pure over its inputs plus the configured backend base and session id.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    backend_base: String,
    session_id: Option<String>,
    proxy_mode: ProxyMode,
    direct_for_non_doubao: bool,
}

impl ImageUrlBuilder {
    /// Creates a builder for the given backend base address.
    ///
    /// Defaults: [`ProxyMode::Proxy`], no session id, and non-Doubao
    /// platforms fetched directly.
    #[must_use]
    pub fn new(backend_base: impl Into<String>) -> Self {
        Self {
            backend_base: backend_base.into().trim_end_matches('/').to_string(),
            session_id: None,
            proxy_mode: ProxyMode::default(),
            direct_for_non_doubao: true,
        }
    }

    /// Sets the session id appended to proxied URLs. Blank ids are ignored.
    #[must_use]
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id.filter(|sid| !sid.trim().is_empty());
        self
    }

    /// Sets the default proxy mode used by [`build`](Self::build).
    #[must_use]
    pub fn with_proxy_mode(mut self, proxy_mode: ProxyMode) -> Self {
        self.proxy_mode = proxy_mode;
        self
    }

    /// Controls whether non-Doubao platforms bypass the proxy in every mode.
    #[must_use]
    pub fn with_direct_for_non_doubao(mut self, enabled: bool) -> Self {
        self.direct_for_non_doubao = enabled;
        self
    }

    /// Returns the configured proxy mode.
    #[must_use]
    pub fn proxy_mode(&self) -> ProxyMode {
        self.proxy_mode
    }

    /// Returns the session id, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Builds the final URL using the configured proxy mode.
    #[must_use]
    pub fn build(&self, raw_url: &str, platform: Platform) -> String {
        self.build_with_mode(raw_url, platform, self.proxy_mode)
    }

    /// Builds the final URL for `raw_url` under an explicit proxy mode.
    ///
    /// Rules, in order: empty stays empty; the URL is normalized to https;
    /// non-Doubao platforms stay direct when that exception is enabled;
    /// [`ProxyMode::Direct`] or a loopback http backend stays direct;
    /// everything else goes through `{https base}/api/image_proxy?url=..[&sid=..]`.
    #[must_use]
    pub fn build_with_mode(&self, raw_url: &str, platform: Platform, mode: ProxyMode) -> String {
        let normalized = normalize_url(raw_url);
        if normalized.is_empty() {
            return normalized;
        }

        if self.direct_for_non_doubao && platform != Platform::Doubao {
            return normalized;
        }

        if mode == ProxyMode::Direct || is_loopback_http(&self.backend_base) {
            return normalized;
        }

        let mut proxied = format!(
            "{}?url={}",
            self.proxy_endpoint(),
            urlencoding::encode(&normalized)
        );
        if let Some(sid) = &self.session_id {
            proxied.push_str("&sid=");
            proxied.push_str(&urlencoding::encode(sid));
        }
        proxied
    }

    /// True when `url` points at this builder's proxy endpoint.
    #[must_use]
    pub fn is_proxied(&self, url: &str) -> bool {
        url.starts_with(&self.proxy_endpoint())
    }

    fn proxy_endpoint(&self) -> String {
        let base = match self.backend_base.strip_prefix("http://") {
            Some(rest) => format!("https://{rest}"),
            None => self.backend_base.clone(),
        };
        format!("{base}{IMAGE_PROXY_PATH}")
    }
}
