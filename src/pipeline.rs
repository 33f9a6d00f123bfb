//! Share text to reconciled image list, end to end.
//!
//! [`LinkPipeline::resolve`] runs extraction, the backend parse, the
//! optional cookie exchange and reconciliation, and installs the result in
//! the caller's [`Session`].

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::api::{ApiClient, ApiError, Platform};
use crate::image::{ImageUrlBuilder, ProxyMode, reconcile};
use crate::parser::{ParseError, extract_share_link};
use crate::session::Session;

/// Errors that abort a resolve.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No link could be extracted; no request was sent.
    #[error(transparent)]
    Input(#[from] ParseError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What a successful resolve produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSummary {
    pub link: String,
    pub platform: Platform,
    pub image_count: usize,
    /// True when proxied URLs carry a session id.
    pub has_session_id: bool,
}

/// Resolves share text against one backend.
#[derive(Debug, Clone)]
pub struct LinkPipeline {
    api: ApiClient,
    proxy_mode: ProxyMode,
    direct_for_non_doubao: bool,
}

impl LinkPipeline {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            proxy_mode: ProxyMode::default(),
            direct_for_non_doubao: true,
        }
    }

    #[must_use]
    pub fn with_proxy_mode(mut self, proxy_mode: ProxyMode) -> Self {
        self.proxy_mode = proxy_mode;
        self
    }

    #[must_use]
    pub fn with_direct_for_non_doubao(mut self, enabled: bool) -> Self {
        self.direct_for_non_doubao = enabled;
        self
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Resolves `text` and replaces the session's image list.
    ///
    /// A blank `cookie` counts as absent. For Doubao links with a cookie the
    /// session id is taken from the session cache or exchanged once; a
    /// failed exchange continues without one. Failures are logged to the
    /// session before being returned, and leave the previous list intact.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Input`] when `text` holds no link,
    /// [`PipelineError::Api`] when the parse call fails.
    #[instrument(skip(self, session, text, cookie), fields(has_cookie = cookie.is_some()))]
    pub async fn resolve(
        &self,
        session: &mut Session,
        text: &str,
        cookie: Option<&str>,
    ) -> Result<ResolveSummary, PipelineError> {
        let cookie = cookie.map(str::trim).filter(|c| !c.is_empty());

        let link = match extract_share_link(text).require() {
            Ok(link) => link,
            Err(error) => {
                session.record(format!("no link found: {error}"));
                return Err(error.into());
            }
        };
        session.record(format!("resolving {}", link.url));

        let result = match self.api.parse(&link.url, cookie).await {
            Ok(result) => result,
            Err(error) => {
                session.record(format!("parse failed: {}", error.short_message()));
                return Err(error.into());
            }
        };
        let platform = result.platform_or_infer(&link.url);

        let session_id = match cookie {
            Some(cookie) if platform == Platform::Doubao => {
                self.session_id_for(session, cookie).await
            }
            _ => None,
        };

        let builder = ImageUrlBuilder::new(self.api.base_url())
            .with_session_id(session_id)
            .with_proxy_mode(self.proxy_mode)
            .with_direct_for_non_doubao(self.direct_for_non_doubao);
        let entries = reconcile(
            &result.all_images,
            &result.image_url,
            platform,
            cookie.is_some(),
            &builder,
        );

        let summary = ResolveSummary {
            link: link.url,
            platform,
            image_count: entries.len(),
            has_session_id: builder.session_id().is_some(),
        };
        info!(
            platform = %platform,
            images = summary.image_count,
            candidates = result.all_images.len(),
            "share link resolved"
        );
        session.record(format!(
            "parsed {} image(s) from {platform}",
            summary.image_count
        ));
        session.replace_entries(result, entries);
        Ok(summary)
    }

    async fn session_id_for(&self, session: &mut Session, cookie: &str) -> Option<String> {
        if let Some(cached) = session.cached_session_id(cookie) {
            debug!("reusing cached session id");
            return Some(cached.to_string());
        }

        let sid = self.api.exchange_cookie_for_session_id(cookie).await;
        match &sid {
            Some(sid) => {
                session.cache_session_id(cookie, sid.clone());
                session.record("cookie exchanged for session id");
            }
            None => session.record("cookie exchange failed; continuing without session id"),
        }
        sid
    }
}
