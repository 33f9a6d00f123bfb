//! Client for the remote share-link parse backend.
//!
//! The backend resolves a short link server-side, scrapes the target page
//! and answers with a cover image plus every image candidate it found.
//! Every endpoint wraps its payload in the same `{success, data, error}`
//! envelope.
//!
//! # Endpoints
//!
//! - `POST /api/parse` - resolve a short link ([`ApiClient::parse`])
//! - `POST /api/doubao_cookie` - exchange a credential for a session id
//!   ([`ApiClient::exchange_cookie_for_session_id`])
//! - `GET /health` - liveness ([`ApiClient::health`])
//! - `GET /api/image_proxy` - consumed indirectly through
//!   [`ImageUrlBuilder`](crate::image::ImageUrlBuilder)

mod client;
mod error;
mod types;

pub use client::{ApiClient, DEFAULT_API_TIMEOUT_SECS};
pub use error::ApiError;
pub use types::{ParseResult, Platform};
