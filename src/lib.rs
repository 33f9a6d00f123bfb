//! Linkgrab core library
//!
//! Resolves social-media share links into direct image URLs through a
//! remote parse backend, reconciles the returned image list and downloads
//! a selection of it into a local photo library.
//!
//! # Architecture
//!
//! - [`parser`] - share link extraction from pasted text
//! - [`api`] - parse backend client (parse, cookie exchange, health)
//! - [`image`] - candidate filtering, cover de-duplication, proxy URLs
//! - [`session`] - image list, selection set and diagnostics log
//! - [`download`] - sequential fetch-and-persist with direct-URL fallback
//! - [`pipeline`] - extraction through reconciliation in one call
//! - [`notice`] - toast/modal mapping for every failure class

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod download;
mod http;
pub mod image;
pub mod notice;
pub mod parser;
pub mod pipeline;
pub mod session;
#[cfg(test)]
mod test_support;
mod user_agent;

pub use api::{ApiClient, ApiError, ParseResult, Platform};
pub use download::{
    DirectoryLibrary, DownloadError, DownloadItem, DownloadOrchestrator, DownloadReport,
    HttpClient, ItemState, PersistError, PhotoLibrary,
};
pub use image::{ImageEntry, ImageUrlBuilder, ProxyMode, reconcile};
pub use notice::Notice;
pub use parser::{ParseError, ShareLink, extract_share_link};
pub use pipeline::{LinkPipeline, PipelineError, ResolveSummary};
pub use session::{Session, SessionError};
