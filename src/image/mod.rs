//! Image list reconciliation and final URL construction.
//!
//! # Overview
//!
//! - [`predicates`] holds the CDN URL-shape heuristics, one function each
//! - [`reconcile`] filters a backend candidate list and removes repeats of
//!   the cover image
//! - [`ImageUrlBuilder`] decides between the direct CDN URL and the
//!   backend image proxy for each survivor

mod builder;
mod entry;
pub mod predicates;
mod reconcile;

pub use builder::{IMAGE_PROXY_PATH, ImageUrlBuilder, ProxyMode, is_loopback_http, normalize_url};
pub use entry::ImageEntry;
pub use reconcile::{Candidate, filter_candidates, is_xhs_candidate, reconcile};
