//! Image fetching and persisting.
//!
//! Fetches stream into a staging directory owned by the
//! [`PhotoLibrary`], which then moves the file into place. The
//! [`DownloadOrchestrator`] drives a selected batch through both steps one
//! item at a time.
//!
//! # Example
//!
//! ```no_run
//! use linkgrab_core::download::{DirectoryLibrary, DownloadOrchestrator, HttpClient};
//! use linkgrab_core::session::Session;
//!
//! # async fn example(session: &mut Session) {
//! let client = HttpClient::new();
//! let library = DirectoryLibrary::new("./photos");
//! let report = DownloadOrchestrator::new(&client, &library)
//!     .run_selection(session, |_| {})
//!     .await;
//! println!("{} saved, {} failed", report.success_count, report.fail_count);
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod library;
mod orchestrator;

pub use client::{FetchedFile, HttpClient};
pub use error::{DownloadError, PersistError};
pub use filename::image_file_stem;
pub use library::{DirectoryLibrary, PhotoLibrary};
pub use orchestrator::{
    DownloadItem, DownloadOrchestrator, DownloadReport, ItemFailure, ItemOutcome, ItemState,
};
