//! User-facing notices for failures and batch results.
//!
//! Errors never end the process; each one maps to either a transient
//! toast or, when the user must act, a modal prompt.

use std::fmt;

use crate::api::ApiError;
use crate::download::{DownloadReport, PersistError};
use crate::parser::ParseError;
use crate::pipeline::PipelineError;

/// Maximum characters shown in a toast before truncation.
pub const TOAST_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Short transient message.
    Toast(String),
    /// Prompt that needs acknowledgement.
    Modal { title: String, body: String },
}

impl Notice {
    /// Builds a toast, truncating to [`TOAST_MAX_CHARS`] characters.
    #[must_use]
    pub fn toast(message: &str) -> Self {
        let trimmed = message.trim();
        let mut text: String = trimmed.chars().take(TOAST_MAX_CHARS).collect();
        if trimmed.chars().count() > TOAST_MAX_CHARS {
            text.push_str("...");
        }
        Self::Toast(text)
    }

    #[must_use]
    pub fn is_modal(&self) -> bool {
        matches!(self, Self::Modal { .. })
    }

    /// Notice for a failed resolve.
    #[must_use]
    pub fn from_pipeline_error(error: &PipelineError) -> Self {
        match error {
            PipelineError::Input(error) => Self::from_parse_error(error),
            PipelineError::Api(error) => Self::from_api_error(error),
        }
    }

    #[must_use]
    pub fn from_parse_error(error: &ParseError) -> Self {
        match error {
            ParseError::NoLinkFound { .. } => Self::toast("no link found"),
        }
    }

    #[must_use]
    pub fn from_api_error(error: &ApiError) -> Self {
        Self::toast(&error.short_message())
    }

    #[must_use]
    pub fn from_persist_error(error: &PersistError) -> Self {
        match error {
            PersistError::AuthDenied { .. } => Self::library_access_modal(),
            PersistError::Failed { .. } => Self::toast("save failed"),
        }
    }

    /// Notice summarizing a finished download batch.
    ///
    /// A permission failure on any item takes precedence as a modal.
    #[must_use]
    pub fn from_report(report: &DownloadReport) -> Self {
        if report.any_auth_denied() {
            return Self::library_access_modal();
        }
        if report.fail_count == 0 {
            Self::toast(&format!("saved {}", report.success_count))
        } else {
            Self::toast(&format!(
                "saved {}, failed {}",
                report.success_count, report.fail_count
            ))
        }
    }

    fn library_access_modal() -> Self {
        Self::Modal {
            title: "Photo library access needed".to_string(),
            body: "Allow writing to the photo library, then download again.".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toast(text) => f.write_str(text),
            Self::Modal { title, body } => write!(f, "{title}\n  {body}"),
        }
    }
}
