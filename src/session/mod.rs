//! Per-session state: image list, selection set, log buffer and the
//! cached image-proxy session id.
//!
//! A [`Session`] is passed explicitly to every operation that reads or
//! mutates it. A fresh parse replaces the image list and the selection
//! wholesale; the log and the session-id cache survive across parses.

mod log;

use std::collections::BTreeSet;

use thiserror::Error;

pub use log::{LOG_CAPACITY, LogBuffer, LogEntry};

use crate::api::ParseResult;
use crate::download::DownloadItem;
use crate::image::ImageEntry;

/// Errors from session mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no image at index {index} (list has {len} images)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone)]
struct CachedSessionId {
    cookie: String,
    sid: String,
}

/// State owned by one resolve/download session.
#[derive(Debug, Default)]
pub struct Session {
    entries: Vec<ImageEntry>,
    selection: BTreeSet<usize>,
    log: LogBuffer,
    session_id: Option<CachedSessionId>,
    last_result: Option<ParseResult>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current image list.
    #[must_use]
    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backend response behind the current list, if any.
    #[must_use]
    pub fn last_result(&self) -> Option<&ParseResult> {
        self.last_result.as_ref()
    }

    /// Installs the result of a fresh parse, replacing list and selection.
    ///
    /// The selection is rebuilt from the entries' `selected` flags.
    pub fn replace_entries(&mut self, result: ParseResult, entries: Vec<ImageEntry>) {
        self.selection = entries
            .iter()
            .filter(|entry| entry.selected)
            .map(|entry| entry.index)
            .collect();
        self.entries = entries;
        self.last_result = Some(result);
    }

    /// Drops the list, the selection and the last result.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.selection.clear();
        self.last_result = None;
    }

    /// Flips the selection of one entry and returns its new state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IndexOutOfRange`] for an unknown index.
    pub fn toggle(&mut self, index: usize) -> Result<bool, SessionError> {
        let selected = !self.entry_mut(index)?.selected;
        self.set_selected(index, selected)?;
        Ok(selected)
    }

    /// Sets the selection of one entry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IndexOutOfRange`] for an unknown index.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<(), SessionError> {
        self.entry_mut(index)?.selected = selected;
        if selected {
            self.selection.insert(index);
        } else {
            self.selection.remove(&index);
        }
        Ok(())
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = true;
            self.selection.insert(entry.index);
        }
    }

    pub fn clear_selection(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
        self.selection.clear();
    }

    /// Selected indices in list order.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Copies the selected entries into download items.
    ///
    /// The snapshot is independent of the session, so a later parse cannot
    /// invalidate a batch that is already running.
    #[must_use]
    pub fn snapshot_selected(&self) -> Vec<DownloadItem> {
        self.selection
            .iter()
            .filter_map(|index| self.entries.get(*index))
            .map(DownloadItem::from_entry)
            .collect()
    }

    /// Appends a user-visible log line.
    pub fn record(&mut self, message: impl Into<String>) {
        self.log.push(message);
    }

    #[must_use]
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Session id previously obtained for `cookie`, if any.
    #[must_use]
    pub fn cached_session_id(&self, cookie: &str) -> Option<&str> {
        self.session_id
            .as_ref()
            .filter(|cached| cached.cookie == cookie)
            .map(|cached| cached.sid.as_str())
    }

    /// Remembers the session id exchanged for `cookie`.
    pub fn cache_session_id(&mut self, cookie: impl Into<String>, sid: impl Into<String>) {
        self.session_id = Some(CachedSessionId {
            cookie: cookie.into(),
            sid: sid.into(),
        });
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut ImageEntry, SessionError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })
    }
}
