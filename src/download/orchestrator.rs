//! Sequential fetch-and-persist over a selected batch of images.
//!
//! Items are processed strictly one at a time: item *n+1* is not started
//! until item *n* has reached a terminal state. A fetch failure on a
//! proxied URL is retried exactly once against the entry's unproxied URL;
//! persist failures are never retried.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::{DownloadError, PersistError};
use super::filename::image_file_stem;
use super::library::PhotoLibrary;
use crate::image::ImageEntry;
use crate::session::Session;

/// One image to download, copied out of the session at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadItem {
    /// Index of the entry in the list it was taken from.
    pub index: usize,
    /// URL tried first (the display URL).
    pub url: String,
    /// Unproxied URL for the single fallback attempt, when `url` is proxied.
    pub fallback_url: Option<String>,
}

impl DownloadItem {
    #[must_use]
    pub fn from_entry(entry: &ImageEntry) -> Self {
        Self {
            index: entry.index,
            url: entry.display_url.clone(),
            fallback_url: entry.is_proxied().then(|| entry.direct_url()),
        }
    }
}

/// Per-item lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemState {
    Pending,
    Fetching,
    FetchFailed,
    Fetched,
    Saved,
    SaveFailed,
}

impl ItemState {
    /// True for states that end an item.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FetchFailed | Self::Saved | Self::SaveFailed)
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Saved
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::FetchFailed => "fetch failed",
            Self::Fetched => "fetched",
            Self::Saved => "saved",
            Self::SaveFailed => "save failed",
        };
        f.write_str(label)
    }
}

/// Why an item failed.
#[derive(Debug)]
pub enum ItemFailure {
    Fetch(DownloadError),
    Persist(PersistError),
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(error) => write!(f, "{error}"),
            Self::Persist(error) => write!(f, "{error}"),
        }
    }
}

/// Terminal result of one item.
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub state: ItemState,
    /// True when the unproxied fallback URL was tried.
    pub used_fallback: bool,
    pub saved_path: Option<PathBuf>,
    pub failure: Option<ItemFailure>,
}

impl ItemOutcome {
    /// True when the library refused access for this item.
    #[must_use]
    pub fn is_auth_denied(&self) -> bool {
        matches!(&self.failure, Some(ItemFailure::Persist(error)) if error.is_auth_denied())
    }
}

/// Counters and outcomes of a finished batch.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl DownloadReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    /// True when any item failed because library access was denied.
    #[must_use]
    pub fn any_auth_denied(&self) -> bool {
        self.outcomes.iter().any(ItemOutcome::is_auth_denied)
    }
}

/// Drives a batch through fetch and persist, one item at a time.
pub struct DownloadOrchestrator<'a> {
    client: &'a HttpClient,
    library: &'a dyn PhotoLibrary,
    note_id: Option<String>,
}

impl<'a> DownloadOrchestrator<'a> {
    #[must_use]
    pub fn new(client: &'a HttpClient, library: &'a dyn PhotoLibrary) -> Self {
        Self {
            client,
            library,
            note_id: None,
        }
    }

    /// Prefixes saved file names with the note id.
    #[must_use]
    pub fn with_note_id(mut self, note_id: Option<String>) -> Self {
        self.note_id = note_id;
        self
    }

    /// Downloads the session's current selection, then clears it.
    ///
    /// The selection is snapshotted before the first request, and every
    /// terminal item plus the final summary is appended to the session log.
    pub async fn run_selection<F>(&self, session: &mut Session, mut on_item: F) -> DownloadReport
    where
        F: FnMut(&ItemOutcome),
    {
        let items = session.snapshot_selected();
        session.record(format!("downloading {} image(s)", items.len()));

        let report = self
            .run(items, |outcome| {
                session.record(describe_outcome(outcome));
                on_item(outcome);
            })
            .await;

        session.record(format!(
            "download finished: {} saved, {} failed",
            report.success_count, report.fail_count
        ));
        session.clear_selection();
        report
    }

    /// Processes `items` in order and reports the counters.
    ///
    /// `on_item` is called once per item as soon as it reaches a terminal
    /// state.
    #[instrument(skip(self, items, on_item), fields(items = items.len()))]
    pub async fn run<F>(&self, items: Vec<DownloadItem>, mut on_item: F) -> DownloadReport
    where
        F: FnMut(&ItemOutcome),
    {
        let mut report = DownloadReport::default();

        for (position, item) in items.iter().enumerate() {
            let outcome = self.process(item, position + 1).await;
            if outcome.state.is_success() {
                report.success_count += 1;
            } else {
                report.fail_count += 1;
            }
            on_item(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            success = report.success_count,
            failed = report.fail_count,
            "download batch complete"
        );
        report
    }

    async fn process(&self, item: &DownloadItem, position: usize) -> ItemOutcome {
        let mut state = ItemState::Pending;
        let stem = image_file_stem(self.note_id.as_deref(), position);
        let staging_dir = self.library.staging_dir();

        advance(item.index, &mut state, ItemState::Fetching);
        let mut used_fallback = false;
        let first = self.client.fetch_to_file(&item.url, &staging_dir, &stem).await;
        let fetched = match (first, item.fallback_url.as_deref()) {
            (Err(error), Some(fallback)) if error.is_fetch_failure() => {
                warn!(
                    index = item.index,
                    error = %error,
                    "proxied fetch failed, retrying with direct URL"
                );
                used_fallback = true;
                self.client.fetch_to_file(fallback, &staging_dir, &stem).await
            }
            (result, _) => result,
        };

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(error) => {
                advance(item.index, &mut state, ItemState::FetchFailed);
                return ItemOutcome {
                    index: item.index,
                    state,
                    used_fallback,
                    saved_path: None,
                    failure: Some(ItemFailure::Fetch(error)),
                };
            }
        };
        advance(item.index, &mut state, ItemState::Fetched);

        match self.library.save(&fetched.path).await {
            Ok(saved_path) => {
                advance(item.index, &mut state, ItemState::Saved);
                ItemOutcome {
                    index: item.index,
                    state,
                    used_fallback,
                    saved_path: Some(saved_path),
                    failure: None,
                }
            }
            Err(error) => {
                let _ = tokio::fs::remove_file(&fetched.path).await;
                advance(item.index, &mut state, ItemState::SaveFailed);
                ItemOutcome {
                    index: item.index,
                    state,
                    used_fallback,
                    saved_path: None,
                    failure: Some(ItemFailure::Persist(error)),
                }
            }
        }
    }
}

fn advance(index: usize, state: &mut ItemState, next: ItemState) {
    debug!(index, from = %state, to = %next, "item state");
    *state = next;
}

fn describe_outcome(outcome: &ItemOutcome) -> String {
    let image = outcome.index + 1;
    match (&outcome.saved_path, &outcome.failure) {
        (Some(path), _) if outcome.used_fallback => {
            format!("image {image} saved via direct URL to {}", path.display())
        }
        (Some(path), _) => format!("image {image} saved to {}", path.display()),
        (None, Some(failure)) => format!("image {image} {}: {failure}", outcome.state),
        (None, None) => format!("image {image} {}", outcome.state),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::api::ParseResult;
    use crate::download::DirectoryLibrary;
    use crate::session::LogEntry;
    use crate::test_support::start_mock_server_or_skip;

    struct DenyingLibrary {
        staging: PathBuf,
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl PhotoLibrary for DenyingLibrary {
        async fn save(&self, staged: &Path) -> Result<PathBuf, PersistError> {
            *self.attempts.lock().unwrap() += 1;
            Err(PersistError::AuthDenied {
                path: staged.to_path_buf(),
            })
        }

        fn staging_dir(&self) -> PathBuf {
            self.staging.clone()
        }
    }

    fn item(index: usize, url: String, fallback_url: Option<String>) -> DownloadItem {
        DownloadItem {
            index,
            url,
            fallback_url,
        }
    }

    #[test]
    fn test_download_item_from_proxied_entry_keeps_direct_fallback() {
        let entry = ImageEntry {
            raw_url: "http://cdn.example/a.png".to_string(),
            display_url: "https://api.example/api/image_proxy?url=https%3A%2F%2Fcdn.example%2Fa.png"
                .to_string(),
            selected: true,
            index: 4,
            is_cover: false,
        };
        let item = DownloadItem::from_entry(&entry);
        assert_eq!(item.index, 4);
        assert_eq!(item.fallback_url.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn test_download_item_from_direct_entry_has_no_fallback() {
        let entry = ImageEntry {
            raw_url: "https://cdn.example/a.png".to_string(),
            display_url: "https://cdn.example/a.png".to_string(),
            selected: true,
            index: 0,
            is_cover: true,
        };
        assert!(DownloadItem::from_entry(&entry).fallback_url.is_none());
    }

    #[test]
    fn test_item_state_terminal_states() {
        assert!(!ItemState::Pending.is_terminal());
        assert!(!ItemState::Fetching.is_terminal());
        assert!(!ItemState::Fetched.is_terminal());
        assert!(ItemState::FetchFailed.is_terminal());
        assert!(ItemState::Saved.is_terminal());
        assert!(ItemState::SaveFailed.is_terminal());
    }

    #[tokio::test]
    async fn test_run_saves_every_item_in_order() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            Mock::given(method("GET"))
                .and(path(format!("/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(name.as_bytes()))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let orchestrator =
            DownloadOrchestrator::new(&client, &library).with_note_id(Some("note".to_string()));
        let items = ["a.jpg", "b.jpg", "c.jpg"]
            .iter()
            .enumerate()
            .map(|(i, name)| item(i, format!("{}/{name}", mock_server.uri()), None))
            .collect();

        let mut seen = Vec::new();
        let report = orchestrator.run(items, |outcome| seen.push(outcome.index)).await;

        assert_eq!((report.success_count, report.fail_count), (3, 0));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(
            std::fs::read(temp_dir.path().join("note_02.jpg")).unwrap(),
            b"b.jpg"
        );
    }

    #[tokio::test]
    async fn test_run_falls_back_once_to_direct_url() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/image_proxy"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/direct.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let orchestrator = DownloadOrchestrator::new(&client, &library);
        let items = vec![item(
            0,
            format!("{}/api/image_proxy?url=x", mock_server.uri()),
            Some(format!("{}/direct.png", mock_server.uri())),
        )];

        let report = orchestrator.run(items, |_| {}).await;

        assert_eq!((report.success_count, report.fail_count), (1, 0));
        assert!(report.outcomes[0].used_fallback);
        assert!(temp_dir.path().join("linkgrab_01.png").exists());
    }

    #[tokio::test]
    async fn test_run_counts_failure_after_fallback_fails() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let orchestrator = DownloadOrchestrator::new(&client, &library);
        let items = vec![item(
            0,
            format!("{}/api/image_proxy?url=x", mock_server.uri()),
            Some(format!("{}/direct.png", mock_server.uri())),
        )];

        let report = orchestrator.run(items, |_| {}).await;

        assert_eq!((report.success_count, report.fail_count), (0, 1));
        assert_eq!(report.outcomes[0].state, ItemState::FetchFailed);
        assert!(matches!(
            report.outcomes[0].failure,
            Some(ItemFailure::Fetch(DownloadError::HttpStatus { status: 404, .. }))
        ));
    }

    #[tokio::test]
    async fn test_run_direct_url_failure_is_not_retried() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let orchestrator = DownloadOrchestrator::new(&client, &library);
        let items = vec![item(0, format!("{}/a.jpg", mock_server.uri()), None)];

        let report = orchestrator.run(items, |_| {}).await;
        assert_eq!(report.fail_count, 1);
        assert!(!report.outcomes[0].used_fallback);
    }

    #[tokio::test]
    async fn test_run_save_failure_is_not_retried_and_batch_continues() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let library = DenyingLibrary {
            staging: temp_dir.path().join(".staging"),
            attempts: Mutex::new(0),
        };
        let orchestrator = DownloadOrchestrator::new(&client, &library);
        let items = vec![
            item(0, format!("{}/a.jpg", mock_server.uri()), None),
            item(1, format!("{}/b.jpg", mock_server.uri()), None),
        ];

        let report = orchestrator.run(items, |_| {}).await;

        assert_eq!((report.success_count, report.fail_count), (0, 2));
        assert_eq!(*library.attempts.lock().unwrap(), 2);
        assert!(report.any_auth_denied());
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.state == ItemState::SaveFailed)
        );
    }

    #[tokio::test]
    async fn test_run_selection_logs_each_item_when_it_finishes() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/fast.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"slow")
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&mock_server)
            .await;

        let urls: Vec<String> = ["fast.jpg", "slow.jpg"]
            .iter()
            .map(|name| format!("{}/{name}", mock_server.uri()))
            .collect();
        let entries = urls
            .iter()
            .enumerate()
            .map(|(index, url)| ImageEntry {
                raw_url: url.clone(),
                display_url: url.clone(),
                selected: true,
                index,
                is_cover: index == 0,
            })
            .collect();
        let result = ParseResult {
            platform: None,
            image_url: urls[0].clone(),
            all_images: urls.clone(),
            no_watermark_image_url: None,
            note_id: None,
            target_url: None,
        };
        let mut session = Session::new();
        session.replace_entries(result, entries);

        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let report = DownloadOrchestrator::new(&client, &library)
            .run_selection(&mut session, |_| {})
            .await;
        assert_eq!((report.success_count, report.fail_count), (1, 1));

        let log: Vec<&LogEntry> = session.log().iter().collect();
        let messages: Vec<&str> = log.iter().map(|e| e.message.as_str()).collect();
        let start = messages.iter().position(|m| *m == "downloading 2 image(s)").unwrap();
        assert!(messages[start + 1].starts_with("image 1 "), "{messages:?}");
        assert!(messages[start + 2].starts_with("image 2 saved to "), "{messages:?}");
        assert_eq!(messages[start + 3], "download finished: 1 saved, 1 failed");
        assert!(log.windows(2).all(|pair| pair[0].at <= pair[1].at));

        // The first item is logged before the slow second fetch, not at batch end.
        let first_done = log[start + 1].at;
        let finished = log[start + 3].at;
        let gap = finished.duration_since(first_done).unwrap();
        assert!(gap >= Duration::from_millis(300), "gap was {gap:?}");
    }

    #[tokio::test]
    async fn test_run_empty_batch_reports_zero() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new();
        let library = DirectoryLibrary::new(temp_dir.path());
        let report = DownloadOrchestrator::new(&client, &library)
            .run(Vec::new(), |_| {})
            .await;
        assert_eq!(report.total(), 0);
    }
}
