//! Progress bar for download batches.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use linkgrab_core::download::ItemOutcome;

/// Per-item progress bar; a no-op when disabled.
pub(crate) struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Creates the bar when `enabled` and the batch is not empty.
    pub(crate) fn new(total: usize, enabled: bool) -> Self {
        if !enabled || total == 0 {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {bar:30} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("downloading...");
        Self { bar: Some(bar) }
    }

    #[cfg(test)]
    pub(crate) fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    /// Advances the bar for one finished item.
    pub(crate) fn on_item(&self, outcome: &ItemOutcome) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("image {} {}", outcome.index + 1, outcome.state));
            bar.inc(1);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
