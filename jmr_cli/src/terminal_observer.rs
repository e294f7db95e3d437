use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use jmr_core::api::client::ApiClient;
use jmr_core::api::types::DownloadProgress;
use jmr_core::monitor::observer::DownloadObserver;

/// Renders download progress as an indicatif terminal bar.
///
/// The bar position mirrors the backend's percentage and the bar message
/// mirrors its status text. After the refresh delay the observer re-fetches
/// the library listing, standing in for the page reload of the web UI.
pub struct TerminalProgressObserver {
    client: Arc<ApiClient>,
    /// Lazily initialised on the first callback so nothing is drawn for a
    /// task that never reports.
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgressObserver {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            bar: Mutex::new(None),
        }
    }

    fn ensure_bar(&self) -> ProgressBar {
        let mut bar = self.bar.lock().unwrap();
        if bar.is_none() {
            let style = ProgressStyle::with_template("[{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap()
                .progress_chars("=>-");

            let pb = ProgressBar::new(100);
            pb.set_style(style);
            *bar = Some(pb);
        }
        bar.as_ref().unwrap().clone()
    }
}

#[async_trait]
impl DownloadObserver for TerminalProgressObserver {
    async fn on_progress(&self, progress: &DownloadProgress) {
        let pb = self.ensure_bar();
        pb.set_position(progress.progress.clamp(0.0, 100.0).round() as u64);
        pb.set_message(progress.message.clone());
    }

    async fn on_complete(&self, progress: &DownloadProgress) {
        let pb = self.ensure_bar();
        pb.set_position(100);
        let message = if progress.message.is_empty() {
            "Download complete".to_string()
        } else {
            progress.message.clone()
        };
        pb.finish_with_message(message);
    }

    async fn on_error(&self, error: &str) {
        let pb = self.ensure_bar();
        pb.abandon_with_message(format!("Error: {}", error));
    }

    async fn on_refresh(&self) {
        // The web UI reloads the whole page at this point; the closest a
        // terminal gets is reprinting the library.
        match self.client.downloaded_comics().await {
            Ok(comics) => {
                println!(
                    "Library now holds {} comic{}:",
                    comics.len(),
                    if comics.len() == 1 { "" } else { "s" }
                );
                for comic in comics {
                    println!("  JM{}  {}", comic.id, comic.title);
                }
            }
            Err(err) => log::warn!("[cli] library refresh failed: {}", err),
        }
    }
}
