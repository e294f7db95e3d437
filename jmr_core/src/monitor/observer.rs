use async_trait::async_trait;

use crate::api::types::DownloadProgress;

/// Trait for anything that wants to observe a monitored download.
///
/// The `DownloadMonitor` calls these methods on all registered observers
/// as poll responses arrive from the backend.
///
/// Lifecycle:
/// - `on_progress` is called for every non-terminal poll response, in poll
///   order, with the payload exactly as the backend reported it.
/// - `on_complete` is called once when a poll reports `completed`.
/// - `on_error` is called once, either when a poll reports `error` or when
///   polling itself halts on a failure.
/// - `on_refresh` is called once, a fixed delay after `on_complete`, so
///   views can reload now that the library changed. It never follows
///   `on_error`.
#[async_trait]
pub trait DownloadObserver: Send + Sync + 'static {
    /// Called with each non-terminal progress payload.
    async fn on_progress(&self, progress: &DownloadProgress);

    /// Called when the download reports completion.
    async fn on_complete(&self, progress: &DownloadProgress);

    /// Called when the download fails or polling halts.
    async fn on_error(&self, error: &str);

    /// Called once the post-completion delay has elapsed.
    async fn on_refresh(&self);
}
