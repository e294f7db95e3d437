use async_trait::async_trait;

use crate::api::client::ApiClient;
use crate::api::types::DownloadProgress;
use crate::error::ApiError;

/// Where the monitor gets its progress reports from.
///
/// [`ApiClient`] is the production source; tests substitute scripted ones.
#[async_trait]
pub trait ProgressSource: Send + Sync + 'static {
    /// Fetch the current progress of `download_id`.
    async fn poll(&self, download_id: &str) -> Result<DownloadProgress, ApiError>;
}

#[async_trait]
impl ProgressSource for ApiClient {
    async fn poll(&self, download_id: &str) -> Result<DownloadProgress, ApiError> {
        self.download_progress(download_id).await
    }
}
