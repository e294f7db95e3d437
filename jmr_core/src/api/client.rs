use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::api::types::{
    CacheCleared, CacheStatus, ComicInfo, DownloadProgress, DownloadedComic, Envelope, ReadInfo,
    SortOrder, StartDownloadResponse, StartOutcome,
};
use crate::error::ApiError;

/// Backend address of a locally-run reader instance.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Typed client for the comic-reader backend.
///
/// One method per endpoint. Every endpoint except `start_download` answers
/// in the shared [`Envelope`] shape; `start_download` answers flat.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for the backend at `base_url`, including the `/api`
    /// prefix (e.g. `http://127.0.0.1:5000/api`). Trailing slashes are
    /// trimmed so per-endpoint path formatting stays uniform.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build HTTP client"),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /search/jm/{id}`: exact lookup by JM id.
    pub async fn search_by_id(&self, jm_id: u64) -> Result<ComicInfo, ApiError> {
        self.get_enveloped(&format!("{}/search/jm/{}", self.base_url, jm_id))
            .await
    }

    /// `GET /search/keyword`: fuzzy search, ordered by `sort`.
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortOrder,
    ) -> Result<Vec<ComicInfo>, ApiError> {
        let url = format!("{}/search/keyword", self.base_url);
        log::debug!("[api] GET {} keyword={:?} sort={}", url, keyword, sort.as_str());
        let resp = self
            .client
            .get(&url)
            .query(&[("keyword", keyword), ("sort", sort.as_str())])
            .send()
            .await?;
        Self::decode_enveloped(resp).await
    }

    /// `POST /download/{id}`: ask the backend to start downloading a comic.
    pub async fn start_download(&self, jm_id: u64) -> Result<StartOutcome, ApiError> {
        let url = format!("{}/download/{}", self.base_url, jm_id);
        log::debug!("[api] POST {}", url);
        let resp = self.client.post(&url).send().await?;
        let resp = Self::check_status(resp)?;
        let raw: StartDownloadResponse = resp.json().await?;
        raw.into_outcome()
    }

    /// `GET /download/progress/{id}`: one poll of an active download task.
    pub async fn download_progress(&self, download_id: &str) -> Result<DownloadProgress, ApiError> {
        self.get_enveloped(&format!(
            "{}/download/progress/{}",
            self.base_url, download_id
        ))
        .await
    }

    /// `DELETE /delete/{id}`: remove a downloaded comic. Returns the
    /// backend's confirmation message.
    pub async fn delete_comic(&self, jm_id: u64) -> Result<String, ApiError> {
        let url = format!("{}/delete/{}", self.base_url, jm_id);
        log::debug!("[api] DELETE {}", url);
        let resp = self.client.delete(&url).send().await?;
        let resp = Self::check_status(resp)?;
        let envelope: Envelope<serde_json::Value> = resp.json().await?;
        envelope.into_ack()
    }

    /// `GET /downloaded`: the local library, newest first.
    pub async fn downloaded_comics(&self) -> Result<Vec<DownloadedComic>, ApiError> {
        self.get_enveloped(&format!("{}/downloaded", self.base_url))
            .await
    }

    /// `GET /read/{id}`: reader data, opened at the first chapter.
    pub async fn read_info(&self, jm_id: u64) -> Result<ReadInfo, ApiError> {
        self.get_enveloped(&format!("{}/read/{}", self.base_url, jm_id))
            .await
    }

    /// `GET /read/{id}/chapter/{chapter_id}`: reader data for one chapter.
    pub async fn read_chapter(&self, jm_id: u64, chapter_id: &str) -> Result<ReadInfo, ApiError> {
        self.get_enveloped(&format!(
            "{}/read/{}/chapter/{}",
            self.base_url, jm_id, chapter_id
        ))
        .await
    }

    /// `GET /cache/status`: size of the backend's conversion cache.
    pub async fn cache_status(&self) -> Result<CacheStatus, ApiError> {
        self.get_enveloped(&format!("{}/cache/status", self.base_url))
            .await
    }

    /// `POST /cache/clear`: drop cached conversion artifacts.
    pub async fn clear_cache(&self) -> Result<CacheCleared, ApiError> {
        let url = format!("{}/cache/clear", self.base_url);
        log::debug!("[api] POST {}", url);
        let resp = self.client.post(&url).send().await?;
        Self::decode_enveloped(resp).await
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        log::debug!("[api] GET {}", url);
        let resp = self.client.get(url).send().await?;
        Self::decode_enveloped(resp).await
    }

    async fn decode_enveloped<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let resp = Self::check_status(resp)?;
        let envelope: Envelope<T> = resp.json().await?;
        envelope.into_result()
    }

    fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(ApiError::Http(status))
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
