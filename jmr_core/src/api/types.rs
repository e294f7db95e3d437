use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Outer wrapper shared by the backend's JSON endpoints:
/// `{ "success": bool, "data": ..., "message": ... }`.
///
/// `data` and `message` are both optional on the wire; which one is present
/// depends on `success` and on the endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the envelope: `data` on success, the carried message as a
    /// [`ApiError::Backend`] otherwise.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.success {
            self.data
                .ok_or_else(|| ApiError::Backend("response carried no data".into()))
        } else {
            Err(ApiError::Backend(
                self.message.unwrap_or_else(|| "request failed".into()),
            ))
        }
    }

    /// Unwrap an envelope whose success payload is just a confirmation
    /// message, as the delete endpoint answers. Returns the message.
    pub fn into_ack(self) -> Result<String, ApiError> {
        if self.success {
            Ok(self.message.unwrap_or_default())
        } else {
            Err(ApiError::Backend(
                self.message.unwrap_or_else(|| "request failed".into()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Download progress
// ---------------------------------------------------------------------------

/// Backend-reported state of a download task.
///
/// The vocabulary is owned by the backend and live servers emit phases
/// beyond the documented four (`starting`, `preparing`, `processing`, ...),
/// so unknown strings are preserved instead of rejected. Terminality is the
/// only property the monitor relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DownloadStatus {
    Pending,
    Running,
    Completed,
    Error,
    /// Any status string the client does not specifically know.
    Other(String),
}

impl DownloadStatus {
    /// `completed` and `error` end monitoring; everything else keeps the
    /// poll loop alive.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Running => "running",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Error => "error",
            DownloadStatus::Other(s) => s,
        }
    }
}

impl From<String> for DownloadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => DownloadStatus::Pending,
            "running" => DownloadStatus::Running,
            "completed" => DownloadStatus::Completed,
            "error" => DownloadStatus::Error,
            _ => DownloadStatus::Other(s),
        }
    }
}

impl From<DownloadStatus> for String {
    fn from(status: DownloadStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report from `GET /download/progress/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub status: DownloadStatus,
    /// Percentage, 0 to 100.
    #[serde(default)]
    pub progress: f64,
    /// Backend-worded description of the current phase.
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Starting a download
// ---------------------------------------------------------------------------

/// Raw wire shape of `POST /download/{id}`. This endpoint answers flat
/// rather than in the common envelope.
#[derive(Debug, Deserialize)]
pub struct StartDownloadResponse {
    pub success: bool,
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Set by the backend when it refuses because the comic is already
    /// on disk.
    #[serde(default)]
    pub downloaded: bool,
}

/// Typed outcome of asking the backend to start a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A download task was created. `download_id` is the handle the
    /// progress endpoint polls.
    Started {
        download_id: String,
        message: String,
    },
    /// The backend refused because the comic is already downloaded. Not an
    /// error: callers decide whether to delete and go again.
    AlreadyDownloaded { message: String },
}

impl StartDownloadResponse {
    pub fn into_outcome(self) -> Result<StartOutcome, ApiError> {
        if self.success {
            let download_id = self
                .download_id
                .ok_or_else(|| ApiError::Backend("start response carried no download_id".into()))?;
            Ok(StartOutcome::Started {
                download_id,
                message: self.message.unwrap_or_default(),
            })
        } else if self.downloaded {
            Ok(StartOutcome::AlreadyDownloaded {
                message: self.message.unwrap_or_else(|| "already downloaded".into()),
            })
        } else {
            Err(ApiError::Backend(
                self.message
                    .unwrap_or_else(|| "download could not be started".into()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Comics
// ---------------------------------------------------------------------------

/// Comic metadata as returned by both search endpoints. Keyword results
/// carry a subset of the by-id fields, hence the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicInfo {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub favorites: u64,
    #[serde(default)]
    pub pages: u64,
}

/// An entry in the local library (`GET /downloaded`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedComic {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorites: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub cover_path: Option<String>,
    #[serde(default)]
    pub download_time: Option<String>,
    /// Null until the comic has been opened in the reader.
    #[serde(default)]
    pub last_read_time: Option<String>,
    #[serde(default)]
    pub read_progress: u64,
    #[serde(default)]
    pub file_size: u64,
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub index: u64,
}

/// Reader bootstrap data (`GET /read/{id}` and its per-chapter variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadInfo {
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub current_chapter: String,
    #[serde(default)]
    pub current_chapter_pages: u64,
    #[serde(default)]
    pub total_chapters: u64,
    #[serde(default)]
    pub comic_path: String,
}

// ---------------------------------------------------------------------------
// Cache maintenance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// Bytes currently held in the conversion cache.
    pub cache_size: u64,
    pub cache_size_mb: f64,
    /// Whether the backend thinks the cache is over its threshold.
    pub need_cleanup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheCleared {
    pub cleared_size: u64,
    #[serde(default)]
    pub cleared_size_mb: f64,
    #[serde(default)]
    pub remaining_size: u64,
    #[serde(default)]
    pub remaining_size_mb: f64,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Search input
// ---------------------------------------------------------------------------

/// Keyword-search result ordering. The backend defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
            SortOrder::Asc => "asc",
        }
    }
}

/// Classified search input. A run of ASCII digits is treated as a JM id,
/// anything else as a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Id(u64),
    Keyword(String),
}

impl SearchQuery {
    /// Classify raw user input. Blank input yields `None`; a digit run too
    /// long for a `u64` falls back to keyword search.
    pub fn parse(raw: &str) -> Option<SearchQuery> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse::<u64>() {
                return Some(SearchQuery::Id(id));
            }
        }
        Some(SearchQuery::Keyword(trimmed.to_string()))
    }
}

/// Human-readable byte formatting.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
