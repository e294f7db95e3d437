pub mod client;
pub mod types;

// Convenient re-exports
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use types::{
    format_bytes, CacheCleared, CacheStatus, Chapter, ComicInfo, DownloadProgress,
    DownloadStatus, DownloadedComic, Envelope, ReadInfo, SearchQuery, SortOrder,
    StartDownloadResponse, StartOutcome,
};
