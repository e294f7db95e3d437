pub mod observer;
pub mod poller;
pub mod source;

// Convenient re-exports
pub use observer::DownloadObserver;
pub use poller::{
    DownloadMonitor, MonitorConfig, MonitorHandle, MonitorOutcome, DEFAULT_POLL_INTERVAL,
    DEFAULT_REFRESH_DELAY,
};
pub use source::ProgressSource;
