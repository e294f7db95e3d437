use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::types::DownloadStatus;
use crate::error::MonitorError;
use super::observer::DownloadObserver;
use super::source::ProgressSource;

/// How often an active download is polled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Pause between a completed poll and the view refresh.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(2000);

/// Tuning for one monitoring session.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between scheduled polls.
    pub poll_interval: Duration,
    /// Delay between a `completed` report and the single `on_refresh` call.
    pub refresh_delay: Duration,
    /// Extra attempts allowed when a poll fails transiently. 0 keeps the
    /// fail-fast behavior: the first failed poll ends the session.
    pub max_retries: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            refresh_delay: DEFAULT_REFRESH_DELAY,
            max_retries: 0,
        }
    }
}

/// How a monitoring session ended.
#[derive(Debug)]
pub enum MonitorOutcome {
    /// The backend reported `completed` and the refresh notification ran.
    Completed,
    /// The backend reported `error`, or polling itself failed.
    Failed(MonitorError),
    /// [`MonitorHandle::stop`] ended the session first.
    Cancelled,
}

impl MonitorOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MonitorOutcome::Completed)
    }
}

/// Polls one download's progress until a terminal status arrives and fans
/// the reports out to all registered observers.
///
/// The monitor owns nothing but the schedule; every user-visible effect
/// (rendering progress, notices, the post-completion refresh) lives in the
/// observers.
///
/// # Lifecycle
///
/// | Poll result              | Observer method called               |
/// |--------------------------|--------------------------------------|
/// | non-terminal status      | `on_progress(&progress)`             |
/// | `completed`              | `on_complete`, later `on_refresh`    |
/// | `error`                  | `on_error(&message)` then stops      |
/// | poll failure             | `on_error(&message)` then stops      |
pub struct DownloadMonitor {
    source: Arc<dyn ProgressSource>,
    config: MonitorConfig,
    observers: Vec<Box<dyn DownloadObserver>>,
}

impl DownloadMonitor {
    pub fn new(source: Arc<dyn ProgressSource>) -> Self {
        Self::with_config(source, MonitorConfig::default())
    }

    pub fn with_config(source: Arc<dyn ProgressSource>, config: MonitorConfig) -> Self {
        Self {
            source,
            config,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Must be called before `start()`.
    pub fn add_observer(&mut self, observer: Box<dyn DownloadObserver>) {
        self.observers.push(observer);
    }

    /// Spawn the polling task for `download_id`.
    ///
    /// The first poll happens one full interval after this call, matching
    /// the interval timer the web front end armed on download start.
    pub fn start(self, download_id: impl Into<String>) -> MonitorHandle {
        let download_id = download_id.into();
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let task = tokio::spawn(async move {
            run(
                self.source,
                self.observers,
                self.config,
                download_id,
                task_token,
            )
            .await
        });
        MonitorHandle { cancel_token, task }
    }
}

/// Handle to a running monitoring session.
pub struct MonitorHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    /// Stop polling. Safe at any point, including while a poll is in
    /// flight: the in-flight request is dropped and none of its data
    /// reaches observers.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the polling task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn join(self) -> MonitorOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("[monitor] polling task aborted: {}", err);
                MonitorOutcome::Cancelled
            }
        }
    }
}

async fn run(
    source: Arc<dyn ProgressSource>,
    observers: Vec<Box<dyn DownloadObserver>>,
    config: MonitorConfig,
    download_id: String,
    cancel_token: CancellationToken,
) -> MonitorOutcome {
    let mut ticker = tokio::time::interval(config.poll_interval);
    // A slow poll must push the next tick out, never let it fire early.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() yields its first tick immediately; consume it so the
    // first poll lands one full interval after start.
    ticker.tick().await;

    let mut retries: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log::debug!("[monitor] {}: stopped before next poll", download_id);
                return MonitorOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        // One scheduled poll, plus its retry chain when a budget is set.
        // Retries re-poll after a short backoff instead of waiting for the
        // next tick; a successful poll resets the budget.
        let progress = loop {
            let result = tokio::select! {
                _ = cancel_token.cancelled() => {
                    log::debug!("[monitor] {}: stopped mid-poll", download_id);
                    return MonitorOutcome::Cancelled;
                }
                result = source.poll(&download_id) => result,
            };

            match result {
                Ok(progress) => {
                    retries = 0;
                    break progress;
                }
                Err(err) if err.is_transient() && retries < config.max_retries => {
                    // Exponential backoff: 100ms, 200ms, 400ms
                    let delay_ms = 100u64 * (1u64 << retries.min(5));
                    retries += 1;
                    log::warn!(
                        "[monitor] {}: poll failed ({}), retry {}/{} in {}ms",
                        download_id, err, retries, config.max_retries, delay_ms
                    );
                    tokio::select! {
                        _ = cancel_token.cancelled() => return MonitorOutcome::Cancelled,
                        _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                    }
                }
                Err(err) => {
                    log::error!("[monitor] {}: polling halted: {}", download_id, err);
                    let message = err.to_string();
                    for observer in &observers {
                        observer.on_error(&message).await;
                    }
                    return MonitorOutcome::Failed(MonitorError::Poll(err));
                }
            }
        };

        match &progress.status {
            DownloadStatus::Completed => {
                log::info!("[monitor] {}: completed", download_id);
                for observer in &observers {
                    observer.on_complete(&progress).await;
                }
                tokio::select! {
                    _ = cancel_token.cancelled() => return MonitorOutcome::Cancelled,
                    _ = tokio::time::sleep(config.refresh_delay) => {}
                }
                for observer in &observers {
                    observer.on_refresh().await;
                }
                return MonitorOutcome::Completed;
            }
            DownloadStatus::Error => {
                log::warn!(
                    "[monitor] {}: download failed: {}",
                    download_id, progress.message
                );
                for observer in &observers {
                    observer.on_error(&progress.message).await;
                }
                return MonitorOutcome::Failed(MonitorError::Terminal(progress.message));
            }
            _ => {
                log::debug!(
                    "[monitor] {}: {} {:.0}% {}",
                    download_id, progress.status, progress.progress, progress.message
                );
                for observer in &observers {
                    observer.on_progress(&progress).await;
                }
            }
        }
    }
}
