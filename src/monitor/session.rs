//! Monitoring session controller.
//!
//! Owns the tail engine's lifecycle: idempotent start/stop, status
//! reporting, and full teardown of watch handles and tracked state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_full::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::ConfigStore;
use crate::webhook::WebhookNotifier;

use super::discovery::discover_bot_folders;
use super::engine::TailEngine;
use super::event::{MonitorStatus, MonitorUpdate};

/// Window for collapsing bursts of change notifications into one pass.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Capacity of the observer update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Result of a start or stop request.
///
/// Double start and double stop are rejected with `success: false` and a
/// descriptive message; they are expected states, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlResult {
    pub success: bool,
    pub message: String,
}

impl ControlResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Resources held while monitoring is active.
struct ActiveMonitor {
    engine: Arc<Mutex<TailEngine>>,
    /// Dropping the debouncer releases every OS watch handle and discards
    /// pending debounce timers.
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

/// One monitoring session per process, constructed explicitly by the entry
/// point and driven through `start`/`stop`/`status`.
///
/// The exclusive receiver (`&mut self`) on `start`/`stop` serializes
/// lifecycle changes; the active check happens before any asynchronous
/// discovery work begins.
pub struct MonitorSession {
    store: ConfigStore,
    updates: broadcast::Sender<MonitorUpdate>,
    active: Option<ActiveMonitor>,
}

impl MonitorSession {
    /// Create a stopped session reading configuration from `store`.
    #[must_use]
    pub fn new(store: ConfigStore) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            updates,
            active: None,
        }
    }

    /// Subscribe to status, activity, and event updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorUpdate> {
        self.updates.subscribe()
    }

    /// Start monitoring.
    ///
    /// Takes a fresh configuration snapshot, discovers bot log folders,
    /// registers watches, and spawns the engine task. Zero discovered
    /// folders is a successful start: monitoring is on but inert.
    /// Configuration changes while active require a stop/start cycle.
    pub async fn start(&mut self) -> ControlResult {
        if self.active.is_some() {
            return ControlResult::rejected("Monitoring is already active");
        }

        let config = match self.store.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                return ControlResult::rejected(format!("Failed to load configuration: {e}"));
            }
        };

        if config.base_log_directory.trim().is_empty() {
            return ControlResult::rejected("No log directory configured");
        }

        let root = PathBuf::from(&config.base_log_directory);
        let bot_names: Vec<String> = config.bots.keys().cloned().collect();
        let folders = discover_bot_folders(&root, &bot_names, config.vip_features);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut debouncer = match new_debouncer(
            DEBOUNCE_WINDOW,
            None,
            move |result: DebounceEventResult| {
                let _ = event_tx.send(result);
            },
        ) {
            Ok(debouncer) => debouncer,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create file watcher");
                return ControlResult::rejected(format!("Failed to create file watcher: {e}"));
            }
        };

        let notifier = WebhookNotifier::new(&config);
        let mut engine = TailEngine::new(notifier, self.updates.clone());

        for folder in &folders {
            // Watcher failures are isolated to the folder; the session
            // continues with the remaining watches.
            if let Err(e) = debouncer.watch(&folder.path, RecursiveMode::NonRecursive) {
                tracing::warn!(path = %folder.path.display(), error = %e, "Failed to watch bot folder");
                continue;
            }
            engine.add_folder(folder.path.clone(), folder.bot.clone());
            engine.scan_folder(&folder.path, &folder.bot).await;
        }

        let status = engine.status(true);
        tracing::info!(
            folders = status.watched_folders.len(),
            files = status.watched_files.len(),
            "Monitoring started"
        );

        let engine = Arc::new(Mutex::new(engine));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_engine(Arc::clone(&engine), event_rx, cancel.clone()));

        self.active = Some(ActiveMonitor {
            engine,
            debouncer,
            cancel,
            task,
        });
        let _ = self.updates.send(MonitorUpdate::Status(status));

        ControlResult::ok("Monitoring started successfully")
    }

    /// Stop monitoring and release every watch handle.
    ///
    /// Pending debounce timers are discarded before this returns, so no
    /// stale read fires after a stop completes. Notification deliveries
    /// already in flight finish independently.
    pub async fn stop(&mut self) -> ControlResult {
        let Some(active) = self.active.take() else {
            return ControlResult::rejected("Monitoring is not active");
        };

        let ActiveMonitor {
            engine,
            debouncer,
            cancel,
            task,
        } = active;

        drop(debouncer);
        cancel.cancel();
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Engine task terminated abnormally");
        }

        engine.lock().await.clear();
        tracing::info!("Monitoring stopped");
        let _ = self
            .updates
            .send(MonitorUpdate::Status(MonitorStatus::stopped()));

        ControlResult::ok("Monitoring stopped successfully")
    }

    /// Current status; always available regardless of state.
    pub async fn status(&self) -> MonitorStatus {
        match &self.active {
            Some(active) => active.engine.lock().await.status(true),
            None => MonitorStatus::stopped(),
        }
    }
}

/// Engine task: drains debounced watcher events until cancelled.
async fn run_engine(
    engine: Arc<Mutex<TailEngine>>,
    mut event_rx: mpsc::UnboundedReceiver<DebounceEventResult>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            result = event_rx.recv() => match result {
                Some(Ok(events)) => {
                    let mut engine = engine.lock().await;
                    for event in &events {
                        engine.handle_event(event).await;
                    }
                }
                Some(Err(errors)) => {
                    for error in errors {
                        tracing::warn!(error = %error, "File watcher error");
                    }
                }
                None => break,
            },
        }
    }
}
