//! Tail engine: reacts to debounced file-system events for the watched
//! bot folders, tracks per-file read offsets, and feeds new lines through
//! classification and dispatch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use notify_debouncer_full::notify::EventKind;
use notify_debouncer_full::DebouncedEvent;
use tokio::sync::broadcast;

use crate::webhook::WebhookNotifier;

use super::discovery::is_log_file;
use super::event::{LogActivity, LogEvent, MonitorStatus, MonitorUpdate};
use super::tailer::LogTailer;

/// State for one actively tailed log file.
#[derive(Debug)]
struct TrackedFile {
    /// Owning bot identity.
    bot: String,
    /// Incremental reader with the file's read offset.
    tailer: LogTailer,
    /// Hash of the last processed chunk, for duplicate suppression.
    last_hash: Option<u64>,
}

/// The tail engine owns the watch maps and processes file-system events.
///
/// It is driven by the session task; nothing else mutates its state.
pub(crate) struct TailEngine {
    /// Watched folder path -> owning bot.
    folders: BTreeMap<PathBuf, String>,
    /// Watched file path -> tracking state.
    files: BTreeMap<PathBuf, TrackedFile>,
    notifier: WebhookNotifier,
    updates: broadcast::Sender<MonitorUpdate>,
}

impl TailEngine {
    pub(crate) fn new(notifier: WebhookNotifier, updates: broadcast::Sender<MonitorUpdate>) -> Self {
        Self {
            folders: BTreeMap::new(),
            files: BTreeMap::new(),
            notifier,
            updates,
        }
    }

    /// Register a watched bot folder.
    pub(crate) fn add_folder(&mut self, path: PathBuf, bot: String) {
        self.folders.insert(path, bot);
    }

    /// Scan a folder for existing log files and begin tailing each at its
    /// current size. Content written before monitoring starts is never
    /// replayed.
    pub(crate) async fn scan_folder(&mut self, folder: &Path, bot: &str) {
        let mut entries = match tokio::fs::read_dir(folder).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %folder.display(), error = %e, "Failed to list bot folder");
                return;
            }
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
                    if is_file && is_log_file(&name) {
                        self.track_file(entry.path(), bot.to_string()).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(path = %folder.display(), error = %e, "Failed to read folder entry");
                    break;
                }
            }
        }
    }

    /// Begin tailing a file at its current size.
    ///
    /// Returns `true` if the file was newly added to the watch set.
    pub(crate) async fn track_file(&mut self, path: PathBuf, bot: String) -> bool {
        if self.files.contains_key(&path) {
            return false;
        }

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to stat log file");
                return false;
            }
        };

        tracing::info!(path = %path.display(), bot = %bot, offset = size, "Watching log file");
        let tailer = LogTailer::new(path.clone(), size);
        self.files.insert(
            path,
            TrackedFile {
                bot,
                tailer,
                last_hash: None,
            },
        );
        true
    }

    /// Current watch-set snapshot.
    pub(crate) fn status(&self, is_monitoring: bool) -> MonitorStatus {
        MonitorStatus {
            is_monitoring,
            watched_files: self.files.keys().map(|p| p.display().to_string()).collect(),
            watched_folders: self
                .folders
                .keys()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }

    /// Release all tracked state (watch maps and dedup cache).
    pub(crate) fn clear(&mut self) {
        self.files.clear();
        self.folders.clear();
    }

    /// Handle one debounced file-system event.
    pub(crate) async fn handle_event(&mut self, event: &DebouncedEvent) {
        match event.kind {
            EventKind::Create(_) => {
                for path in &event.paths {
                    self.handle_created(path).await;
                }
            }
            EventKind::Modify(_) => {
                for path in &event.paths {
                    self.process_file(path).await;
                }
            }
            EventKind::Remove(_) => {
                for path in &event.paths {
                    if let Some(tracked) = self.files.get_mut(path.as_path()) {
                        tracing::debug!(path = %path.display(), "Watched file removed, resetting offset");
                        tracked.tailer.reset();
                    }
                }
            }
            _ => {}
        }
    }

    /// Handle a file created inside a watched folder.
    async fn handle_created(&mut self, path: &Path) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };
        if !is_log_file(&name) {
            return;
        }

        if self.files.contains_key(path) {
            // Recreated after rotation: content present at creation time is
            // treated as already seen, never re-ingested from zero.
            match tokio::fs::metadata(path).await {
                Ok(meta) => {
                    tracing::debug!(path = %path.display(), size = meta.len(), "Watched file recreated");
                    if let Some(tracked) = self.files.get_mut(path) {
                        tracked.tailer = LogTailer::new(path.to_path_buf(), meta.len());
                    }
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Recreated file vanished before stat");
                }
            }
            return;
        }

        let Some(parent) = path.parent() else { return };
        let Some(bot) = self.folders.get(parent).cloned() else {
            return;
        };

        tracing::info!(path = %path.display(), bot = %bot, "New log file detected");
        if self.track_file(path.to_path_buf(), bot).await {
            let status = self.status(true);
            let _ = self.updates.send(MonitorUpdate::Status(status));
        }
    }

    /// Process newly appended content for a tracked file.
    pub(crate) async fn process_file(&mut self, path: &Path) {
        let Some(tracked) = self.files.get_mut(path) else {
            return;
        };

        let chunk = match tracked.tailer.read_appended().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => return,
            Err(e) => {
                // Offset is untouched; the next change event retries the
                // same range.
                tracing::warn!(path = %path.display(), error = %e, "Failed to read appended content");
                return;
            }
        };

        if tracked.last_hash == Some(chunk.hash) {
            tracing::debug!(path = %path.display(), "Duplicate chunk, skipping");
            return;
        }
        tracked.last_hash = Some(chunk.hash);

        if chunk.lines.is_empty() {
            return;
        }

        let bot = tracked.bot.clone();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let _ = self.updates.send(MonitorUpdate::Activity(LogActivity {
            bot: bot.clone(),
            file_name: file_name.clone(),
            file_path: path.to_path_buf(),
            timestamp: Utc::now(),
        }));

        for line in &chunk.lines {
            if let Some(event) = LogEvent::from_line(line, &bot, &file_name) {
                tracing::debug!(bot = %event.bot, kind = %event.kind, "Event detected");
                let _ = self.updates.send(MonitorUpdate::Event(event.clone()));

                // Fire-and-forget: tailing never waits on delivery.
                let notifier = self.notifier.clone();
                tokio::spawn(async move {
                    notifier.dispatch(&event).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::monitor::event::LogEventKind;
    use tempfile::TempDir;
    use tokio::sync::broadcast::error::TryRecvError;

    fn test_engine() -> (TailEngine, broadcast::Receiver<MonitorUpdate>) {
        // No webhook URLs configured: dispatch resolves to skipped and
        // performs no network calls.
        let (tx, rx) = broadcast::channel(64);
        let notifier = WebhookNotifier::new(&AppConfig::default());
        (TailEngine::new(notifier, tx), rx)
    }

    fn drain_events(rx: &mut broadcast::Receiver<MonitorUpdate>) -> Vec<LogEvent> {
        let mut events = Vec::new();
        while let Ok(update) = rx.try_recv() {
            if let MonitorUpdate::Event(event) = update {
                events.push(event);
            }
        }
        events
    }

    #[tokio::test]
    async fn test_track_file_seeds_offset_at_current_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "[INFO] CHAT: old content\n").unwrap();

        let (mut engine, mut rx) = test_engine();
        assert!(engine.track_file(path.clone(), "Bot1".to_string()).await);

        let tracked = engine.files.get(&path).unwrap();
        assert_eq!(tracked.tailer.offset(), 25);

        // Pre-existing content is never replayed.
        engine.process_file(&path).await;
        assert!(drain_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_track_file_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, _rx) = test_engine();
        assert!(engine.track_file(path.clone(), "Bot1".to_string()).await);
        assert!(!engine.track_file(path.clone(), "Bot1".to_string()).await);
        assert_eq!(engine.files.len(), 1);
    }

    #[tokio::test]
    async fn test_process_file_classifies_lines_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, mut rx) = test_engine();
        engine.track_file(path.clone(), "Woodcutter1".to_string()).await;

        std::fs::write(
            &path,
            "[INFO] CHAT: gz\n\
             [INFO] walking to bank\n\
             you've just advanced your Fishing level. You are now level 50\n",
        )
        .unwrap();
        engine.process_file(&path).await;

        let events = drain_events(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, LogEventKind::Chat);
        assert_eq!(events[0].bot, "Woodcutter1");
        assert_eq!(events[0].source_file, "console.log");
        assert_eq!(events[1].kind, LogEventKind::LevelUp);
        assert_eq!(events[1].attr("skill"), Some("Fishing"));
        assert_eq!(events[1].attr("level"), Some("50"));
    }

    #[tokio::test]
    async fn test_process_file_emits_activity_for_unmatched_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, mut rx) = test_engine();
        engine.track_file(path.clone(), "Bot1".to_string()).await;

        std::fs::write(&path, "[INFO] nothing interesting\n").unwrap();
        engine.process_file(&path).await;

        let update = rx.try_recv().unwrap();
        match update {
            MonitorUpdate::Activity(activity) => {
                assert_eq!(activity.bot, "Bot1");
                assert_eq!(activity.file_name, "console.log");
                assert_eq!(activity.file_path, path);
            }
            other => panic!("Expected activity update, got {other:?}"),
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_duplicate_chunk_is_suppressed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, mut rx) = test_engine();
        engine.track_file(path.clone(), "Bot1".to_string()).await;

        std::fs::write(&path, "[INFO] CHAT: gz\n").unwrap();
        engine.process_file(&path).await;
        assert_eq!(drain_events(&mut rx).len(), 1);

        // Simulate the same byte range being delivered twice: rewind the
        // offset without touching the dedup hash.
        engine.files.get_mut(&path).unwrap().tailer.reset();
        engine.process_file(&path).await;
        assert!(drain_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_rotation_recovery_reads_from_zero() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "a long line of earlier content to push the offset out\n").unwrap();

        let (mut engine, mut rx) = test_engine();
        engine.track_file(path.clone(), "Bot1".to_string()).await;
        let old_offset = engine.files.get(&path).unwrap().tailer.offset();
        assert!(old_offset > 20);

        // Rotate: new, shorter content below the old offset.
        std::fs::write(&path, "[INFO] CHAT: gz\n").unwrap();
        engine.process_file(&path).await;

        let events = drain_events(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LogEventKind::Chat);
        assert!(engine.files.get(&path).unwrap().tailer.offset() < old_offset);
    }

    #[tokio::test]
    async fn test_handle_created_tracks_new_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().to_path_buf();
        let path = folder.join("session.log");

        let (mut engine, mut rx) = test_engine();
        engine.add_folder(folder.clone(), "Bot1".to_string());

        std::fs::write(&path, "").unwrap();
        engine.handle_created(&path).await;

        assert!(engine.files.contains_key(&path));
        match rx.try_recv().unwrap() {
            MonitorUpdate::Status(status) => {
                assert!(status.is_monitoring);
                assert_eq!(status.watched_files, vec![path.display().to_string()]);
            }
            other => panic!("Expected status update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_created_ignores_non_log_files() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().to_path_buf();
        let path = folder.join("screenshot.png");

        let (mut engine, _rx) = test_engine();
        engine.add_folder(folder, "Bot1".to_string());

        std::fs::write(&path, "").unwrap();
        engine.handle_created(&path).await;
        assert!(engine.files.is_empty());
    }

    #[tokio::test]
    async fn test_handle_created_ignores_unwatched_folders() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stray.log");

        let (mut engine, _rx) = test_engine();
        std::fs::write(&path, "").unwrap();
        engine.handle_created(&path).await;
        assert!(engine.files.is_empty());
    }

    #[tokio::test]
    async fn test_recreated_file_starts_at_current_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, mut rx) = test_engine();
        engine.add_folder(temp_dir.path().to_path_buf(), "Bot1".to_string());
        engine.track_file(path.clone(), "Bot1".to_string()).await;

        // Rotation: the file is replaced and a create event fires with
        // content already present.
        std::fs::write(&path, "[INFO] CHAT: should not replay\n").unwrap();
        engine.handle_created(&path).await;

        assert_eq!(engine.files.get(&path).unwrap().tailer.offset(), 31);
        engine.process_file(&path).await;
        assert!(drain_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_scan_folder_tracks_only_log_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("console.log"), "hello\n").unwrap();
        std::fs::write(temp_dir.path().join("chat.txt"), "hello\n").unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{}").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.log")).unwrap();

        let (mut engine, _rx) = test_engine();
        engine.scan_folder(temp_dir.path(), "Bot1").await;

        assert_eq!(engine.files.len(), 2);
        assert!(engine.files.contains_key(&temp_dir.path().join("console.log")));
        assert!(engine.files.contains_key(&temp_dir.path().join("chat.txt")));
    }

    #[tokio::test]
    async fn test_clear_releases_all_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.log");
        std::fs::write(&path, "").unwrap();

        let (mut engine, _rx) = test_engine();
        engine.add_folder(temp_dir.path().to_path_buf(), "Bot1".to_string());
        engine.track_file(path, "Bot1".to_string()).await;

        engine.clear();
        let status = engine.status(false);
        assert_eq!(status, MonitorStatus::stopped());
    }
}
