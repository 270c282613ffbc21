//! Event and status types produced by the monitoring pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pattern::classify;

/// Kind of event extracted from a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogEventKind {
    Chat,
    Response,
    LevelUp,
    QuestStart,
    QuestComplete,
    BreakStarted,
    BreakOver,
    Death,
    ValuableDrop,
    BotStarted,
    BotStopped,
}

impl LogEventKind {
    /// Wire/name form of the kind, e.g. `LEVEL_UP`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "CHAT",
            Self::Response => "RESPONSE",
            Self::LevelUp => "LEVEL_UP",
            Self::QuestStart => "QUEST_START",
            Self::QuestComplete => "QUEST_COMPLETE",
            Self::BreakStarted => "BREAK_STARTED",
            Self::BreakOver => "BREAK_OVER",
            Self::Death => "DEATH",
            Self::ValuableDrop => "VALUABLE_DROP",
            Self::BotStarted => "BOT_STARTED",
            Self::BotStopped => "BOT_STOPPED",
        }
    }
}

impl std::fmt::Display for LogEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// What happened.
    pub kind: LogEventKind,
    /// Owning bot identity (log folder name).
    pub bot: String,
    /// File name the line came from.
    pub source_file: String,
    /// When the event was detected (not parsed from the line).
    pub timestamp: DateTime<Utc>,
    /// Kind-specific captures, e.g. `skill`/`level` for a level-up.
    pub attributes: BTreeMap<String, String>,
    /// The original unmodified line.
    pub raw_line: String,
}

impl LogEvent {
    /// Classify one log line into an event for the given bot and file.
    ///
    /// Returns `None` for blank lines and lines matching no known pattern;
    /// unmatched lines are expected, not an error.
    #[must_use]
    pub fn from_line(line: &str, bot: &str, source_file: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (kind, attributes) = classify(trimmed)?;
        Some(Self {
            kind,
            bot: bot.to_string(),
            source_file: source_file.to_string(),
            timestamp: Utc::now(),
            attributes,
            raw_line: trimmed.to_string(),
        })
    }

    /// Look up an attribute value by key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Snapshot of what the session is watching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub is_monitoring: bool,
    pub watched_files: Vec<String>,
    pub watched_folders: Vec<String>,
}

impl MonitorStatus {
    /// Status of a stopped session.
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            is_monitoring: false,
            watched_files: Vec::new(),
            watched_folders: Vec::new(),
        }
    }
}

/// New displayable content was processed for a watched file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogActivity {
    pub bot: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

/// Updates pushed to observers of a monitoring session.
#[derive(Debug, Clone)]
pub enum MonitorUpdate {
    /// Emitted on start, stop, and whenever the watch set changes.
    Status(MonitorStatus),
    /// Emitted when a processed chunk contains new content.
    Activity(LogActivity),
    /// Emitted for every classified event, mirroring what is dispatched.
    Event(LogEvent),
}
