//! Bot log folder discovery.
//!
//! Resolves which subdirectories of the base log directory are live log
//! sources for a monitoring session.

use std::path::{Path, PathBuf};

/// Folder watched when multi-bot discovery is disabled or finds nothing.
pub const DEFAULT_BOT_FOLDER: &str = "default";

/// One discovered bot log folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotFolder {
    /// Absolute path of the folder.
    pub path: PathBuf,
    /// Owning bot identity (the folder name).
    pub bot: String,
}

/// Discover bot log folders under `root`.
///
/// With VIP features enabled, each configured bot name is checked as a
/// subfolder of `root`; missing folders are skipped silently (an expected
/// state, not an error). Without VIP features, or when no configured folder
/// exists, the single default folder is checked instead.
///
/// A missing or unreadable root yields an empty result; the caller decides
/// what zero folders means.
#[must_use]
pub fn discover_bot_folders(root: &Path, bot_names: &[String], vip_features: bool) -> Vec<BotFolder> {
    let mut folders = Vec::new();

    if vip_features {
        for name in bot_names {
            let path = root.join(name);
            if path.is_dir() {
                tracing::info!(path = %path.display(), bot = %name, "Found bot folder");
                folders.push(BotFolder {
                    path,
                    bot: name.clone(),
                });
            } else {
                tracing::debug!(path = %path.display(), bot = %name, "Bot folder does not exist, skipping");
            }
        }
    }

    if folders.is_empty() {
        let path = root.join(DEFAULT_BOT_FOLDER);
        if path.is_dir() {
            tracing::info!(path = %path.display(), "Watching default log folder");
            folders.push(BotFolder {
                path,
                bot: DEFAULT_BOT_FOLDER.to_string(),
            });
        } else {
            tracing::debug!(root = %root.display(), "No bot folders found under log directory");
        }
    }

    folders
}

/// Whether a file name looks like a log file.
///
/// Matches `.log`/`.txt` extensions, with a `log`/`Log` substring fallback
/// for unconventionally named files.
#[must_use]
pub fn is_log_file(file_name: &str) -> bool {
    let ext = Path::new(file_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase);

    matches!(ext.as_deref(), Some("log" | "txt"))
        || file_name.contains("log")
        || file_name.contains("Log")
}
