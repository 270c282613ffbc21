//! Log monitoring pipeline: folder discovery, file tailing, line
//! classification, and session lifecycle control.

mod discovery;
mod engine;
mod error;
mod event;
mod pattern;
mod session;
mod tailer;

pub use discovery::{discover_bot_folders, is_log_file, BotFolder, DEFAULT_BOT_FOLDER};
pub use error::MonitorError;
pub use event::{LogActivity, LogEvent, LogEventKind, MonitorStatus, MonitorUpdate};
pub use pattern::classify;
pub use session::{ControlResult, MonitorSession};
pub use tailer::{Chunk, LogTailer};
