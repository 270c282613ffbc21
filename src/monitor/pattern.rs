//! Log line classification.
//!
//! Maps one log line to at most one typed event via a fixed regex table
//! matching the bot client's log conventions.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::event::LogEventKind;

/// One entry in the pattern table.
struct LogPattern {
    kind: LogEventKind,
    regex: Regex,
    /// Attribute names for capture groups 1..=N, in group order.
    captures: &'static [&'static str],
}

fn pattern(kind: LogEventKind, regex: &str, captures: &'static [&'static str]) -> LogPattern {
    LogPattern {
        kind,
        regex: Regex::new(regex).unwrap_or_else(|e| panic!("invalid pattern for {kind}: {e}")),
        captures,
    }
}

/// Patterns are tried in registration order and the first match wins.
/// The log format keeps them mutually exclusive in practice; the ordering
/// is the documented tie-break for lines that could match twice.
static PATTERNS: LazyLock<Vec<LogPattern>> = LazyLock::new(|| {
    use LogEventKind as K;
    vec![
        pattern(K::Chat, r"\[INFO\] CHAT: (.+)$", &["message"]),
        pattern(K::Response, r"\[INFO\] RESPONSE: (.+)$", &["response"]),
        pattern(
            K::LevelUp,
            r"advanced your ([A-Za-z ]+?) level\. You are now level (\d+)",
            &["skill", "level"],
        ),
        pattern(K::QuestStart, r"[Qq]uest started: (.+)$", &["quest"]),
        pattern(K::QuestComplete, r"[Qq]uest completed?: (.+)$", &["quest"]),
        pattern(K::BreakStarted, r"Taking a break for (\d+)", &["duration"]),
        pattern(K::BreakOver, r"[Bb]reak (?:is )?over", &[]),
        pattern(K::Death, r"(?i)oh dear, you are dead|you have died", &[]),
        pattern(
            K::ValuableDrop,
            r"[Vv]aluable drop: (.+?) \((\d+) coins?\)",
            &["item", "value"],
        ),
        pattern(K::BotStarted, r"\[INFO\] Script started: (.+)$", &["script"]),
        pattern(K::BotStopped, r"\[INFO\] Script stopped: (.+)$", &["script"]),
    ]
});

/// Classify a trimmed, non-empty log line.
///
/// Returns the matched kind and its extracted attributes, or `None` when no
/// pattern matches. Pure function; safe to call concurrently.
#[must_use]
pub fn classify(line: &str) -> Option<(LogEventKind, BTreeMap<String, String>)> {
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.regex.captures(line) {
            let mut attributes = BTreeMap::new();
            for (index, name) in pattern.captures.iter().enumerate() {
                if let Some(group) = caps.get(index + 1) {
                    attributes.insert((*name).to_string(), group.as_str().to_string());
                }
            }
            return Some((pattern.kind, attributes));
        }
    }
    None
}
