//! Event to Discord embed formatting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitor::{LogEvent, LogEventKind};

/// Discord embed payload for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
    pub footer: EmbedFooter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    /// Build the embed for an event. Pure; missing attributes render as
    /// `Unknown <field>` fallbacks rather than failing.
    #[must_use]
    pub fn from_event(event: &LogEvent) -> Self {
        Self {
            title: event_title(event.kind).to_string(),
            description: event_description(event),
            color: event_color(event.kind),
            timestamp: event.timestamp,
            footer: EmbedFooter {
                text: format!("{} - {}", event.bot, event.source_file),
            },
            fields: event_fields(event),
        }
    }
}

fn event_title(kind: LogEventKind) -> &'static str {
    match kind {
        LogEventKind::Chat => "\u{1f4ac} Chat Message",
        LogEventKind::Response => "\u{2328}\u{fe0f} Bot Response",
        LogEventKind::LevelUp => "\u{1f4c8} Level Up!",
        LogEventKind::QuestStart => "\u{1f5fa}\u{fe0f} Quest Started",
        LogEventKind::QuestComplete => "\u{1f3c6} Quest Completed!",
        LogEventKind::BreakStarted => "\u{1f4a4} Break Started",
        LogEventKind::BreakOver => "\u{23f0} Break Over",
        LogEventKind::Death => "\u{1f480} Died",
        LogEventKind::ValuableDrop => "\u{1f4b0} Valuable Drop!",
        LogEventKind::BotStarted => "\u{1f7e2} Bot Started",
        LogEventKind::BotStopped => "\u{1f534} Bot Stopped",
    }
}

fn event_color(kind: LogEventKind) -> u32 {
    match kind {
        LogEventKind::Chat | LogEventKind::Response => 0x0099_ff,
        LogEventKind::LevelUp => 0x88_e788,
        LogEventKind::QuestStart | LogEventKind::QuestComplete => 0x87_ceeb,
        LogEventKind::BreakStarted => 0x80_8080,
        LogEventKind::BreakOver => 0x90_ee90,
        LogEventKind::Death => 0xff_0000,
        LogEventKind::ValuableDrop => 0xff_d700,
        LogEventKind::BotStarted => 0x32_cd32,
        LogEventKind::BotStopped => 0xb2_2222,
    }
}

/// Attribute value, or an `Unknown <field>` fallback for partial matches.
fn attr_or_unknown(event: &LogEvent, key: &str) -> String {
    event
        .attr(key)
        .filter(|value| !value.is_empty())
        .map_or_else(|| format!("Unknown {key}"), ToString::to_string)
}

fn event_description(event: &LogEvent) -> String {
    match event.kind {
        LogEventKind::Chat => format!("**{}**", attr_or_unknown(event, "message")),
        LogEventKind::Response => format!("**{}**", attr_or_unknown(event, "response")),
        LogEventKind::LevelUp => format!(
            "**{}** is now level **{}**!",
            attr_or_unknown(event, "skill"),
            attr_or_unknown(event, "level")
        ),
        LogEventKind::QuestStart => {
            format!("**{}** has been started!", attr_or_unknown(event, "quest"))
        }
        LogEventKind::QuestComplete => {
            format!("**{}** has been completed!", attr_or_unknown(event, "quest"))
        }
        LogEventKind::BreakStarted => format!(
            "Taking a break for **{}**",
            format_break_duration(event.attr("duration"))
        ),
        LogEventKind::BreakOver => "Break is over, back to work!".to_string(),
        LogEventKind::Death => "Bot has died".to_string(),
        LogEventKind::ValuableDrop => format!(
            "**{}** worth **{}** coins!",
            attr_or_unknown(event, "item"),
            attr_or_unknown(event, "value")
        ),
        LogEventKind::BotStarted => {
            format!("Script **{}** has started", attr_or_unknown(event, "script"))
        }
        LogEventKind::BotStopped => {
            format!("Script **{}** has stopped", attr_or_unknown(event, "script"))
        }
    }
}

fn event_fields(event: &LogEvent) -> Vec<EmbedField> {
    let inline = |name: &str, value: &str| EmbedField {
        name: name.to_string(),
        value: value.to_string(),
        inline: true,
    };

    match event.kind {
        LogEventKind::LevelUp => match (event.attr("skill"), event.attr("level")) {
            (Some(skill), Some(level)) => {
                vec![inline("Skill", skill), inline("New Level", level)]
            }
            _ => Vec::new(),
        },
        LogEventKind::ValuableDrop => match (event.attr("item"), event.attr("value")) {
            (Some(item), Some(value)) => vec![inline("Item", item), inline("Value", value)],
            _ => Vec::new(),
        },
        LogEventKind::BreakStarted => match parse_duration_ms(event.attr("duration")) {
            Some(ms) => vec![inline("Duration", &format_duration_ms(ms))],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn parse_duration_ms(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
}

/// The break duration is logged in milliseconds. One earlier revision of
/// the formatter treated the raw value as minutes; the millisecond
/// conversion is the settled behavior.
fn format_break_duration(raw: Option<&str>) -> String {
    match parse_duration_ms(raw) {
        Some(ms) => format_duration_ms(ms),
        None => "Unknown duration".to_string(),
    }
}

/// Compact `Nd Nh Nm Ns` rendering, dropping leading zero units.
fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let days = total_secs / 86_400;
    let hours = (total_secs / 3600) % 24;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}
