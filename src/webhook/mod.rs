//! Webhook notification delivery: embed formatting and dispatch.

mod dispatcher;
mod formatter;

pub use dispatcher::{DispatchOutcome, WebhookNotifier};
pub use formatter::{Embed, EmbedField, EmbedFooter};
