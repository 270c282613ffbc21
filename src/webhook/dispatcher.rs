//! Webhook notification dispatch.
//!
//! Resolves the destination URL for a bot and performs the outbound POST.
//! Delivery is best-effort: failures are logged and dropped, never
//! propagated to the tailing pipeline.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;

use crate::config::AppConfig;
use crate::monitor::LogEvent;

use super::formatter::Embed;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The destination accepted the notification.
    Delivered,
    /// No destination is configured for the bot; an expected state.
    Skipped,
    /// Transport error or non-2xx response; logged and dropped.
    Failed,
}

/// Sends event notifications to Discord-compatible webhook endpoints.
///
/// Cheap to clone; clones share the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    /// Per-bot webhook URLs (empty entries are dropped at construction).
    routes: BTreeMap<String, String>,
    /// Destination for bots without their own webhook.
    fallback_url: Option<String>,
}

impl WebhookNotifier {
    /// Build a notifier from a configuration snapshot.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        let routes = config
            .bots
            .iter()
            .filter_map(|(name, bot)| {
                bot.webhook_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| (name.clone(), url.to_string()))
            })
            .collect();

        let fallback_url = config
            .fallback_webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(ToString::to_string);

        Self {
            client,
            routes,
            fallback_url,
        }
    }

    /// Resolve the destination for a bot: its own webhook first, then the
    /// fallback URL, then none.
    #[must_use]
    pub fn resolve_url(&self, bot: &str) -> Option<&str> {
        self.routes
            .get(bot)
            .map(String::as_str)
            .or(self.fallback_url.as_deref())
    }

    /// Deliver one event.
    ///
    /// A bot with no destination yields `Skipped` without any network call.
    /// Errors are contained here: logged, not retried, not propagated.
    pub async fn dispatch(&self, event: &LogEvent) -> DispatchOutcome {
        let Some(url) = self.resolve_url(&event.bot) else {
            tracing::debug!(bot = %event.bot, kind = %event.kind, "No webhook configured, skipping notification");
            return DispatchOutcome::Skipped;
        };

        let body = serde_json::json!({ "embeds": [Embed::from_event(event)] });

        match self.client.post(url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(bot = %event.bot, kind = %event.kind, "Webhook delivered");
                DispatchOutcome::Delivered
            }
            Ok(response) => {
                tracing::warn!(
                    bot = %event.bot,
                    kind = %event.kind,
                    status = %response.status(),
                    "Webhook delivery failed"
                );
                DispatchOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(bot = %event.bot, kind = %event.kind, error = %e, "Webhook delivery failed");
                DispatchOutcome::Failed
            }
        }
    }
}
