//! New-proposal notifications.
//!
//! Delivery is fire-and-forget from the engine's point of view: a failed
//! send is reported as [`WatchError::Notify`], logged, and never retried.
//!
//! Message layout (plain text):
//!
//! ```text
//! New Proposal:
//! ID: <proposal_id>
//! Title: <title>
//! Description: <description>
//! Explorer: <explorer_base_url>/<proposal_id>
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::errors::{Result, WatchError};
use crate::proposal::Proposal;

/// Telegram rejects messages longer than this many UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Render the notification text for a newly observed proposal.
pub fn format_notification(proposal: &Proposal, explorer_base_url: &str) -> String {
    render(
        &proposal.proposal_id,
        proposal.title(),
        proposal.description(),
        explorer_base_url,
    )
}

/// Like [`format_notification`], but bounded to `max_units` UTF-16 code units.
///
/// All five lines are always present. The description is shortened first;
/// the title only when the other lines alone exceed the limit.
pub fn format_bounded_notification(
    proposal: &Proposal,
    explorer_base_url: &str,
    max_units: usize,
) -> String {
    let full = format_notification(proposal, explorer_base_url);
    if utf16_len(&full) <= max_units {
        return full;
    }

    let id = &proposal.proposal_id;
    let title = proposal.title();
    let fixed = utf16_len(&render(id, title, "", explorer_base_url));
    if fixed <= max_units {
        let description = fit_message(proposal.description(), max_units - fixed);
        return render(id, title, &description, explorer_base_url);
    }

    let fixed = utf16_len(&render(id, "", "", explorer_base_url));
    let title = fit_message(title, max_units.saturating_sub(fixed));
    render(id, &title, "", explorer_base_url)
}

fn render(id: &str, title: &str, description: &str, explorer_base_url: &str) -> String {
    format!(
        "New Proposal:\nID: {id}\nTitle: {title}\nDescription: {description}\nExplorer: {explorer_base_url}/{id}"
    )
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Delivers one message per new proposal to a fixed destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, proposal: &Proposal, explorer_base_url: &str) -> Result<()>;
}

/// Envelope shared by every Bot API method.
#[derive(Debug, Deserialize)]
struct BotApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Notifier posting to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    /// Build the notifier and authenticate the bot token with `getMe`.
    pub async fn connect(client: reqwest::Client, config: &TelegramConfig) -> Result<Self> {
        let notifier = Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
        };

        let request = notifier.client.get(notifier.method_url("getMe"));
        let me: BotUser = notifier.execute("getMe", request).await?;
        tracing::info!(
            bot_id = me.id,
            bot_username = me.username.as_deref().unwrap_or("<none>"),
            chat_id = notifier.chat_id,
            "Authorized notification bot"
        );

        Ok(notifier)
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.bot_token)
    }

    /// Send `request` and unwrap the Bot API envelope. Errors never carry the
    /// request URL, which embeds the bot token.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = request.send().await.map_err(|e| {
            WatchError::notify_with_source(format!("{method} request failed"), e.without_url())
        })?;

        let status = resp.status();
        let parsed: BotApiResponse<T> = resp.json().await.map_err(|e| {
            WatchError::notify_with_source(
                format!("{method} returned {status} with an undecodable body"),
                e.without_url(),
            )
        })?;

        if !parsed.ok || !status.is_success() {
            return Err(WatchError::notify(format!(
                "{method} rejected ({status}): {}",
                parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string())
            )));
        }

        parsed
            .result
            .ok_or_else(|| WatchError::notify(format!("{method} returned no result")))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, proposal: &Proposal, explorer_base_url: &str) -> Result<()> {
        let text = format_bounded_notification(proposal, explorer_base_url, MAX_MESSAGE_LEN);
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id: self.chat_id,
                text: &text,
            });

        let sent: SentMessage = self.execute("sendMessage", request).await?;
        tracing::debug!(
            proposal_id = %proposal.proposal_id,
            message_id = sent.message_id,
            "Notification delivered"
        );
        Ok(())
    }
}

/// Cut `text` to at most `max_units` UTF-16 code units, marking the cut with
/// an ellipsis.
pub fn fit_message(text: &str, max_units: usize) -> String {
    if utf16_len(text) <= max_units {
        return text.to_string();
    }
    if max_units == 0 {
        return String::new();
    }

    let budget = max_units.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}
