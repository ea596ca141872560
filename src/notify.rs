//! Pipeline notification composition
//!
//! Builds the message a notification job would send and works out which
//! channels are configured. Delivery itself is left to the workflow.

use crate::ci::CiEnv;
use crate::domain::PipelineStatus;
use std::fmt;

/// A configured notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Apprise,
    Telegram,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Apprise => f.write_str("apprise"),
            Channel::Telegram => f.write_str("telegram"),
        }
    }
}

/// Composed notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub status: PipelineStatus,
    pub title: String,
    pub body: String,
    pub channels: Vec<Channel>,
    /// False when notifications are disabled or no channel is configured
    pub should_notify: bool,
}

impl Notification {
    /// Channel names joined with commas, as exposed in step outputs
    pub fn channel_list(&self) -> String {
        self.channels
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Channels with complete credentials in the environment
pub fn detect_channels(env: &CiEnv) -> Vec<Channel> {
    let mut channels = Vec::new();
    if env.get("APPRISE_URLS").is_some() {
        channels.push(Channel::Apprise);
    }
    if env.get("TELEGRAM_BOT_TOKEN").is_some() && env.get("TELEGRAM_CHAT_ID").is_some() {
        channels.push(Channel::Telegram);
    }
    channels
}

/// Compose the notification for `status`
///
/// `title` overrides the default "<emoji> Pipeline <status>" heading.
pub fn compose(env: &CiEnv, status: PipelineStatus, title: Option<&str>) -> Notification {
    let title = match title {
        Some(t) => format!("{} {}", status.emoji(), t.trim()),
        None => format!("{} Pipeline {}", status.emoji(), status),
    };

    let mut lines = vec![format!("Status: {}", status)];
    if let Some(repository) = env.repository() {
        lines.push(format!("Repository: {}", repository));
    }
    if let Some(ref_name) = env.ref_name() {
        lines.push(format!("Ref: {}", ref_name));
    }
    if let Some(sha) = env.short_sha() {
        lines.push(format!("Commit: {}", sha));
    }
    if let Some(url) = env.run_url() {
        lines.push(format!("Run: {}", url));
    }

    let channels = detect_channels(env);
    let enabled = env.feature_flag("NOTIFICATIONS").unwrap_or(true);

    Notification {
        status,
        title,
        body: lines.join("\n"),
        should_notify: enabled && !channels.is_empty(),
        channels,
    }
}
