//! Slack chat system: block-formatted messages via `chat.postMessage`,
//! thread replies via `thread_ts`.

use super::{ChatSystem, SentMessage};
use crate::error::{HeraldError, Result};
use crate::message::{ChatMessage, MessageBlock};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack caps button labels at 75 characters.
const BUTTON_LABEL_LIMIT: usize = 75;

pub struct SlackChatSystem {
    client: Client,
    api_base: String,
    token: String,
    channel: String,
}

impl SlackChatSystem {
    pub fn new(api_base: &str, token: &str, channel: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            channel: channel.to_string(),
        })
    }

    fn block_json(block: &MessageBlock) -> Value {
        match block {
            MessageBlock::Section { text } => json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": text },
            }),
            MessageBlock::Divider => json!({ "type": "divider" }),
            MessageBlock::Actions { url } => json!({
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": button_label(url) },
                    "url": url,
                }],
            }),
        }
    }
}

fn button_label(url: &str) -> String {
    let label = url.trim_start_matches("https://").trim_start_matches("http://");
    if label.chars().count() <= BUTTON_LABEL_LIMIT {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(BUTTON_LABEL_LIMIT - 3).collect();
    truncated.push_str("...");
    truncated
}

impl ChatSystem for SlackChatSystem {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn send(&self, message: &ChatMessage) -> Result<SentMessage> {
        let blocks: Vec<Value> = message.blocks.iter().map(Self::block_json).collect();
        let mut body = json!({
            "channel": self.channel,
            "text": "Deployment Info",
            "blocks": blocks,
        });
        if let Some(root) = &message.thread_root {
            body["thread_ts"] = json!(root);
        }

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| HeraldError::ChatTransport(e.to_string()))?;

        let data: Value = response
            .json()
            .map_err(|e| HeraldError::ChatTransport(e.to_string()))?;

        if !data["ok"].as_bool().unwrap_or(false) {
            let reason = data["error"].as_str().unwrap_or("unknown error");
            return Err(HeraldError::ChatTransport(format!(
                "slack rejected the message: {reason}"
            )));
        }

        let ts = data["ts"].as_str().ok_or_else(|| {
            HeraldError::ChatTransport("slack response is missing the message ts".to_string())
        })?;
        Ok(SentMessage { id: ts.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
