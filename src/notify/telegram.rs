//! Telegram Bot API notifier

use crate::config::NotifierConfig;
use crate::notify::{DeliveryEvent, Notifier, NotifyError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Characters that must be escaped in MarkdownV2 text
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends discovery messages to one chat through `sendMessage`
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    include_source: bool,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: &NotifierConfig) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
            include_source: config.include_source,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, event: &DeliveryEvent) -> Result<(), NotifyError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: format_message(event, self.include_source),
            parse_mode: "MarkdownV2",
            disable_web_page_preview: false,
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body: ApiResponse = response.json().await.unwrap_or(ApiResponse {
            ok: false,
            description: None,
        });

        if status.is_success() && body.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: body
                    .description
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
            })
        }
    }
}

/// Builds the MarkdownV2 message body for an event
pub fn format_message(event: &DeliveryEvent, include_source: bool) -> String {
    let mut message = format!(
        "🔗 *New Link Found\\!* \n\n*Link:* {}\n",
        escape_markdown_v2(&event.link)
    );

    if include_source {
        message.push_str(&format!(
            "*Source:* {}\n*Keyword:* {}\n",
            escape_markdown_v2(&event.source_url),
            escape_markdown_v2(&event.keyword)
        ));
    }

    message
}

/// Escapes text for Telegram's MarkdownV2 parse mode
///
/// ```
/// use tele_trawl::notify::escape_markdown_v2;
///
/// assert_eq!(escape_markdown_v2("https://t.me/a_b"), "https://t\\.me/a\\_b");
/// ```
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
