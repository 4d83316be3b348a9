use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// A single mail message as returned by the mail API listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<MessageBody>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Message {
    pub fn new(subject: &str, body: &str) -> Self {
        Self {
            subject: Some(subject.to_string()),
            body: Some(MessageBody {
                content_type: Some("text".to_string()),
                content: Some(body.to_string()),
            }),
        }
    }

    /// Subject text, empty when absent
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    /// Body content, empty when absent
    pub fn body_content(&self) -> &str {
        self.body
            .as_ref()
            .and_then(|b| b.content.as_deref())
            .unwrap_or_default()
    }
}

/// One page of a cursor-linked message listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(rename = "value", default)]
    pub messages: Vec<Message>,
    /// Continuation cursor; `None` marks the last page
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// Report-ready record derived from a matching message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub subject: String,
    pub summarized_body: String,
}

/// One grouped line of the summary sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub display_label: String,
    pub count: usize,
}

/// Per-run state: one instance per run, dropped at exit
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub pages_fetched: usize,
    pub messages_processed: usize,
    pub matches_found: usize,
    clock: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            pages_fetched: 0,
            messages_processed: 0,
            matches_found: 0,
            clock: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
