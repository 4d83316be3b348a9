//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::NaiveDate;
use mail_keyword_report::client::{MailClient, MessageQuery};
use mail_keyword_report::config::OutputConfig;
use mail_keyword_report::error::Result;
use mail_keyword_report::models::{Message, MessagePage};
use mail_keyword_report::ReportSettings;
use mockall::mock;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

pub const MAILBOX: &str = "helpdesk@example.com";

/// Graph-style JSON for one message
pub fn graph_message(subject: &str, body: &str) -> serde_json::Value {
    json!({
        "id": format!("AAMk-{}", subject.len()),
        "subject": subject,
        "body": {"contentType": "html", "content": body}
    })
}

/// Graph-style JSON for a page of messages
pub fn graph_page(messages: Vec<serde_json::Value>, next_link: Option<&str>) -> serde_json::Value {
    let mut response = json!({
        "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('helpdesk')/mailFolders('Inbox')/messages",
        "value": messages,
    });

    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }

    response
}

/// In-memory page for mock clients
pub fn message_page(messages: &[(&str, &str)], next_link: Option<&str>) -> MessagePage {
    MessagePage {
        messages: messages
            .iter()
            .map(|(subject, body)| Message::new(subject, body))
            .collect(),
        next_link: next_link.map(|l| l.to_string()),
    }
}

/// Settings rooted in `base_dir`, with throttling disabled
pub fn test_settings(base_dir: &Path, api_base: &str) -> ReportSettings {
    let output = OutputConfig {
        base_dir: base_dir.to_path_buf(),
        ..OutputConfig::default()
    };

    ReportSettings {
        query: MessageQuery {
            mailbox: MAILBOX.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            page_size: 50,
        },
        api_base: api_base.to_string(),
        output,
        throttle: Duration::ZERO,
    }
}

/// Create the staging, output and log directories for `settings`
pub async fn prepare_dirs(settings: &ReportSettings) {
    settings.output.ensure_directories().await.unwrap();
}

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait::async_trait]
    impl MailClient for MailClient {
        async fn fetch_page(&self, url: &str) -> Result<MessagePage>;
    }
}
