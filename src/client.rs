//! Mail API client: one HTTP GET per page of the Inbox message listing

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use tracing::debug;

use crate::auth::AccessToken;
use crate::error::{ReportError, Result};
use crate::models::MessagePage;

/// Fields requested for each message; the filter only reads these two
const MESSAGE_SELECT_FIELDS: &str = "subject,body";

/// Trait defining the mail API operation the scanner needs, for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Fetch one page of messages from a listing or continuation URL
    async fn fetch_page(&self, url: &str) -> Result<MessagePage>;
}

/// Server-side filter for an Inbox listing
#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub mailbox: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page_size: u32,
}

impl MessageQuery {
    /// OData filter covering `[start 00:00:00Z, end 23:59:59Z]`
    pub fn odata_filter(&self) -> String {
        format!(
            "receivedDateTime ge {}T00:00:00Z and receivedDateTime le {}T23:59:59Z",
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d")
        )
    }

    /// First-page URL under `api_base`
    pub fn listing_url(&self, api_base: &str) -> Result<String> {
        let endpoint = format!(
            "{}/users/{}/mailFolders/Inbox/messages",
            api_base.trim_end_matches('/'),
            self.mailbox
        );
        let mut url = Url::parse(&endpoint)
            .map_err(|e| ReportError::Config(format!("Invalid mail API URL {}: {}", endpoint, e)))?;
        // OData wants spaces as %20, not "+"
        url.set_query(Some(&format!(
            "$filter={}&$top={}&$select={}",
            self.odata_filter(),
            self.page_size,
            MESSAGE_SELECT_FIELDS
        )));
        Ok(url.to_string())
    }
}

/// Microsoft Graph implementation of [`MailClient`]
pub struct GraphMailClient {
    http: reqwest::Client,
    token: AccessToken,
}

impl GraphMailClient {
    pub fn new(http: reqwest::Client, token: AccessToken) -> Self {
        Self { http, token }
    }
}

#[async_trait]
impl MailClient for GraphMailClient {
    async fn fetch_page(&self, url: &str) -> Result<MessagePage> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token.token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::api(status.as_u16(), &body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
