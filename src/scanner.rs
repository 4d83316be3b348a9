//! Cursor-driven page fetching and the keyword scan loop

use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::MailClient;
use crate::error::Result;
use crate::filter::KeywordFilter;
use crate::models::{MatchRow, MessagePage, RunContext};

/// Progress is logged every this many messages (run-wide count)
pub const PROGRESS_LOG_INTERVAL: usize = 25;

/// Forward-only walk over a cursor-linked message listing.
///
/// Nothing is fetched until [`PageFetcher::next_page`] is called, and each
/// call performs exactly one request. The walk ends after the first page
/// that carries no continuation cursor.
pub struct PageFetcher<'a> {
    client: &'a dyn MailClient,
    first_url: String,
    next_url: Option<String>,
    pages_fetched: usize,
}

impl<'a> PageFetcher<'a> {
    pub fn new(client: &'a dyn MailClient, first_url: impl Into<String>) -> Self {
        let first_url = first_url.into();
        Self {
            client,
            next_url: Some(first_url.clone()),
            first_url,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `Ok(None)` once the cursor is exhausted
    pub async fn next_page(&mut self) -> Result<Option<MessagePage>> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let page = self.client.fetch_page(&url).await?;
        self.pages_fetched += 1;
        self.next_url = page.next_link.clone();
        debug!(
            "Fetched page {} with {} messages (more: {})",
            self.pages_fetched,
            page.messages.len(),
            self.next_url.is_some()
        );
        Ok(Some(page))
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        self.next_url = Some(self.first_url.clone());
        self.pages_fetched = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_url.is_none()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Same walk as a stream; ends after the last page or the first error
    pub fn pages(&mut self) -> Pin<Box<dyn Stream<Item = Result<MessagePage>> + Send + '_>> {
        Box::pin(stream! {
            loop {
                match self.next_page().await {
                    Ok(Some(page)) => yield Ok(page),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }
}

/// Walk every page, keep the messages that match `filter`.
///
/// Matches are returned in page arrival order. The first fetch error aborts
/// the scan and is returned as-is.
pub async fn scan_mailbox(
    fetcher: &mut PageFetcher<'_>,
    filter: &KeywordFilter,
    ctx: &mut RunContext,
    throttle: Duration,
) -> Result<Vec<MatchRow>> {
    let mut matches = Vec::new();

    info!("Starting inbox scan");
    while !fetcher.is_exhausted() {
        info!("Reading page {}", ctx.pages_fetched + 1);
        let Some(page) = fetcher.next_page().await? else {
            break;
        };
        ctx.pages_fetched += 1;

        for message in &page.messages {
            ctx.messages_processed += 1;

            if let Some(row) = filter.apply(message) {
                matches.push(row);
                ctx.matches_found += 1;
            }

            if ctx.messages_processed % PROGRESS_LOG_INTERVAL == 0 {
                info!("{} e-mails processed", ctx.messages_processed);
            }

            if !throttle.is_zero() {
                tokio::time::sleep(throttle).await;
            }
        }
    }

    info!(
        "Scan complete: {} pages, {} messages, {} matches",
        ctx.pages_fetched, ctx.messages_processed, ctx.matches_found
    );
    Ok(matches)
}

/// Collect every page through the stream interface
pub async fn collect_pages(fetcher: &mut PageFetcher<'_>) -> Result<Vec<MessagePage>> {
    let mut pages = Vec::new();
    let mut stream = fetcher.pages();
    while let Some(page) = stream.next().await {
        pages.push(page?);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::models::Message;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages keyed by URL and records every request
    struct FakeMailClient {
        pages: HashMap<String, MessagePage>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeMailClient {
        fn new(pages: Vec<(&str, MessagePage)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailClient for FakeMailClient {
        async fn fetch_page(&self, url: &str) -> Result<MessagePage> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ReportError::api(500, "boom"))
        }
    }

    fn page(subjects: &[&str], next: Option<&str>) -> MessagePage {
        MessagePage {
            messages: subjects.iter().map(|s| Message::new(s, "")).collect(),
            next_link: next.map(|n| n.to_string()),
        }
    }

    #[tokio::test]
    async fn test_fetcher_follows_cursor_until_absent() {
        let client = FakeMailClient::new(vec![
            ("p1", page(&["a"], Some("p2"))),
            ("p2", page(&["b", "c"], Some("p3"))),
            ("p3", page(&["d"], None)),
        ]);
        let mut fetcher = PageFetcher::new(&client, "p1");

        let mut sizes = Vec::new();
        while let Some(p) = fetcher.next_page().await.unwrap() {
            sizes.push(p.messages.len());
        }

        assert_eq!(sizes, vec![1, 2, 1]);
        assert_eq!(client.requests(), vec!["p1", "p2", "p3"]);
        assert!(fetcher.is_exhausted());
        assert_eq!(fetcher.pages_fetched(), 3);
        // exhausted fetchers stay exhausted without new requests
        assert!(fetcher.next_page().await.unwrap().is_none());
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_fetcher_is_lazy() {
        let client = FakeMailClient::new(vec![("p1", page(&["a"], None))]);
        let fetcher = PageFetcher::new(&client, "p1");
        assert!(!fetcher.is_exhausted());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetcher_stops_on_last_page_even_if_empty() {
        let client = FakeMailClient::new(vec![
            ("p1", page(&["a", "b"], Some("p2"))),
            ("p2", page(&[], None)),
        ]);
        let mut fetcher = PageFetcher::new(&client, "p1");
        let pages = collect_pages(&mut fetcher).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_fetcher_restart() {
        let client = FakeMailClient::new(vec![("p1", page(&["a"], None))]);
        let mut fetcher = PageFetcher::new(&client, "p1");
        collect_pages(&mut fetcher).await.unwrap();
        assert!(fetcher.is_exhausted());

        fetcher.restart();
        assert_eq!(fetcher.pages_fetched(), 0);
        let pages = collect_pages(&mut fetcher).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(client.requests(), vec!["p1", "p1"]);
    }

    #[tokio::test]
    async fn test_stream_ends_after_error() {
        let client = FakeMailClient::new(vec![("p1", page(&["a"], Some("missing")))]);
        let mut fetcher = PageFetcher::new(&client, "p1");

        let mut stream = fetcher.pages();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_scan_collects_matches_in_arrival_order() {
        let client = FakeMailClient::new(vec![
            ("p1", page(&["VPN down", "Printer", "vpn slow"], Some("p2"))),
            ("p2", page(&["Nothing here"], None)),
        ]);
        let mut fetcher = PageFetcher::new(&client, "p1");
        let mut ctx = RunContext::new();

        let matches = scan_mailbox(
            &mut fetcher,
            &KeywordFilter::new("vpn"),
            &mut ctx,
            Duration::ZERO,
        )
        .await
        .unwrap();

        let subjects: Vec<&str> = matches.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["VPN down", "vpn slow"]);
        assert_eq!(ctx.pages_fetched, 2);
        assert_eq!(ctx.messages_processed, 4);
        assert_eq!(ctx.matches_found, 2);
    }

    #[tokio::test]
    async fn test_scan_counter_is_run_wide() {
        let subjects: Vec<String> = (0..30).map(|i| format!("msg {}", i)).collect();
        let refs: Vec<&str> = subjects.iter().map(|s| s.as_str()).collect();
        let client = FakeMailClient::new(vec![
            ("p1", page(&refs[..20], Some("p2"))),
            ("p2", page(&refs[20..], None)),
        ]);
        let mut fetcher = PageFetcher::new(&client, "p1");
        let mut ctx = RunContext::new();
        ctx.messages_processed = 5;

        scan_mailbox(&mut fetcher, &KeywordFilter::new("msg"), &mut ctx, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(ctx.messages_processed, 35);
    }

    fn numbered_subjects(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("msg {}", i)).collect()
    }

    /// Run a scan with an info-level subscriber writing to a temp log, return its lines
    async fn logged_scan(pages: Vec<(&str, MessagePage)>) -> Vec<String> {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scan.log");
        let subscriber = tracing_subscriber::fmt()
            .event_format(crate::logging::EventLineFormat)
            .with_max_level(tracing::Level::INFO)
            .with_writer(Mutex::new(crate::logging::open_log_file(&log_path).unwrap()))
            .finish();

        let client = FakeMailClient::new(pages);
        let mut fetcher = PageFetcher::new(&client, "p1");
        let mut ctx = RunContext::new();
        {
            let _guard = tracing::subscriber::set_default(subscriber);
            scan_mailbox(&mut fetcher, &KeywordFilter::new("msg"), &mut ctx, Duration::ZERO)
                .await
                .unwrap();
        }

        std::fs::read_to_string(&log_path)
            .unwrap()
            .lines()
            .map(|line| line.splitn(2, "] ").nth(1).unwrap_or_default().to_string())
            .collect()
    }

    fn lines_containing<'a>(lines: &'a [String], needle: &str) -> Vec<&'a str> {
        lines
            .iter()
            .filter(|line| line.contains(needle))
            .map(|line| line.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_scan_logs_each_page_and_every_25th_message() {
        let first = numbered_subjects(0..20);
        let second = numbered_subjects(20..50);
        let first: Vec<&str> = first.iter().map(|s| s.as_str()).collect();
        let second: Vec<&str> = second.iter().map(|s| s.as_str()).collect();

        let lines = logged_scan(vec![
            ("p1", page(&first, Some("p2"))),
            ("p2", page(&second, None)),
        ])
        .await;

        assert_eq!(
            lines_containing(&lines, "Reading page"),
            vec!["Reading page 1", "Reading page 2"]
        );
        assert_eq!(
            lines_containing(&lines, "e-mails processed"),
            vec!["25 e-mails processed", "50 e-mails processed"]
        );
    }

    #[tokio::test]
    async fn test_scan_progress_spans_page_boundaries() {
        let subjects = numbered_subjects(0..60);
        let subjects: Vec<&str> = subjects.iter().map(|s| s.as_str()).collect();

        // boundaries at 10 and 40 fall between multiples of 25
        let lines = logged_scan(vec![
            ("p1", page(&subjects[..10], Some("p2"))),
            ("p2", page(&subjects[10..40], Some("p3"))),
            ("p3", page(&subjects[40..], None)),
        ])
        .await;

        assert_eq!(lines_containing(&lines, "Reading page").len(), 3);
        assert_eq!(
            lines_containing(&lines, "e-mails processed"),
            vec!["25 e-mails processed", "50 e-mails processed"]
        );
    }

    #[tokio::test]
    async fn test_scan_aborts_on_fetch_error() {
        let client = FakeMailClient::new(vec![("p1", page(&["vpn"], Some("gone")))]);
        let mut fetcher = PageFetcher::new(&client, "p1");
        let mut ctx = RunContext::new();

        let err = scan_mailbox(&mut fetcher, &KeywordFilter::new("vpn"), &mut ctx, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Api { status: 500, .. }));
        assert_eq!(ctx.pages_fetched, 1);
    }
}
