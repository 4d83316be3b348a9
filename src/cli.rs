//! Command-line interface and pipeline orchestration

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::aggregate::aggregate_by_subject;
use crate::auth::{self, ClientCredentials};
use crate::client::{GraphMailClient, MailClient, MessageQuery};
use crate::config::{Config, OutputConfig};
use crate::error::{ReportError, Result};
use crate::filter::KeywordFilter;
use crate::logging;
use crate::models::RunContext;
use crate::report;
use crate::scanner::{scan_mailbox, PageFetcher};

#[derive(Parser, Debug)]
#[command(name = "mail-report")]
#[command(version)]
#[command(about = "Filter a mailbox by keyword and build a spreadsheet report", long_about = None)]
pub struct Cli {
    /// Keyword to look for in subject and body (prompted for when omitted)
    pub keyword: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "mail-report.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Trim and lower-case the operator's keyword; empty is rejected
pub fn normalize_keyword(raw: &str) -> Result<String> {
    let keyword = raw.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(ReportError::Config("Keyword must not be empty".to_string()));
    }
    Ok(keyword)
}

/// Keyword from the command line, or a one-off prompt on stdin
pub fn resolve_keyword(cli: &Cli) -> Result<String> {
    match &cli.keyword {
        Some(keyword) => normalize_keyword(keyword),
        None => {
            let answer = inquire::Text::new("Enter the keyword to filter e-mails:")
                .prompt()
                .map_err(|e| ReportError::Config(format!("Failed to read keyword: {}", e)))?;
            normalize_keyword(&answer)
        }
    }
}

/// Everything the core needs besides the mail client
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub query: MessageQuery,
    pub api_base: String,
    pub output: OutputConfig,
    pub throttle: Duration,
}

impl ReportSettings {
    pub fn from_config(config: &Config, mailbox: String) -> Self {
        Self {
            query: MessageQuery {
                mailbox,
                start_date: config.scan.start_date,
                end_date: config.scan.end_date,
                page_size: config.scan.page_size,
            },
            api_base: config.graph.api_base.clone(),
            output: config.output.clone(),
            throttle: Duration::from_millis(config.scan.throttle_ms),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub keyword: String,
    pub pages_fetched: usize,
    pub messages_scanned: usize,
    pub matches: usize,
    pub subject_groups: usize,
    pub report_path: PathBuf,
    pub duration: Duration,
}

impl RunSummary {
    pub fn print(&self) {
        println!("\n========================================");
        println!("Mail Report Summary");
        println!("========================================");
        println!("Run ID: {}", self.run_id);
        println!("Keyword: {}", self.keyword);
        println!("Pages fetched: {}", self.pages_fetched);
        println!("E-mails scanned: {}", self.messages_scanned);
        println!("Matches: {}", self.matches);
        println!("Subject groups: {}", self.subject_groups);
        println!("Report: {}", self.report_path.display());
        println!("Duration: {:.1} seconds", self.duration.as_secs_f64());
        println!("========================================");
    }
}

/// Scan, filter, aggregate and publish the report for an authenticated client.
///
/// The report is staged under the staging directory and only moved to the
/// output directory once both sheets are written. A failure at any step
/// leaves the output directory untouched.
pub async fn generate_report(
    client: &dyn MailClient,
    settings: &ReportSettings,
    keyword: &str,
    ctx: &mut RunContext,
) -> Result<RunSummary> {
    let filter = KeywordFilter::new(keyword);
    let first_url = settings.query.listing_url(&settings.api_base)?;
    let mut fetcher = PageFetcher::new(client, first_url);

    info!("Reading inbox of {}", settings.query.mailbox);
    let matches = scan_mailbox(&mut fetcher, &filter, ctx, settings.throttle).await?;

    let file_name = report::report_file_name(&settings.output.report_prefix, filter.keyword());
    let staging_path = settings.output.staging_path().join(&file_name);

    report::write_raw(&matches, &staging_path)?;
    info!("Report generated: {}", staging_path.display());

    let aggregates = aggregate_by_subject(&matches);
    if !aggregates.is_empty() {
        report::append_aggregate(&aggregates, &staging_path)?;
        info!("Subject summary created ({} groups)", aggregates.len());
    }

    let report_path = report::finalize(&staging_path, &settings.output.output_path()).await?;

    Ok(RunSummary {
        run_id: ctx.run_id.clone(),
        keyword: filter.keyword().to_string(),
        pages_fetched: ctx.pages_fetched,
        messages_scanned: ctx.messages_processed,
        matches: matches.len(),
        subject_groups: aggregates.len(),
        report_path,
        duration: ctx.elapsed(),
    })
}

/// Full run: configuration, logging, authentication, then [`generate_report`]
pub async fn run_pipeline(cli: &Cli) -> Result<RunSummary> {
    let mut ctx = RunContext::new();

    let config = Config::load(&cli.config).await?;
    config.output.ensure_directories().await?;
    logging::init(&config.output.log_file_path(), cli.verbose)?;

    info!("Run started ({})", ctx.run_id);
    info!("Using configuration from {:?}", cli.config);

    let keyword = resolve_keyword(cli)?;
    let mailbox = config.resolve_mailbox()?;
    info!(
        "Filtering {} for \"{}\" between {} and {}",
        mailbox, keyword, config.scan.start_date, config.scan.end_date
    );

    let http = reqwest::Client::new();
    let credentials = ClientCredentials::from_env()?;
    let token = auth::acquire_token(
        &http,
        &credentials,
        &config.graph.authority_base,
        &config.graph.scope,
    )
    .await?;
    info!("Authentication succeeded");

    let client = GraphMailClient::new(http, token);
    let settings = ReportSettings::from_config(&config, mailbox);
    let summary = generate_report(&client, &settings, &keyword, &mut ctx).await?;

    info!("Process finished successfully in {:?}", summary.duration);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  VPN ").unwrap(), "vpn");
        assert_eq!(normalize_keyword("Wi-Fi").unwrap(), "wi-fi");
        assert!(normalize_keyword("   ").unwrap_err().is_config());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["mail-report", "Refund", "--config", "x.toml", "-v"]).unwrap();
        assert_eq!(cli.keyword.as_deref(), Some("Refund"));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(cli.verbose);
        assert_eq!(resolve_keyword(&cli).unwrap(), "refund");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["mail-report"]).unwrap();
        assert!(cli.keyword.is_none());
        assert_eq!(cli.config, PathBuf::from("mail-report.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.scan.throttle_ms = 0;
        config.scan.page_size = 25;

        let settings = ReportSettings::from_config(&config, "ops@example.com".to_string());
        assert_eq!(settings.query.mailbox, "ops@example.com");
        assert_eq!(settings.query.page_size, 25);
        assert!(settings.throttle.is_zero());
        assert_eq!(settings.api_base, config.graph.api_base);
    }
}
