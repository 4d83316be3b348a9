//! Mail Keyword Report
//!
//! A batch job that reads a mailbox through the Microsoft Graph mail API,
//! keeps the messages mentioning a keyword, and writes a two-sheet
//! spreadsheet report grouped by normalized subject.
//!
//! # Overview
//!
//! - **Authentication**: client-credential bearer token for the mail API
//! - **Scanning**: lazy, cursor-driven walk over the Inbox listing
//! - **Filtering**: case-insensitive substring match on subject and body
//! - **Aggregation**: subject grouping, counting and ordering
//! - **Reporting**: staged spreadsheet, summary sheet, atomic publish
//!
//! # Example Usage
//!
//! ```no_run
//! use mail_keyword_report::{cli::Cli, cli::run_pipeline};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_from(["mail-report", "vpn"]);
//!     let summary = run_pipeline(&cli).await?;
//!     summary.print();
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`aggregate`] - Subject grouping for the summary sheet
//! - [`auth`] - Client-credential token acquisition
//! - [`cli`] - Command-line interface and pipeline orchestration
//! - [`client`] - Mail API client trait and Graph implementation
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`filter`] - Keyword matching
//! - [`logging`] - Timestamped event log
//! - [`models`] - Core data structures
//! - [`report`] - Spreadsheet writing and publishing
//! - [`scanner`] - Page fetching and the scan loop
//! - [`text`] - Whitespace, truncation and case helpers

pub mod aggregate;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod report;
pub mod scanner;
pub mod text;

// Re-export commonly used types for convenience
pub use error::{ReportError, Result};

// Core data models
pub use models::{AggregateRow, MatchRow, Message, MessagePage, RunContext};

// Pipeline pieces
pub use aggregate::aggregate_by_subject;
pub use client::{GraphMailClient, MailClient, MessageQuery};
pub use config::Config;
pub use filter::KeywordFilter;
pub use scanner::PageFetcher;

// CLI types (for binary usage)
pub use cli::{Cli, ReportSettings, RunSummary};
