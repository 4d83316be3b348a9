use anyhow::{Context, Result};
use clap::Parser;
use mail_keyword_report::cli::{self, Cli};
use mail_keyword_report::error::ReportError;
use std::process;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        tracing::error!("Run aborted: {:#}", e);
        display_error(&e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let summary = cli::run_pipeline(&cli)
        .await
        .context("Mail report run failed")?;

    summary.print();
    println!("✅ Process finished successfully");
    Ok(())
}

/// Display error with context
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    // Display helpful hints based on error type
    if let Some(report_err) = error.downcast_ref::<ReportError>() {
        match report_err {
            ReportError::Auth(_) => {
                eprintln!("\nHint: Check AZURE_CLIENT_ID, AZURE_CLIENT_SECRET and AZURE_TENANT_ID,");
                eprintln!("      and that the app registration has the Mail.Read permission.");
            }
            ReportError::Config(_) => {
                eprintln!("\nHint: Check the configuration file passed with --config");
                eprintln!("      and that a mailbox is set (mailbox.address or MAILBOX_EMAIL).");
            }
            ReportError::Api { status: 401 | 403, .. } => {
                eprintln!("\nHint: The token was rejected for this mailbox.");
                eprintln!("      Verify the application access policy covers it.");
            }
            _ => {}
        }
    }
}
