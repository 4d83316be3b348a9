//! Event log: one `[timestamp] message` line per event, appended to a file,
//! plus a filtered console copy on stderr.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{ReportError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Library and binary targets written to the event log
const FILE_LOG_DIRECTIVES: &str = "mail_keyword_report=info,mail_report=info";

/// Formats an event as `[YYYY-MM-DD HH:MM:SS] message` in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLineFormat;

impl<S, N> FormatEvent<S, N> for EventLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "[{}] ", Local::now().format(TIMESTAMP_FORMAT))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Open the event log for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ReportError::Config(format!("Failed to open log file {:?}: {}", path, e)))
}

fn console_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "mail_keyword_report=debug,mail_report=debug,info"
    } else {
        "mail_keyword_report=info,mail_report=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber: file log at info level, console per
/// `RUST_LOG` (or `--verbose`). Call once per process.
pub fn init(log_path: &Path, verbose: bool) -> Result<()> {
    let file = open_log_file(log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(EventLineFormat)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new(FILE_LOG_DIRECTIVES));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ReportError::Config(format!("Failed to initialize logging: {}", e)))
}
