use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Environment variable consulted when `mailbox.address` is empty
pub const MAILBOX_ENV: &str = "MAILBOX_EMAIL";

/// Largest `$top` the Graph listing endpoint accepts
const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mailbox: MailboxConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailboxConfig {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pause after each processed message, in milliseconds (0 disables)
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            page_size: default_page_size(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_authority_base")]
    pub authority_base: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            authority_base: default_authority_base(),
            scope: default_scope(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            staging_dir: default_staging_dir(),
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            report_prefix: default_report_prefix(),
        }
    }
}

impl OutputConfig {
    pub fn staging_path(&self) -> PathBuf {
        self.base_dir.join(&self.staging_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.output_dir)
    }

    pub fn log_dir_path(&self) -> PathBuf {
        self.base_dir.join(&self.log_dir)
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir_path().join(&self.log_file)
    }

    /// Create the staging, output and log directories if absent
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [self.staging_path(), self.output_path(), self.log_dir_path()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                ReportError::Config(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap_or_default()
}

fn default_page_size() -> u32 {
    50
}

fn default_throttle_ms() -> u64 {
    50
}

fn default_api_base() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_authority_base() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("chamados")
}

fn default_staging_dir() -> String {
    "chamadosFiltrados".to_string()
}

fn default_output_dir() -> String {
    "chamadosOrganizados".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file() -> String {
    "email_analysis.log".to_string()
}

fn default_report_prefix() -> String {
    "chamados_filtrados".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // A missing file means defaults; logging is not up yet, so no warning here
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReportError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReportError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ReportError::Config(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| ReportError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scan.start_date > self.scan.end_date {
            return Err(ReportError::Config(format!(
                "scan.start_date ({}) must not be after scan.end_date ({})",
                self.scan.start_date, self.scan.end_date
            )));
        }

        if self.scan.page_size == 0 {
            return Err(ReportError::Config(
                "scan.page_size must be at least 1".to_string(),
            ));
        }
        if self.scan.page_size > MAX_PAGE_SIZE {
            return Err(ReportError::Config(format!(
                "scan.page_size cannot exceed {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.output.report_prefix.trim().is_empty() {
            return Err(ReportError::Config(
                "output.report_prefix must not be empty".to_string(),
            ));
        }
        if self.output.log_file.trim().is_empty() {
            return Err(ReportError::Config(
                "output.log_file must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("output.staging_dir", &self.output.staging_dir),
            ("output.output_dir", &self.output.output_dir),
            ("output.log_dir", &self.output.log_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ReportError::Config(format!("{} must not be empty", name)));
            }
        }
        if self.output.staging_path() == self.output.output_path() {
            return Err(ReportError::Config(
                "output.staging_dir and output.output_dir must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Mailbox to scan: the configured address, else `MAILBOX_EMAIL`
    pub fn resolve_mailbox(&self) -> Result<String> {
        let configured = self.mailbox.address.trim();
        if !configured.is_empty() {
            return Ok(configured.to_string());
        }
        std::env::var(MAILBOX_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ReportError::Config(format!(
                    "No mailbox configured: set mailbox.address or {}",
                    MAILBOX_ENV
                ))
            })
    }
}
