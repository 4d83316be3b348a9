//! Spreadsheet report: raw matches sheet, summary sheet, and the final move
//!
//! A report is built at a staging path in two phases (raw sheet, then the
//! optional summary sheet) and only becomes visible once [`finalize`]
//! renames it into the output directory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::{ReportError, Result};
use crate::models::{AggregateRow, MatchRow};

pub const REPORT_EXTENSION: &str = "xlsx";

pub const RAW_SHEET_NAME: &str = "Sheet1";
pub const SUBJECT_HEADER: &str = "Título do Chamado (Assunto)";
pub const BODY_HEADER: &str = "Corpo do Email Resumido";

pub const SUMMARY_SHEET_NAME: &str = "Resumo_Chamados";
pub const LABEL_HEADER: &str = "Chamado";
pub const COUNT_HEADER: &str = "Quantidade de Chamados";

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-]").expect("valid filename regex"));

/// Replace every character outside word characters and `-` with `_`
pub fn sanitize_keyword(keyword: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(keyword, "_").into_owned()
}

/// `<prefix>_<sanitized-keyword>.xlsx`
pub fn report_file_name(prefix: &str, keyword: &str) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        sanitize_keyword(keyword),
        REPORT_EXTENSION
    )
}

/// Create a new workbook at `path` holding one row per match.
///
/// The header row is always written, so an empty match set still yields a
/// valid sheet with its columns defined. An existing file is replaced.
pub fn write_raw(matches: &[MatchRow], path: &Path) -> Result<()> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| ReportError::Spreadsheet("new workbook has no sheet".to_string()))?;
    sheet.set_name(RAW_SHEET_NAME);

    write_row(sheet, 1, &[SUBJECT_HEADER, BODY_HEADER]);
    for (i, row) in matches.iter().enumerate() {
        let r = i as u32 + 2;
        write_row(sheet, r, &[row.subject.as_str(), row.summarized_body.as_str()]);
    }

    save(&book, path)?;
    debug!("Wrote {} raw rows to {:?}", matches.len(), path);
    Ok(())
}

/// Add (or replace) the summary sheet in the existing workbook at `path`,
/// leaving every other sheet untouched.
pub fn append_aggregate(aggregates: &[AggregateRow], path: &Path) -> Result<()> {
    let mut book = open(path)?;

    if has_sheet(&book, SUMMARY_SHEET_NAME) {
        book.remove_sheet_by_name(SUMMARY_SHEET_NAME)
            .map_err(|e| ReportError::Spreadsheet(format!("Failed to replace sheet: {}", e)))?;
        debug!("Replacing existing {} sheet", SUMMARY_SHEET_NAME);
    }

    let sheet = book
        .new_sheet(SUMMARY_SHEET_NAME)
        .map_err(|e| ReportError::Spreadsheet(format!("Failed to add sheet: {}", e)))?;

    write_row(sheet, 1, &[LABEL_HEADER, COUNT_HEADER]);
    for (i, aggregate) in aggregates.iter().enumerate() {
        let r = i as u32 + 2;
        sheet
            .get_cell_mut((1u32, r))
            .set_value_string(aggregate.display_label.as_str());
        sheet
            .get_cell_mut((2u32, r))
            .set_value_number(aggregate.count as f64);
    }

    save(&book, path)?;
    debug!("Wrote {} summary rows to {:?}", aggregates.len(), path);
    Ok(())
}

/// Move the staged report into `destination_dir`, keeping its file name.
///
/// This is a rename, never a copy; a same-named file already in the
/// destination is overwritten.
pub async fn finalize(path: &Path, destination_dir: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Staging path {:?} has no file name", path),
        ))
    })?;
    let final_path = destination_dir.join(file_name);

    tokio::fs::rename(path, &final_path).await?;
    info!("Moved report to {:?}", final_path);
    Ok(final_path)
}

/// Sheet names and data-row counts (header excluded) of a report on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub sheets: Vec<(String, usize)>,
}

impl ReportSummary {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn data_rows(&self, sheet: &str) -> Option<usize> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| *rows)
    }
}

/// Reopen a report and describe its sheets
pub fn read_summary(path: &Path) -> Result<ReportSummary> {
    let book = open(path)?;
    let sheets = book
        .get_sheet_collection()
        .iter()
        .map(|sheet| {
            let rows = sheet.get_highest_row().saturating_sub(1) as usize;
            (sheet.get_name().to_string(), rows)
        })
        .collect();
    Ok(ReportSummary { sheets })
}

/// Text cells are always stored as strings, never type-guessed
fn write_row(sheet: &mut Worksheet, row: u32, values: &[&str]) {
    for (i, value) in values.iter().enumerate() {
        sheet.get_cell_mut((i as u32 + 1, row)).set_value_string(*value);
    }
}

fn has_sheet(book: &Spreadsheet, name: &str) -> bool {
    book.get_sheet_collection()
        .iter()
        .any(|sheet| sheet.get_name() == name)
}

fn open(path: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| ReportError::Spreadsheet(format!("Failed to open {:?}: {}", path, e)))
}

fn save(book: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path)
        .map_err(|e| ReportError::Spreadsheet(format!("Failed to write {:?}: {}", path, e)))
}
