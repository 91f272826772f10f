use crate::api::{format_timestamp, ContributorRecord, Result};
use anyhow::Context;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;
use std::path::Path;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// Writes `records` to `path`, replacing the file if it exists.
pub fn save(format: OutputFormat, path: &Path, records: &[ContributorRecord]) -> Result<()> {
    match format {
        OutputFormat::Csv => save_csv(path, records)?,
        OutputFormat::Xlsx => save_xlsx(path, records)?,
    }
    info!("Saved {} contributors to {}", records.len(), path.display());
    Ok(())
}

pub fn save_csv(path: &Path, records: &[ContributorRecord]) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, records).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Header row followed by one RFC 4180 quoted row per record. The header is written even for an empty table.
pub fn write_csv<W: Write>(writer: W, records: &[ContributorRecord]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(ContributorRecord::COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_xlsx(path: &Path, records: &[ContributorRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header = Format::new().set_bold();
    for (col, column) in ContributorRecord::COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *column, &header)
            .context("Failed to write header")?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, cell) in cells(record).iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                Cell::Text(Some(text)) => worksheet.write_string(row, col, *text),
                Cell::Number(number) => worksheet.write_number(row, col, *number as f64),
                Cell::Time(Some(time)) => worksheet.write_string(row, col, time),
                Cell::Text(None) | Cell::Time(None) => continue,
            };
            written.with_context(|| format!("Failed to write row {}", row))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

enum Cell<'a> {
    Text(Option<&'a str>),
    Number(u32),
    Time(Option<String>),
}

/// Values of `record` in `ContributorRecord::COLUMNS` order.
fn cells(record: &ContributorRecord) -> [Cell<'_>; 16] {
    [
        Cell::Text(Some(&record.project_name)),
        Cell::Text(Some(&record.project_url)),
        Cell::Text(Some(&record.username)),
        Cell::Text(Some(&record.profile_url)),
        Cell::Text(record.name.as_deref()),
        Cell::Text(record.email.as_deref()),
        Cell::Text(record.twitter.as_deref()),
        Cell::Text(record.website.as_deref()),
        Cell::Text(record.location.as_deref()),
        Cell::Text(record.company.as_deref()),
        Cell::Number(record.contributions),
        Cell::Number(record.followers),
        Cell::Number(record.following),
        Cell::Number(record.public_repos),
        Cell::Time(record.account_created.as_ref().map(format_timestamp)),
        Cell::Time(record.last_updated.as_ref().map(format_timestamp)),
    ]
}
