//! Downloadable exports and the CSV helpers the tools read and write with.

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, StringRecord, Terminator};
use serde::Serialize;

use super::WidgetError;

pub const MIME_JSON: &str = "application/json";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_TEXT: &str = "text/plain";

/// A file the client offers as a download. Never stored server-side.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExportFile {
  pub filename: String,
  pub mime: &'static str,
  pub content: String,
}

impl ExportFile {
  pub fn json(filename: String, value: &impl Serialize) -> Result<ExportFile, WidgetError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| WidgetError::Export(e.to_string()))?;
    Ok(ExportFile { filename, mime: MIME_JSON, content })
  }

  pub fn csv(filename: String, content: String) -> ExportFile { ExportFile { filename, mime: MIME_CSV, content } }

  pub fn text(filename: String, content: String) -> ExportFile { ExportFile { filename, mime: MIME_TEXT, content } }
}

/// "New Product  Launch" → "New-Product-Launch"; blank → `fallback`.
pub fn filename_part(name: &str, fallback: &str) -> String {
  let joined = name.split_whitespace().collect::<Vec<_>>().join("-");
  if joined.is_empty() { fallback.to_string() } else { joined }
}

/// ISO-8601 with milliseconds and a `Z` suffix.
pub fn iso_timestamp(t: DateTime<Utc>) -> String { t.to_rfc3339_opts(SecondsFormat::Millis, true) }

/// CSV text with a bare header line. Data fields are double-quoted unless
/// numeric; embedded quotes are doubled.
pub fn write_csv<I, R, S>(header: &[&str], rows: I) -> Result<String, WidgetError>
where
  I: IntoIterator<Item = R>,
  R: IntoIterator<Item = S>,
  S: AsRef<[u8]>,
{
  let export_err = |e: csv::Error| WidgetError::Export(e.to_string());
  let mut head = csv::WriterBuilder::new()
    .quote_style(QuoteStyle::Necessary)
    .terminator(Terminator::Any(b'\n'))
    .from_writer(Vec::new());
  head.write_record(header).map_err(export_err)?;
  let buf = head.into_inner().map_err(|e| WidgetError::Export(e.to_string()))?;

  let mut body = csv::WriterBuilder::new()
    .quote_style(QuoteStyle::NonNumeric)
    .terminator(Terminator::Any(b'\n'))
    .from_writer(buf);
  for row in rows {
    body.write_record(row).map_err(export_err)?;
  }
  let bytes = body.into_inner().map_err(|e| WidgetError::Export(e.to_string()))?;
  String::from_utf8(bytes).map_err(|e| WidgetError::Export(e.to_string()))
}

/// Data rows of a CSV file; the first line is taken as the header. Rows may
/// have any number of fields and blank lines are skipped.
pub fn read_csv(content: &str) -> Result<Vec<StringRecord>, WidgetError> {
  let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(content.as_bytes());
  reader.records().collect::<Result<Vec<_>, _>>().map_err(|e| WidgetError::Import(e.to_string()))
}
