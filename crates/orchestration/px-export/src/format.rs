//! Record formats for partition output files.
//!
//! Every entry becomes one newline-terminated record:
//!
//! - `csv`: `kind,bucket,key,size,last_modified` with RFC 3339 timestamps;
//!   prefixes leave the last two columns empty. Backslash, CR and LF in the
//!   bucket and key are written as `\\`, `\r` and `\n`
//! - `json`: one JSON object per line, tagged with `"kind"`

use chrono::{DateTime, SecondsFormat, Utc};
use px_error::{ExportError, Result};
use px_types::{Entry, EntryKind};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Output record format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" | "jsonl" | "ndjson" => Ok(Self::Json),
            other => Err(ExportError::Format(format!(
                "unknown output format '{other}' (expected csv or json)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Renders entries as records of one [`OutputFormat`] and parses them back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFormatter {
    format: OutputFormat,
}

impl RecordFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Render one entry as a newline-terminated record.
    pub fn format(&self, entry: &Entry) -> Result<String> {
        match self.format {
            OutputFormat::Csv => format_csv(entry),
            OutputFormat::Json => {
                let mut line = serde_json::to_string(entry)
                    .map_err(|e| ExportError::Format(format!("cannot encode entry: {e}")))?;
                line.push('\n');
                Ok(line)
            }
        }
    }

    /// Parse one record produced by [`RecordFormatter::format`].
    pub fn parse(&self, record: &str) -> Result<Entry> {
        let record = record.trim_end_matches(['\r', '\n']);
        match self.format {
            OutputFormat::Csv => parse_csv(record),
            OutputFormat::Json => serde_json::from_str(record)
                .map_err(|e| ExportError::Format(format!("cannot decode record: {e}"))),
        }
    }
}

fn format_csv(entry: &Entry) -> Result<String> {
    let size = entry.size().map(|s| s.to_string()).unwrap_or_default();
    let last_modified = entry
        .last_modified()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default();

    let bucket = escape_field(entry.bucket());
    let key = escape_field(entry.key());

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record([
            entry.kind().as_str(),
            bucket.as_ref(),
            key.as_ref(),
            size.as_str(),
            last_modified.as_str(),
        ])
        .map_err(|e| ExportError::Format(format!("cannot encode entry: {e}")))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Format(format!("cannot encode entry: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Format(e.to_string()))
}

fn parse_csv(record: &str) -> Result<Entry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(record.as_bytes());

    let row = reader
        .records()
        .next()
        .ok_or_else(|| ExportError::Format("empty record".to_string()))?
        .map_err(|e| ExportError::Format(format!("cannot decode record: {e}")))?;

    if row.len() != 5 {
        return Err(ExportError::Format(format!(
            "expected 5 columns, found {}",
            row.len()
        )));
    }

    let kind = match &row[0] {
        "OBJECT" => EntryKind::Object,
        "PREFIX" => EntryKind::Prefix,
        other => return Err(ExportError::Format(format!("unknown entry kind '{other}'"))),
    };
    let bucket = unescape_field(&row[1])?;
    let key = unescape_field(&row[2])?;

    match kind {
        EntryKind::Prefix => Ok(Entry::prefix(bucket, key)),
        EntryKind::Object => {
            let size = row[3]
                .parse::<u64>()
                .map_err(|e| ExportError::Format(format!("invalid size '{}': {e}", &row[3])))?;
            let last_modified = match &row[4] {
                "" => None,
                ts => Some(
                    DateTime::parse_from_rfc3339(ts)
                        .map_err(|e| {
                            ExportError::Format(format!("invalid timestamp '{ts}': {e}"))
                        })?
                        .with_timezone(&Utc),
                ),
            };
            Ok(Entry::object(bucket, key, size, last_modified))
        }
    }
}

/// Keep a field on one line: `\` becomes `\\`, CR and LF become `\r` and `\n`.
fn escape_field(field: &str) -> Cow<'_, str> {
    if !field.contains(['\\', '\r', '\n']) {
        return Cow::Borrowed(field);
    }
    let mut escaped = String::with_capacity(field.len() + 2);
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn unescape_field(field: &str) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            other => {
                return Err(ExportError::Format(format!(
                    "invalid escape '\\{}' in '{field}'",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}
