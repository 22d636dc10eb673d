//! Partition output files.

use async_trait::async_trait;
use px_error::{ExportError, Result};
use px_lister::EntryConsumer;
use px_types::Entry;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::format::RecordFormatter;

/// Written once when a sink is opened, before any record.
const RECORD_SEPARATOR: &[u8] = b"\n";

/// How an existing output file is treated on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Keep existing content and write after it
    Append,

    /// Discard existing content
    Truncate,
}

/// Location of one partition's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target named `<file_prefix>_<partition_id>` inside `dir`.
    pub fn for_partition(dir: &Path, file_prefix: &str, partition_id: &str) -> Self {
        Self::new(dir.join(format!("{file_prefix}_{partition_id}")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether something already exists at the target path.
    pub async fn exists(&self) -> io::Result<bool> {
        tokio::fs::try_exists(&self.path).await
    }

    /// Delete the output file. A missing file is not an error.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExportError::output_target(&self.path, e)),
        }
    }

    /// Open the target for writing records with `formatter`.
    pub async fn open(&self, mode: OpenMode, formatter: RecordFormatter) -> Result<FileSink> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Append => {
                options.append(true);
            }
            OpenMode::Truncate => {
                options.write(true).truncate(true);
            }
        }

        let file = options
            .open(&self.path)
            .await
            .map_err(|e| ExportError::output_target(&self.path, e))?;

        let mut sink = FileSink {
            path: self.path.clone(),
            writer: BufWriter::new(file),
            formatter,
            entries: 0,
            bytes: 0,
        };
        sink.write_raw(RECORD_SEPARATOR).await?;
        Ok(sink)
    }
}

/// [`EntryConsumer`] appending formatted records to a file.
///
/// Writes are buffered; [`FileSink::close`] must be called to flush them.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    formatter: RecordFormatter,
    entries: u64,
    bytes: u64,
}

impl FileSink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far.
    pub fn entries_written(&self) -> u64 {
        self.entries
    }

    /// Total size of the objects written so far.
    pub fn bytes_listed(&self) -> u64 {
        self.bytes
    }

    /// Flush buffered records and close the file.
    pub async fn close(mut self) -> Result<()> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| ExportError::output_target(&self.path, e))
    }

    async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .await
            .map_err(|e| ExportError::output_target(&self.path, e))
    }
}

#[async_trait]
impl EntryConsumer for FileSink {
    async fn consume(&mut self, entry: Entry) -> Result<()> {
        let record = self.formatter.format(&entry)?;
        self.write_raw(record.as_bytes()).await?;
        self.entries += 1;
        self.bytes += entry.size().unwrap_or(0);
        Ok(())
    }
}
