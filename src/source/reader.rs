use crate::config::Config;
use crate::source::format::{FormatError, LogFormat};
use crate::source::timestamp::{TimestampError, TimestampExtractor};
use crate::template::{TemplateHandle, TemplateParser};
use chrono::{DateTime, FixedOffset};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log format error: {0}")]
    Format(#[from] FormatError),

    #[error("timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("message field '{0}' is not part of the log format")]
    UnknownMessageField(String),

    #[error("dataset '{dataset}', {} line {line}: {reason}", path.display())]
    ParseFailure {
        dataset: String,
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub timestamp: DateTime<FixedOffset>,
    pub template_key: String,
}

/// A named collection of records in original file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub records: Vec<LogRecord>,
}

#[derive(Debug, Clone, Copy)]
struct PendingRecord {
    line: usize,
    timestamp: DateTime<FixedOffset>,
    handle: TemplateHandle,
}

/// Records whose templates are not final yet.
///
/// The template parser may keep generalizing a template while later lines
/// (of this or another dataset) are observed. Call [`resolve`](Self::resolve)
/// once the whole corpus has been read.
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    name: String,
    records: Vec<PendingRecord>,
}

impl ParsedDataset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn resolve(self, parser: &dyn TemplateParser) -> Dataset {
        let records = self
            .records
            .into_iter()
            .map(|r| LogRecord {
                line: r.line,
                timestamp: r.timestamp,
                template_key: parser.template_key(r.handle).to_string(),
            })
            .collect();

        Dataset {
            name: self.name,
            records,
        }
    }
}

/// Reads raw log files into timestamped template observations.
#[derive(Debug, Clone)]
pub struct DatasetReader {
    format: LogFormat,
    timestamps: TimestampExtractor,
    message_field: String,
}

impl DatasetReader {
    pub fn new(
        format: LogFormat,
        timestamps: TimestampExtractor,
        message_field: &str,
    ) -> Result<Self, ReaderError> {
        if !format.has_field(message_field) {
            return Err(ReaderError::UnknownMessageField(message_field.to_string()));
        }
        Ok(Self {
            format,
            timestamps,
            message_field: message_field.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ReaderError> {
        let format = LogFormat::new(&config.log_format)?;
        let timestamps = TimestampExtractor::new(
            &config.timestamp.template,
            &config.timestamp.format,
            &format,
        )?;
        Self::new(format, timestamps, &config.message_field)
    }

    /// Read a dataset file. Any line that does not parse fails the whole
    /// dataset.
    pub fn read_file(
        &self,
        name: &str,
        path: &Path,
        parser: &mut dyn TemplateParser,
    ) -> Result<ParsedDataset, ReaderError> {
        info!(dataset = %name, path = %path.display(), "Reading dataset");

        let file = File::open(path).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = self.read(name, path, BufReader::new(file), parser)?;

        info!(
            dataset = %name,
            records = dataset.len(),
            templates = parser.template_count(),
            "Dataset parsed"
        );
        Ok(dataset)
    }

    /// Read lines from any buffered source. `path` is only used in errors.
    pub fn read<R: BufRead>(
        &self,
        name: &str,
        path: &Path,
        mut reader: R,
        parser: &mut dyn TemplateParser,
    ) -> Result<ParsedDataset, ReaderError> {
        let mut records = Vec::new();
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ReaderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let failure = |reason: String| ReaderError::ParseFailure {
                dataset: name.to_string(),
                path: path.to_path_buf(),
                line: line_no,
                reason,
            };

            // invalid UTF-8 is a malformed line, not an I/O error
            let line = std::str::from_utf8(trim_line_ending(&buf))
                .map_err(|e| failure(format!("line is not valid UTF-8: {}", e)))?;

            let fields = self.format.parse(line).ok_or_else(|| {
                failure(format!(
                    "line does not match log format '{}'",
                    self.format.as_str()
                ))
            })?;
            let timestamp = self
                .timestamps
                .extract(&fields)
                .map_err(|e| failure(e.to_string()))?;
            let message = fields.get(&self.message_field).unwrap_or_default();

            let handle = parser.observe(message);
            records.push(PendingRecord {
                line: line_no,
                timestamp,
                handle,
            });

            if line_no % 10_000 == 0 {
                debug!(dataset = %name, lines = line_no, "Reading progress");
            }
        }

        Ok(ParsedDataset {
            name: name.to_string(),
            records,
        })
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
