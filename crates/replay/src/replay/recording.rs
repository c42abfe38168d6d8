use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use chrono::NaiveTime;

/// `HH:MM:SS.ffffff`; chrono's `%.f` accepts any number of fractional digits.
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.f";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to read log: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: invalid timestamp {field:?}")]
    InvalidTimestamp { line: usize, field: String },
    #[error("log contains no lines")]
    Empty,
}

/// Parses the leading `HH:MM:SS.ffffff` field of a log record.
pub fn parse_timestamp(field: &str) -> Option<NaiveTime> {
    // chrono treats the fraction as optional; the recorder always writes one.
    if !field.contains('.') {
        return None;
    }
    NaiveTime::parse_from_str(field, TIMESTAMP_FORMAT).ok()
}

/// One recorded sentence, kept verbatim including its timestamp field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    timestamp: NaiveTime,
    text: String,
}

impl LogLine {
    pub fn parse(text: &str) -> Option<Self> {
        let field = text.split(' ').next()?;
        let timestamp = parse_timestamp(field)?;
        Some(Self {
            timestamp,
            text: text.to_owned(),
        })
    }

    pub fn timestamp(&self) -> NaiveTime {
        self.timestamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Wire form: the original text terminated with CRLF.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.text.len() + 2);
        bytes.extend_from_slice(self.text.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

/// An ordered, non-empty recording. Lines are kept in file order.
#[derive(Debug, Clone)]
pub struct ReplayLog {
    lines: Vec<LogLine>,
}

impl ReplayLog {
    pub fn new(lines: Vec<LogLine>) -> Result<Self, LogError> {
        if lines.is_empty() {
            return Err(LogError::Empty);
        }
        Ok(Self { lines })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads one record per line. Trailing whitespace and terminators are
    /// stripped; blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LogError> {
        let mut lines = Vec::new();

        for (index, raw) in reader.lines().enumerate() {
            let raw = raw?;
            let text = raw.trim_end();
            if text.is_empty() {
                continue;
            }

            let line = LogLine::parse(text).ok_or_else(|| LogError::InvalidTimestamp {
                line: index + 1,
                field: text.split(' ').next().unwrap_or_default().to_owned(),
            })?;
            lines.push(line);
        }

        Self::new(lines)
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
