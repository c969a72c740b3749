//! Tagged training corpus: one `<text> <tag>` record per line.
//!
//! `W` marks a dictionary word taken as a single unit, `S` a sentence that
//! must be segmented into words before counting.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid corpus line {line_no}: {content:?}")]
    InvalidCorpusLine { line_no: usize, content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// `W`: the text is one word unit.
    Word,
    /// `S`: the text is a sentence to be segmented.
    Sentence,
}

impl DataKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "W" => Some(Self::Word),
            "S" => Some(Self::Sentence),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Word => "W",
            Self::Sentence => "S",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLine {
    pub text: String,
    pub kind: DataKind,
}

impl CorpusLine {
    pub fn new(text: impl Into<String>, kind: DataKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Parse one line. Blank lines yield `Ok(None)`; a line without a valid tag
/// is an error carrying the 1-based line number.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<CorpusLine>, CorpusError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let invalid = || CorpusError::InvalidCorpusLine {
        line_no,
        content: line.to_string(),
    };

    let mut fields = trimmed.split_whitespace();
    let text = fields.next().ok_or_else(invalid)?;
    let kind = fields
        .next()
        .and_then(DataKind::from_tag)
        .ok_or_else(invalid)?;
    Ok(Some(CorpusLine::new(text, kind)))
}

/// Parse an entire corpus held in memory. Fails on the first bad line.
pub fn parse_corpus(text: &str) -> Result<Vec<CorpusLine>, CorpusError> {
    let mut lines = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(parsed) = parse_line(line, i + 1)? {
            lines.push(parsed);
        }
    }
    Ok(lines)
}

/// Read and parse a corpus file.
pub fn read_corpus(path: &Path) -> Result<Vec<CorpusLine>, CorpusError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        if let Some(parsed) = parse_line(&line?, i + 1)? {
            lines.push(parsed);
        }
    }
    Ok(lines)
}
