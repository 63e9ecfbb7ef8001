//! Tabular input and output
//!
//! Input is a CSV file with a header row, or a JSON array of comment objects
//! as written by the acquisition layer. Output is always CSV with the columns
//! in [`OUTPUT_COLUMNS`].

use scamlens_core::{
    decode_embedding, encode_embedding, join_domains, split_domains, Error, FeatureRecord,
    RawComment, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Columns every input must provide
pub const REQUIRED_COLUMNS: [&str; 3] = ["comment_id", "video_id", "text"];

/// Output columns, in order
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "comment_id",
    "video_id",
    "text_clean",
    "tokens",
    "num_words",
    "num_urls",
    "domains",
    "num_scam_keywords",
    "phobert_emb",
];

/// One input row: a comment, or the reason the row is unusable
pub type InputRow = Result<RawComment>;

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Pick the format from the file extension; CSV unless `.json`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Read all rows of an input file.
///
/// A missing required column fails the whole read. Rows that are present but
/// unusable come back as `Err` entries so the caller can skip them.
pub fn read_comments(path: impl AsRef<Path>) -> Result<Vec<InputRow>> {
    let path = path.as_ref();
    let rows = match InputFormat::from_path(path) {
        InputFormat::Csv => {
            let file = std::fs::File::open(path).map_err(|e| {
                Error::input_format(format!("Failed to open {}: {}", path.display(), e))
            })?;
            read_csv(file)?
        }
        InputFormat::Json => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::input_format(format!("Failed to read {}: {}", path.display(), e))
            })?;
            read_json(&content)?
        }
    };

    info!("Read {} input rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read CSV rows from any reader
pub fn read_csv<R: std::io::Read>(input: R) -> Result<Vec<InputRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);

    let headers = reader
        .byte_headers()
        .map_err(|e| Error::input_format(format!("Failed to read header row: {}", e)))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h == name.as_bytes());

    let mut required = [0usize; 3];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name).ok_or_else(|| Error::missing_column(name))?;
    }
    let [id_col, video_col, text_col] = required;
    let author_col = column("author");
    let published_col = column("published_at");
    let likes_col = column("like_count");

    let mut rows = Vec::new();
    for (line, record) in reader.byte_records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(Error::input_format(format!("Failed to read input: {}", e)));
            }
            Err(e) => {
                rows.push(Err(Error::input_format(format!("row {}: {}", line + 1, e))));
                continue;
            }
        };

        let field = |idx: usize, name: &str| -> Result<String> {
            let bytes = record.get(idx).ok_or_else(|| {
                Error::input_format(format!("row {}: missing value for '{}'", line + 1, name))
            })?;
            std::str::from_utf8(bytes).map(str::to_string).map_err(|_| {
                Error::input_format(format!("row {}: '{}' is not valid UTF-8 text", line + 1, name))
            })
        };
        let optional = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let row = (|| -> Result<RawComment> {
            let mut comment = RawComment::new(
                field(id_col, "comment_id")?,
                field(video_col, "video_id")?,
                field(text_col, "text")?,
            );
            comment.author = optional(author_col);
            comment.published_at = optional(published_col);
            comment.like_count = optional(likes_col).and_then(|v| v.trim().parse().ok());
            Ok(comment)
        })();
        rows.push(row);
    }

    Ok(rows)
}

/// Read a JSON array of comment objects
pub fn read_json(content: &str) -> Result<Vec<InputRow>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::input_format(format!("Invalid JSON input: {}", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| Error::input_format("JSON input must be an array of comments"))?;

    // Column presence is checked over the whole input before any row is used.
    for name in REQUIRED_COLUMNS {
        if items
            .iter()
            .any(|item| item.as_object().is_some_and(|obj| !obj.contains_key(name)))
        {
            return Err(Error::missing_column(name));
        }
    }

    Ok(items
        .iter()
        .enumerate()
        .map(|(idx, item)| json_row(idx, item))
        .collect())
}

fn json_row(idx: usize, item: &serde_json::Value) -> InputRow {
    let obj = item
        .as_object()
        .ok_or_else(|| Error::input_format(format!("row {}: expected an object", idx + 1)))?;

    let identifier = |name: &str| -> Result<String> {
        match &obj[name] {
            serde_json::Value::String(s) => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(Error::input_format(format!(
                "row {}: '{}' must be a string, found {}",
                idx + 1,
                name,
                json_type_name(other)
            ))),
        }
    };

    let text = match &obj["text"] {
        serde_json::Value::String(s) => s.clone(),
        other => {
            return Err(Error::input_format(format!(
                "row {}: expected text, found {}",
                idx + 1,
                json_type_name(other)
            )))
        }
    };

    let mut comment = RawComment::new(identifier("comment_id")?, identifier("video_id")?, text);
    comment.author = obj.get("author").and_then(|v| v.as_str()).map(str::to_string);
    comment.published_at = obj
        .get("published_at")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    comment.like_count = obj.get("like_count").and_then(|v| v.as_u64());
    Ok(comment)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Flat, string-encoded form of a [`FeatureRecord`] as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub comment_id: String,
    pub video_id: String,
    pub text_clean: String,
    pub tokens: String,
    pub num_words: usize,
    pub num_urls: usize,
    pub domains: String,
    pub num_scam_keywords: usize,
    pub phobert_emb: String,
}

impl From<&FeatureRecord> for FeatureRow {
    fn from(record: &FeatureRecord) -> Self {
        Self {
            comment_id: record.comment_id.clone(),
            video_id: record.video_id.clone(),
            text_clean: record.text_clean.clone(),
            tokens: record.tokens.clone(),
            num_words: record.num_words,
            num_urls: record.num_urls,
            domains: join_domains(&record.domains),
            num_scam_keywords: record.num_scam_keywords,
            phobert_emb: encode_embedding(&record.embedding),
        }
    }
}

impl TryFrom<FeatureRow> for FeatureRecord {
    type Error = Error;

    fn try_from(row: FeatureRow) -> Result<Self> {
        Ok(Self {
            embedding: decode_embedding(&row.phobert_emb)?,
            domains: split_domains(&row.domains),
            comment_id: row.comment_id,
            video_id: row.video_id,
            text_clean: row.text_clean,
            tokens: row.tokens,
            num_words: row.num_words,
            num_urls: row.num_urls,
            num_scam_keywords: row.num_scam_keywords,
        })
    }
}

/// Write the feature table in one go.
///
/// Parent directories are created. Rows go to a temporary sibling first and
/// are renamed into place, so a failed write leaves no partial artifact.
pub fn write_features(path: impl AsRef<Path>, records: &[FeatureRecord]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::persistence(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let tmp_path = temp_sibling(path)?;
    if let Err(e) = write_csv(&tmp_path, records) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        Error::persistence(format!("Failed to move output into {}: {}", path.display(), e))
    })?;

    info!("Saved {} feature rows to {}", records.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::persistence(format!("Invalid output path {}", path.display())))?;
    Ok(path.with_file_name(format!(".{}.tmp", file_name)))
}

fn write_csv(path: &Path, records: &[FeatureRecord]) -> Result<()> {
    let persistence = |e: csv::Error| {
        Error::persistence(format!("Failed to write {}: {}", path.display(), e))
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(persistence)?;

    writer.write_record(OUTPUT_COLUMNS).map_err(persistence)?;
    for record in records {
        writer.serialize(FeatureRow::from(record)).map_err(persistence)?;
    }

    writer.flush().map_err(|e| {
        Error::persistence(format!("Failed to flush {}: {}", path.display(), e))
    })?;
    debug!("Flushed {}", path.display());
    Ok(())
}

/// Read a feature table written by [`write_features`]
pub fn read_features(path: impl AsRef<Path>) -> Result<Vec<FeatureRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        Error::input_format(format!("Failed to open {}: {}", path.display(), e))
    })?;

    reader
        .deserialize::<FeatureRow>()
        .map(|row| {
            let row = row.map_err(|e| Error::input_format(format!("Invalid feature row: {}", e)))?;
            FeatureRecord::try_from(row)
        })
        .collect()
}
