//! String encodings for list-valued output columns
//!
//! The output table is comma-delimited, so list columns use their own
//! delimiters: `;` between domains and `|` between embedding components.

use crate::error::{Error, Result};

/// Separator between domains in the `domains` column
pub const DOMAIN_DELIMITER: char = ';';

/// Separator between components in the embedding column
pub const EMBEDDING_DELIMITER: char = '|';

/// Digits kept after the decimal point for each embedding component
pub const EMBEDDING_PRECISION: usize = 6;

/// Serialize an embedding as fixed-precision decimals
pub fn encode_embedding(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10);
    for (i, value) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(EMBEDDING_DELIMITER);
        }
        out.push_str(&format!("{:.*}", EMBEDDING_PRECISION, value));
    }
    out
}

/// Parse an embedding column back into floats
pub fn decode_embedding(encoded: &str) -> Result<Vec<f32>> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    encoded
        .split(EMBEDDING_DELIMITER)
        .enumerate()
        .map(|(i, part)| {
            part.trim().parse::<f32>().map_err(|e| {
                Error::input_format(format!("invalid embedding component {}: '{}' ({})", i, part, e))
            })
        })
        .collect()
}

/// Join domains in order, duplicates kept
pub fn join_domains(domains: &[String]) -> String {
    let mut delimiter = [0u8; 4];
    domains.join(DOMAIN_DELIMITER.encode_utf8(&mut delimiter))
}

/// Split a `domains` column value
pub fn split_domains(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(DOMAIN_DELIMITER).map(str::to_string).collect()
}
