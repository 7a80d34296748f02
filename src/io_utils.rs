//! Delimiter resolution, text decoding, and reader construction.
//!
//! - **Delimiter resolution**: extension-based detection (`.tsv` → tab,
//!   anything else → comma) for both local paths and URL paths, with an
//!   explicit override always winning.
//! - **Encoding**: bytes are decoded through `encoding_rs`. A byte-order mark
//!   wins over any declared label; otherwise the declared label is used,
//!   falling back to UTF-8.
//! - **Reader construction**: every CSV reader is built by
//!   [`open_csv_reader`] so quoting rules stay identical across callers.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| delimiter_for_extension(path.extension().and_then(|e| e.to_str())))
}

/// Resolves the delimiter for a remote file from the last segment of its
/// URL path, ignoring any query string or fragment.
pub fn resolve_url_delimiter(url: &str, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = without_suffix.rsplit('/').next().unwrap_or(without_suffix);
    let extension = last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty());
    delimiter_for_extension(extension)
}

fn delimiter_for_extension(extension: Option<&str>) -> u8 {
    match extension {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

/// Extracts the `charset` parameter from a `Content-Type` header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decodes `bytes` to text. Returns `None` when the bytes are malformed for
/// the chosen encoding. The byte-order mark, if any, is stripped.
pub fn decode_text(bytes: &[u8], declared: Option<&'static Encoding>) -> Option<String> {
    let (encoding, bom_len) =
        Encoding::for_bom(bytes).unwrap_or((declared.unwrap_or(UTF_8), 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

pub fn read_input(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading from stdin")?;
    } else {
        BufReader::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    decode_text(&bytes, Some(encoding))
        .ok_or_else(|| anyhow!("Failed to decode {path:?} with encoding {}", encoding.name()))
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
