//! Result export.
//!
//! Serializes an already-filtered, already-sorted result set back to a
//! delimited file: the original header row followed by the matching raw
//! rows in result order. Pure serialization; no filtering or aggregation
//! logic lives here. Output is quoted always for round-trip safety and can
//! be transcoded to a non-UTF-8 encoding on request.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::search::ResultSet;

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn write_csv(path: &Path, results: &ResultSet<'_>, encoding: &'static Encoding) -> Result<()> {
    let table = results.table();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(table.delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(Vec::new());

    writer
        .write_record(&table.headers)
        .context("Writing header row")?;
    for &row in results.indices() {
        writer
            .write_record(&table.rows[row])
            .with_context(|| format!("Writing row {row}"))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {err}"))?;

    let bytes = if encoding == UTF_8 {
        buffer
    } else {
        let text = String::from_utf8(buffer).context("CSV output was not valid UTF-8")?;
        let (encoded, _, had_errors) = encoding.encode(&text);
        if had_errors {
            return Err(anyhow!(
                "Failed to encode output using {}",
                encoding.name()
            ));
        }
        encoded.into_owned()
    };
    fs::write(path, bytes).with_context(|| format!("Creating output file {path:?}"))
}
