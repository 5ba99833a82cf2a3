//! Table loading with encoding and delimiter fallback.
//!
//! Experience exports come out of spreadsheets in inconsistent shapes:
//! UTF-8 or Windows-1252 bytes, semicolon or comma delimited. The loader
//! tries each encoding in priority order, and within an encoding each
//! candidate delimiter, accepting the first combination that parses into a
//! table with at least two columns. A file that survives no combination is
//! reported as [`LoadError::NoTable`] rather than a panic or a partial read.

use std::{fs, path::Path};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;
use thiserror::Error;

const DELIMITER_CANDIDATES: &[u8] = &[b';', b','];

/// Minimum column count for a parse attempt to be considered successful.
const MIN_COLUMNS: usize = 2;

/// Five-row sample dataset of municipal contracting experiences, used when
/// no input file is given and as the reference layout for positional
/// fallback resolution.
pub const SAMPLE_DATA: &str = "\
ID_Experiencia;Consecutivo;Celebrado_Por;Contratista;Contratante;Objeto;Valor_SMMLV;Valor COP;Porcentaje_Participacion;Codigos_UNSPSC
1;001;EL PROPONENTE;SUFORMA;ALCALDIA EJEMPLO;SUMINISTRO DE PAPELERIA E IMPRESOS;111,31;144.703.000;1;11101500, 14111500
2;002;CONSORCIO;SUFORMA;GOBERNACION DEL VALLE;DOTACION DE MOBILIARIO ESCOLAR;50,5;65.000.000;0.5;56121000, 56101700
3;003;UNION TEMPORAL;SUFORMA;HOSPITAL SAN JORGE;MANTENIMIENTO DE EQUIPOS DE COMPUTO;200,00;260.000.000;1;81111800, 81112300
4;004;EL PROPONENTE;SUFORMA;ALCALDIA DE PEREIRA;SUMINISTRO DE ELEMENTOS DE ASEO Y CAFETERIA;10,00;13.000.000;1;47131800, 14111700
5;005;EL PROPONENTE;SUFORMA;SENA REGIONAL;ADQUISICION DE MATERIAL DE FORMACION;80,20;104.260.000;1;14111500, 44121700
";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{path}'")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No encoding/delimiter combination produced a table with at least {MIN_COLUMNS} columns")]
    NoTable,
}

/// A parsed table before any role resolution or normalization: the header
/// row plus raw string cells, along with the delimiter that won the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

pub fn load_path(path: &Path, delimiter: Option<u8>) -> Result<RawTable, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    load_bytes(&bytes, delimiter)
}

pub fn load_bytes(bytes: &[u8], delimiter: Option<u8>) -> Result<RawTable, LoadError> {
    let delimiters: &[u8] = match &delimiter {
        Some(provided) => std::slice::from_ref(provided),
        None => DELIMITER_CANDIDATES,
    };
    // Windows-1252 decodes any byte sequence, so it doubles as the latin-1
    // catch-all the source data is known to arrive in.
    let encodings: [&Encoding; 2] = [UTF_8, WINDOWS_1252];
    for encoding in encodings {
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            debug!("Rejected encoding {}: decode errors", encoding.name());
            continue;
        }
        for &delim in delimiters {
            if let Some(table) = parse_text(&text, delim) {
                debug!(
                    "Accepted encoding {} with delimiter '{}' ({} columns)",
                    encoding.name(),
                    delim as char,
                    table.headers.len()
                );
                return Ok(table);
            }
        }
    }
    Err(LoadError::NoTable)
}

pub fn load_sample() -> Result<RawTable, LoadError> {
    load_bytes(SAMPLE_DATA.as_bytes(), Some(b';'))
}

fn parse_text(text: &str, delimiter: u8) -> Option<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    if headers.len() < MIN_COLUMNS {
        return None;
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Some(RawTable {
        headers,
        rows,
        delimiter,
    })
}
