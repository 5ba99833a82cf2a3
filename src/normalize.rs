//! Locale-formatted numeric normalization.
//!
//! Source files format numbers the Latin-American way: period as thousands
//! grouping, comma as decimal point ("144.703.000", "111,31"). The two
//! parsers here strip that formatting into plain numbers, defaulting to
//! zero for missing or malformed cells so one bad row never blocks the rest
//! of the dataset. The convention is fixed, not detected; it is documented
//! to users as a format requirement.

use anyhow::{Result, anyhow};
use log::debug;

use crate::{
    loader::RawTable,
    resolve::{Role, RoleMapping},
};

/// Parses an integer currency amount such as "144.703.000". Missing or
/// unparseable input yields 0.
pub fn parse_monetary(raw: Option<&str>) -> i64 {
    raw.and_then(try_parse_monetary).unwrap_or(0)
}

fn try_parse_monetary(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '.').collect();
    cleaned.parse().ok()
}

/// Parses a decimal quantity such as "111,31" or "1.000,00". Missing or
/// unparseable input yields 0.0.
pub fn parse_unit(raw: Option<&str>) -> f64 {
    raw.and_then(try_parse_unit).unwrap_or(0.0)
}

fn try_parse_unit(raw: &str) -> Option<f64> {
    let swapped = raw.trim().replace('.', "").replace(',', ".");
    swapped.parse().ok()
}

/// Renders an integer currency amount back into display form: `$ 144.703.000`.
pub fn format_monetary(value: i64) -> String {
    format!("$ {}", group_thousands(&value.to_string()))
}

/// Renders a decimal quantity back into display form: `1.000,00`.
pub fn format_unit(value: f64) -> String {
    let text = format!("{value:.2}");
    match text.split_once('.') {
        Some((int_part, frac)) => format!("{},{}", group_thousands(int_part), frac),
        None => format!("{},00", group_thousands(&text)),
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    grouped.push_str(sign);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// The loaded table plus the two derived numeric columns, one entry per
/// input row in input order. Derived values are always numeric; bad source
/// cells were coerced to zero and counted in `coerced_cells`.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
    pub mapping: RoleMapping,
    pub unit_values: Vec<f64>,
    pub monetary_values: Vec<i64>,
    pub coerced_cells: usize,
    role_columns: [usize; Role::COUNT],
}

impl NormalizedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell for a role, or `None` when the row is short or the cell is
    /// blank.
    pub fn cell(&self, row: usize, role: Role) -> Option<&str> {
        let column = self.role_columns[role as usize];
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.as_str())
            .filter(|cell| !cell.trim().is_empty())
    }
}

/// Derives the numeric columns for the MonetaryValue and UnitValue roles
/// and coerces the ClassificationCodes column to trimmed text.
pub fn normalize(table: RawTable, mapping: RoleMapping) -> Result<NormalizedTable> {
    let mut role_columns = [0usize; Role::COUNT];
    for role in Role::ALL {
        let column = mapping.column(role);
        role_columns[role as usize] = table
            .headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| anyhow!("Mapped column '{column}' for role '{role}' not in table"))?;
    }

    let unit_column = role_columns[Role::UnitValue as usize];
    let monetary_column = role_columns[Role::MonetaryValue as usize];
    let codes_column = role_columns[Role::ClassificationCodes as usize];

    let RawTable {
        headers,
        mut rows,
        delimiter,
    } = table;

    let mut unit_values = Vec::with_capacity(rows.len());
    let mut monetary_values = Vec::with_capacity(rows.len());
    let mut coerced_cells = 0usize;

    for row in &mut rows {
        let unit_raw = row.get(unit_column).map(|cell| cell.as_str());
        let monetary_raw = row.get(monetary_column).map(|cell| cell.as_str());
        coerced_cells += count_coercion(unit_raw, |raw| try_parse_unit(raw).is_none());
        coerced_cells += count_coercion(monetary_raw, |raw| try_parse_monetary(raw).is_none());
        unit_values.push(parse_unit(unit_raw));
        monetary_values.push(parse_monetary(monetary_raw));

        if let Some(codes) = row.get_mut(codes_column) {
            let trimmed = codes.trim();
            if trimmed.len() != codes.len() {
                *codes = trimmed.to_string();
            }
        }
    }

    if coerced_cells > 0 {
        debug!("{coerced_cells} numeric cell(s) coerced to zero during normalization");
    }

    Ok(NormalizedTable {
        headers,
        rows,
        delimiter,
        mapping,
        unit_values,
        monetary_values,
        coerced_cells,
        role_columns,
    })
}

fn count_coercion(raw: Option<&str>, failed: impl Fn(&str) -> bool) -> usize {
    match raw {
        Some(value) if !value.trim().is_empty() && failed(value) => 1,
        _ => 0,
    }
}
