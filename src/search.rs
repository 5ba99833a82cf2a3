//! Filtering, sorting, and aggregation over a normalized table.
//!
//! Two independent predicates combine with logical AND: a case-insensitive
//! substring match on the description, and a contains-all match over the
//! classification codes (every queried token must appear verbatim among the
//! row's tokens, not merely any one of them). Results are always stably
//! sorted by the derived unit value, descending.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    cli::SearchArgs,
    export, loader,
    normalize::{self, NormalizedTable, format_monetary, format_unit},
    resolve::{self, Role},
    table,
};

/// One user interaction's filter criteria. Both parts optional; empty or
/// whitespace-only input means "not applied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub codes: Vec<String>,
    pub text: Option<String>,
}

impl SearchQuery {
    pub fn parse(codes: Option<&str>, text: Option<&str>) -> Self {
        let codes = codes
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        let text = text
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_string);
        SearchQuery { codes, text }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.text.is_none()
    }
}

/// Rows matching a query, as indices into the normalized table, in unit
/// value descending order (stable among equal values).
#[derive(Debug)]
pub struct ResultSet<'a> {
    table: &'a NormalizedTable,
    indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub count: usize,
    pub total_unit_value: f64,
    pub total_monetary_value: i64,
}

impl<'a> ResultSet<'a> {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn table(&self) -> &'a NormalizedTable {
        self.table
    }

    pub fn aggregate(&self) -> Totals {
        Totals {
            count: self.indices.len(),
            total_unit_value: self.indices.iter().map(|&i| self.table.unit_values[i]).sum(),
            total_monetary_value: self
                .indices
                .iter()
                .map(|&i| self.table.monetary_values[i])
                .sum(),
        }
    }
}

pub fn filter<'a>(table: &'a NormalizedTable, query: &SearchQuery) -> ResultSet<'a> {
    let needle = query.text.as_deref().map(str::to_lowercase);
    let mut indices = (0..table.row_count())
        .filter(|&row| {
            let text_ok = match &needle {
                Some(needle) => description_matches(table.cell(row, Role::Description), needle),
                None => true,
            };
            let codes_ok = query.codes.is_empty()
                || codes_match(table.cell(row, Role::ClassificationCodes), &query.codes);
            text_ok && codes_ok
        })
        .collect_vec();
    // sort_by is stable, so equal unit values keep their input order.
    indices.sort_by(|&a, &b| table.unit_values[b].total_cmp(&table.unit_values[a]));
    ResultSet { table, indices }
}

fn description_matches(cell: Option<&str>, lowered_needle: &str) -> bool {
    match cell {
        Some(description) => description.to_lowercase().contains(lowered_needle),
        None => false,
    }
}

/// Contains-all semantics over exact trimmed tokens. Substring containment
/// would let a target like "111" match the token "11101500", so tokens are
/// compared for equality only.
pub fn codes_match(cell: Option<&str>, targets: &[String]) -> bool {
    let Some(cell) = cell else {
        return false;
    };
    let row_tokens = cell.split([',', ';']).map(str::trim).collect_vec();
    targets
        .iter()
        .all(|target| row_tokens.iter().any(|token| token == target))
}

pub fn execute(args: &SearchArgs) -> Result<()> {
    let raw = match &args.input {
        Some(path) => loader::load_path(path, args.delimiter)
            .with_context(|| format!("Loading table from {path:?}"))?,
        None => {
            info!("No input file given; using the bundled sample dataset");
            loader::load_sample().context("Loading bundled sample dataset")?
        }
    };
    let mapping = resolve::resolve(&raw.headers, crate::resolve_mode(args.positional_fallback))
        .context("Resolving column roles")?;
    let normalized = normalize::normalize(raw, mapping).context("Normalizing table")?;

    let query = SearchQuery::parse(args.codes.as_deref(), args.text.as_deref());
    let results = filter(&normalized, &query);
    let totals = results.aggregate();
    info!(
        "{} of {} record(s) match the active filters",
        totals.count,
        normalized.row_count()
    );

    if let Some(path) = &args.output {
        let encoding = export::resolve_encoding(args.output_encoding.as_deref())?;
        export::write_csv(path, &results, encoding)
            .with_context(|| format!("Exporting results to {path:?}"))?;
        info!("Exported {} row(s) to {path:?}", totals.count);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    if !results.is_empty() {
        print_results(&results);
        println!();
    }
    println!("Experiences found:   {}", totals.count);
    println!(
        "Total value (SMMLV): {}",
        format_unit(totals.total_unit_value)
    );
    println!(
        "Total budget (COP):  {}",
        format_monetary(totals.total_monetary_value)
    );
    if results.is_empty() {
        println!();
        println!("No records match the active filters.");
    }
    Ok(())
}

const DISPLAY_ROLES: [Role; 5] = [
    Role::SequenceNumber,
    Role::Identifier,
    Role::CounterpartyName,
    Role::Description,
    Role::ClassificationCodes,
];

fn print_results(results: &ResultSet<'_>) {
    let table = results.table();
    let mut headers = DISPLAY_ROLES
        .iter()
        .map(|&role| table.mapping.column(role).to_string())
        .collect_vec();
    headers.push(table.mapping.column(Role::UnitValue).to_string());
    headers.push(table.mapping.column(Role::MonetaryValue).to_string());

    let rows = results
        .indices()
        .iter()
        .map(|&row| {
            let mut cells = DISPLAY_ROLES
                .iter()
                .map(|&role| table.cell(row, role).unwrap_or_default().to_string())
                .collect_vec();
            cells.push(format_unit(table.unit_values[row]));
            cells.push(format_monetary(table.monetary_values[row]));
            cells
        })
        .collect_vec();

    let header_refs = headers.iter().map(String::as_str).collect_vec();
    table::print_table(&header_refs, &rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_sample;
    use crate::resolve::{ResolveMode, resolve};

    fn sample_table() -> NormalizedTable {
        let raw = load_sample().unwrap();
        let mapping = resolve(&raw.headers, ResolveMode::Strict).unwrap();
        normalize::normalize(raw, mapping).unwrap()
    }

    #[test]
    fn query_parsing_trims_and_drops_empty_tokens() {
        let query = SearchQuery::parse(Some(" 14111500 , ,81111800 "), Some("  "));
        assert_eq!(query.codes, vec!["14111500", "81111800"]);
        assert_eq!(query.text, None);

        assert!(SearchQuery::parse(None, None).is_empty());
    }

    #[test]
    fn codes_match_requires_every_target() {
        let cell = Some("11101500, 14111500, 81111800");
        assert!(codes_match(
            cell,
            &["14111500".to_string(), "81111800".to_string()]
        ));
        assert!(!codes_match(
            cell,
            &["14111500".to_string(), "99999999".to_string()]
        ));
    }

    #[test]
    fn codes_match_is_exact_per_token() {
        let cell = Some("11101500, 14111500");
        assert!(!codes_match(cell, &["111".to_string()]));
        assert!(!codes_match(cell, &["1110150".to_string()]));
    }

    #[test]
    fn codes_match_accepts_semicolon_separated_cells() {
        let cell = Some("11101500; 14111500;81111800");
        assert!(codes_match(cell, &["81111800".to_string()]));
    }

    #[test]
    fn missing_codes_cell_never_matches() {
        assert!(!codes_match(None, &["14111500".to_string()]));
    }

    #[test]
    fn description_match_is_case_insensitive() {
        let table = sample_table();
        let query = SearchQuery::parse(None, Some("papeleria"));
        let results = filter(&table, &query);
        assert_eq!(results.len(), 1);
        assert_eq!(
            table.cell(results.indices()[0], Role::Description),
            Some("SUMINISTRO DE PAPELERIA E IMPRESOS")
        );
    }

    #[test]
    fn empty_query_returns_whole_table_sorted_by_unit_value() {
        let table = sample_table();
        let results = filter(&table, &SearchQuery::default());
        assert_eq!(results.len(), 5);
        // 200,00 > 111,31 > 80,20 > 50,5 > 10,00
        assert_eq!(results.indices(), &[2, 0, 4, 1, 3]);
    }

    #[test]
    fn equal_unit_values_keep_input_order() {
        let mut table = sample_table();
        table.unit_values = vec![50.0, 200.0, 50.0, 10.0, 5.0];
        let results = filter(&table, &SearchQuery::default());
        assert_eq!(results.indices()[0], 1);
        assert_eq!(&results.indices()[1..3], &[0, 2]);
    }

    #[test]
    fn both_predicates_combine_with_and() {
        let table = sample_table();
        // Code present on rows 1 and 5; keyword only on row 5.
        let query = SearchQuery::parse(Some("14111500"), Some("formacion"));
        let results = filter(&table, &query);
        assert_eq!(results.len(), 1);
        assert_eq!(
            table.cell(results.indices()[0], Role::SequenceNumber),
            Some("005")
        );
    }

    #[test]
    fn aggregate_sums_both_derived_columns() {
        let table = sample_table();
        let query = SearchQuery::parse(Some("14111500"), None);
        let results = filter(&table, &query);
        let totals = results.aggregate();
        assert_eq!(totals.count, 2);
        assert!((totals.total_unit_value - 191.51).abs() < 1e-9);
        assert_eq!(totals.total_monetary_value, 248_963_000);
    }

    #[test]
    fn empty_result_set_aggregates_to_zero() {
        let table = sample_table();
        let query = SearchQuery::parse(Some("00000000"), None);
        let results = filter(&table, &query);
        assert!(results.is_empty());
        let totals = results.aggregate();
        assert_eq!(totals.count, 0);
        assert_eq!(totals.total_unit_value, 0.0);
        assert_eq!(totals.total_monetary_value, 0);
    }
}
