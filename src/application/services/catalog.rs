//! Catalog ingestion service
//!
//! Reads a `;`-delimited catalog (`code; name; stock; price`, one header line)
//! into an [`AvlTree`]. Bad lines are reported through the [`EventLog`] and
//! skipped; only an unreadable source fails the load.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, EventLog, IoResultExt, LineError};
use crate::domain::{AvlTree, Code, Record};
use crate::infrastructure::traits::FileSystem;

const FIELD_SEPARATOR: char = ';';

/// Outcome of parsing one catalog line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Item(Record),
    /// Well-formed but with stock `<= 0`; never inserted.
    NoStock(Code),
}

/// Summary of a catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that became new tree nodes
    pub inserted: usize,
    /// Lines whose code was already present (first record kept)
    pub duplicates: usize,
    /// Well-formed lines with no stock
    pub skipped: usize,
    /// Lines rejected with a [`LineError`]
    pub malformed: usize,
    /// Distinct codes that were inserted, in file order
    pub codes: Vec<Code>,
}

/// Parse a single data line.
///
/// Decimal commas in the price are accepted (`12,50` reads as `12.50`).
pub fn parse_line(line: &str) -> Result<ParsedLine, LineError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < 4 {
        return Err(LineError::MissingFields {
            found: fields.len(),
        });
    }

    let code: Code = parse_number("code", fields[0])?;
    let name = fields[1];
    let stock: i64 = parse_number("stock", fields[2])?;
    let price_text = fields[3].replace(',', ".");
    let price: f64 = parse_number("price", &price_text)?;
    if !price.is_finite() {
        return Err(invalid("price", fields[3]));
    }

    if stock <= 0 {
        return Ok(ParsedLine::NoStock(code));
    }
    let stock = u32::try_from(stock).map_err(|_| invalid("stock", fields[2]))?;

    Ok(ParsedLine::Item(Record::new(code, name, stock, price)))
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, LineError> {
    value.parse().map_err(|_| invalid(field, value))
}

fn invalid(field: &'static str, value: &str) -> LineError {
    LineError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}

/// Service for loading catalogs into the inventory tree.
pub struct CatalogService {
    fs: Arc<dyn FileSystem>,
}

impl CatalogService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the catalog at `path` into `tree`.
    #[instrument(level = "debug", skip(self, tree, log))]
    pub fn load(
        &self,
        path: &Path,
        tree: &mut AvlTree,
        log: &mut EventLog,
    ) -> ApplicationResult<LoadReport> {
        log.record(format!("--- Loading catalog: {} ---", path.display()));
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalog", path)?;
        let report = self.load_str(&content, tree, log);
        log.record(format!(
            "Load finished. Records in tree: {} (inserted {}, duplicates {}, no stock {}, malformed {})",
            tree.count(),
            report.inserted,
            report.duplicates,
            report.skipped,
            report.malformed
        ));
        Ok(report)
    }

    /// Load catalog text already in memory. The first line is a header.
    pub fn load_str(&self, content: &str, tree: &mut AvlTree, log: &mut EventLog) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, line) in content.lines().enumerate().skip(1) {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(line) {
                Ok(ParsedLine::Item(record)) => {
                    let code = record.code();
                    let name = record.name().to_string();
                    if tree.insert(record) {
                        report.inserted += 1;
                        report.codes.push(code);
                        log.record(format!("Inserted item {code}: {name}"));
                    } else {
                        report.duplicates += 1;
                        log.record(format!(
                            "Line {line_no}: code {code} already present, keeping the first record"
                        ));
                    }
                }
                Ok(ParsedLine::NoStock(code)) => {
                    report.skipped += 1;
                    debug!("line {line_no}: code {code} has no stock, skipped");
                }
                Err(e) => {
                    report.malformed += 1;
                    log.record(format!("Line {line_no} skipped ({e}): {line}"));
                }
            }
        }

        report
    }
}
