//! Record Normalizer: maps a sheet's own column layout onto
//! [`TransactionRecord`]s and keeps an audit of everything it drops.

use crate::config::{AmountSource, FallbackDateRule, SheetLayout};
use crate::error::{DashboardError, Result, RowValidationError};
use crate::reader::{RawRow, RawValue, SheetTable};
use crate::schema::{Category, Direction, TransactionRecord};
use crate::utils::excel_serial_to_date;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

const CURRENCY_MARKERS: &[&str] = &["KSHS", "KSH", "KES", "SHS"];

pub fn parse_date(value: &RawValue) -> std::result::Result<NaiveDate, RowValidationError> {
    match value {
        RawValue::Date(d) => Ok(*d),
        RawValue::Number(n) if *n <= MAX_SERIAL_DATE => {
            excel_serial_to_date(*n).ok_or_else(|| RowValidationError::InvalidDate(value.to_string()))
        }
        RawValue::Text(s) if s.trim().is_empty() => Err(RowValidationError::MissingDate),
        RawValue::Text(s) => parse_date_text(s.trim())
            .ok_or_else(|| RowValidationError::InvalidDate(s.trim().to_string())),
        RawValue::Empty => Err(RowValidationError::MissingDate),
        other => Err(RowValidationError::InvalidDate(other.to_string())),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Signed amount as written in the sheet.
pub fn parse_amount(value: &RawValue) -> std::result::Result<f64, RowValidationError> {
    match value {
        RawValue::Number(n) if n.is_finite() => Ok(*n),
        RawValue::Text(s) if s.trim().is_empty() => Err(RowValidationError::MissingAmount),
        RawValue::Text(s) => parse_amount_text(s.trim())
            .ok_or_else(|| RowValidationError::InvalidAmount(s.trim().to_string())),
        RawValue::Empty => Err(RowValidationError::MissingAmount),
        other => Err(RowValidationError::InvalidAmount(other.to_string())),
    }
}

fn parse_amount_text(text: &str) -> Option<f64> {
    let (negative, inner) = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, text),
    };

    let upper = inner.to_uppercase();
    let without_currency = CURRENCY_MARKERS
        .iter()
        .find_map(|marker| upper.strip_prefix(marker))
        .unwrap_or(upper.as_str())
        .trim_start_matches('.');

    let cleaned: String = without_currency
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}

/// Like [`parse_amount`] but a blank cell is simply absent.
fn parse_optional_amount(value: &RawValue) -> std::result::Result<Option<f64>, RowValidationError> {
    match parse_amount(value) {
        Ok(v) => Ok(Some(v)),
        Err(RowValidationError::MissingAmount) => Ok(None),
        Err(e) => Err(e),
    }
}

/// What the normalizer decided about one (row, direction) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record {
        record: TransactionRecord,
        defaulted_date: bool,
        sign_corrected: bool,
    },
    Rejected {
        line_number: usize,
        error: RowValidationError,
    },
    /// Nothing to record, e.g. a utilities row whose columns sum to zero.
    Skipped { line_number: usize },
}

struct Magnitude {
    direction: Direction,
    amount: f64,
    sign_corrected: bool,
}

impl Magnitude {
    fn new(direction: Direction, signed: f64) -> Self {
        Self {
            direction,
            amount: signed.abs(),
            sign_corrected: signed < 0.0,
        }
    }
}

/// Lazily turns the rows of one sheet into [`RowOutcome`]s.
pub struct RecordStream<'a> {
    layout: &'a SheetLayout,
    fallback: Option<&'a FallbackDateRule>,
    rows: std::slice::Iter<'a, RawRow>,
    pending: VecDeque<RowOutcome>,
}

impl<'a> RecordStream<'a> {
    pub fn new(
        table: &'a SheetTable,
        layout: &'a SheetLayout,
        fallback: Option<&'a FallbackDateRule>,
    ) -> Self {
        Self {
            layout,
            fallback,
            rows: table.rows.iter(),
            pending: VecDeque::new(),
        }
    }

    /// One entry per amount side the row carries. Blank sides are absent;
    /// an unreadable side is an error for that side only.
    fn amounts(&self, row: &RawRow) -> Vec<std::result::Result<Magnitude, RowValidationError>> {
        let direction = self.layout.category.default_direction();

        match &self.layout.amount {
            AmountSource::Column { name } => {
                vec![parse_amount(row.get(name)).map(|signed| Magnitude::new(direction, signed))]
            }
            AmountSource::Combined { columns } => match combined_amount(row, columns, direction) {
                Ok(Some(m)) => vec![Ok(m)],
                Ok(None) => Vec::new(),
                Err(e) => vec![Err(e)],
            },
            AmountSource::Split { inflow, outflow } => {
                [(Direction::Inflow, inflow), (Direction::Outflow, outflow)]
                    .into_iter()
                    .filter_map(|(direction, column)| match parse_optional_amount(row.get(column)) {
                        Ok(Some(signed)) if signed != 0.0 => Some(Ok(Magnitude::new(direction, signed))),
                        Ok(_) => None,
                        Err(e) => Some(Err(e)),
                    })
                    .collect()
            }
        }
    }

    fn process_row(&self, row: &RawRow) -> Vec<RowOutcome> {
        let category = self.layout.category;
        let narrative = row.get(&self.layout.narrative_column).to_string();
        let line_number = row.line_number;

        // Only a blank date cell is eligible for the fallback; a present but
        // unreadable date is always rejected.
        let (date, defaulted_date) = match parse_date(row.get(&self.layout.date_column)) {
            Ok(date) => (date, false),
            Err(RowValidationError::MissingDate) => {
                match self.fallback.filter(|rule| rule.applies_to(category, &narrative)) {
                    Some(rule) => (rule.date, true),
                    None => {
                        return vec![RowOutcome::Rejected {
                            line_number,
                            error: RowValidationError::MissingDate,
                        }]
                    }
                }
            }
            Err(error) => return vec![RowOutcome::Rejected { line_number, error }],
        };

        let sides = self.amounts(row);
        if sides.is_empty() {
            return vec![RowOutcome::Skipped { line_number }];
        }

        sides
            .into_iter()
            .map(|side| match side {
                Ok(m) => RowOutcome::Record {
                    record: TransactionRecord {
                        date,
                        amount: m.amount,
                        category,
                        narrative: narrative.clone(),
                        direction: m.direction,
                    },
                    defaulted_date,
                    sign_corrected: m.sign_corrected,
                },
                Err(error) => RowOutcome::Rejected { line_number, error },
            })
            .collect()
    }
}

/// Sum of magnitudes across `columns`; `None` when nothing positive remains.
fn combined_amount(
    row: &RawRow,
    columns: &[String],
    direction: Direction,
) -> std::result::Result<Option<Magnitude>, RowValidationError> {
    let mut total = 0.0;
    let mut sign_corrected = false;
    for column in columns {
        if let Some(signed) = parse_optional_amount(row.get(column))? {
            total += signed.abs();
            sign_corrected |= signed < 0.0;
        }
    }

    Ok((total > 0.0).then_some(Magnitude {
        direction,
        amount: total,
        sign_corrected,
    }))
}

impl Iterator for RecordStream<'_> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(outcome) = self.pending.pop_front() {
                return Some(outcome);
            }
            let row = self.rows.next()?;
            let outcomes = self.process_row(row);
            self.pending.extend(outcomes);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetStatus {
    Loaded,
    SourceReadFailed { reason: String },
    SchemaMismatch { column: String },
}

/// Per-sheet data quality tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetAudit {
    pub sheet: String,
    pub category: Category,
    pub status: SheetStatus,
    pub rows_read: usize,
    pub records_kept: usize,
    pub dropped_invalid_date: usize,
    /// Counted per amount side, so a split row can add two.
    pub dropped_invalid_amount: usize,
    pub dropped_duplicates: usize,
    pub skipped_zero_amount: usize,
    pub defaulted_dates: usize,
    pub sign_corrected: usize,
}

impl SheetAudit {
    fn empty(sheet: &str, category: Category, status: SheetStatus) -> Self {
        Self {
            sheet: sheet.to_string(),
            category,
            status,
            rows_read: 0,
            records_kept: 0,
            dropped_invalid_date: 0,
            dropped_invalid_amount: 0,
            dropped_duplicates: 0,
            skipped_zero_amount: 0,
            defaulted_dates: 0,
            sign_corrected: 0,
        }
    }

    /// Audit entry for a sheet that contributed nothing because of `error`.
    pub fn failed(layout: &SheetLayout, error: &DashboardError) -> Self {
        let status = match error {
            DashboardError::SchemaMismatch { column, .. } => SheetStatus::SchemaMismatch {
                column: column.clone(),
            },
            other => SheetStatus::SourceReadFailed {
                reason: other.to_string(),
            },
        };
        Self::empty(&layout.sheet, layout.category, status)
    }

    pub fn is_loaded(&self) -> bool {
        self.status == SheetStatus::Loaded
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped_invalid_date + self.dropped_invalid_amount + self.dropped_duplicates
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedSheet {
    pub category: Category,
    pub records: Vec<TransactionRecord>,
    pub audit: SheetAudit,
}

/// Exact-duplicate identity. Amounts compare at cent precision.
#[derive(Hash, PartialEq, Eq)]
struct DedupKey {
    date: NaiveDate,
    cents: i64,
    narrative: String,
    category: Category,
    direction: Direction,
}

impl From<&TransactionRecord> for DedupKey {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            date: record.date,
            cents: (record.amount * 100.0).round() as i64,
            narrative: record.narrative.trim().to_string(),
            category: record.category,
            direction: record.direction,
        }
    }
}

pub fn check_schema(table: &SheetTable, layout: &SheetLayout) -> Result<()> {
    for column in layout.required_columns() {
        if !table.has_column(column) {
            return Err(DashboardError::SchemaMismatch {
                sheet: table.sheet.clone(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

pub fn normalize_sheet(
    table: &SheetTable,
    layout: &SheetLayout,
    fallback: Option<&FallbackDateRule>,
) -> Result<NormalizedSheet> {
    check_schema(table, layout)?;

    let mut audit = SheetAudit::empty(&table.sheet, layout.category, SheetStatus::Loaded);
    audit.rows_read = table.rows.len();

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for outcome in RecordStream::new(table, layout, fallback) {
        match outcome {
            RowOutcome::Record {
                record,
                defaulted_date,
                sign_corrected,
            } => {
                if !seen.insert(DedupKey::from(&record)) {
                    debug!(
                        "{}: duplicate {} {} '{}' dropped",
                        table.sheet, record.date, record.amount, record.narrative
                    );
                    audit.dropped_duplicates += 1;
                    continue;
                }
                if defaulted_date {
                    audit.defaulted_dates += 1;
                }
                if sign_corrected {
                    audit.sign_corrected += 1;
                }
                records.push(record);
            }
            RowOutcome::Rejected { line_number, error } => {
                debug!("{} row {}: {}", table.sheet, line_number, error);
                if error.is_date_error() {
                    audit.dropped_invalid_date += 1;
                } else {
                    audit.dropped_invalid_amount += 1;
                }
            }
            RowOutcome::Skipped { .. } => audit.skipped_zero_amount += 1,
        }
    }

    audit.records_kept = records.len();

    if audit.defaulted_dates > 0 {
        warn!(
            "{}: {} undated rows assigned the fallback date",
            table.sheet, audit.defaulted_dates
        );
    }
    info!(
        "{} ({}): {} records kept, {} dropped, {} skipped",
        table.sheet,
        layout.category,
        audit.records_kept,
        audit.dropped_total(),
        audit.skipped_zero_amount
    );

    Ok(NormalizedSheet {
        category: layout.category,
        records,
        audit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderMode;
    use crate::reader::RawSheet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> RawValue {
        RawValue::from(s)
    }

    fn layout_for(category: Category) -> SheetLayout {
        SheetLayout::default_layouts()
            .into_iter()
            .find(|l| l.category == category)
            .unwrap()
    }

    fn named_table(sheet: &str, header: &[&str], rows: Vec<Vec<RawValue>>) -> SheetTable {
        let mut grid = vec![header.iter().map(|h| text(h)).collect::<Vec<_>>()];
        grid.extend(rows);
        RawSheet::new(sheet, grid).table(&HeaderMode::FirstRow)
    }

    #[test]
    fn test_parse_date_variants() {
        let expected = date(2025, 3, 14);
        assert_eq!(parse_date(&RawValue::Date(expected)), Ok(expected));
        assert_eq!(parse_date(&text("2025-03-14")), Ok(expected));
        assert_eq!(parse_date(&text("14/03/2025")), Ok(expected));
        assert_eq!(parse_date(&text("14-Mar-2025")), Ok(expected));
        assert_eq!(parse_date(&text("2025-03-14 09:30:00")), Ok(expected));
        assert_eq!(parse_date(&RawValue::Number(45730.0)), Ok(expected));
        assert_eq!(parse_date(&RawValue::Empty), Err(RowValidationError::MissingDate));
        assert_eq!(parse_date(&text("  ")), Err(RowValidationError::MissingDate));
        assert!(matches!(
            parse_date(&text("sometime")),
            Err(RowValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount(&RawValue::Number(-250.0)), Ok(-250.0));
        assert_eq!(parse_amount(&text("12,500.50")), Ok(12_500.5));
        assert_eq!(parse_amount(&text("KES 3,000")), Ok(3_000.0));
        assert_eq!(parse_amount(&text("Ksh. 450")), Ok(450.0));
        assert_eq!(parse_amount(&text("(1,200)")), Ok(-1_200.0));
        assert_eq!(parse_amount(&RawValue::Empty), Err(RowValidationError::MissingAmount));
        assert!(matches!(
            parse_amount(&text("n/a")),
            Err(RowValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_negative_expenses_become_magnitudes() {
        let table = named_table(
            "Labour",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                vec![text("2025-01-05"), RawValue::Number(-4_000.0), text("Wages A")],
                vec![text("2025-01-06"), RawValue::Number(2_500.0), text("Wages B")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Labour), None).unwrap();
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].amount, 4_000.0);
        assert!(sheet.records.iter().all(|r| r.amount >= 0.0));
        assert!(sheet.records.iter().all(|r| r.direction == Direction::Outflow));
        assert_eq!(sheet.audit.sign_corrected, 1);
    }

    #[test]
    fn test_invalid_rows_dropped_and_counted() {
        let table = named_table(
            "Labour",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                vec![text("2025-01-05"), RawValue::Number(1_000.0), text("ok")],
                vec![RawValue::Empty, RawValue::Number(1_000.0), text("no date")],
                vec![text("not a date"), RawValue::Number(1_000.0), text("bad date")],
                vec![text("2025-01-07"), RawValue::Empty, text("no amount")],
                vec![text("2025-01-08"), text("abc"), text("bad amount")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Labour), None).unwrap();
        assert_eq!(sheet.audit.rows_read, 5);
        assert_eq!(sheet.audit.records_kept, 1);
        assert_eq!(sheet.audit.dropped_invalid_date, 2);
        assert_eq!(sheet.audit.dropped_invalid_amount, 2);
    }

    #[test]
    fn test_exact_duplicates_kept_once() {
        let row = || vec![text("2025-02-01"), RawValue::Number(700.0), text("Casual pay")];
        let table = named_table(
            "Labour",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                row(),
                row(),
                vec![text("2025-02-01"), RawValue::Number(700.0), text("Casual pay 2")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Labour), None).unwrap();
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.audit.dropped_duplicates, 1);
    }

    #[test]
    fn test_fallback_date_only_for_matching_rows() {
        let rule = FallbackDateRule::transport_batch();
        let table = named_table(
            "Expense",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                vec![RawValue::Empty, RawValue::Number(3_000.0), text("Transport - Nov batch")],
                vec![RawValue::Empty, RawValue::Number(800.0), text("Airtime")],
                vec![text("2025-04-02"), RawValue::Number(1_200.0), text("Transport to market")],
            ],
        );

        let sheet =
            normalize_sheet(&table, &layout_for(Category::OtherExpenses), Some(&rule)).unwrap();
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].date, date(2024, 11, 30));
        assert_eq!(sheet.records[1].date, date(2025, 4, 2));
        assert_eq!(sheet.audit.defaulted_dates, 1);
        assert_eq!(sheet.audit.dropped_invalid_date, 1);
    }

    #[test]
    fn test_fallback_date_not_applied_to_unreadable_dates() {
        let rule = FallbackDateRule::transport_batch();
        let table = named_table(
            "Expense",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                vec![text("pending"), RawValue::Number(900.0), text("Transport to depot")],
                vec![RawValue::Empty, RawValue::Number(600.0), text("Transport to depot")],
            ],
        );

        let sheet =
            normalize_sheet(&table, &layout_for(Category::OtherExpenses), Some(&rule)).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].amount, 600.0);
        assert_eq!(sheet.audit.defaulted_dates, 1);
        assert_eq!(sheet.audit.dropped_invalid_date, 1);
    }

    #[test]
    fn test_fallback_rule_ignored_for_other_categories() {
        let rule = FallbackDateRule::transport_batch();
        let table = named_table(
            "Labour",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![vec![RawValue::Empty, RawValue::Number(500.0), text("Transport allowance")]],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Labour), Some(&rule)).unwrap();
        assert!(sheet.records.is_empty());
        assert_eq!(sheet.audit.defaulted_dates, 0);
    }

    #[test]
    fn test_combined_columns_skip_zero_rows() {
        let table = named_table(
            "Utilities",
            &["Tran Date", "Withdrawals", "Deposits", "Transaction Narrative"],
            vec![
                vec![text("2025-01-10"), RawValue::Number(1_500.0), RawValue::Empty, text("KPLC")],
                vec![text("2025-01-11"), RawValue::Empty, RawValue::Number(300.0), text("Water")],
                vec![text("2025-01-12"), RawValue::Empty, RawValue::Empty, text("Nothing")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Utilities), None).unwrap();
        let total: f64 = sheet.records.iter().map(|r| r.amount).sum();
        assert_eq!(sheet.records.len(), 2);
        assert!((total - 1_800.0).abs() < 0.01);
        assert_eq!(sheet.audit.skipped_zero_amount, 1);
    }

    #[test]
    fn test_split_columns_emit_both_directions() {
        let table = named_table(
            "Saving",
            &["Tran Date", "Withdrawals", "Deposits", "Transaction Narrative"],
            vec![
                vec![text("2025-03-01"), RawValue::Empty, RawValue::Number(10_000.0), text("Deposit")],
                vec![text("2025-03-15"), RawValue::Number(4_000.0), RawValue::Empty, text("Withdrawal")],
                vec![text("2025-03-20"), RawValue::Number(1_000.0), RawValue::Number(2_000.0), text("Both")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Savings), None).unwrap();
        let inflows = sheet.records.iter().filter(|r| r.direction == Direction::Inflow).count();
        let outflows = sheet.records.iter().filter(|r| r.direction == Direction::Outflow).count();
        assert_eq!(inflows, 2);
        assert_eq!(outflows, 2);
    }

    #[test]
    fn test_split_columns_reject_each_side_separately() {
        let table = named_table(
            "Saving",
            &["Tran Date", "Withdrawals", "Deposits", "Transaction Narrative"],
            vec![
                vec![text("2025-04-01"), RawValue::Number(3_000.0), text("abc"), text("Mixed")],
                vec![text("2025-04-02"), text("??"), text("n/a"), text("Both bad")],
            ],
        );

        let sheet = normalize_sheet(&table, &layout_for(Category::Savings), None).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].direction, Direction::Outflow);
        assert_eq!(sheet.records[0].amount, 3_000.0);
        assert_eq!(sheet.audit.dropped_invalid_amount, 3);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let table = named_table(
            "Labour",
            &["Tran Date", "Amount", "Transaction Narrative"],
            vec![vec![text("2025-01-05"), RawValue::Number(1_000.0), text("x")]],
        );

        match normalize_sheet(&table, &layout_for(Category::Labour), None) {
            Err(DashboardError::SchemaMismatch { column, .. }) => assert_eq!(column, "Withdrawals"),
            other => panic!("expected schema mismatch, got {:?}", other.map(|s| s.audit)),
        }
    }

    #[test]
    fn test_record_stream_is_lazy_per_row() {
        let table = named_table(
            "Labour",
            &["Tran Date", "Withdrawals", "Transaction Narrative"],
            vec![
                vec![text("2025-01-05"), RawValue::Number(1.0), text("a")],
                vec![text("2025-01-06"), RawValue::Number(2.0), text("b")],
            ],
        );
        let layout = layout_for(Category::Labour);

        let mut stream = RecordStream::new(&table, &layout, None);
        assert!(matches!(stream.next(), Some(RowOutcome::Record { .. })));
        assert!(matches!(stream.next(), Some(RowOutcome::Record { .. })));
        assert!(stream.next().is_none());
    }
}
