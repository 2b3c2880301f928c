//! Aggregator: category totals, monthly series and the comparison between the
//! official annual summary and the detailed transaction year.

use crate::normalizer::SheetAudit;
use crate::schema::{Category, Direction, OfficialAnnualSummary, TransactionRecord, YearMonth};
use crate::utils::months_spanned;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Month-end dates bounding a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    fn widen(period: Option<Period>, date: NaiveDate) -> Period {
        let month_end = YearMonth::from_date(date).month_end();
        match period {
            Some(p) => Period {
                start: p.start.min(month_end),
                end: p.end.max(month_end),
            },
            None => Period {
                start: month_end,
                end: month_end,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub category: Category,
    pub direction: Direction,
    pub total: f64,
    pub record_count: usize,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub total: f64,
    pub record_count: usize,
}

/// Chronological; months without records are absent.
pub type MonthlySeries = Vec<MonthlyPoint>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialRatios {
    pub gross_profit_margin: f64,
    pub net_profit_margin: f64,
    pub operating_expense_ratio: f64,
}

impl FinancialRatios {
    pub fn from_summary(summary: &OfficialAnnualSummary) -> Self {
        Self {
            gross_profit_margin: summary.gross_profit_margin(),
            net_profit_margin: summary.net_profit_margin(),
            operating_expense_ratio: summary.operating_expense_ratio(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureSource {
    Official,
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBreakdown {
    pub year: i32,
    pub source: FigureSource,
    pub transactions: usize,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
}

impl YearBreakdown {
    pub fn official(summary: &OfficialAnnualSummary) -> Self {
        Self {
            year: summary.year,
            source: FigureSource::Official,
            // Statement figures, not transactions.
            transactions: 0,
            total_income: summary.sales,
            total_expenses: summary.total_expenses(),
            net: summary.sales - summary.total_expenses(),
        }
    }

    pub fn detailed(year: i32, records: &[TransactionRecord]) -> Self {
        let kpis = Kpis::from_records(records);
        Self {
            year,
            source: FigureSource::Detailed,
            transactions: records.len(),
            total_income: kpis.total_income,
            total_expenses: kpis.total_expenses,
            net: kpis.net_profit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub official: f64,
    pub detailed: f64,
    /// Percentage change from the official figure; `None` when that is zero.
    pub change_pct: Option<f64>,
}

impl ComparisonRow {
    fn new(metric: &str, official: f64, detailed: f64) -> Self {
        let change_pct = if official == 0.0 {
            None
        } else {
            Some((detailed - official) / official.abs() * 100.0)
        };

        Self {
            metric: metric.to_string(),
            official,
            detailed,
            change_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    /// Net profit as a percentage of income.
    pub profit_margin: f64,
}

impl Kpis {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let (total_income, total_expenses) =
            records
                .iter()
                .fold((0.0, 0.0), |(income, expenses), r| match r.direction {
                    Direction::Inflow => (income + r.amount, expenses),
                    Direction::Outflow => (income, expenses + r.amount),
                });

        let net_profit = total_income - total_expenses;
        let profit_margin = if total_income > 0.0 {
            net_profit / total_income * 100.0
        } else {
            0.0
        };

        Self {
            total_income,
            total_expenses,
            net_profit,
            profit_margin,
        }
    }
}

/// Narrow a record set by year, categories and direction. Empty criteria match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub year: Option<i32>,
    pub categories: Vec<Category>,
    pub direction: Option<Direction>,
}

impl RecordFilter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.year.map_or(true, |y| record.date.year() == y)
            && (self.categories.is_empty() || self.categories.contains(&record.category))
            && self.direction.map_or(true, |d| record.direction == d)
    }

    pub fn apply(&self, records: &[TransactionRecord]) -> Vec<TransactionRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_transactions: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub months_covered: i32,
    pub categories: Vec<Category>,
    pub years: Vec<i32>,
}

impl DataSummary {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let first_date = records.iter().map(|r| r.date).min();
        let last_date = records.iter().map(|r| r.date).max();
        let categories: BTreeSet<Category> = records.iter().map(|r| r.category).collect();
        let years: BTreeSet<i32> = records.iter().map(|r| r.date.year()).collect();

        Self {
            total_transactions: records.len(),
            first_date,
            last_date,
            months_covered: match (first_date, last_date) {
                (Some(first), Some(last)) => months_spanned(first, last),
                _ => 0,
            },
            categories: categories.into_iter().collect(),
            years: years.into_iter().collect(),
        }
    }
}

/// Totals across every sheet audit, for the report's data quality note.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityNote {
    pub sheets_loaded: usize,
    pub sheets_failed: Vec<String>,
    pub rows_read: usize,
    pub records_kept: usize,
    pub dropped_invalid_date: usize,
    pub dropped_invalid_amount: usize,
    pub dropped_duplicates: usize,
    pub defaulted_dates: usize,
    pub sign_corrected: usize,
}

impl DataQualityNote {
    pub fn from_audits(audits: &[SheetAudit]) -> Self {
        audits.iter().fold(Self::default(), |mut note, audit| {
            if audit.is_loaded() {
                note.sheets_loaded += 1;
            } else {
                note.sheets_failed.push(audit.sheet.clone());
            }
            note.rows_read += audit.rows_read;
            note.records_kept += audit.records_kept;
            note.dropped_invalid_date += audit.dropped_invalid_date;
            note.dropped_invalid_amount += audit.dropped_invalid_amount;
            note.dropped_duplicates += audit.dropped_duplicates;
            note.defaulted_dates += audit.defaulted_dates;
            note.sign_corrected += audit.sign_corrected;
            note
        })
    }

    pub fn has_issues(&self) -> bool {
        !self.sheets_failed.is_empty()
            || self.dropped_invalid_date
                + self.dropped_invalid_amount
                + self.dropped_duplicates
                + self.defaulted_dates
                + self.sign_corrected
                > 0
    }
}

pub fn category_totals(records: &[TransactionRecord]) -> Vec<CategoryAggregate> {
    let mut groups: BTreeMap<(Category, Direction), CategoryAggregate> = BTreeMap::new();

    for record in records {
        let entry = groups
            .entry((record.category, record.direction))
            .or_insert_with(|| CategoryAggregate {
                category: record.category,
                direction: record.direction,
                total: 0.0,
                record_count: 0,
                period: None,
            });
        entry.total += record.amount;
        entry.record_count += 1;
        entry.period = Some(Period::widen(entry.period, record.date));
    }

    groups.into_values().collect()
}

/// Sum of one category across both directions.
pub fn category_total(records: &[TransactionRecord], category: Category) -> f64 {
    records
        .iter()
        .filter(|r| r.category == category)
        .map(|r| r.amount)
        .sum()
}

fn bucket_by_month<'a, K: Ord>(
    records: impl Iterator<Item = &'a TransactionRecord>,
    key: impl Fn(&TransactionRecord) -> K,
) -> BTreeMap<K, MonthlySeries> {
    let mut buckets: BTreeMap<K, BTreeMap<YearMonth, (f64, usize)>> = BTreeMap::new();

    for record in records {
        let slot = buckets
            .entry(key(record))
            .or_default()
            .entry(record.month())
            .or_insert((0.0, 0));
        slot.0 += record.amount;
        slot.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(k, months)| {
            let series = months
                .into_iter()
                .map(|(month, (total, record_count))| MonthlyPoint {
                    month,
                    total,
                    record_count,
                })
                .collect();
            (k, series)
        })
        .collect()
}

pub fn monthly_series(records: &[TransactionRecord]) -> BTreeMap<Category, MonthlySeries> {
    bucket_by_month(records.iter(), |r| r.category)
}

/// Income vs expense trend.
pub fn direction_series(records: &[TransactionRecord]) -> BTreeMap<Direction, MonthlySeries> {
    bucket_by_month(records.iter(), |r| r.direction)
}

pub fn compare_years(official: &YearBreakdown, detailed: &YearBreakdown) -> Vec<ComparisonRow> {
    vec![
        ComparisonRow::new("Sales Revenue", official.total_income, detailed.total_income),
        ComparisonRow::new("Total Expenses", official.total_expenses, detailed.total_expenses),
        ComparisonRow::new("Net Profit", official.net, detailed.net),
    ]
}

/// Everything the renderer needs, computed once.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub official: OfficialAnnualSummary,
    pub official_gross_profit: f64,
    pub official_operating_expenses: f64,
    pub official_ratios: FinancialRatios,
    pub transaction_year: i32,
    pub category_totals: Vec<CategoryAggregate>,
    pub monthly_by_category: BTreeMap<Category, MonthlySeries>,
    pub monthly_by_direction: BTreeMap<Direction, MonthlySeries>,
    pub year_breakdown: Vec<YearBreakdown>,
    pub comparison: Vec<ComparisonRow>,
    pub kpis: Kpis,
    pub data_summary: DataSummary,
    pub quality: DataQualityNote,
    pub audits: Vec<SheetAudit>,
}

impl AggregateReport {
    pub fn category_total(&self, category: Category) -> f64 {
        self.category_totals
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.total)
            .sum()
    }

    pub fn breakdown(&self, source: FigureSource) -> Option<&YearBreakdown> {
        self.year_breakdown.iter().find(|b| b.source == source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn aggregate(
    official: &OfficialAnnualSummary,
    transaction_year: i32,
    records: &[TransactionRecord],
    audits: Vec<SheetAudit>,
) -> AggregateReport {
    let official_year = YearBreakdown::official(official);
    let detailed_year = YearBreakdown::detailed(transaction_year, records);
    let comparison = compare_years(&official_year, &detailed_year);

    AggregateReport {
        official: official.clone(),
        official_gross_profit: official.gross_profit(),
        official_operating_expenses: official.total_operating_expenses(),
        official_ratios: FinancialRatios::from_summary(official),
        transaction_year,
        category_totals: category_totals(records),
        monthly_by_category: monthly_series(records),
        monthly_by_direction: direction_series(records),
        year_breakdown: vec![official_year, detailed_year],
        comparison,
        kpis: Kpis::from_records(records),
        data_summary: DataSummary::from_records(records),
        quality: DataQualityNote::from_audits(&audits),
        audits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        y: i32,
        m: u32,
        d: u32,
        amount: f64,
        category: Category,
        direction: Direction,
    ) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            amount,
            category,
            narrative: format!("{} {}", category, amount),
            direction,
        }
    }

    fn sample() -> Vec<TransactionRecord> {
        vec![
            record(2025, 1, 5, 100_000.0, Category::Sales, Direction::Inflow),
            record(2025, 1, 20, 50_000.0, Category::Sales, Direction::Inflow),
            record(2025, 3, 2, 80_000.0, Category::Sales, Direction::Inflow),
            record(2025, 1, 10, 20_000.0, Category::Labour, Direction::Outflow),
            record(2025, 3, 10, 16_000.0, Category::Rent, Direction::Outflow),
            record(2025, 2, 1, 5_000.0, Category::Savings, Direction::Inflow),
            record(2025, 2, 9, 2_000.0, Category::Savings, Direction::Outflow),
        ]
    }

    #[test]
    fn test_category_totals() {
        let totals = category_totals(&sample());

        let sales = totals.iter().find(|t| t.category == Category::Sales).unwrap();
        assert!((sales.total - 230_000.0).abs() < 0.01);
        assert_eq!(sales.record_count, 3);
        assert_eq!(
            sales.period,
            Some(Period {
                start: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            })
        );

        let savings: Vec<_> = totals.iter().filter(|t| t.category == Category::Savings).collect();
        assert_eq!(savings.len(), 2);
        assert_eq!(savings[0].direction, Direction::Inflow);
    }

    #[test]
    fn test_monthly_series_is_sparse_and_chronological() {
        let series = monthly_series(&sample());
        let sales = &series[&Category::Sales];

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].month, YearMonth::new(2025, 1));
        assert!((sales[0].total - 150_000.0).abs() < 0.01);
        assert_eq!(sales[0].record_count, 2);
        assert_eq!(sales[1].month, YearMonth::new(2025, 3));
        assert!(!series.contains_key(&Category::Utilities));
    }

    #[test]
    fn test_direction_series() {
        let series = direction_series(&sample());
        let income = &series[&Direction::Inflow];
        let expense = &series[&Direction::Outflow];
        assert_eq!(income.len(), 3);
        assert!((income[1].total - 5_000.0).abs() < 0.01);
        assert_eq!(expense.len(), 3);
    }

    #[test]
    fn test_kpis_and_filter() {
        let records = sample();
        let kpis = Kpis::from_records(&records);
        assert!((kpis.total_income - 235_000.0).abs() < 0.01);
        assert!((kpis.total_expenses - 38_000.0).abs() < 0.01);
        assert!((kpis.net_profit - 197_000.0).abs() < 0.01);

        let filter = RecordFilter {
            categories: vec![Category::Sales],
            ..Default::default()
        };
        assert_eq!(filter.apply(&records).len(), 3);

        let outflows = RecordFilter {
            direction: Some(Direction::Outflow),
            year: Some(2025),
            ..Default::default()
        };
        assert_eq!(outflows.apply(&records).len(), 3);

        assert_eq!(Kpis::from_records(&[]).profit_margin, 0.0);
    }

    #[test]
    fn test_comparison_against_official_year() {
        let official = OfficialAnnualSummary::official_2024();
        let report = aggregate(&official, 2025, &sample(), Vec::new());

        let official_year = report.breakdown(FigureSource::Official).unwrap();
        assert!((official_year.net - 3_389_075.35).abs() < 0.01);

        let sales_row = &report.comparison[0];
        assert_eq!(sales_row.metric, "Sales Revenue");
        let expected = (235_000.0 - 22_619_122.0) / 22_619_122.0 * 100.0;
        assert!((sales_row.change_pct.unwrap() - expected).abs() < 1e-9);

        assert!(ComparisonRow::new("x", 0.0, 5.0).change_pct.is_none());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let official = OfficialAnnualSummary::official_2024();
        let records = sample();
        let first = aggregate(&official, 2025, &records, Vec::new());
        let second = aggregate(&official, 2025, &records, Vec::new());

        assert_eq!(first.category_totals, second.category_totals);
        assert_eq!(first.monthly_by_category, second.monthly_by_category);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_data_summary() {
        let summary = DataSummary::from_records(&sample());
        assert_eq!(summary.total_transactions, 7);
        assert_eq!(summary.months_covered, 3);
        assert_eq!(summary.years, vec![2025]);
        assert_eq!(
            summary.categories,
            vec![Category::Sales, Category::Labour, Category::Rent, Category::Savings]
        );
    }
}
