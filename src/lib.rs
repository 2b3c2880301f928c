//! # Financial Dashboard Builder
//!
//! Turns a small business's records into a static, single-page financial
//! dashboard.
//!
//! ## Core Concepts
//!
//! - **Official Summary**: audited annual P&L figures, supplied as constants and
//!   never derived from transactions
//! - **Transaction Workbook**: one sheet per category, each with its own column
//!   layout, normalized into a single stream of [`TransactionRecord`]s
//! - **Aggregate Report**: category totals, monthly series and the comparison
//!   between the official year and the transaction year
//! - **Data Quality**: every dropped, defaulted or sign-corrected row is counted
//!   per sheet and shown in the report
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_dashboard_builder::*;
//!
//! let builder = DashboardBuilder::new(DashboardConfig::default());
//! let mut workbook = WorkbookReader::open(&builder.config().workbook_path)?;
//! let report = builder.build_report(&mut workbook)?;
//! let html = builder.render(&report, chrono::Local::now().date_naive())?;
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod reader;
pub mod render;
pub mod schema;
pub mod utils;

pub use aggregator::{
    aggregate, category_totals, compare_years, direction_series, monthly_series, AggregateReport,
    CategoryAggregate, ComparisonRow, DataQualityNote, DataSummary, FigureSource, Kpis,
    MonthlyPoint, MonthlySeries, RecordFilter, YearBreakdown,
};
pub use config::{AmountSource, DashboardConfig, FallbackDateRule, HeaderMode, SheetLayout};
pub use error::{DashboardError, Result, RowValidationError};
pub use normalizer::{normalize_sheet, NormalizedSheet, SheetAudit, SheetStatus};
pub use reader::{InMemoryWorkbook, RawSheet, RawValue, SheetSource, WorkbookReader};
pub use render::{chart_specs, console_summary, render_html, ChartKind, ChartSpec, RenderOptions};
pub use schema::*;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::fs;

pub struct DashboardBuilder {
    config: DashboardConfig,
}

impl DashboardBuilder {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Reads and normalizes every configured sheet. A sheet that cannot be
    /// read, or lacks a column its layout needs, is recorded in the audits and
    /// skipped.
    pub fn load_records<S: SheetSource>(
        &self,
        source: &mut S,
    ) -> (Vec<TransactionRecord>, Vec<SheetAudit>) {
        let mut records = Vec::new();
        let mut audits = Vec::with_capacity(self.config.layouts.len());

        for layout in &self.config.layouts {
            match self.load_sheet(source, layout) {
                Ok(sheet) => {
                    records.extend(sheet.records);
                    audits.push(sheet.audit);
                }
                Err(e @ DashboardError::SchemaMismatch { .. }) => {
                    warn!("Skipping sheet '{}': {}", layout.sheet, e);
                    audits.push(SheetAudit::failed(layout, &e));
                }
                Err(e) => {
                    error!("Skipping sheet '{}': {}", layout.sheet, e);
                    audits.push(SheetAudit::failed(layout, &e));
                }
            }
        }

        debug!(
            "Loaded {} records from {} of {} sheets",
            records.len(),
            audits.iter().filter(|a| a.is_loaded()).count(),
            audits.len()
        );

        (records, audits)
    }

    fn load_sheet<S: SheetSource>(
        &self,
        source: &mut S,
        layout: &SheetLayout,
    ) -> Result<NormalizedSheet> {
        let raw = source.read_sheet(&layout.sheet)?;
        let table = raw.table(&layout.header);
        normalize_sheet(&table, layout, self.config.fallback_date.as_ref())
    }

    pub fn build_report<S: SheetSource>(&self, source: &mut S) -> Result<AggregateReport> {
        let official = &self.config.official_summary;
        if let Err(e) = official.verify(self.config.summary_tolerance) {
            warn!("{} official summary: {}", official.year, e);
        }

        let (records, audits) = self.load_records(source);
        if !audits.iter().any(SheetAudit::is_loaded) {
            return Err(DashboardError::NoData);
        }

        info!(
            "Aggregating {} records for {} against the {} official summary",
            records.len(),
            self.config.transaction_year,
            official.year
        );

        Ok(aggregate(
            official,
            self.config.transaction_year,
            &records,
            audits,
        ))
    }

    pub fn render(&self, report: &AggregateReport, generated_on: NaiveDate) -> Result<String> {
        let options = RenderOptions::new(
            &self.config.organization_name,
            &self.config.currency,
            generated_on,
        );
        render_html(report, &options)
    }

    /// Full batch: open the configured workbook, build the report and write
    /// the HTML document to the configured output path.
    pub fn run(&self, generated_on: NaiveDate) -> Result<AggregateReport> {
        info!(
            "Building dashboard for {} from {}",
            self.config.organization_name,
            self.config.workbook_path.display()
        );

        let mut workbook = WorkbookReader::open(&self.config.workbook_path)?;
        let report = self.build_report(&mut workbook)?;
        let html = self.render(&report, generated_on)?;

        fs::write(&self.config.output_path, html)?;
        info!("Dashboard written to {}", self.config.output_path.display());

        Ok(report)
    }
}

pub fn build_dashboard<S: SheetSource>(
    config: &DashboardConfig,
    source: &mut S,
    generated_on: NaiveDate,
) -> Result<(AggregateReport, String)> {
    let builder = DashboardBuilder::new(config.clone());
    let report = builder.build_report(source)?;
    let html = builder.render(&report, generated_on)?;
    Ok((report, html))
}
