//! Sheet Reader: loads one named sheet of a workbook as raw, untyped rows.

use crate::config::HeaderMode;
use crate::error::{DashboardError, Result};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A cell as it came out of the workbook, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl RawValue {
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Empty => Ok(()),
            RawValue::Text(s) => f.write_str(s.trim()),
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RawValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

impl From<&Data> for RawValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => RawValue::Empty,
            Data::String(s) => RawValue::Text(s.clone()),
            Data::Float(f) => RawValue::Number(*f),
            Data::Int(i) => RawValue::Number(*i as f64),
            Data::Bool(b) => RawValue::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(|d| RawValue::Date(d.date()))
                .unwrap_or(RawValue::Empty),
            Data::DateTimeIso(s) => RawValue::Text(s.clone()),
            Data::DurationIso(s) => RawValue::Text(s.clone()),
            Data::Error(_) => RawValue::Empty,
        }
    }
}

/// One data row keyed by column name. Absent columns read as `Empty`.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based row number in the source sheet
    pub line_number: usize,
    pub cells: BTreeMap<String, RawValue>,
}

static EMPTY: RawValue = RawValue::Empty;

impl RawRow {
    pub fn get(&self, column: &str) -> &RawValue {
        self.cells.get(column).unwrap_or(&EMPTY)
    }
}

/// Rows with their column names resolved.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub sheet: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SheetTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// The cell grid of one sheet.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Widest row in the sheet.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Applies the header mode. The sheet's first row is always treated as a
    /// header row; fully blank data rows are skipped. Positional names past
    /// the sheet's width are not columns of the table.
    pub fn table(&self, header: &HeaderMode) -> SheetTable {
        let (columns, data_start) = match header {
            HeaderMode::FirstRow => {
                let columns: Vec<String> = self
                    .rows
                    .first()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .unwrap_or_default();
                (columns, 1)
            }
            HeaderMode::Positional { skip_rows, columns } => {
                let present: Vec<String> = columns.iter().take(self.width()).cloned().collect();
                (present, 1 + skip_rows)
            }
        };

        let rows = self
            .rows
            .iter()
            .enumerate()
            .skip(data_start)
            .filter(|(_, row)| row.iter().any(|c| !c.is_empty()))
            .map(|(idx, row)| RawRow {
                line_number: idx + 1,
                cells: columns
                    .iter()
                    .zip(row.iter())
                    .filter(|(name, _)| !name.is_empty())
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            })
            .collect();

        SheetTable {
            sheet: self.name.clone(),
            columns: columns.into_iter().filter(|c| !c.is_empty()).collect(),
            rows,
        }
    }
}

/// Anything that can hand out named sheets.
pub trait SheetSource {
    fn sheet_names(&self) -> Vec<String>;

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet>;

    /// Exact name first, then a case- and whitespace-insensitive match.
    fn resolve_sheet_name(&self, requested: &str) -> Option<String> {
        let names = self.sheet_names();
        if let Some(exact) = names.iter().find(|n| n.as_str() == requested) {
            return Some(exact.clone());
        }

        let wanted = requested.trim().to_lowercase();
        names.into_iter().find(|n| n.trim().to_lowercase() == wanted)
    }
}

pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookReader {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = open_workbook_auto(path)
            .map_err(|e| DashboardError::source_read(path.display().to_string(), e))?;

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl SheetSource for WorkbookReader {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet> {
        let resolved = self.resolve_sheet_name(name).ok_or_else(|| {
            DashboardError::source_read(
                format!("sheet '{}'", name),
                format!("not present in {}", self.path.display()),
            )
        })?;

        let range = self
            .workbook
            .worksheet_range(&resolved)
            .map_err(|e| DashboardError::source_read(format!("sheet '{}'", resolved), e))?;

        // Keep column positions stable when the used range does not start at A.
        let leading_columns = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let rows: Vec<Vec<RawValue>> = range
            .rows()
            .map(|row| {
                std::iter::repeat(RawValue::Empty)
                    .take(leading_columns)
                    .chain(row.iter().map(RawValue::from))
                    .collect()
            })
            .collect();

        debug!("Read {} rows from sheet '{}'", rows.len(), resolved);

        Ok(RawSheet::new(resolved, rows))
    }
}

/// Workbook held in memory; used for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: BTreeMap<String, Vec<Vec<RawValue>>>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<RawValue>>) -> Self {
        self.sheets.insert(name.to_string(), rows);
        self
    }
}

impl SheetSource for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet> {
        let resolved = self.resolve_sheet_name(name).ok_or_else(|| {
            DashboardError::source_read(format!("sheet '{}'", name), "not present in workbook")
        })?;

        let rows = self.sheets.get(&resolved).cloned().unwrap_or_default();
        Ok(RawSheet::new(resolved, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn text(s: &str) -> RawValue {
        RawValue::from(s)
    }

    #[test]
    fn test_first_row_header() {
        let sheet = RawSheet::new(
            "Labour",
            vec![
                vec![text("Tran Date"), text("Withdrawals"), text("Transaction Narrative")],
                vec![text("2025-01-03"), RawValue::Number(1500.0), text("Casuals")],
                vec![RawValue::Empty, RawValue::Empty, text("  ")],
                vec![text("2025-01-04"), RawValue::Number(900.0)],
            ],
        );

        let table = sheet.table(&HeaderMode::FirstRow);
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line_number, 2);
        assert_eq!(table.rows[1].line_number, 4);
        assert_eq!(table.rows[0].get("Withdrawals"), &RawValue::Number(1500.0));
        assert_eq!(table.rows[1].get("Transaction Narrative"), &RawValue::Empty);
    }

    #[test]
    fn test_positional_header_skips_extra_rows() {
        let sheet = RawSheet::new(
            "rent",
            vec![
                vec![text("junk"), text("junk")],
                vec![text("Posting"), text("Value"), text("Amt")],
                vec![text("x"), text("2025-02-01"), RawValue::Number(16000.0)],
            ],
        );

        let header = HeaderMode::Positional {
            skip_rows: 1,
            columns: vec!["Date1".into(), "Date".into(), "Amount".into()],
        };
        let table = sheet.table(&header);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("Amount"), &RawValue::Number(16000.0));
        assert!(table.has_column("Date1"));
    }

    #[test]
    fn test_positional_header_limited_to_sheet_width() {
        let sheet = RawSheet::new(
            "rent",
            vec![
                vec![text("Posting"), text("Value")],
                vec![text("junk"), text("junk")],
                vec![text("x"), text("2025-02-01")],
                vec![text("y"), text("2025-03-01")],
            ],
        );

        let header = HeaderMode::Positional {
            skip_rows: 1,
            columns: vec!["Date1".into(), "Date".into(), "Amount".into(), "Details".into()],
        };
        let table = sheet.table(&header);
        assert_eq!(table.columns, vec!["Date1".to_string(), "Date".to_string()]);
        assert!(!table.has_column("Amount"));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_workbook_datetimes_respect_1904_system() {
        let in_1900 = Data::DateTime(ExcelDateTime::new(45658.0, ExcelDateTimeType::DateTime, false));
        let in_1904 = Data::DateTime(ExcelDateTime::new(44196.0, ExcelDateTimeType::DateTime, true));
        let new_year = RawValue::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        assert_eq!(RawValue::from(&in_1900), new_year);
        assert_eq!(RawValue::from(&in_1904), new_year);
    }

    #[test]
    fn test_sheet_name_resolution_is_case_insensitive() {
        let mut workbook = InMemoryWorkbook::new().with_sheet("Rent ", vec![]);
        assert_eq!(workbook.resolve_sheet_name("rent"), Some("Rent ".to_string()));
        assert!(workbook.read_sheet("RENT").is_ok());
        assert!(matches!(
            workbook.read_sheet("Payroll"),
            Err(DashboardError::SourceRead { .. })
        ));
    }

    #[test]
    fn test_missing_workbook_is_source_read_error() {
        let result = WorkbookReader::open(Path::new("/nonexistent/book of accounts.xlsx"));
        assert!(matches!(result, Err(DashboardError::SourceRead { .. })));
    }

    #[test]
    fn test_raw_value_display() {
        assert_eq!(RawValue::Number(4500.0).to_string(), "4500");
        assert_eq!(RawValue::Number(12.5).to_string(), "12.5");
        assert_eq!(
            RawValue::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()).to_string(),
            "2025-03-01"
        );
    }
}
