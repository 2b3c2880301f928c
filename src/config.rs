use crate::error::{DashboardError, Result};
use crate::schema::{Category, OfficialAnnualSummary};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "mode", rename_all = "PascalCase")]
pub enum HeaderMode {
    #[schemars(description = "The first row of the sheet holds the column names.")]
    FirstRow,

    #[schemars(
        description = "Ignore the sheet's own header row (plus `skip_rows` further rows) and name the columns by position."
    )]
    Positional {
        #[serde(default)]
        skip_rows: usize,
        columns: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "PascalCase")]
pub enum AmountSource {
    #[schemars(description = "A single amount column; records take the category's default direction.")]
    Column { name: String },

    #[schemars(
        description = "Sum of several columns (missing cells count as zero). Rows whose sum is not positive are skipped."
    )]
    Combined { columns: Vec<String> },

    #[schemars(
        description = "Separate inflow and outflow columns. A row may yield one record for each non-empty, non-zero side."
    )]
    Split { inflow: String, outflow: String },
}

impl AmountSource {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            AmountSource::Column { name } => vec![name.as_str()],
            AmountSource::Combined { columns } => columns.iter().map(String::as_str).collect(),
            AmountSource::Split { inflow, outflow } => vec![inflow.as_str(), outflow.as_str()],
        }
    }
}

/// Column mapping for one workbook sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SheetLayout {
    #[schemars(description = "Sheet name in the workbook (matched case-insensitively)")]
    pub sheet: String,
    pub category: Category,
    pub header: HeaderMode,
    pub date_column: String,
    pub narrative_column: String,
    pub amount: AmountSource,
}

impl SheetLayout {
    fn named(sheet: &str, category: Category, amount: AmountSource) -> Self {
        Self {
            sheet: sheet.to_string(),
            category,
            header: HeaderMode::FirstRow,
            date_column: "Tran Date".to_string(),
            narrative_column: "Transaction Narrative".to_string(),
            amount,
        }
    }

    fn positional(sheet: &str, category: Category, skip_rows: usize, columns: &[&str]) -> Self {
        Self {
            sheet: sheet.to_string(),
            category,
            header: HeaderMode::Positional {
                skip_rows,
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
            date_column: "Date".to_string(),
            narrative_column: "Details".to_string(),
            amount: AmountSource::Column {
                name: "Amount".to_string(),
            },
        }
    }

    /// Every column the layout reads, in the order it checks them.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.date_column.as_str(), self.narrative_column.as_str()];
        columns.extend(self.amount.columns());
        columns
    }

    pub fn default_layouts() -> Vec<SheetLayout> {
        let column = |name: &str| AmountSource::Column {
            name: name.to_string(),
        };

        vec![
            Self::positional(
                "Sales",
                Category::Sales,
                0,
                &["Date", "Value_Date", "Withdrawals", "Amount", "Details"],
            ),
            Self::named("Labour", Category::Labour, column("Withdrawals")),
            Self::positional(
                "rent",
                Category::Rent,
                1,
                &["Date1", "Date", "Amount", "Col3", "Details"],
            ),
            Self::named(
                "Purchase of stock",
                Category::PurchaseOfStock,
                column("Deposits"),
            ),
            Self::named(
                "Utilities",
                Category::Utilities,
                AmountSource::Combined {
                    columns: vec!["Withdrawals".to_string(), "Deposits".to_string()],
                },
            ),
            Self::named(
                "Saving",
                Category::Savings,
                AmountSource::Split {
                    inflow: "Deposits".to_string(),
                    outflow: "Withdrawals".to_string(),
                },
            ),
            Self::named("Expense", Category::OtherExpenses, column("Withdrawals")),
        ]
    }
}

/// Rows of one historical batch were exported without dates. Rows matching
/// this rule get `date` instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FallbackDateRule {
    pub category: Category,
    #[schemars(description = "Case-insensitive substring the narrative must contain")]
    pub narrative_keyword: String,
    pub date: NaiveDate,
}

impl FallbackDateRule {
    pub fn transport_batch() -> Self {
        Self {
            category: Category::OtherExpenses,
            narrative_keyword: "transport".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 30).unwrap_or_default(),
        }
    }

    pub fn applies_to(&self, category: Category, narrative: &str) -> bool {
        category == self.category
            && !self.narrative_keyword.is_empty()
            && narrative
                .to_lowercase()
                .contains(&self.narrative_keyword.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    #[schemars(description = "Business name shown in the dashboard header")]
    pub organization_name: String,

    #[schemars(description = "Currency code prefixed to every amount (e.g. KES)")]
    pub currency: String,

    pub workbook_path: PathBuf,

    pub output_path: PathBuf,

    #[schemars(description = "Year the workbook's transactions belong to")]
    pub transaction_year: i32,

    pub layouts: Vec<SheetLayout>,

    pub fallback_date: Option<FallbackDateRule>,

    pub official_summary: OfficialAnnualSummary,

    #[schemars(description = "Allowed gap between stated and computed official net profit")]
    pub summary_tolerance: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            organization_name: "Blancosy".to_string(),
            currency: "KES".to_string(),
            workbook_path: PathBuf::from("blancosy book of accounts 2025.xlsx"),
            output_path: PathBuf::from("index.html"),
            transaction_year: 2025,
            layouts: SheetLayout::default_layouts(),
            fallback_date: Some(FallbackDateRule::transport_batch()),
            official_summary: OfficialAnnualSummary::official_2024(),
            summary_tolerance: 0.01,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layouts.is_empty() {
            return Err(DashboardError::Config("no sheet layouts configured".to_string()));
        }

        for layout in &self.layouts {
            if let HeaderMode::Positional { columns, .. } = &layout.header {
                for required in layout.required_columns() {
                    if !columns.iter().any(|c| c == required) {
                        return Err(DashboardError::Config(format!(
                            "layout '{}' reads column '{}' that its positional header does not name",
                            layout.sheet, required
                        )));
                    }
                }
            }
        }

        if self.summary_tolerance < 0.0 {
            return Err(DashboardError::Config(format!(
                "summary tolerance {} must not be negative",
                self.summary_tolerance
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
