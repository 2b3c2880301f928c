use crate::error::{DashboardError, Result};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum Category {
    #[schemars(description = "Revenue received from customers (Sales sheet)")]
    Sales,

    #[schemars(description = "Wages and casual labour (Labour sheet)")]
    Labour,

    #[schemars(description = "Premises rent (rent sheet)")]
    Rent,

    #[schemars(description = "Stock bought for resale, the cost of goods sold (Purchase of stock sheet)")]
    PurchaseOfStock,

    #[schemars(description = "Power, water and similar utilities (Utilities sheet)")]
    Utilities,

    #[schemars(description = "Savings account deposits and withdrawals (Saving sheet)")]
    Savings,

    #[schemars(description = "Everything else, including transport (Expense sheet)")]
    OtherExpenses,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Sales,
        Category::Labour,
        Category::Rent,
        Category::PurchaseOfStock,
        Category::Utilities,
        Category::Savings,
        Category::OtherExpenses,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Sales => "Sales",
            Category::Labour => "Labour",
            Category::Rent => "Rent",
            Category::PurchaseOfStock => "Purchase of Stock",
            Category::Utilities => "Utilities",
            Category::Savings => "Savings",
            Category::OtherExpenses => "Other Expenses",
        }
    }

    /// Direction used when a sheet only carries one amount column.
    pub fn default_direction(&self) -> Direction {
        match self {
            Category::Sales => Direction::Inflow,
            _ => Direction::Outflow,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Inflow => "Income",
            Direction::Outflow => "Expense",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A cleaned transaction. `amount` is always a non-negative magnitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Category,
    pub narrative: String,
    pub direction: Direction,
}

impl TransactionRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Calendar month bucket, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month_end(&self) -> NaiveDate {
        crate::utils::last_day_of_month(self.year, self.month)
    }

    pub fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Provenance {
    #[schemars(description = "Figure taken from the official Profit & Loss Account")]
    PnlAccount,

    #[schemars(description = "Figure taken from the official Balance Sheet")]
    BalanceSheet,
}

impl Provenance {
    pub fn label(&self) -> &'static str {
        match self {
            Provenance::PnlAccount => "P&L Account",
            Provenance::BalanceSheet => "Balance Sheet",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfficialFigure {
    pub name: &'static str,
    pub value: f64,
    pub provenance: Provenance,
}

/// Audited annual P&L figures. Supplied as constants, never derived from
/// transaction records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct OfficialAnnualSummary {
    #[schemars(description = "Financial year the statement covers")]
    pub year: i32,
    pub sales: f64,
    #[schemars(description = "Cost of goods sold (stock purchases)")]
    pub cogs: f64,
    pub labour: f64,
    pub rent: f64,
    pub transport: f64,
    #[schemars(description = "Bank and mobile-money transaction charges")]
    pub transaction_costs: f64,
    #[schemars(description = "Net profit as stated on the official statement")]
    pub net_profit: f64,
    #[schemars(description = "Statement the figures are taken from unless overridden per figure")]
    pub provenance: Provenance,
    #[serde(default)]
    #[schemars(
        description = "Per-figure statement, keyed by figure name (e.g. \"Transaction Costs\": \"BalanceSheet\")"
    )]
    pub figure_provenance: BTreeMap<String, Provenance>,
}

impl OfficialAnnualSummary {
    pub fn official_2024() -> Self {
        Self {
            year: 2024,
            sales: 22_619_122.0,
            cogs: 17_244_564.0,
            labour: 601_155.0,
            rent: 192_000.0,
            transport: 1_028_770.0,
            transaction_costs: 163_557.65,
            net_profit: 3_389_075.35,
            provenance: Provenance::PnlAccount,
            figure_provenance: BTreeMap::new(),
        }
    }

    pub fn gross_profit(&self) -> f64 {
        self.sales - self.cogs
    }

    pub fn total_operating_expenses(&self) -> f64 {
        self.labour + self.rent + self.transport + self.transaction_costs
    }

    pub fn total_expenses(&self) -> f64 {
        self.cogs + self.total_operating_expenses()
    }

    pub fn computed_net_profit(&self) -> f64 {
        self.gross_profit() - self.total_operating_expenses()
    }

    pub fn gross_profit_margin(&self) -> f64 {
        ratio(self.gross_profit(), self.sales)
    }

    pub fn net_profit_margin(&self) -> f64 {
        ratio(self.net_profit, self.sales)
    }

    pub fn operating_expense_ratio(&self) -> f64 {
        ratio(self.total_operating_expenses(), self.sales)
    }

    /// Checks the stated net profit against the figures it is made of.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        let computed = self.computed_net_profit();
        let difference = (self.net_profit - computed).abs();

        if difference > tolerance {
            return Err(DashboardError::SummaryMismatch {
                stated: self.net_profit,
                computed,
                difference,
            });
        }

        Ok(())
    }

    pub fn provenance_of(&self, figure: &str) -> Provenance {
        self.figure_provenance
            .get(figure)
            .copied()
            .unwrap_or(self.provenance)
    }

    /// Distinct statements behind the figures, e.g. "P&L Account & Balance Sheet".
    pub fn provenance_label(&self) -> String {
        let mut statements = vec![self.provenance];
        for p in self.figure_provenance.values() {
            if !statements.contains(p) {
                statements.push(*p);
            }
        }
        statements
            .iter()
            .map(Provenance::label)
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// Waterfall order: revenue, each deduction, stated result.
    pub fn figures(&self) -> Vec<OfficialFigure> {
        let figure = |name: &'static str, value: f64| OfficialFigure {
            name,
            value,
            provenance: self.provenance_of(name),
        };

        vec![
            figure("Sales", self.sales),
            figure("COGS", self.cogs),
            figure("Labour", self.labour),
            figure("Rent", self.rent),
            figure("Transport", self.transport),
            figure("Transaction Costs", self.transaction_costs),
            figure("Net Profit", self.net_profit),
        ]
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
