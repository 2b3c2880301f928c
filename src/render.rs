//! Report Renderer: chart specifications and the static HTML document.
//!
//! Everything here is presentation. Every figure shown comes straight from the
//! [`AggregateReport`]; nothing is recomputed.

use crate::aggregator::{AggregateReport, FigureSource, MonthlySeries};
use crate::error::Result;
use crate::normalizer::{SheetAudit, SheetStatus};
use crate::schema::Direction;
use crate::utils::{format_amount, format_change, format_money};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
pub const BOOTSTRAP_CSS_CDN: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/css/bootstrap.min.css";

const INCOME_COLOR: &str = "#28a745";
const EXPENSE_COLOR: &str = "#dc3545";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Waterfall,
    Pie,
    Bar,
    Line,
}

/// A Plotly figure: `traces` and `layout` are passed to `Plotly.newPlot` as is.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub traces: Vec<Value>,
    pub layout: Value,
}

impl ChartSpec {
    fn new(id: &str, title: &str, kind: ChartKind, traces: Vec<Value>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            traces,
            layout: json!({
                "title": title,
                "template": "plotly_white",
                "height": 500,
                "font": { "size": 12 },
                "margin": { "t": 60, "b": 60 },
            }),
        }
    }

    fn with_layout(mut self, extra: Value) -> Self {
        if let (Value::Object(base), Value::Object(extra)) = (&mut self.layout, extra) {
            base.extend(extra);
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub organization_name: String,
    pub currency: String,
    pub generated_on: NaiveDate,
}

impl RenderOptions {
    pub fn new(organization_name: &str, currency: &str, generated_on: NaiveDate) -> Self {
        Self {
            title: format!("{} Financials - Official Analysis Dashboard", organization_name),
            organization_name: organization_name.to_string(),
            currency: currency.to_string(),
            generated_on,
        }
    }
}

fn waterfall_chart(report: &AggregateReport, currency: &str) -> ChartSpec {
    let figures = report.official.figures();
    let last = figures.len().saturating_sub(1);

    let measure: Vec<&str> = (0..figures.len())
        .map(|i| match i {
            0 => "absolute",
            i if i == last => "total",
            _ => "relative",
        })
        .collect();
    let x: Vec<&str> = figures.iter().map(|f| f.name).collect();
    let y: Vec<f64> = figures
        .iter()
        .enumerate()
        .map(|(i, f)| if i == 0 || i == last { f.value } else { -f.value })
        .collect();
    let text: Vec<String> = y.iter().map(|v| format_money(currency, *v)).collect();
    let sources: Vec<&str> = figures.iter().map(|f| f.provenance.label()).collect();

    let title = format!("{} Official P&L Waterfall Analysis", report.official.year);
    ChartSpec::new(
        "chart-waterfall",
        &title,
        ChartKind::Waterfall,
        vec![json!({
            "type": "waterfall",
            "name": format!("{} P&L", report.official.year),
            "orientation": "v",
            "measure": measure,
            "x": x,
            "y": y,
            "text": text,
            "customdata": sources,
            "hovertemplate": "%{x}: %{text}<br>%{customdata}<extra></extra>",
            "textposition": "outside",
            "connector": { "line": { "color": "rgb(63, 63, 63)" } },
        })],
    )
    .with_layout(json!({ "showlegend": false }))
}

fn expense_pie_chart(report: &AggregateReport) -> ChartSpec {
    let official = &report.official;
    let labels = [
        "Stock Purchase (COGS)",
        "Transport",
        "Labour",
        "Rent",
        "Transaction Costs",
    ];
    let values = [
        official.cogs,
        official.transport,
        official.labour,
        official.rent,
        official.transaction_costs,
    ];

    let title = format!("{} Official Expense Breakdown", official.year);
    ChartSpec::new(
        "chart-expense-pie",
        &title,
        ChartKind::Pie,
        vec![json!({
            "type": "pie",
            "labels": labels,
            "values": values,
            "textposition": "inside",
            "textinfo": "percent+label",
        })],
    )
}

fn year_over_year_chart(report: &AggregateReport, currency: &str) -> ChartSpec {
    let years: Vec<String> = report
        .year_breakdown
        .iter()
        .map(|b| b.year.to_string())
        .collect();

    let bar = |name: &str, color: &str, values: Vec<f64>| {
        let text: Vec<String> = values.iter().map(|v| format_money(currency, *v)).collect();
        json!({
            "type": "bar",
            "name": name,
            "x": years,
            "y": values,
            "marker": { "color": color },
            "text": text,
            "textposition": "outside",
        })
    };

    let income = report.year_breakdown.iter().map(|b| b.total_income).collect();
    let expenses = report.year_breakdown.iter().map(|b| b.total_expenses).collect();

    ChartSpec::new(
        "chart-yoy",
        "Year-over-Year Financial Performance",
        ChartKind::Bar,
        vec![
            bar("Income", INCOME_COLOR, income),
            bar("Expenses", EXPENSE_COLOR, expenses),
        ],
    )
    .with_layout(json!({
        "barmode": "group",
        "xaxis": { "title": "Year", "type": "category" },
        "yaxis": { "title": format!("Amount ({})", currency) },
    }))
}

fn series_trace(name: &str, color: &str, series: &MonthlySeries) -> Value {
    let x: Vec<String> = series.iter().map(|p| p.month.to_string()).collect();
    let y: Vec<f64> = series.iter().map(|p| p.total).collect();

    json!({
        "type": "scatter",
        "mode": "lines+markers",
        "name": name,
        "x": x,
        "y": y,
        "line": { "color": color, "width": 3 },
        "marker": { "size": 8 },
    })
}

fn monthly_trend_chart(report: &AggregateReport, currency: &str) -> ChartSpec {
    let traces = report
        .monthly_by_direction
        .iter()
        .map(|(direction, series)| {
            let color = match direction {
                Direction::Inflow => INCOME_COLOR,
                Direction::Outflow => EXPENSE_COLOR,
            };
            series_trace(direction.label(), color, series)
        })
        .collect();

    let title = format!("{} Monthly Financial Trends", report.transaction_year);
    ChartSpec::new("chart-monthly", &title, ChartKind::Line, traces).with_layout(json!({
        "hovermode": "x unified",
        "xaxis": { "title": "Month", "type": "category" },
        "yaxis": { "title": format!("Amount ({})", currency) },
    }))
}

fn category_chart(report: &AggregateReport, currency: &str) -> ChartSpec {
    let labels: Vec<String> = report
        .category_totals
        .iter()
        .map(|c| {
            if c.direction == c.category.default_direction() {
                c.category.label().to_string()
            } else {
                format!("{} ({})", c.category.label(), c.direction.label())
            }
        })
        .collect();
    let values: Vec<f64> = report.category_totals.iter().map(|c| c.total).collect();
    let colors: Vec<&str> = report
        .category_totals
        .iter()
        .map(|c| match c.direction {
            Direction::Inflow => INCOME_COLOR,
            Direction::Outflow => EXPENSE_COLOR,
        })
        .collect();

    let title = format!("{} Totals by Category", report.transaction_year);
    ChartSpec::new(
        "chart-categories",
        &title,
        ChartKind::Bar,
        vec![json!({
            "type": "bar",
            "x": labels,
            "y": values,
            "marker": { "color": colors },
        })],
    )
    .with_layout(json!({
        "showlegend": false,
        "yaxis": { "title": format!("Amount ({})", currency) },
    }))
}

pub fn chart_specs(report: &AggregateReport, currency: &str) -> Vec<ChartSpec> {
    vec![
        waterfall_chart(report, currency),
        expense_pie_chart(report),
        year_over_year_chart(report, currency),
        monthly_trend_chart(report, currency),
        category_chart(report, currency),
    ]
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// JSON that is safe to place inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/").replace("<!--", "<\\!--"))
}

#[derive(Serialize)]
struct EmbeddedData<'a> {
    report: &'a AggregateReport,
    charts: &'a [ChartSpec],
}

fn metric_card(color: &str, value: &str, label: &str, note: &str) -> String {
    format!(
        r#"            <div class="col-md-3 mb-4">
                <div class="card metric-card h-100 border-{color}">
                    <div class="card-body text-center">
                        <h4 class="text-{color}">{value}</h4>
                        <p class="card-text">{label}</p>
                        <small class="text-muted">{note}</small>
                    </div>
                </div>
            </div>
"#,
        color = color,
        value = escape_html(value),
        label = escape_html(label),
        note = escape_html(note),
    )
}

fn metric_cards(report: &AggregateReport, currency: &str) -> String {
    let official = &report.official;
    let ratios = &report.official_ratios;

    [
        metric_card(
            "success",
            &format_money(currency, official.sales),
            &format!("{} Sales Revenue", official.year),
            official.provenance_of("Sales").label(),
        ),
        metric_card(
            "info",
            &format_money(currency, report.official_gross_profit),
            "Gross Profit",
            &format!("{:.1}% Margin", ratios.gross_profit_margin * 100.0),
        ),
        metric_card(
            "primary",
            &format_money(currency, official.net_profit),
            "Net Profit (Official)",
            &format!("{:.1}% Margin", ratios.net_profit_margin * 100.0),
        ),
        metric_card(
            "warning",
            &report.data_summary.total_transactions.to_string(),
            &format!("{} Transactions", report.transaction_year),
            &format!(
                "Operating expenses {:.1}% of sales",
                ratios.operating_expense_ratio * 100.0
            ),
        ),
    ]
    .concat()
}

fn chart_block(chart: &ChartSpec, column_class: &str) -> String {
    format!(
        r#"            <div class="{column_class}">
                <div class="chart-container">
                    <h5 class="mb-3">{title}</h5>
                    <div id="{id}" class="chart"></div>
                </div>
            </div>
"#,
        column_class = column_class,
        title = escape_html(&chart.title),
        id = escape_html(&chart.id),
    )
}

fn comparison_rows(report: &AggregateReport, currency: &str) -> String {
    report
        .comparison
        .iter()
        .map(|row| {
            let class = match row.change_pct {
                Some(p) if p >= 0.0 => "text-success",
                Some(_) => "text-danger",
                None => "text-muted",
            };
            format!(
                "<tr><td><strong>{}</strong></td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
                escape_html(&row.metric),
                format_money(currency, row.official),
                format_money(currency, row.detailed),
                class,
                format_change(row.change_pct),
            )
        })
        .collect()
}

fn category_rows(report: &AggregateReport, currency: &str) -> String {
    report
        .category_totals
        .iter()
        .map(|c| {
            let period = c
                .period
                .map(|p| format!("{} to {}", p.start.format("%b %Y"), p.end.format("%b %Y")))
                .unwrap_or_default();
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(c.category.label()),
                c.direction.label(),
                c.record_count,
                format_money(currency, c.total),
                period,
            )
        })
        .collect()
}

fn audit_row(audit: &SheetAudit) -> String {
    let status = match &audit.status {
        SheetStatus::Loaded => "<span class=\"badge bg-success\">loaded</span>".to_string(),
        SheetStatus::SourceReadFailed { reason } => format!(
            "<span class=\"badge bg-danger\">unreadable</span> {}",
            escape_html(reason)
        ),
        SheetStatus::SchemaMismatch { column } => format!(
            "<span class=\"badge bg-danger\">missing column</span> {}",
            escape_html(column)
        ),
    };

    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(&audit.sheet),
        status,
        audit.rows_read,
        audit.records_kept,
        audit.dropped_invalid_date,
        audit.dropped_invalid_amount,
        audit.dropped_duplicates,
        audit.defaulted_dates,
        audit.sign_corrected,
    )
}

fn quality_section(report: &AggregateReport) -> String {
    let quality = &report.quality;
    let (alert, headline) = if quality.has_issues() {
        ("alert-warning", "Some source rows were adjusted or excluded.")
    } else {
        ("alert-success", "Every source row was used as recorded.")
    };

    let mut details = format!(
        "{} of {} sheets loaded; {} of {} rows kept. Dropped: {} without a valid date, {} without a valid amount, {} duplicates. {} rows received the fallback date; {} negative amounts were recorded as magnitudes.",
        quality.sheets_loaded,
        report.audits.len(),
        format_amount(quality.records_kept as f64, 0),
        format_amount(quality.rows_read as f64, 0),
        quality.dropped_invalid_date,
        quality.dropped_invalid_amount,
        quality.dropped_duplicates,
        quality.defaulted_dates,
        quality.sign_corrected,
    );
    if !quality.sheets_failed.is_empty() {
        details.push_str(&format!(
            " Not included: {}.",
            escape_html(&quality.sheets_failed.join(", "))
        ));
    }

    let rows: String = report.audits.iter().map(audit_row).collect();

    format!(
        r#"<div class="alert {alert}"><strong>{headline}</strong> {details}</div>
                    <div class="table-responsive">
                        <table class="table table-sm">
                            <thead><tr><th>Sheet</th><th>Status</th><th>Rows</th><th>Kept</th><th>Bad date</th><th>Bad amount</th><th>Duplicates</th><th>Fallback date</th><th>Sign corrected</th></tr></thead>
                            <tbody>
{rows}                            </tbody>
                        </table>
                    </div>"#,
        alert = alert,
        headline = headline,
        details = details,
        rows = rows,
    )
}

fn insights(report: &AggregateReport) -> String {
    let revenue_change = report.comparison.first().and_then(|row| row.change_pct);
    let (trend_class, trend_title, trend_text) = match revenue_change {
        Some(p) if p < 0.0 => (
            "alert-warning",
            "Revenue Decline",
            format!(
                "{} recorded sales are {:.1}% below the official {} figure.",
                report.transaction_year,
                -p,
                report.official.year
            ),
        ),
        Some(p) => (
            "alert-success",
            "Revenue Growth",
            format!(
                "{} recorded sales are {:.1}% above the official {} figure.",
                report.transaction_year, p, report.official.year
            ),
        ),
        None => (
            "alert-secondary",
            "Revenue Trend",
            "No official revenue figure to compare against.".to_string(),
        ),
    };

    format!(
        r#"<div class="row">
                        <div class="col-md-4"><div class="alert alert-info"><h6>Profitability</h6><p class="mb-0">{year} net profit margin of {margin:.1}% on the official statement.</p></div></div>
                        <div class="col-md-4"><div class="alert alert-info"><h6>Official Verification</h6><p class="mb-0">{year} figures are taken from the {provenance}.</p></div></div>
                        <div class="col-md-4"><div class="alert {trend_class}"><h6>{trend_title}</h6><p class="mb-0">{trend_text}</p></div></div>
                    </div>"#,
        year = report.official.year,
        margin = report.official_ratios.net_profit_margin * 100.0,
        provenance = escape_html(&report.official.provenance_label()),
        trend_class = trend_class,
        trend_title = trend_title,
        trend_text = escape_html(&trend_text),
    )
}

const CSS: &str = r#"
        body { background-color: #f8f9fa; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; }
        .hero-section { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 60px 0; margin-bottom: 40px; }
        .metric-card { border: none; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }
        .chart-container { background: white; border-radius: 10px; padding: 20px; margin-bottom: 30px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }
        .footer { background-color: #343a40; color: white; padding: 40px 0; margin-top: 60px; }
"#;

pub fn render_html(report: &AggregateReport, options: &RenderOptions) -> Result<String> {
    let currency = options.currency.as_str();
    let charts = chart_specs(report, currency);
    let data = script_json(&EmbeddedData {
        report,
        charts: &charts,
    })?;

    let chart_html = |id: &str, class: &str| {
        charts
            .iter()
            .find(|c| c.id == id)
            .map(|c| chart_block(c, class))
            .unwrap_or_default()
    };

    let detailed_year = report
        .breakdown(FigureSource::Detailed)
        .map(|b| b.year)
        .unwrap_or(report.transaction_year);

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{plotly}"></script>
    <link href="{bootstrap}" rel="stylesheet">
    <style>{css}    </style>
</head>
<body>
    <div class="hero-section">
        <div class="container text-center">
            <h1 class="display-4 fw-bold mb-4">{org} Financials</h1>
            <p class="lead mb-4">Official Financial Analysis Dashboard</p>
            <span class="badge bg-light text-dark">Based on Official {provenance} ({official_year}) and {detailed_year} transaction records</span>
        </div>
    </div>

    <div class="container">
        <div class="row mb-5">
{cards}        </div>

        <div class="row mb-4">
{waterfall}{pie}        </div>

        <div class="row mb-4">
{yoy}{monthly}        </div>

        <div class="row mb-4">
{categories}        </div>

        <div class="row mb-4">
            <div class="col-12">
                <div class="chart-container">
                    <h5 class="mb-3">Financial Summary</h5>
                    <div class="table-responsive">
                        <table class="table table-striped table-hover">
                            <thead class="table-dark"><tr><th>Metric</th><th>{official_year} (Official)</th><th>{detailed_year} (Detailed)</th><th>Change</th></tr></thead>
                            <tbody>
{comparison}                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </div>

        <div class="row mb-4">
            <div class="col-12">
                <div class="chart-container">
                    <h5 class="mb-3">{detailed_year} Category Breakdown</h5>
                    <div class="table-responsive">
                        <table class="table table-striped">
                            <thead><tr><th>Category</th><th>Direction</th><th>Records</th><th>Total</th><th>Period</th></tr></thead>
                            <tbody>
{category_rows}                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </div>

        <div class="row mb-4">
            <div class="col-12">
                <div class="chart-container">
                    <h5 class="mb-3">Key Insights</h5>
                    {insights}
                </div>
            </div>
        </div>

        <div class="row mb-4">
            <div class="col-12">
                <div class="chart-container" id="data-quality">
                    <h5 class="mb-3">Data Quality</h5>
                    {quality}
                </div>
            </div>
        </div>
    </div>

    <div class="footer">
        <div class="container">
            <div class="row">
                <div class="col-md-6">
                    <h5>{org} Financials Dashboard</h5>
                    <p>Financial analysis based on the official {provenance} and the detailed transaction workbook.</p>
                </div>
                <div class="col-md-6 text-md-end">
                    <p>Generated: {generated}</p>
                    <p>{official_year} Net Profit: {net_profit}</p>
                </div>
            </div>
        </div>
    </div>

    <script id="dashboard-data" type="application/json">{data}</script>
    <script>
        const dashboard = JSON.parse(document.getElementById('dashboard-data').textContent);
        dashboard.charts.forEach(function (chart) {{
            Plotly.newPlot(chart.id, chart.traces, chart.layout, {{ responsive: true }});
        }});
    </script>
</body>
</html>
"##,
        title = escape_html(&options.title),
        plotly = PLOTLY_CDN,
        bootstrap = BOOTSTRAP_CSS_CDN,
        css = CSS,
        org = escape_html(&options.organization_name),
        provenance = escape_html(&report.official.provenance_label()),
        official_year = report.official.year,
        detailed_year = detailed_year,
        cards = metric_cards(report, currency),
        waterfall = chart_html("chart-waterfall", "col-lg-8"),
        pie = chart_html("chart-expense-pie", "col-lg-4"),
        yoy = chart_html("chart-yoy", "col-lg-6"),
        monthly = chart_html("chart-monthly", "col-lg-6"),
        categories = chart_html("chart-categories", "col-12"),
        comparison = comparison_rows(report, currency),
        category_rows = category_rows(report, currency),
        insights = insights(report),
        quality = quality_section(report),
        generated = options.generated_on.format("%B %d, %Y"),
        net_profit = escape_html(&format_money(currency, report.official.net_profit)),
        data = data,
    ))
}

/// Plain-text P&L printed by the command line tool.
pub fn console_summary(report: &AggregateReport, currency: &str) -> String {
    let official = &report.official;
    let ratios = &report.official_ratios;
    let line = |label: &str, value: f64| format!("{:<24}{:>20}\n", label, format_money(currency, value));

    let mut out = format!(
        "{} OFFICIAL P&L ({})\n{}\n",
        official.year,
        official.provenance_label(),
        "=".repeat(44)
    );
    out.push_str(&line("Sales", official.sales));
    out.push_str(&line("Cost of Goods Sold", official.cogs));
    out.push_str(&line("Gross Profit", report.official_gross_profit));
    out.push_str(&line("Operating Expenses", report.official_operating_expenses));
    out.push_str(&line("Net Profit", official.net_profit));
    out.push_str(&format!(
        "Gross margin {:.2}%, net margin {:.2}%\n\n",
        ratios.gross_profit_margin * 100.0,
        ratios.net_profit_margin * 100.0
    ));

    out.push_str(&format!("{} TRANSACTIONS\n{}\n", report.transaction_year, "=".repeat(44)));
    for aggregate in &report.category_totals {
        let label = format!("{} ({})", aggregate.category.label(), aggregate.direction.label());
        out.push_str(&line(&label, aggregate.total));
    }
    out.push_str(&format!(
        "{} records kept of {} rows read\n",
        report.quality.records_kept, report.quality.rows_read
    ));
    if !report.quality.sheets_failed.is_empty() {
        out.push_str(&format!("Not loaded: {}\n", report.quality.sheets_failed.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::schema::{Category, OfficialAnnualSummary, TransactionRecord};

    fn report() -> AggregateReport {
        let records = vec![
            TransactionRecord {
                date: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
                amount: 120_000.0,
                category: Category::Sales,
                narrative: "M-Pesa <till> sales".to_string(),
                direction: Direction::Inflow,
            },
            TransactionRecord {
                date: NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
                amount: 16_000.0,
                category: Category::Rent,
                narrative: "Rent".to_string(),
                direction: Direction::Outflow,
            },
        ];
        aggregate(&OfficialAnnualSummary::official_2024(), 2025, &records, Vec::new())
    }

    fn options() -> RenderOptions {
        RenderOptions::new("Blancosy", "KES", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[test]
    fn test_chart_specs_cover_every_view() {
        let charts = chart_specs(&report(), "KES");
        let kinds: Vec<ChartKind> = charts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Waterfall,
                ChartKind::Pie,
                ChartKind::Bar,
                ChartKind::Line,
                ChartKind::Bar
            ]
        );

        let waterfall = &charts[0].traces[0];
        assert_eq!(waterfall["measure"][0], "absolute");
        assert_eq!(waterfall["measure"][6], "total");
        assert_eq!(waterfall["y"][1], -17_244_564.0);
        assert_eq!(waterfall["y"][6], 3_389_075.35);
        assert_eq!(charts[0].layout["showlegend"], false);
    }

    #[test]
    fn test_figure_provenance_reaches_dashboard() {
        let mut report = report();
        report
            .official
            .figure_provenance
            .insert("Transaction Costs".to_string(), crate::schema::Provenance::BalanceSheet);

        let charts = chart_specs(&report, "KES");
        assert_eq!(charts[0].traces[0]["customdata"][0], "P&L Account");
        assert_eq!(charts[0].traces[0]["customdata"][5], "Balance Sheet");

        let html = render_html(&report, &options()).unwrap();
        assert!(html.contains("Official P&amp;L Account &amp; Balance Sheet (2024)"));
    }

    #[test]
    fn test_monthly_chart_follows_series() {
        let charts = chart_specs(&report(), "KES");
        let monthly = &charts[3];
        assert_eq!(monthly.traces.len(), 2);
        assert_eq!(monthly.traces[0]["name"], "Income");
        assert_eq!(monthly.traces[0]["x"][0], "2025-01");
        assert_eq!(monthly.traces[1]["y"][0], 16_000.0);
    }

    #[test]
    fn test_html_contains_figures_and_quality_note() {
        let html = render_html(&report(), &options()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("KES 22,619,122"));
        assert!(html.contains("KES 3,389,075"));
        assert!(html.contains("id=\"data-quality\""));
        assert!(html.contains("June 01, 2025"));
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("chart-waterfall"));
    }

    #[test]
    fn test_embedded_json_cannot_close_script() {
        let mut report = report();
        report.audits.push(SheetAudit::failed(
            &crate::config::SheetLayout::default_layouts()[0],
            &crate::error::DashboardError::source_read("sheet 'Sales'", "</script><b>"),
        ));
        let html = render_html(&report, &options()).unwrap();
        assert_eq!(html.matches("</script>").count(), 3);
        assert!(html.contains("&lt;/script&gt;"));
    }

    #[test]
    fn test_console_summary() {
        let summary = console_summary(&report(), "KES");
        assert!(summary.contains("2024 OFFICIAL P&L (P&L Account)"));
        assert!(summary.contains("KES 5,374,558"));
        assert!(summary.contains("Rent (Expense)"));
        assert!(summary.contains("Sales (Income)"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("P&L <b>\"x\"</b>"), "P&amp;L &lt;b&gt;&quot;x&quot;&lt;/b&gt;");
    }
}
