use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use financial_dashboard_builder::{console_summary, DashboardBuilder, DashboardConfig};
use std::path::PathBuf;

/// Build the static financial dashboard from the official summary and the
/// transaction workbook.
#[derive(Parser, Debug)]
#[command(name = "financial-dashboard", version, about)]
struct Cli {
    /// Transaction workbook (.xlsx)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the HTML document
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the P&L and category totals to stdout
    #[arg(long)]
    print_summary: bool,

    /// Print the configuration JSON Schema and exit
    #[arg(long)]
    config_schema: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.config_schema {
        println!("{}", DashboardConfig::schema_as_json()?);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(input) = cli.input {
        config.workbook_path = input;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    let currency = config.currency.clone();
    let output_path = config.output_path.clone();
    let builder = DashboardBuilder::new(config);

    let report = builder
        .run(chrono::Local::now().date_naive())
        .with_context(|| format!("building dashboard {}", output_path.display()))?;

    if cli.print_summary {
        print!("{}", console_summary(&report, &currency));
    }

    Ok(())
}
