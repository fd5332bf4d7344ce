use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;

use khata_core::ReferenceCatalog;
use khata_ingest::Role;
use khata_staging::{EngineConfig, HttpSink, ImportSession};

/// Khata - stage and commit expenses from arbitrary CSV exports
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "CSV expense ingestion and reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    /// CSV file to ingest
    file: PathBuf,

    /// Reference catalog (JSON: categories, people, payment methods, apps)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use one common date (YYYY-MM-DD) for every record instead of the
    /// mapped date column
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Override an inferred column mapping, e.g. --map amount=Total
    /// (repeatable)
    #[arg(long = "map", value_name = "ROLE=COLUMN")]
    map: Vec<String>,

    /// Clear a role the inference assigned, e.g. --unmap breakdown
    /// (repeatable)
    #[arg(long = "unmap", value_name = "ROLE")]
    unmap: Vec<Role>,

    /// Submit the staged batch to the persistence endpoint
    #[arg(long)]
    commit: bool,

    /// Batch endpoint (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let catalog = match &cli.catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog {}", path.display()))?;
            serde_json::from_str::<ReferenceCatalog>(&raw).context("invalid catalog JSON")?
        }
        None => {
            tracing::warn!("no --catalog given; names will not resolve to ids");
            ReferenceCatalog::default()
        }
    };

    let mut session = ImportSession::new(catalog, &config.currency);

    let bytes = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    session.load(&bytes)?;

    for arg in &cli.map {
        let (role, column) = parse_map_arg(arg)?;
        session.set_role(role, Some(column));
    }
    for role in &cli.unmap {
        session.set_role(*role, None);
    }
    if let Some(date) = cli.date {
        session.set_common_date(date);
    }

    print_mapping(&session);

    if !session.mapping_ready() {
        bail!("mapping incomplete: assign an amount or breakdown column, and a date column (or pass --date)");
    }

    let rows = session.table().map(|t| t.row_count()).unwrap_or(0);
    let staged = session.expand()?;
    print_staged(&session);
    println!(
        "\n{staged} record(s) staged from {rows} row(s); total {} {}",
        session.staged_total(),
        config.currency
    );

    if cli.commit {
        let endpoint = cli
            .endpoint
            .or(config.endpoint)
            .context("no endpoint: pass --endpoint or set one in the config file")?;
        let sink = HttpSink::new(&endpoint);
        let committed = session.commit(&sink).await?;
        println!("committed {} record(s) to {endpoint}", committed.len());
    } else {
        println!("dry run; pass --commit to submit the batch");
    }

    Ok(())
}

fn parse_map_arg(arg: &str) -> anyhow::Result<(Role, String)> {
    let (role, column) = arg
        .split_once('=')
        .with_context(|| format!("expected ROLE=COLUMN, got '{arg}'"))?;
    let role = role
        .parse::<Role>()
        .map_err(|e| anyhow::anyhow!("{e} (in '--map {arg}')"))?;
    Ok((role, column.to_string()))
}

fn print_mapping(session: &ImportSession) {
    println!("Column mapping:");
    for role in Role::ALL {
        match session.mapping().get(role) {
            Some(column) => println!("  {role:<15} <- {column}"),
            None => println!("  {role:<15} (unset)"),
        }
    }
}

fn print_staged(session: &ImportSession) {
    println!(
        "\n{:<16} {:<12} {:>10}  {:<8} {:<8} {}",
        "TEMP ID", "DATE", "AMOUNT", "CATEGORY", "METHOD", "NOTES"
    );
    for exp in session.staged() {
        println!(
            "{:<16} {:<12} {:>10}  {:<8} {:<8} {}",
            exp.temp_id.to_string(),
            exp.expense_date.to_string(),
            exp.amount_converted.to_string(),
            exp.category_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            exp.payment_method_id,
            exp.notes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_map_arg_accepts_role_equals_column() {
        let (role, column) = parse_map_arg("amount=Total").unwrap();
        assert_eq!(role, Role::Amount);
        assert_eq!(column, "Total");
    }

    #[test]
    fn parse_map_arg_rejects_bad_specs() {
        assert!(parse_map_arg("amount").is_err());
        assert!(parse_map_arg("bogus=Total").is_err());
    }
}
