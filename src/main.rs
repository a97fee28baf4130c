// Purchase Likelihood - Command line
// Interactive query loop plus one-shot scoring over a purchase history CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use purchase_likelihood::{evaluate, load_or_empty, Query, RecordStore, ScoringConfig};

#[derive(Debug, Parser)]
#[command(name = "purchase-likelihood")]
#[command(about = "Estimate how likely a product is to be bought, given a purchase history")]
#[command(version)]
struct Cli {
    /// Purchase history CSV (header row + brand,category,price,orderedOnline,paidFullPrice,yearOfPurchase)
    #[arg(short, long, default_value = "dataset.csv")]
    dataset: PathBuf,

    /// JSON file with scoring tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the year recency is measured against
    #[arg(long)]
    current_year: Option<i32>,

    /// Log filter (e.g. warn, debug, purchase_likelihood=trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prompt for queries until told to stop (default)
    Interactive,
    /// Score a single query
    Score {
        brand: String,
        category: String,
        price: String,
        /// 1 if the product is on sale, else 0
        on_sale: String,
        /// 1 if the product would be delivered, else 0
        delivery: String,
        /// Print the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what was loaded from the dataset
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => ScoringConfig::from_file(path)?,
        None => ScoringConfig::default(),
    };
    if let Some(year) = cli.current_year {
        config = config.with_current_year(year);
    }

    let report = load_or_empty(&cli.dataset);
    let skipped = report.skipped.len();
    let store = RecordStore::from(report);

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_interactive(&store, &config, stdin.lock(), stdout.lock())?;
        }
        Command::Score {
            brand,
            category,
            price,
            on_sale,
            delivery,
            json,
        } => {
            let tokens = [
                brand.as_str(),
                category.as_str(),
                price.as_str(),
                on_sale.as_str(),
                delivery.as_str(),
            ];
            let query = Query::from_tokens(&tokens)?;
            let evaluation = evaluate(store.records(), &query, &config);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&evaluation).context("Failed to serialize evaluation")?
                );
            } else {
                println!("{}", result_line(evaluation.score));
            }
        }
        Command::Summary => print_summary(&store, skipped, &config),
    }

    Ok(())
}

fn result_line(score: f64) -> String {
    format!(
        "According to the given dataset, this product has {:.2}% chances to turn profit.",
        score
    )
}

/// Prompt, evaluate, and ask whether to continue until the answer does not
/// start with `y`/`Y` or input ends
fn run_interactive<R: BufRead, W: Write>(
    store: &RecordStore,
    config: &ScoringConfig,
    mut input: R,
    mut output: W,
) -> Result<()> {
    let mut line = String::new();

    loop {
        writeln!(
            output,
            "This query will help you calculate how likely a product will be purchased (according to the loaded dataset)."
        )?;
        writeln!(output, "\nPlease enter query columns in order:")?;
        writeln!(output, "Brand Category Price OnSale(1/0) Delivery(1/0)")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).context("Failed to read query")? == 0 {
            break;
        }

        match line.parse::<Query>() {
            Ok(query) => {
                let evaluation = evaluate(store.records(), &query, config);
                writeln!(output, "{}", result_line(evaluation.score))?;
            }
            Err(e) => {
                writeln!(output, "Invalid query: {}", e)?;
                continue;
            }
        }

        write!(output, "Continue? (y/n) ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).context("Failed to read answer")? == 0 {
            break;
        }
        if !line.trim_start().starts_with(['y', 'Y']) {
            break;
        }
    }

    Ok(())
}

fn print_summary(store: &RecordStore, skipped: usize, config: &ScoringConfig) {
    println!("📊 Purchase history");
    println!("  Records loaded: {}", store.len());
    println!("  Rows skipped:   {}", skipped);
    println!("  Brands:         {}", store.brands().join(", "));
    println!("  Categories:     {}", store.categories().join(", "));
    println!(
        "  Scoring:        year {} | year gap {} | price gap {}%",
        config.current_year, config.year_gap, config.price_gap_percent
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchase_likelihood::PurchaseRecord;

    fn store() -> RecordStore {
        RecordStore::new(vec![PurchaseRecord::new("Acme", "Widget", 100.0, true, true, 2023)])
    }

    fn run(input: &str) -> String {
        let mut output = Vec::new();
        run_interactive(&store(), &ScoringConfig::default(), input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_single_query_then_stop() {
        let out = run("Acme Widget 95 0 1\nn\n");
        assert!(out.contains("has 60.00% chances"));
        assert_eq!(out.matches("Please enter query columns").count(), 1);
    }

    #[test]
    fn test_repeat_until_no() {
        let out = run("Acme Widget 95 0 1\ny\nOther Widget 95 0 1\nY\nAcme Widget 95 0 1\nq\n");
        assert_eq!(out.matches("has 60.00% chances").count(), 2);
        assert_eq!(out.matches("has 0.00% chances").count(), 1);
    }

    #[test]
    fn test_yes_answers_continue() {
        let out = run("Acme Widget 95 0 1\nyes\nAcme Widget 95 0 1\n  Yes please\nAcme Widget 95 0 1\nno\n");
        assert_eq!(out.matches("has 60.00% chances").count(), 3);
    }

    #[test]
    fn test_invalid_query_reprompts() {
        let out = run("Acme Widget abc 0 1\nAcme Widget 95 0 1\nn\n");
        assert!(out.contains("Invalid query"));
        assert!(out.contains("has 60.00% chances"));
    }

    #[test]
    fn test_eof_ends_loop() {
        let out = run("");
        assert!(!out.contains("chances"));
    }

    #[test]
    fn test_cli_parses_score_command() {
        let cli = Cli::try_parse_from([
            "purchase-likelihood",
            "--dataset",
            "history.csv",
            "--current-year",
            "2024",
            "score",
            "Acme",
            "Widget",
            "95",
            "0",
            "1",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.dataset, PathBuf::from("history.csv"));
        assert_eq!(cli.current_year, Some(2024));
        assert!(matches!(cli.command, Some(Command::Score { json: true, .. })));
    }
}
