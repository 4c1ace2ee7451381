//! Foodcast CLI — training, prediction, and model management commands.
//!
//! Commands:
//! - `train` — fit and save a model for every (region, item) pair in the dataset
//! - `predict` — forecast one item in one region at a target date
//! - `models list` — list trained artifacts in the model directory
//! - `items` — list tracked items with their display labels and tokens
//! - `generate` — write a synthetic dataset for local development

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use foodcast_core::data::{generate_table, write_csv, DataStore};
use foodcast_core::domain::Item;
use foodcast_core::model::ModelTrainer;
use foodcast_runner::{
    artifact_name, BatchTrainer, DisplayForecast, ForecastConfig, ForecastOutcome,
    ForecastService, LogProgress, ModelRegistry,
};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "foodcast",
    about = "Foodcast CLI — regional food price forecasting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by commands that read the dataset or the model directory.
#[derive(clap::Args)]
struct SourceArgs {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset CSV. Overrides `[data] path`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Model directory. Overrides `[models] dir`.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and save a model for every region × item pair.
    Train {
        #[command(flatten)]
        source: SourceArgs,

        /// Train one pair at a time instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Forecast one item in one region.
    Predict {
        /// Region (state) name as it appears in the dataset.
        #[arg(long)]
        region: String,

        /// Item label, name, or token (e.g. "Rice (50 KG)", rice, CASSAVA_MEAL).
        #[arg(long)]
        item: String,

        /// Target date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Print the raw and rounded forecast as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Model directory commands.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// List tracked items with their display labels and artifact tokens.
    Items,
    /// Write a synthetic dataset (development only).
    Generate {
        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,

        /// Regions to generate.
        #[arg(long, num_args = 1.., default_values_t = ["Lagos".to_string(), "Kano".to_string(), "Oyo".to_string()])]
        regions: Vec<String>,

        /// First date (YYYY-MM-DD).
        #[arg(long, default_value = "2019-01-01")]
        start: String,

        /// Last date (YYYY-MM-DD).
        #[arg(long, default_value = "2023-12-31")]
        end: String,

        /// Days between rows.
        #[arg(long, default_value_t = 30)]
        step_days: i64,
    },
}

#[derive(Subcommand)]
enum ModelsAction {
    /// List trained (region, item) pairs.
    List {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Model directory. Overrides `[models] dir`.
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train { source, sequential } => run_train(source, sequential),
        Commands::Predict {
            region,
            item,
            date,
            source,
            json,
        } => run_predict(&region, &item, &date, source, json),
        Commands::Models { action } => match action {
            ModelsAction::List { config, model_dir } => run_models_list(SourceArgs {
                config,
                data: None,
                model_dir,
            }),
        },
        Commands::Items => run_items(),
        Commands::Generate {
            output,
            regions,
            start,
            end,
            step_days,
        } => run_generate(output, regions, &start, &end, step_days),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "foodcast=info".into()))
        .init();
}

/// Config file (or defaults) with CLI overrides applied.
fn load_config(source: SourceArgs) -> Result<ForecastConfig> {
    let mut config = match &source.config {
        Some(path) => ForecastConfig::from_file(path)?,
        None => ForecastConfig::default(),
    };
    if let Some(data) = source.data {
        config.data.path = data;
    }
    if let Some(dir) = source.model_dir {
        config.models.dir = dir;
    }
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn run_train(source: SourceArgs, sequential: bool) -> Result<()> {
    let config = load_config(source)?;
    let table = DataStore::new(config.data.clone())
        .load()
        .context("load price dataset")?;
    let registry = ModelRegistry::new(&config.models.dir)?;

    let batch = BatchTrainer::new(ModelTrainer::new(config.model.clone()), registry)
        .with_parallelism(config.training.parallel && !sequential);
    let summary = batch.train_all(&table, &LogProgress);

    println!(
        "Trained {} of {} pairs ({} skipped for insufficient data, {} failed)",
        summary.trained, summary.total, summary.skipped, summary.failed
    );
    println!("Models saved to: {}", config.models.dir.display());

    if !summary.all_succeeded() {
        for (key, err) in &summary.errors {
            eprintln!("Error for {key}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_predict(region: &str, item: &str, date: &str, source: SourceArgs, json: bool) -> Result<()> {
    let item: Item = item.parse()?;
    let target_date = parse_date(date)?;
    let config = load_config(source)?;
    let service = ForecastService::from_config(&config)?;

    match service.forecast(region, item, target_date)? {
        ForecastOutcome::Forecast { request, result } => {
            let shown = DisplayForecast::from_result(&result, &config.display);
            if json {
                let out = serde_json::json!({
                    "region": request.region,
                    "item": item.canonical_token(),
                    "target_date": result.target_date,
                    "regressor_value": request.regressor_value,
                    "forecast": result,
                    "display": shown,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} in {}", item.display_label(), request.region);
                println!("{shown}");
            }
        }
        ForecastOutcome::NotTrained(key) => {
            if json {
                let out = serde_json::json!({
                    "region": key.region,
                    "item": key.item.canonical_token(),
                    "target_date": target_date,
                    "error": "not_trained",
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("No trained model for {} in {}.", item.display_label(), key.region);
                println!("Run `foodcast train` to build it.");
            }
        }
    }
    Ok(())
}

fn run_models_list(source: SourceArgs) -> Result<()> {
    let config = load_config(source)?;
    if !config.models.dir.exists() {
        println!("Model directory does not exist: {}", config.models.dir.display());
        return Ok(());
    }

    let registry = ModelRegistry::new(&config.models.dir)?;
    let keys = registry.list()?;
    if keys.is_empty() {
        println!("No trained models in {}", config.models.dir.display());
        return Ok(());
    }

    println!("{:<20} {:<24} ARTIFACT", "REGION", "ITEM");
    for key in &keys {
        println!(
            "{:<20} {:<24} {}",
            key.region,
            key.item.display_label(),
            artifact_name(key)
        );
    }
    println!("{} models", keys.len());
    Ok(())
}

fn run_items() -> Result<()> {
    println!("{:<24} {:<14} COLUMN", "LABEL", "TOKEN");
    for item in Item::ALL {
        println!(
            "{:<24} {:<14} {}",
            item.display_label(),
            item.canonical_token(),
            item.column_name()
        );
    }
    Ok(())
}

fn run_generate(
    output: PathBuf,
    regions: Vec<String>,
    start: &str,
    end: &str,
    step_days: i64,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        bail!("--end {end} is before --start {start}");
    }

    let region_refs: Vec<&str> = regions.iter().map(|r| r.as_str()).collect();
    let table = generate_table(&region_refs, start, end, step_days);
    let file = File::create(&output)
        .with_context(|| format!("create {}", output.display()))?;
    write_csv(&table, &ForecastConfig::default().data, file)
        .with_context(|| format!("write {}", output.display()))?;

    println!(
        "Wrote {} rows for {} regions to {}",
        table.len(),
        regions.len(),
        output.display()
    );
    Ok(())
}
