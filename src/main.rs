//! Sunshine ETL
//!
//! Batch job behind the event health dashboard:
//! - Loads daily COVID-19 county objects and HHS flu objects from S3
//! - Stores them as dated snapshots in DynamoDB raw tables
//! - Joins four weekly snapshots per entity into monthly rate records
//! - Serves the dashboard's monthly lookups from the command line

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{error, info, warn};

use dynamodb_client::{covid_summary, flu_summary, DynamoClient, DynamoConfig, TableNames};
use etl_core::{parse_partition_key, Domain, EntityId};
use reference::{GeoTable, StateRegions};
use s3_source::{BucketNames, S3Client, S3Config};
use telemetry::{health, init_tracing_from_env};
use worker::{aggregate_phase, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "sunshine-etl")]
#[command(about = "Loads COVID-19 and flu counters into DynamoDB and computes monthly rates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest and aggregate both domains
    Run {
        /// Run date (YYYY-MM-DD), today by default
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Load one domain's raw objects into its raw table
    Ingest {
        #[arg(long)]
        domain: Domain,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Recompute one domain's monthly table
    Aggregate {
        #[arg(long)]
        domain: Domain,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Print the monthly figures for a county and its HHS region
    #[command(group(
        ArgGroup::new("place")
            .required(true)
            .args(["county", "postal_code"])
    ))]
    Lookup {
        #[arg(long, requires = "county")]
        state: Option<String>,
        #[arg(long, requires = "state")]
        county: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
    },
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    dynamodb: DynamoConfig,

    #[serde(default)]
    s3: S3Config,

    #[serde(default)]
    pipeline: PipelineConfig,

    /// States list driving covid ingestion
    #[serde(default = "default_states_csv")]
    states_csv: String,

    /// Postal code to county table
    #[serde(default = "default_geo_csv")]
    geo_csv: String,

    /// Legacy JSON file mapping role keys to table and bucket names
    #[serde(default)]
    names_file: Option<String>,
}

fn default_states_csv() -> String {
    "assets/statesPartial.csv".to_string()
}

fn default_geo_csv() -> String {
    "refTables/geo_data.csv".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dynamodb: DynamoConfig::default(),
            s3: S3Config::default(),
            pipeline: PipelineConfig::default(),
            states_csv: default_states_csv(),
            geo_csv: default_geo_csv(),
            names_file: None,
        }
    }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_partition_key(raw).map_err(|e| e.to_string())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting sunshine ETL v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        region = %config.dynamodb.region,
        tables = ?config.dynamodb.tables,
        buckets = ?config.s3.buckets,
        "Loaded config"
    );

    let dynamo = Arc::new(DynamoClient::connect(config.dynamodb.clone()).await);

    match cli.command {
        Commands::Run { date } => {
            let s3 = Arc::new(S3Client::connect(config.s3.clone()).await);
            check_health(&dynamo, Some(&s3)).await?;
            let pipeline = build_pipeline(&config, s3, dynamo)?;
            let date = date.unwrap_or_else(today);

            let report = pipeline.run(date).await.map_err(log_failure)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Ingest { domain, date } => {
            let s3 = Arc::new(S3Client::connect(config.s3.clone()).await);
            check_health(&dynamo, Some(&s3)).await?;
            let pipeline = build_pipeline(&config, s3, dynamo)?;

            let report = pipeline
                .ingest(domain, date.unwrap_or_else(today))
                .await
                .map_err(log_failure)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Aggregate { domain, date } => {
            check_health(&dynamo, None).await?;

            let report = aggregate_phase(&dynamo, domain, date.unwrap_or_else(today))
                .await
                .map_err(log_failure)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Lookup {
            state,
            county,
            postal_code,
        } => {
            check_health(&dynamo, None).await?;
            lookup(&config, &dynamo, state, county, postal_code).await?;
        }
    }

    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. ETL__DYNAMODB__REGION
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ETL")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    if let Some(ref path) = config.names_file {
        let (tables, buckets) = load_names_file(path)?;
        config.dynamodb.tables = tables;
        config.s3.buckets = buckets;
    }

    Ok(config)
}

/// Reads the legacy `{covidbucket, covidtable, ...}` name mapping.
fn load_names_file(path: &str) -> Result<(TableNames, BucketNames)> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read names file {}", path))?;
    let tables: TableNames = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid table names in {}", path))?;
    let buckets: BucketNames = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid bucket names in {}", path))?;
    info!(path = path, "Loaded legacy names file");
    Ok((tables, buckets))
}

fn load_states(config: &Config) -> Result<StateRegions> {
    let states = StateRegions::from_path(&config.states_csv)
        .with_context(|| format!("Failed to load states list {}", config.states_csv))?;
    if states.is_empty() {
        warn!(path = %config.states_csv, "States list is empty, covid ingest will do nothing");
    }
    Ok(states)
}

fn build_pipeline(
    config: &Config,
    s3: Arc<S3Client>,
    dynamo: Arc<DynamoClient>,
) -> Result<Pipeline<S3Client, DynamoClient>> {
    let states = Arc::new(load_states(config)?);
    Ok(Pipeline::new(
        config.pipeline.clone(),
        s3,
        dynamo,
        config.s3.buckets.clone(),
        states,
    ))
}

/// Logs a pipeline failure with its code before handing it to anyhow.
fn log_failure(e: etl_core::Error) -> anyhow::Error {
    error!(code = e.error_code().unwrap_or("UNCODED"), "Run failed: {}", e);
    e.into()
}

async fn lookup(
    config: &Config,
    dynamo: &DynamoClient,
    state: Option<String>,
    county: Option<String>,
    postal_code: Option<String>,
) -> Result<()> {
    let (state, county) = match (state, county, postal_code) {
        (Some(state), Some(county), _) => (state, county),
        (_, _, Some(code)) => {
            let geo = GeoTable::from_path(&config.geo_csv)
                .with_context(|| format!("Failed to load geo table {}", config.geo_csv))?;
            let location = geo
                .lookup(&code)
                .with_context(|| format!("Postal code {} not in geo table", code))?;
            (location.state.clone(), location.county.clone())
        }
        _ => bail!("Either --state and --county or --postal-code is required"),
    };

    let entity = EntityId::county(&state, &county);
    let covid = covid_summary(dynamo, &entity).await.map_err(log_failure)?;

    let states = load_states(config)?;
    let flu = match states.region_of(&state) {
        Some(region) => flu_summary(dynamo, &EntityId::hhs_region(region))
            .await
            .map_err(log_failure)?,
        None => {
            warn!(state = %state, "State has no HHS region in the states list");
            None
        }
    };

    if covid.is_none() {
        warn!(entity = %entity, "No covid monthly record");
    }

    let out = serde_json::json!({
        "entity": entity,
        "covid": covid,
        "flu": flu,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Check component health on startup. S3 is only checked when the command
/// reads objects.
async fn check_health(dynamo: &DynamoClient, s3: Option<&S3Client>) -> Result<()> {
    if dynamodb_client::health::check_connection(dynamo).await {
        health().dynamodb.set_healthy();
        info!("DynamoDB connection: healthy");
    } else {
        health().dynamodb.set_unhealthy("Connection failed");
        error!("DynamoDB connection: unhealthy");
    }

    if let Some(s3) = s3 {
        if s3_source::health::check_connection(s3).await {
            health().s3.set_healthy();
            info!("S3 connection: healthy");
        } else {
            health().s3.set_unhealthy("Connection failed");
            error!("S3 connection: unhealthy");
        }
        if !health().can_ingest() {
            bail!("Ingestion needs both DynamoDB and S3: {:?}", health().report());
        }
    } else if !health().can_aggregate() {
        bail!("DynamoDB is unreachable: {:?}", health().report());
    }

    Ok(())
}
