//! CLI commands and handlers
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::cycle::{CycleReport, PriceTracker};
use crate::application::notifier::Notifier;
use crate::domain::history::PriceHistory;
use crate::domain::market::Market;
use crate::infrastructure::notify::PushoverClient;
use crate::infrastructure::persistence::{FileStore, GcsStore, ObjectStore, StateRepository};
use crate::infrastructure::price_source::TankerkoenigClient;
use crate::shared::config::{AppConfig, StorageBackend};
use crate::shared::errors::AppError;
use crate::shared::types::FuelType;
use crate::shared::utils::format_price;

#[derive(Parser)]
#[command(name = "fuelwatch")]
#[command(version, about = "Tracks fuel prices around a location and reports good prices")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single cycle
    Run,

    /// Run cycles on a fixed interval
    Watch {
        /// Seconds between cycles
        #[arg(short, long, default_value_t = 900)]
        interval: u64,
    },

    /// Show the stored market and price history
    Report {
        /// Only this fuel (diesel, e5, e10)
        #[arg(short, long)]
        fuel: Option<FuelType>,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: AppConfig) -> anyhow::Result<()> {
        match command {
            Commands::Run => Self::execute_run_command(config).await,
            Commands::Watch { interval } => Self::execute_watch_command(interval, config).await,
            Commands::Report { fuel } => Self::execute_report_command(fuel, config).await,
        }
    }

    async fn execute_run_command(config: AppConfig) -> anyhow::Result<()> {
        let tracker = Self::build_tracker(&config)?;
        let report = tracker.run_cycle().await.context("cycle failed")?;
        print_cycle_report(&report);
        Ok(())
    }

    async fn execute_watch_command(interval: u64, config: AppConfig) -> anyhow::Result<()> {
        if interval == 0 {
            anyhow::bail!("--interval must be at least one second");
        }
        let tracker = Self::build_tracker(&config)?;
        info!("Watching prices every {}s", interval);
        tracker.watch(Duration::from_secs(interval)).await;
        Ok(())
    }

    async fn execute_report_command(fuel: Option<FuelType>, config: AppConfig) -> anyhow::Result<()> {
        let repository = build_repository(&config)?;
        let retention = config.retention();
        let market = repository.load_market(retention).await;
        let history = repository.load_history().await;

        let fuels = match fuel {
            Some(fuel) => vec![fuel],
            None => config.fuels.clone(),
        };

        println!(
            "{} stations, {} history entries, window {} days",
            market.len(),
            history.len(),
            config.retention_days
        );
        for fuel in fuels {
            print_fuel_report(fuel, &market, &history);
        }
        Ok(())
    }

    fn build_tracker(config: &AppConfig) -> Result<PriceTracker, AppError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let source = TankerkoenigClient::new(&config.source, timeout)?;

        Ok(PriceTracker::new(
            build_repository(config)?,
            Arc::new(source),
            build_notifier(config, timeout),
            config.fuels.clone(),
            config.retention(),
        ))
    }
}

fn build_repository(config: &AppConfig) -> Result<StateRepository, AppError> {
    let storage = &config.storage;
    let store: Arc<dyn ObjectStore> = match storage.backend {
        StorageBackend::File => Arc::new(FileStore::new(storage.directory.clone())),
        StorageBackend::Gcs => {
            let bucket = storage
                .bucket
                .as_deref()
                .ok_or_else(|| AppError::ConfigError("storage.bucket is required for gcs".to_string()))?;
            let store = GcsStore::new(
                bucket,
                storage.access_token.clone(),
                Duration::from_secs(config.http_timeout_secs),
            )?;
            Arc::new(store)
        }
    };

    Ok(StateRepository::new(
        store,
        &storage.market_object,
        &storage.history_object,
    ))
}

fn build_notifier(config: &AppConfig, timeout: Duration) -> Option<Notifier> {
    let (Some(token), Some(user)) = (&config.notify.token, &config.notify.user) else {
        info!("Pushover credentials not set, notifications disabled");
        return None;
    };

    match PushoverClient::new(token, user, timeout) {
        Ok(client) => Some(Notifier::new(Arc::new(client))),
        Err(e) => {
            warn!("Notifications disabled: {}", e);
            None
        }
    }
}

fn print_cycle_report(report: &CycleReport) {
    println!(
        "Cycle {} at {}: {} stations observed",
        report.cycle_id, report.timestamp, report.observed_stations
    );
    for outcome in &report.outcomes {
        let ingested = report.ingested.get(&outcome.fuel).copied().unwrap_or(0);
        match (outcome.good_price, &outcome.cheapest) {
            (Some(good), Some((_, cheapest))) => println!(
                "  {:<6} {} prices, good price {}, best {} at {} {}{}",
                outcome.fuel,
                ingested,
                format_price(good),
                format_price(cheapest.latest_price),
                cheapest.brand,
                cheapest.place,
                if outcome.below_history { " (below history)" } else { "" }
            ),
            (Some(good), None) => println!(
                "  {:<6} {} prices, good price {}, no station qualifies",
                outcome.fuel,
                ingested,
                format_price(good)
            ),
            (None, _) => println!("  {:<6} no prices in window", outcome.fuel),
        }
    }
    if report.notified {
        println!("Notification sent");
    }
}

fn print_fuel_report(fuel: FuelType, market: &Market, history: &PriceHistory) {
    println!();
    println!("{}", fuel);

    let latest = market
        .stations()
        .filter_map(|station| station.latest_price(fuel))
        .map(|point| point.timestamp)
        .max();

    match latest {
        Some(as_of) => {
            let best = market.best_stations(as_of, fuel);
            if best.has_decision() {
                println!("  good price at {}: {}", as_of, format_price(best.good_price));
            }
            let mut ranked: Vec<_> = best.summaries().into_values().collect();
            ranked.sort_by(|a, b| a.latest_price.total_cmp(&b.latest_price));
            for summary in ranked {
                println!(
                    "  {} {} ({}, {})",
                    format_price(summary.latest_price),
                    summary.name,
                    summary.brand,
                    summary.place
                );
            }
        }
        None => println!("  no prices recorded"),
    }

    for (timestamp, aggregate) in history.entries(fuel) {
        println!(
            "  {}  mean {}  stddev {:.4}  n={}",
            timestamp,
            format_price(aggregate.mean),
            aggregate.std_dev,
            aggregate.count
        );
    }
}
