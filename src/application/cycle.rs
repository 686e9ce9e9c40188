//! One fetch / ingest / select / persist / notify cycle

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::application::notifier::Notifier;
use crate::domain::history::PriceHistory;
use crate::domain::market::{BestStations, Market};
use crate::domain::price::{PriceSource, StationObservation};
use crate::domain::station::StationSummary;
use crate::infrastructure::persistence::StateRepository;
use crate::shared::errors::SourceError;
use crate::shared::types::{FuelType, RetentionWindow, StationId, Timestamp};
use crate::shared::utils::{format_price, generate_id, now_timestamp};

/// Result of one cycle for one fuel
#[derive(Debug, Clone)]
pub struct FuelOutcome {
    pub fuel: FuelType,
    /// `None` when the window held no prices
    pub good_price: Option<f64>,
    pub best_stations: BTreeMap<StationId, StationSummary>,
    pub cheapest: Option<(StationId, StationSummary)>,
    /// Whether the cheapest price also beats the long-term history
    pub below_history: bool,
}

impl FuelOutcome {
    fn new(best: &BestStations, history: &PriceHistory, now: Timestamp, retention: RetentionWindow) -> Self {
        let cheapest = best.cheapest();
        let below_history = cheapest.as_ref().map_or(false, |(_, summary)| {
            history.good_price(best.fuel, summary.latest_price, now, retention)
        });

        Self {
            fuel: best.fuel,
            good_price: best.has_decision().then_some(best.good_price),
            best_stations: best.summaries(),
            cheapest,
            below_history,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: String,
    pub timestamp: Timestamp,
    pub observed_stations: usize,
    pub ingested: BTreeMap<FuelType, usize>,
    pub outcomes: Vec<FuelOutcome>,
    pub notified: bool,
}

/// Feed one batch of observations into the market and the history.
///
/// Returns how many prices each fuel contributed.
pub fn ingest(
    observations: &[StationObservation],
    timestamp: Timestamp,
    market: &mut Market,
    history: &mut PriceHistory,
    fuels: &[FuelType],
) -> BTreeMap<FuelType, usize> {
    let mut cycle_prices: BTreeMap<FuelType, Vec<f64>> =
        fuels.iter().map(|fuel| (*fuel, Vec::new())).collect();

    for observation in observations {
        market.upsert_station(
            &observation.id,
            &observation.brand,
            &observation.name,
            &observation.place,
        );
        if let Err(e) = market.update_status(
            &observation.id,
            observation.lat,
            observation.lng,
            observation.is_open,
        ) {
            warn!("Skipping station: {}", e);
            continue;
        }

        if !observation.is_open {
            continue;
        }

        for (fuel, prices) in cycle_prices.iter_mut() {
            let Some(price) = observation.price(*fuel) else {
                continue;
            };
            match market.add_price(timestamp, &observation.id, *fuel, price) {
                Ok(()) => prices.push(price),
                Err(e) => warn!("Dropping {} price {}: {}", fuel, price, e),
            }
        }
    }

    let retention = market.retention();
    let mut ingested = BTreeMap::new();
    for (fuel, prices) in cycle_prices {
        history.add_fuel_prices(timestamp, fuel, &prices);
        let evicted = history.clean_history(fuel, timestamp, retention);
        if evicted > 0 {
            debug!("Evicted {} {} history entries", evicted, fuel);
        }
        ingested.insert(fuel, prices.len());
    }
    ingested
}

/// Cycle counters kept across `watch` iterations
#[derive(Debug, Clone, Default)]
pub struct TrackerStats {
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub notifications_sent: u64,
    pub last_cycle: Option<Timestamp>,
}

/// Owns the shared state and runs cycles against it
pub struct PriceTracker {
    market: Arc<RwLock<Market>>,
    history: Arc<RwLock<PriceHistory>>,
    repository: StateRepository,
    source: Arc<dyn PriceSource>,
    notifier: Option<Mutex<Notifier>>,
    fuels: Vec<FuelType>,
    retention: RetentionWindow,
    stats: Arc<RwLock<TrackerStats>>,
    loaded: OnceCell<()>,
}

impl PriceTracker {
    pub fn new(
        repository: StateRepository,
        source: Arc<dyn PriceSource>,
        notifier: Option<Notifier>,
        fuels: Vec<FuelType>,
        retention: RetentionWindow,
    ) -> Self {
        Self {
            market: Arc::new(RwLock::new(Market::new(retention))),
            history: Arc::new(RwLock::new(PriceHistory::new())),
            repository,
            source,
            notifier: notifier.map(Mutex::new),
            fuels,
            retention,
            stats: Arc::new(RwLock::new(TrackerStats::default())),
            loaded: OnceCell::new(),
        }
    }

    pub fn market(&self) -> Arc<RwLock<Market>> {
        Arc::clone(&self.market)
    }

    pub fn history(&self) -> Arc<RwLock<PriceHistory>> {
        Arc::clone(&self.history)
    }

    pub async fn stats(&self) -> TrackerStats {
        self.stats.read().await.clone()
    }

    /// Replace the in-memory state with what the store holds.
    ///
    /// Both write guards are held across the reads, so no cycle can ingest
    /// into state that is about to be replaced.
    pub async fn load_state(&self) {
        let mut market = self.market.write().await;
        let mut history = self.history.write().await;

        *market = self.repository.load_market(self.retention).await;
        *history = self.repository.load_history().await;
        info!(
            "Loaded {} stations and {} history entries",
            market.len(),
            history.len()
        );
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, SourceError> {
        self.run_cycle_at(now_timestamp()).await
    }

    pub async fn run_cycle_at(&self, timestamp: Timestamp) -> Result<CycleReport, SourceError> {
        let cycle_id = generate_id();
        let span = info_span!("cycle", id = %cycle_id, ts = timestamp);

        let result = self.cycle(cycle_id, timestamp).instrument(span).await;

        let mut stats = self.stats.write().await;
        stats.cycles_run += 1;
        stats.last_cycle = Some(timestamp);
        match &result {
            Ok(report) if report.notified => stats.notifications_sent += 1,
            Ok(_) => {}
            Err(_) => stats.cycles_failed += 1,
        }
        result
    }

    async fn cycle(&self, cycle_id: String, timestamp: Timestamp) -> Result<CycleReport, SourceError> {
        // only the first cycle reads the store; concurrent first cycles wait
        // for that load, later ones keep working on the in-memory state
        self.loaded.get_or_init(|| self.load_state()).await;

        let observations = match self.source.fetch_stations().await {
            Ok(observations) => observations,
            Err(e) => {
                error!("Error getting stations: {}", e);
                return Err(e);
            }
        };

        let (ingested, outcomes, best) = {
            let mut market = self.market.write().await;
            let mut history = self.history.write().await;

            let ingested = ingest(&observations, timestamp, &mut market, &mut history, &self.fuels);

            let mut outcomes = Vec::new();
            let mut best = Vec::new();
            for fuel in &self.fuels {
                let best_stations = market.best_stations(timestamp, *fuel);
                let outcome = FuelOutcome::new(&best_stations, &history, timestamp, self.retention);
                log_outcome(&outcome);
                outcomes.push(outcome);
                best.push(best_stations);
            }
            (ingested, outcomes, best)
        };

        self.persist().await;
        let notified = self.notify(best).await;

        Ok(CycleReport {
            cycle_id,
            timestamp,
            observed_stations: observations.len(),
            ingested,
            outcomes,
            notified,
        })
    }

    async fn persist(&self) {
        let market = self.market.read().await;
        if let Err(e) = self.repository.save_market(&market).await {
            error!("Error saving market: {}", e);
        }
        let history = self.history.read().await;
        if let Err(e) = self.repository.save_history(&history).await {
            error!("Error saving price history: {}", e);
        }
    }

    /// True only when a message actually went out
    async fn notify(&self, best: Vec<BestStations>) -> bool {
        let Some(notifier) = &self.notifier else {
            return false;
        };

        let mut notifier = notifier.lock().await;
        notifier.clear();
        for best_stations in best {
            notifier.update_best_stations(best_stations);
        }

        if !notifier.has_news() {
            return false;
        }
        notifier.notify().await
    }

    /// Run a cycle every `period`, forever. Source failures end a single
    /// cycle only.
    pub async fn watch(&self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(report) => info!(
                    "Cycle {} done: {} stations observed",
                    report.cycle_id, report.observed_stations
                ),
                Err(e) => warn!("Cycle failed, retrying in {:?}: {}", period, e),
            }
        }
    }
}

fn log_outcome(outcome: &FuelOutcome) {
    match (&outcome.good_price, &outcome.cheapest) {
        (Some(good_price), Some((_, cheapest))) => info!(
            "Found good price for {}: {} at {} {} (threshold {}, below history: {})",
            outcome.fuel,
            format_price(cheapest.latest_price),
            cheapest.brand,
            cheapest.place,
            format_price(*good_price),
            outcome.below_history
        ),
        (Some(good_price), None) => info!(
            "No station at or below {} for {}",
            format_price(*good_price),
            outcome.fuel
        ),
        (None, _) => info!("No {} prices in the retention window", outcome.fuel),
    }
}
