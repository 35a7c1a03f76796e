//! Sequential coordinate sweep
//!
//! Each coordinate is collected and persisted end to end before the next one
//! starts, with the configured cooldown between coordinates. A persistence
//! failure ends the sweep; station-level failures never do.

use crate::clock::Clock;
use crate::collector::PriceCollector;
use crate::config::Config;
use crate::discovery::StationDiscoverer;
use crate::error::Result;
use crate::fetcher::{RetryPolicy, RetryingFetcher};
use crate::logging::{StructuredLogger, get_logger};
use crate::model::Coordinate;
use crate::provider::RemoteProvider;
use crate::store::DedupStore;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

/// What happened at one coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateOutcome {
    pub coordinate: Coordinate,
    pub query_time: NaiveDateTime,
    pub stations_discovered: usize,
    pub records_collected: usize,
    pub records_written: usize,
}

/// Per-coordinate outcomes in sweep order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<CoordinateOutcome>,
}

impl RunSummary {
    pub fn total_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.records_written).sum()
    }

    pub fn total_collected(&self) -> usize {
        self.outcomes.iter().map(|o| o.records_collected).sum()
    }
}

pub struct Pipeline {
    collector: PriceCollector,
    store: DedupStore,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    logger: StructuredLogger,
}

impl Pipeline {
    pub fn new(
        collector: PriceCollector,
        store: DedupStore,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
    ) -> Self {
        Self {
            collector,
            store,
            clock,
            cooldown,
            logger: get_logger("pipeline"),
        }
    }

    /// Wire every stage from configuration around an existing provider
    pub fn with_provider(
        config: &Config,
        provider: Arc<dyn RemoteProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let fetcher = Arc::new(RetryingFetcher::new(
            Arc::clone(&provider),
            Arc::clone(&clock),
            RetryPolicy::from_config(&config.fetch),
        ));
        let discoverer = StationDiscoverer::new(
            provider,
            Arc::clone(&clock),
            config.pacing.discovery_settle(),
        );
        let collector = PriceCollector::new(
            discoverer,
            fetcher,
            Arc::clone(&clock),
            config.pacing.station_spacing(),
        )
        .with_timezone(config.timezone()?);

        Ok(Self::new(
            collector,
            DedupStore::new(config.output.dataset_path.clone()),
            clock,
            config.pacing.coordinate_cooldown(),
        ))
    }

    /// Production wiring: GasBuddy provider and the system clock
    #[cfg(feature = "gasbuddy")]
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Arc::new(crate::provider::GasBuddyProvider::new(&config.provider)?);
        Self::with_provider(config, provider, Arc::new(crate::clock::SystemClock))
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Collect and persist one coordinate
    pub async fn run_coordinate(&self, coordinate: Coordinate) -> Result<CoordinateOutcome> {
        let query_time = self.collector.query_time();
        let collection = self
            .collector
            .collect_detailed(coordinate, query_time)
            .await;

        let records_written = self.store.append(&collection.records)?;
        Ok(CoordinateOutcome {
            coordinate,
            query_time,
            stations_discovered: collection.stations_discovered,
            records_collected: collection.records.len(),
            records_written,
        })
    }

    /// Sweep `coordinates` in order with the cooldown between them
    pub async fn run(&self, coordinates: &[Coordinate]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (idx, coordinate) in coordinates.iter().enumerate() {
            if idx > 0 {
                self.logger.info(&format!(
                    "Cooling down for {:.0} seconds before next coordinate",
                    self.cooldown.as_secs_f64()
                ));
                self.clock.sleep(self.cooldown).await;
            }

            self.logger.info(&format!(
                "Processing coordinate {}/{}: {}",
                idx + 1,
                coordinates.len(),
                coordinate
            ));
            let outcome = self.run_coordinate(*coordinate).await.inspect_err(|e| {
                self.logger
                    .error(&format!("Aborting sweep at {}: {}", coordinate, e));
            })?;
            self.logger.info(&format!(
                "{}: {} stations, {} records, {} written",
                coordinate,
                outcome.stations_discovered,
                outcome.records_collected,
                outcome.records_written
            ));
            summary.outcomes.push(outcome);
        }

        Ok(summary)
    }
}
