//! Fan-out/fan-in price collection for one coordinate
//!
//! Station fetches are dispatched one spacing interval apart as independent
//! tasks and then all awaited; no record leaves [`PriceCollector`] before
//! every dispatched fetch has settled. A station that fails for any reason is
//! dropped and logged, never aborting its siblings.

use crate::clock::Clock;
use crate::discovery::StationDiscoverer;
use crate::error::{PumpwatchError, Result};
use crate::fetcher::RetryingFetcher;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::model::{Coordinate, PriceRecord, StationPrices, StationSummary};
use chrono::{Local, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A station that produced no record, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedStation {
    pub station_id: String,
    pub reason: String,
}

/// Everything one collection run produced
#[derive(Debug, Clone)]
pub struct Collection {
    pub coordinate: Coordinate,
    pub query_time: NaiveDateTime,
    pub stations_discovered: usize,
    /// Records in discovery order
    pub records: Vec<PriceRecord>,
    pub dropped: Vec<DroppedStation>,
}

pub struct PriceCollector {
    discoverer: StationDiscoverer,
    fetcher: Arc<RetryingFetcher>,
    clock: Arc<dyn Clock>,
    spacing: Duration,
    timezone: Option<Tz>,
}

impl PriceCollector {
    pub fn new(
        discoverer: StationDiscoverer,
        fetcher: Arc<RetryingFetcher>,
        clock: Arc<dyn Clock>,
        spacing: Duration,
    ) -> Self {
        Self {
            discoverer,
            fetcher,
            clock,
            spacing,
            timezone: None,
        }
    }

    /// Stamp query times in `tz` instead of local time
    pub fn with_timezone(mut self, tz: Option<Tz>) -> Self {
        self.timezone = tz;
        self
    }

    /// Current clock time truncated to whole seconds
    pub fn query_time(&self) -> NaiveDateTime {
        let now = self.clock.now();
        let local = match self.timezone {
            Some(tz) => now.with_timezone(&tz).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        };
        local.with_nanosecond(0).unwrap_or(local)
    }

    /// Records for every station near `coordinate` that could be priced
    pub async fn collect(&self, coordinate: Coordinate) -> Vec<PriceRecord> {
        self.collect_detailed(coordinate, self.query_time())
            .await
            .records
    }

    /// Run one collection with an explicit shared query time
    pub async fn collect_detailed(
        &self,
        coordinate: Coordinate,
        query_time: NaiveDateTime,
    ) -> Collection {
        let logger = get_logger_with_context(
            LogContext::new("collector")
                .with_run_id(uuid::Uuid::new_v4().to_string())
                .with_coordinate(coordinate),
        );

        let stations = self.discoverer.discover(coordinate).await;
        if stations.is_empty() {
            logger.warn("No stations found");
            return Collection {
                coordinate,
                query_time,
                stations_discovered: 0,
                records: Vec::new(),
                dropped: Vec::new(),
            };
        }

        let mut handles = Vec::with_capacity(stations.len());
        for (idx, station) in stations.iter().enumerate() {
            if idx > 0 {
                self.clock.sleep(self.spacing).await;
            }
            let fetcher = Arc::clone(&self.fetcher);
            let station_id = station.id.clone();
            logger.debug(&format!("Dispatching price fetch for {}", station_id));
            handles.push(tokio::spawn(
                async move { fetcher.fetch(&station_id).await },
            ));
        }

        // Barrier: every dispatched fetch settles before anything is merged
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PumpwatchError::generic(format!(
                    "fetch task failed: {}",
                    e
                ))),
            });
        }

        let mut records = Vec::with_capacity(stations.len());
        let mut dropped = Vec::new();
        for (station, outcome) in stations.iter().zip(outcomes) {
            match merge(&logger, station, outcome, query_time) {
                Ok(record) => records.push(record),
                Err(e) => dropped.push(DroppedStation {
                    station_id: station.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        logger.info(&format!(
            "Collected {} of {} stations ({} dropped)",
            records.len(),
            stations.len(),
            dropped.len()
        ));

        Collection {
            coordinate,
            query_time,
            stations_discovered: stations.len(),
            records,
            dropped,
        }
    }
}

fn merge(
    logger: &StructuredLogger,
    station: &StationSummary,
    outcome: Result<Value>,
    query_time: NaiveDateTime,
) -> Result<PriceRecord> {
    let logger = logger.for_station(&station.id);
    let payload = outcome.inspect_err(|e| {
        logger.warn(&format!("Dropping station, fetch failed: {}", e));
    })?;
    let prices = StationPrices::from_payload(&payload).inspect_err(|e| {
        logger.warn(&format!(
            "Skipping station due to missing data ({}); payload: {}",
            e, payload
        ));
    })?;
    Ok(PriceRecord::from_parts(station, &prices, query_time))
}
