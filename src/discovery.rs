//! Station discovery around a coordinate
//!
//! A failed or malformed location search is not an error for the run: it is
//! logged and treated as "no stations found".

use crate::clock::Clock;
use crate::error::{PumpwatchError, Result};
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use crate::model::{Coordinate, StationSummary};
use crate::provider::RemoteProvider;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Turns a coordinate into candidate stations
pub struct StationDiscoverer {
    provider: Arc<dyn RemoteProvider>,
    clock: Arc<dyn Clock>,
    settle_delay: Duration,
}

impl StationDiscoverer {
    pub fn new(
        provider: Arc<dyn RemoteProvider>,
        clock: Arc<dyn Clock>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            provider,
            clock,
            settle_delay,
        }
    }

    /// Stations near `coordinate`, in provider order
    ///
    /// When at least one station is found the settle delay is observed before
    /// returning, so price fetching never directly follows the search call.
    pub async fn discover(&self, coordinate: Coordinate) -> Vec<StationSummary> {
        let logger =
            get_logger_with_context(LogContext::new("discovery").with_coordinate(coordinate));

        let response = match self.provider.location_search(coordinate).await {
            Ok(response) => response,
            Err(e) => {
                logger.warn(&format!("Location search failed, no stations: {}", e));
                return Vec::new();
            }
        };

        let stations = match extract_stations(&response) {
            Ok(stations) => stations,
            Err(e) => {
                logger.warn(&format!("{}; raw response: {}", e, response));
                return Vec::new();
            }
        };

        logger.debug(&format!("Discovered {} stations", stations.len()));
        if !stations.is_empty() {
            self.clock.sleep(self.settle_delay).await;
        }
        stations
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pull the station list out of a location-search response
///
/// Entries without a usable `id` cannot be priced; they are logged and skipped.
pub fn extract_stations(response: &Value) -> Result<Vec<StationSummary>> {
    if let Some(err) = response.get("error") {
        return Err(PumpwatchError::malformed(format!(
            "location search returned error: {}",
            err
        )));
    }

    let results = response
        .get("data")
        .and_then(|d| d.get("locationBySearchTerm"))
        .and_then(|l| l.get("stations"))
        .and_then(|s| s.get("results"))
        .and_then(|r| r.as_array())
        .ok_or_else(|| {
            PumpwatchError::malformed("missing data.locationBySearchTerm.stations.results")
        })?;

    let logger = get_logger("discovery");
    Ok(results
        .iter()
        .filter_map(|station| {
            let Some(id) = station.get("id").and_then(id_string) else {
                logger.warn(&format!("Skipping station without id: {}", station));
                return None;
            };
            Some(StationSummary {
                id,
                name: station
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string(),
                address: station
                    .get("address")
                    .and_then(|a| a.get("line1"))
                    .and_then(|l| l.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect())
}
