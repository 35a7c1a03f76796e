#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pumpwatch::error::{PumpwatchError, Result};
use pumpwatch::model::Coordinate;
use pumpwatch::provider::RemoteProvider;
use pumpwatch::{PriceRecord, VirtualClock};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 20, 16, 15, 0).unwrap()
}

pub fn virtual_clock() -> Arc<VirtualClock> {
    Arc::new(VirtualClock::new(start_time()))
}

/// Location-search response listing `ids` in order
pub fn discovery_response(ids: &[&str]) -> Value {
    let results: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Station {}", id),
                "address": {"line1": format!("{} Main St", id)}
            })
        })
        .collect();
    json!({"data": {"locationBySearchTerm": {"stations": {"results": results}}}})
}

/// Quote payload with both grades present
pub fn quote_payload(station_id: &str, regular: Option<f64>, premium: Option<f64>) -> Value {
    json!({
        "station_id": station_id,
        "unit_of_measure": "cents_per_liter",
        "currency": "CAD",
        "latitude": 49.25,
        "longitude": -123.1,
        "image_url": null,
        "regular_gas": {"credit": "Owner", "price": regular, "last_updated": "2024-11-20T15:00:00Z"},
        "premium_gas": {"credit": null, "price": premium, "last_updated": null}
    })
}

/// Provider whose answers are scripted per station
///
/// Station scripts are consumed front to back; once a script is exhausted
/// the station answers with a default priced payload.
#[derive(Default)]
pub struct FakeProvider {
    discovery: Mutex<VecDeque<Result<Value>>>,
    default_discovery: Mutex<Option<Value>>,
    scripts: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    price_calls: Mutex<Vec<String>>,
    search_calls: Mutex<Vec<Coordinate>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every location search returns these stations
    pub fn with_stations(self, ids: &[&str]) -> Self {
        *self.default_discovery.lock().unwrap() = Some(discovery_response(ids));
        self
    }

    /// Queue one location-search answer ahead of the default
    pub fn push_discovery(self, response: Result<Value>) -> Self {
        self.discovery.lock().unwrap().push_back(response);
        self
    }

    pub fn script(self, station_id: &str, outcomes: Vec<Result<Value>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(station_id.to_string(), outcomes.into());
        self
    }

    pub fn price_calls(&self, station_id: &str) -> usize {
        self.price_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == station_id)
            .count()
    }

    pub fn price_call_order(&self) -> Vec<String> {
        self.price_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<Coordinate> {
        self.search_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RemoteProvider for FakeProvider {
    async fn location_search(&self, coordinate: Coordinate) -> Result<Value> {
        self.search_calls.lock().unwrap().push(coordinate);
        if let Some(queued) = self.discovery.lock().unwrap().pop_front() {
            return queued;
        }
        Ok(self
            .default_discovery
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| discovery_response(&[])))
    }

    async fn price_lookup(&self, station_id: &str) -> Result<Value> {
        self.price_calls.lock().unwrap().push(station_id.to_string());
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(station_id)
            .and_then(|s| s.pop_front());
        match scripted {
            Some(outcome) => outcome,
            None => Ok(quote_payload(station_id, Some(150.5), Some(170.2))),
        }
    }
}

pub fn rate_limited() -> Result<Value> {
    Err(PumpwatchError::rate_limited("429 Too Many Requests"))
}

pub fn record(station_id: &str, query_time: &str) -> PriceRecord {
    PriceRecord {
        station_id: station_id.to_string(),
        station_name: format!("Station {}", station_id),
        address: format!("{} Main St", station_id),
        location: pumpwatch::model::Location {
            latitude: Some(49.25),
            longitude: Some(-123.1),
        },
        query_time: pumpwatch::model::parse_query_time(query_time).unwrap(),
        regular_last_update: None,
        regular_price: Some(150.5),
        premium_last_update: None,
        premium_price: Some(170.2),
    }
}
