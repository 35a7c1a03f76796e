//! Data model shared by the acquisition pipeline
//!
//! `StationSummary` and `StationPrices` are transient per-run values; they are
//! merged into a `PriceRecord`, which is what ends up in the dataset.

use crate::error::{PumpwatchError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// `Query Time` column format (second precision)
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A point the location search is centred on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.latitude, self.longitude)
    }
}

/// Station identity and static metadata returned by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// Fuel grades that are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuelGrade {
    Regular,
    Premium,
}

impl FuelGrade {
    /// Key of the grade's sub-object in a quote payload; also the provider's `fuelProduct`
    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::Regular => "regular_gas",
            Self::Premium => "premium_gas",
        }
    }
}

/// One grade's price at one station
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub fuel_grade: FuelGrade,
    pub price: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub currency: String,
    pub unit_of_measure: String,
}

/// Station position as persisted in the `Location` column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

/// Parsed quote payload for one station: the regular/premium pair plus position
#[derive(Debug, Clone, PartialEq)]
pub struct StationPrices {
    pub location: Location,
    pub image_url: Option<String>,
    pub regular: PriceQuote,
    pub premium: PriceQuote,
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn as_string(value: Option<&Value>) -> String {
    value
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

impl StationPrices {
    /// Parse a quote payload as produced by [`crate::provider::RemoteProvider::price_lookup`]
    ///
    /// Fails with `MalformedResponse` when the payload is not an object, carries
    /// an `error` entry, or lacks either grade sub-object. Individual prices and
    /// timestamps are optional.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| PumpwatchError::malformed("quote payload is not an object"))?;

        if let Some(err) = obj.get("error") {
            return Err(PumpwatchError::malformed(format!(
                "quote payload carries error: {}",
                err
            )));
        }

        let currency = as_string(obj.get("currency"));
        let unit_of_measure = as_string(obj.get("unit_of_measure"));

        let quote = |grade: FuelGrade| -> Result<PriceQuote> {
            let sub = obj
                .get(grade.payload_key())
                .and_then(|v| v.as_object())
                .ok_or_else(|| {
                    PumpwatchError::malformed(format!("missing {}", grade.payload_key()))
                })?;
            Ok(PriceQuote {
                fuel_grade: grade,
                price: as_f64(sub.get("price")),
                last_updated: as_timestamp(sub.get("last_updated")),
                currency: currency.clone(),
                unit_of_measure: unit_of_measure.clone(),
            })
        };

        Ok(Self {
            location: Location {
                latitude: as_f64(obj.get("latitude")),
                longitude: as_f64(obj.get("longitude")),
            },
            image_url: obj
                .get("image_url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            regular: quote(FuelGrade::Regular)?,
            premium: quote(FuelGrade::Premium)?,
        })
    }
}

/// One persisted dataset row
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub station_id: String,
    pub station_name: String,
    pub address: String,
    pub location: Location,
    pub query_time: NaiveDateTime,
    pub regular_last_update: Option<DateTime<Utc>>,
    pub regular_price: Option<f64>,
    pub premium_last_update: Option<DateTime<Utc>>,
    pub premium_price: Option<f64>,
}

impl PriceRecord {
    /// Merge discovery metadata with fetched prices under the run's query time
    pub fn from_parts(
        station: &StationSummary,
        prices: &StationPrices,
        query_time: NaiveDateTime,
    ) -> Self {
        Self {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            address: station.address.clone(),
            location: prices.location,
            query_time,
            regular_last_update: prices.regular.last_updated,
            regular_price: prices.regular.price,
            premium_last_update: prices.premium.last_updated,
            premium_price: prices.premium.price,
        }
    }

    /// `Query Time` cell value
    pub fn query_time_string(&self) -> String {
        format_query_time(&self.query_time)
    }

    /// Deduplication key: (station id, query time string)
    pub fn dedup_key(&self) -> (String, String) {
        (self.station_id.clone(), self.query_time_string())
    }
}

pub fn format_query_time(query_time: &NaiveDateTime) -> String {
    query_time.format(QUERY_TIME_FORMAT).to_string()
}

pub fn parse_query_time(raw: &str) -> Result<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(raw.trim(), QUERY_TIME_FORMAT)?)
}
