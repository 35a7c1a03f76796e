use crate::config::ProviderConfig;
use crate::error::{PumpwatchError, Result};
use crate::logging::get_logger;
use crate::model::{Coordinate, FuelGrade};
use crate::provider::RemoteProvider;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ORIGIN, REFERER};
use serde_json::{Value, json};
use std::time::Duration;

const LOCATION_QUERY: &str = r#"
query LocationBySearchTerm($brandId: Int, $cursor: String, $fuel: Int, $lat: Float, $lng: Float, $maxAge: Int, $search: String) {
    locationBySearchTerm(lat: $lat, lng: $lng, search: $search) {
        countryCode
        displayName
        latitude
        longitude
        regionCode
        stations(brandId: $brandId, cursor: $cursor, fuel: $fuel, lat: $lat, lng: $lng, maxAge: $maxAge) {
            count
            cursor { next }
            results {
                address { country line1 line2 locality postalCode region }
                id
                name
                priceUnit
            }
        }
    }
}
"#;

const STATION_QUERY: &str = r#"
query GetStation($id: ID!) {
    station(id: $id) {
        id
        brands { brandId imageUrl name }
        prices {
            cash { nickname postedTime price formattedPrice }
            credit { nickname postedTime price formattedPrice }
            fuelProduct
            longName
        }
        priceUnit
        currency
        latitude
        longitude
    }
}
"#;

/// GraphQL client for the GasBuddy price service
pub struct GasBuddyProvider {
    client: reqwest::Client,
    endpoint: String,
    logger: crate::logging::StructuredLogger,
}

impl GasBuddyProvider {
    /// Create a provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            logger: get_logger("gasbuddy"),
        })
    }

    async fn post(&self, operation: &str, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(ORIGIN, "https://www.gasbuddy.com")
            .header(REFERER, "https://www.gasbuddy.com/")
            .header("apollo-require-preflight", "true")
            .json(&json!({
                "operationName": operation,
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PumpwatchError::rate_limited(format!(
                "{} returned {}",
                operation, status
            )));
        }
        if !status.is_success() {
            self.logger
                .error(&format!("{} request failed: {}", operation, status));
            return Err(PumpwatchError::api(format!(
                "{} returned {}",
                operation, status
            )));
        }

        let body: Value = resp.json().await?;
        check_graphql_errors(operation, &body)?;
        Ok(body)
    }
}

/// Map a GraphQL `errors` array to a classified error
fn check_graphql_errors(operation: &str, body: &Value) -> Result<()> {
    let Some(errors) = body.get("errors").and_then(|e| e.as_array()) else {
        return Ok(());
    };
    let Some(first) = errors.first() else {
        return Ok(());
    };
    let msg = first
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("GraphQL error");
    let lowered = msg.to_lowercase();
    if lowered.contains("too many requests") || lowered.contains("rate limit") {
        return Err(PumpwatchError::rate_limited(format!("{}: {}", operation, msg)));
    }
    Err(PumpwatchError::api(format!("{}: {}", operation, msg)))
}

/// Pick one grade out of a `station.prices[]` list
fn grade_entry(prices: &[Value], grade: FuelGrade) -> Value {
    let Some(entry) = prices
        .iter()
        .find(|p| p.get("fuelProduct").and_then(|f| f.as_str()) == Some(grade.payload_key()))
    else {
        return json!({"credit": null, "price": null, "last_updated": null});
    };

    // Credit price is what the dataset tracks; cash is a fallback
    let quote = entry
        .get("credit")
        .filter(|c| !c.is_null())
        .or_else(|| entry.get("cash").filter(|c| !c.is_null()));
    let Some(quote) = quote else {
        return json!({"credit": null, "price": null, "last_updated": null});
    };

    // A zero price means "not reported"
    let price = quote
        .get("price")
        .and_then(|p| p.as_f64())
        .filter(|p| *p > 0.0);

    json!({
        "credit": quote.get("nickname").cloned().unwrap_or(Value::Null),
        "price": price,
        "last_updated": quote.get("postedTime").cloned().unwrap_or(Value::Null),
    })
}

/// Flatten a `GetStation` response into the quote payload shape
pub fn normalize_station_response(station_id: &str, body: &Value) -> Result<Value> {
    let station = body
        .get("data")
        .and_then(|d| d.get("station"))
        .filter(|s| s.is_object())
        .ok_or_else(|| {
            PumpwatchError::malformed(format!("no station data for {}", station_id))
        })?;

    let prices: Vec<Value> = station
        .get("prices")
        .and_then(|p| p.as_array())
        .cloned()
        .unwrap_or_default();

    let image_url = station
        .get("brands")
        .and_then(|b| b.as_array())
        .and_then(|b| b.first())
        .and_then(|b| b.get("imageUrl"))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(json!({
        "station_id": station_id,
        "unit_of_measure": station.get("priceUnit").cloned().unwrap_or(Value::Null),
        "currency": station.get("currency").cloned().unwrap_or(Value::Null),
        "latitude": station.get("latitude").cloned().unwrap_or(Value::Null),
        "longitude": station.get("longitude").cloned().unwrap_or(Value::Null),
        "image_url": image_url,
        "regular_gas": grade_entry(&prices, FuelGrade::Regular),
        "premium_gas": grade_entry(&prices, FuelGrade::Premium),
    }))
}

#[async_trait::async_trait]
impl RemoteProvider for GasBuddyProvider {
    async fn location_search(&self, coordinate: Coordinate) -> Result<Value> {
        self.logger
            .debug(&format!("Location search at {}", coordinate));
        self.post(
            "LocationBySearchTerm",
            LOCATION_QUERY,
            json!({
                "fuel": 1,
                "maxAge": 0,
                "lat": coordinate.latitude,
                "lng": coordinate.longitude,
            }),
        )
        .await
    }

    async fn price_lookup(&self, station_id: &str) -> Result<Value> {
        let body = self
            .post("GetStation", STATION_QUERY, json!({ "id": station_id }))
            .await?;
        normalize_station_response(station_id, &body)
    }
}
