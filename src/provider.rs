//! Remote price-lookup provider boundary
//!
//! The pipeline talks to the upstream service only through [`RemoteProvider`].
//! Implementations must classify throttling as
//! [`PumpwatchError::RateLimited`](crate::error::PumpwatchError::RateLimited);
//! every other failure is treated as terminal for the station concerned.

use crate::error::Result;
use crate::model::Coordinate;
use serde_json::Value;

#[cfg(feature = "gasbuddy")]
pub mod gasbuddy;

#[cfg(feature = "gasbuddy")]
pub use gasbuddy::GasBuddyProvider;

#[async_trait::async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Stations near a coordinate, as the provider's raw nested response
    ///
    /// The station list is expected at
    /// `data.locationBySearchTerm.stations.results[]`.
    async fn location_search(&self, coordinate: Coordinate) -> Result<Value>;

    /// Current prices for one station as a quote payload
    ///
    /// Shape: `{station_id, unit_of_measure, currency, latitude, longitude,
    /// image_url, regular_gas: {credit, price, last_updated}, premium_gas: {..}}`.
    async fn price_lookup(&self, station_id: &str) -> Result<Value>;
}
