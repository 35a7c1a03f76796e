//! # Pumpwatch - fuel price acquisition
//!
//! Periodically sweeps a list of coordinates, discovers the fuel stations
//! around each one, fetches their current regular and premium prices from a
//! remote provider, and appends the results to a deduplicated tabular dataset.
//!
//! ## Architecture
//!
//! - `provider`: remote price service interface and the GraphQL HTTP client
//! - `fetcher`: per-station lookup with rate-limit aware exponential backoff
//! - `discovery`: stations around a coordinate
//! - `collector`: paced fan-out of station fetches with a join barrier
//! - `store`: append-only CSV dataset keyed on (station, query time)
//! - `pipeline`: sequential coordinate sweep with cooldown
//! - `cleaning`: time-tagged, deduplicated copy of the dataset
//! - `clock`: time source for every pacing delay
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing

pub mod cleaning;
pub mod clock;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::Config;
pub use error::{PumpwatchError, Result};
pub use model::{Coordinate, PriceRecord, StationSummary};
pub use pipeline::{Pipeline, RunSummary};
pub use provider::RemoteProvider;
pub use store::{Dataset, DedupStore};
