//! Zone weather: a table of per-zone seasonal chances loaded at startup and a
//! registry of live weather advanced once per tick.
//!
//! # Invariants
//! - Independent of the spatial index; zone occupancy is supplied by the caller.
//! - Weather exists only for zones with a table record.
//! - Randomness is seeded, so a registry replays identically from the same seed.

mod data;
mod registry;
mod weather;

pub use data::{Season, SeasonChances, WeatherData, WeatherError, WeatherRecord, WeatherTable};
pub use registry::WeatherRegistry;
pub use weather::{Weather, WeatherChange, WeatherKind, WeatherState};
