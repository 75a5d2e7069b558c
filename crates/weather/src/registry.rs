use std::collections::BTreeMap;

use cellspace_common::ZoneId;

use crate::data::{Season, WeatherTable};
use crate::weather::{DEFAULT_CHANGE_INTERVAL_MS, Weather, WeatherChange, WeatherUpdate};

/// Live weather of every zone that currently has some.
///
/// Weather for a zone is created on first use from the table and dropped once
/// a change finds nobody in the zone to receive it. The registry is an
/// ordinary value: construct it at startup, [`clear`](Self::clear) it at
/// shutdown.
#[derive(Debug)]
pub struct WeatherRegistry {
    table: WeatherTable,
    weathers: BTreeMap<ZoneId, Weather>,
    season: Season,
    seed: u64,
    interval_ms: u32,
}

impl WeatherRegistry {
    /// Registry over `table` with seed 0, in spring.
    pub fn new(table: WeatherTable) -> Self {
        Self::with_seed(table, 0)
    }

    /// Registry with a specific seed; each zone derives its own generator from it.
    pub fn with_seed(table: WeatherTable, seed: u64) -> Self {
        Self {
            table,
            weathers: BTreeMap::new(),
            season: Season::Spring,
            seed,
            interval_ms: DEFAULT_CHANGE_INTERVAL_MS,
        }
    }

    /// Interval between regenerations for weathers created from now on.
    pub fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    /// Season used by every regeneration from now on.
    pub fn set_season(&mut self, season: Season) {
        self.season = season;
    }

    /// Current season.
    pub fn season(&self) -> Season {
        self.season
    }

    /// The zone definitions weather is created from.
    pub fn table(&self) -> &WeatherTable {
        &self.table
    }

    /// Number of zones with live weather.
    pub fn len(&self) -> usize {
        self.weathers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weathers.is_empty()
    }

    /// Live weather of a zone, if any.
    pub fn find_weather(&self, zone: ZoneId) -> Option<&Weather> {
        self.weathers.get(&zone)
    }

    /// Create the weather of a zone and roll its first state.
    ///
    /// Returns `None` when the table has no record for the zone.
    pub fn add_weather(&mut self, zone: ZoneId) -> Option<&Weather> {
        let Some(data) = self.table.get(zone) else {
            tracing::trace!(zone = zone.0, "zone has no weather");
            return None;
        };
        let seed = self.seed ^ u64::from(zone.0).rotate_left(32);
        let mut weather = Weather::new(zone, data.clone(), seed).with_interval(self.interval_ms);
        weather.regenerate(self.season);
        tracing::debug!(zone = zone.0, kind = ?weather.kind(), "weather created");

        self.weathers.insert(zone, weather);
        self.weathers.get(&zone)
    }

    /// Drop the live weather of a zone, returning it.
    pub fn remove_weather(&mut self, zone: ZoneId) -> Option<Weather> {
        self.weathers.remove(&zone)
    }

    /// Weather a player entering `zone` should see, creating it on first use.
    /// Zones without a record report fine weather.
    pub fn weather_for_zone_entry(&mut self, zone: ZoneId) -> WeatherChange {
        if let Some(weather) = self.weathers.get(&zone) {
            return weather.change();
        }
        self.add_weather(zone)
            .map(Weather::change)
            .unwrap_or_else(|| WeatherChange::fine(zone))
    }

    /// Advance every weather by `diff_ms`. Returns the changes to deliver.
    ///
    /// `has_players` tells whether anyone is in a zone; weather whose change
    /// reaches an empty zone is removed.
    pub fn update<F>(&mut self, diff_ms: u32, has_players: F) -> Vec<WeatherChange>
    where
        F: Fn(ZoneId) -> bool,
    {
        let season = self.season;
        let mut changes = Vec::new();
        self.weathers
            .retain(|zone, weather| match weather.update(diff_ms, season, &has_players) {
                WeatherUpdate::Unchanged => true,
                WeatherUpdate::Changed(change) => {
                    changes.push(change);
                    true
                }
                WeatherUpdate::Abandoned => {
                    tracing::debug!(zone = zone.0, "weather removed, zone is empty");
                    false
                }
            });
        changes
    }

    /// Drop all live weather.
    pub fn clear(&mut self) {
        self.weathers.clear();
    }
}
