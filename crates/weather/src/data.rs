//! Weather table loading.
//!
//! The table is a YAML list, one record per zone:
//! ```text
//! - zone: 1
//!   spring: { rain: 20, snow: 0, storm: 5 }
//!   summer: { rain: 10, snow: 0, storm: 10 }
//!   fall:   { rain: 30, snow: 0, storm: 5 }
//!   winter: { rain: 5, snow: 40, storm: 0 }
//!   script: null
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use cellspace_common::ZoneId;
use serde::{Deserialize, Serialize};

/// Chance used in place of an out-of-range percentage.
const FALLBACK_CHANCE: u8 = 25;

/// Errors from loading a weather table.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Season of a zero-based day of the year. Spring starts on day 78
    /// (March 20th) and each season lasts 91 days.
    pub fn from_day_of_year(day: u32) -> Self {
        Self::ALL[(((day % 365) + 365 - 78) / 91 % 4) as usize]
    }

    /// Position in [`Season::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Percent chances of each weather kind in one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonChances {
    pub rain: u8,
    pub snow: u8,
    pub storm: u8,
}

/// One zone as written in the table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub zone: u32,
    #[serde(default)]
    pub spring: SeasonChances,
    #[serde(default)]
    pub summer: SeasonChances,
    #[serde(default)]
    pub fall: SeasonChances,
    #[serde(default)]
    pub winter: SeasonChances,
    #[serde(default)]
    pub script: Option<String>,
}

/// Validated chances of one zone, indexed by [`Season::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherData {
    pub seasons: [SeasonChances; 4],
    pub script: Option<String>,
}

impl WeatherData {
    /// Chances for one season.
    pub fn chances(&self, season: Season) -> SeasonChances {
        self.seasons[season.index()]
    }
}

/// All zone weather definitions.
#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    zones: HashMap<ZoneId, WeatherData>,
}

impl WeatherTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WeatherError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse a table from YAML text. An empty document is an empty table.
    pub fn from_yaml_str(text: &str) -> Result<Self, WeatherError> {
        let started = Instant::now();
        let records: Option<Vec<WeatherRecord>> = serde_yaml::from_str(text)?;
        let records = records.unwrap_or_default();
        if records.is_empty() {
            tracing::warn!("loaded 0 weather definitions, table is empty");
            return Ok(Self::default());
        }

        let table = Self::from_records(records);
        tracing::info!(
            count = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded weather definitions"
        );
        Ok(table)
    }

    /// Build a table, replacing chances above 100% with 25%. A later record for
    /// the same zone replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = WeatherRecord>) -> Self {
        let mut zones = HashMap::new();
        for record in records {
            let zone = ZoneId(record.zone);
            let mut seasons = [record.spring, record.summer, record.fall, record.winter];
            for (season, chances) in Season::ALL.into_iter().zip(seasons.iter_mut()) {
                for (kind, chance) in [
                    ("rain", &mut chances.rain),
                    ("snow", &mut chances.snow),
                    ("storm", &mut chances.storm),
                ] {
                    if *chance > 100 {
                        tracing::error!(
                            zone = zone.0,
                            ?season,
                            kind,
                            chance = *chance,
                            "weather chance above 100%, using {FALLBACK_CHANCE}%"
                        );
                        *chance = FALLBACK_CHANCE;
                    }
                }
            }
            let data = WeatherData {
                seasons,
                script: record.script,
            };
            if zones.insert(zone, data).is_some() {
                tracing::warn!(zone = zone.0, "duplicate weather record, keeping the last one");
            }
        }
        Self { zones }
    }

    /// Weather definition of a zone.
    pub fn get(&self, zone: ZoneId) -> Option<&WeatherData> {
        self.zones.get(&zone)
    }

    /// Number of zones with a definition.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = "
- zone: 1
  spring: { rain: 20, snow: 0, storm: 5 }
  winter: { rain: 5, snow: 40 }
  script: zone_one_weather
- zone: 2
  summer: { rain: 150, snow: 0, storm: 101 }
";

    #[test]
    fn parses_records() {
        let table = WeatherTable::from_yaml_str(TABLE).unwrap();
        assert_eq!(table.len(), 2);

        let one = table.get(ZoneId(1)).unwrap();
        assert_eq!(
            one.chances(Season::Spring),
            SeasonChances {
                rain: 20,
                snow: 0,
                storm: 5
            }
        );
        assert_eq!(one.chances(Season::Winter).snow, 40);
        assert_eq!(one.chances(Season::Winter).storm, 0);
        assert_eq!(one.chances(Season::Fall), SeasonChances::default());
        assert_eq!(one.script.as_deref(), Some("zone_one_weather"));
    }

    #[test]
    fn out_of_range_chances_fall_back() {
        let table = WeatherTable::from_yaml_str(TABLE).unwrap();
        let two = table.get(ZoneId(2)).unwrap();
        assert_eq!(two.chances(Season::Summer).rain, FALLBACK_CHANCE);
        assert_eq!(two.chances(Season::Summer).storm, FALLBACK_CHANCE);
        assert_eq!(two.chances(Season::Summer).snow, 0);
    }

    #[test]
    fn empty_table_is_not_an_error() {
        assert!(WeatherTable::from_yaml_str("").unwrap().is_empty());
        assert!(WeatherTable::from_yaml_str("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            WeatherTable::from_yaml_str("- zone: nope"),
            Err(WeatherError::Yaml(_))
        ));
    }

    #[test]
    fn duplicate_zone_keeps_last() {
        let table = WeatherTable::from_yaml_str(
            "- zone: 3\n  spring: { rain: 1 }\n- zone: 3\n  spring: { rain: 2 }\n",
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ZoneId(3)).unwrap().chances(Season::Spring).rain, 2);
    }

    #[test]
    fn loads_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(TABLE.as_bytes()).unwrap();
        let table = WeatherTable::load(tmp.path()).unwrap();
        assert_eq!(table.len(), 2);

        assert!(matches!(
            WeatherTable::load(tmp.path().with_extension("missing")),
            Err(WeatherError::Io(_))
        ));
    }

    #[test]
    fn season_from_day_of_year() {
        assert_eq!(Season::from_day_of_year(0), Season::Winter);
        assert_eq!(Season::from_day_of_year(78), Season::Spring);
        assert_eq!(Season::from_day_of_year(169), Season::Summer);
        assert_eq!(Season::from_day_of_year(260), Season::Fall);
        assert_eq!(Season::from_day_of_year(351), Season::Winter);
    }
}
