use cellspace_common::{ZoneId, splitmix64};
use serde::{Deserialize, Serialize};

use crate::data::{Season, WeatherData};

const THIRD: f32 = 0.333_333_34;
const TWO_THIRDS: f32 = 0.666_666_7;
const MAX_GRADE: f32 = 0.9999;

/// Default time between two regenerations, in milliseconds.
pub const DEFAULT_CHANGE_INTERVAL_MS: u32 = 10 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Fine,
    Rain,
    Snow,
    Storm,
}

/// What players in the zone observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherState {
    Fine,
    Light(WeatherKind),
    Medium(WeatherKind),
    Heavy(WeatherKind),
}

/// A weather change to deliver to the players of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherChange {
    pub zone: ZoneId,
    pub state: WeatherState,
    pub grade: f32,
}

impl WeatherChange {
    /// Neutral weather, sent to players entering a zone without weather.
    pub fn fine(zone: ZoneId) -> Self {
        Self {
            zone,
            state: WeatherState::Fine,
            grade: 0.0,
        }
    }
}

/// Result of advancing one weather by a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WeatherUpdate {
    Unchanged,
    Changed(WeatherChange),
    /// The weather changed but nobody in the zone could receive it.
    Abandoned,
}

/// Splitmix64-based generator; a weather rolls the same sequence from the same seed.
#[derive(Debug, Clone)]
struct WeatherRng {
    state: u64,
}

impl WeatherRng {
    fn next_u64(&mut self) -> u64 {
        self.state = splitmix64(self.state);
        self.state
    }

    /// Uniform in `0..n`.
    fn below(&mut self, n: u32) -> u32 {
        (self.next_u64() % u64::from(n)) as u32
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Live weather of one zone.
#[derive(Debug, Clone)]
pub struct Weather {
    zone: ZoneId,
    data: WeatherData,
    kind: WeatherKind,
    grade: f32,
    interval_ms: u32,
    elapsed_ms: u32,
    rng: WeatherRng,
}

impl Weather {
    /// Fine weather for `zone`, rolling from `seed`.
    pub fn new(zone: ZoneId, data: WeatherData, seed: u64) -> Self {
        Self {
            zone,
            data,
            kind: WeatherKind::Fine,
            grade: 0.0,
            interval_ms: DEFAULT_CHANGE_INTERVAL_MS,
            elapsed_ms: 0,
            rng: WeatherRng { state: seed },
        }
    }

    /// Time between regenerations, at least 1 ms.
    pub fn with_interval(mut self, interval_ms: u32) -> Self {
        self.interval_ms = interval_ms.max(1);
        self
    }

    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    /// Current weather kind.
    pub fn kind(&self) -> WeatherKind {
        self.kind
    }

    /// Intensity in `[0, 1)`.
    pub fn grade(&self) -> f32 {
        self.grade
    }

    /// What players observe: fine below grade 0.27, then light, medium from
    /// 0.40 and heavy from 0.70.
    pub fn state(&self) -> WeatherState {
        if self.kind == WeatherKind::Fine || self.grade < 0.27 {
            WeatherState::Fine
        } else if self.grade < 0.40 {
            WeatherState::Light(self.kind)
        } else if self.grade < 0.70 {
            WeatherState::Medium(self.kind)
        } else {
            WeatherState::Heavy(self.kind)
        }
    }

    /// The current weather as a change to deliver.
    pub fn change(&self) -> WeatherChange {
        WeatherChange {
            zone: self.zone,
            state: self.state(),
            grade: self.grade,
        }
    }

    /// Roll the next weather. Returns true if kind or grade changed.
    ///
    /// 30% nothing happens, 30% the weather gets better, 30% worse, 10% it
    /// changes radically. Fine weather rolls the season's chances instead, with
    /// new weather 85% light, 7% medium and 7% heavy.
    pub fn regenerate(&mut self, season: Season) -> bool {
        let u = self.rng.below(100);
        if u < 30 {
            return false;
        }
        let (old_kind, old_grade) = (self.kind, self.grade);

        if u < 60 && self.grade < THIRD {
            self.set(WeatherKind::Fine, 0.0);
        }
        if u < 60 && self.kind != WeatherKind::Fine {
            self.set(self.kind, self.grade - THIRD);
            return true;
        }
        if u < 90 && self.kind != WeatherKind::Fine {
            self.set(self.kind, self.grade + THIRD);
            return true;
        }
        if self.kind != WeatherKind::Fine {
            // light turns heavy, heavy may turn light, anything else clears
            if self.grade < THIRD {
                self.set(self.kind, MAX_GRADE);
                return true;
            }
            if self.grade > TWO_THIRDS && self.rng.below(100) < 50 {
                self.set(self.kind, self.grade - TWO_THIRDS);
                return true;
            }
            self.set(WeatherKind::Fine, 0.0);
        }

        let chances = self.data.chances(season);
        let rain = u32::from(chances.rain);
        let snow = rain + u32::from(chances.snow);
        let storm = snow + u32::from(chances.storm);
        let roll = self.rng.below(100);
        let kind = if roll < rain {
            WeatherKind::Rain
        } else if roll < snow {
            WeatherKind::Snow
        } else if roll < storm {
            WeatherKind::Storm
        } else {
            WeatherKind::Fine
        };

        let grade = if kind == WeatherKind::Fine {
            0.0
        } else if u < 90 {
            self.rng.unit() * 0.3333
        } else if self.rng.below(100) < 50 {
            self.rng.unit() * 0.3333 + 0.3334
        } else {
            self.rng.unit() * 0.3333 + 0.6667
        };
        self.set(kind, grade);

        self.kind != old_kind || self.grade != old_grade
    }

    fn set(&mut self, kind: WeatherKind, grade: f32) {
        self.kind = kind;
        self.grade = if kind == WeatherKind::Fine {
            0.0
        } else {
            grade.clamp(0.0, MAX_GRADE)
        };
    }

    /// Advance the change timer; regenerate when it expires.
    pub(crate) fn update<F>(&mut self, diff_ms: u32, season: Season, has_players: &F) -> WeatherUpdate
    where
        F: Fn(ZoneId) -> bool,
    {
        self.elapsed_ms = self.elapsed_ms.saturating_add(diff_ms);
        if self.elapsed_ms < self.interval_ms {
            return WeatherUpdate::Unchanged;
        }
        self.elapsed_ms %= self.interval_ms;

        if !self.regenerate(season) {
            return WeatherUpdate::Unchanged;
        }
        if !has_players(self.zone) {
            return WeatherUpdate::Abandoned;
        }
        tracing::debug!(zone = self.zone.0, kind = ?self.kind, grade = self.grade, "weather changed");
        WeatherUpdate::Changed(self.change())
    }
}
