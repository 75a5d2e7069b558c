//! Shared types: object identity, zones, the object category taxonomy the
//! spatial index filters on, and the deterministic RNG step.

mod rng;
mod types;

pub use glam::Vec2;
pub use rng::splitmix64;
pub use types::{CategoryMask, ObjectCategory, ObjectId, ObjectKind, ZoneId};
