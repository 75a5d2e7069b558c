//! Map kernel: owns the objects of one map and the bucket containers the
//! spatial index sweeps.
//!
//! # Invariants
//! - Every live object is registered in exactly one bucket, the one its
//!   position quantizes to.
//! - All state mutations flow through explicit operations and are logged.
//! - One owner per map; queries and mutations happen on the same tick context.

pub mod map;

pub use map::{Map, MapError, MapEvent, MapObject, Relocation};
