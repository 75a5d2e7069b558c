//! Spatial index core: bucket codec, radius-to-bucket range resolution and
//! category-filtered visitor dispatch.
//!
//! # Invariants
//! - A bucket key is a total identity; positions outside the layout are
//!   rejected, never wrapped onto another bucket.
//! - A resolved area never leaves out a bucket holding a point strictly inside
//!   the query circle, and never extends past the world.
//! - A degenerate area sweeps nothing.
//!
//! Nothing here owns object storage or mutable state; the map that owns the
//! objects implements [`BucketStore`].

mod area;
mod key;
mod layout;
mod store;
mod visit;

pub use area::QueryArea;
pub use key::{BucketAddress, BucketKey, RegionCoord};
pub use layout::{GridConfig, GridError, GridLayout};
pub use store::{Anchor, BucketStore};
pub use visit::{Dispatcher, within_radius};
