use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::key::{BucketAddress, BucketKey, RegionCoord};

/// Each key field is 8 bits wide.
const FIELD_RANGE: u32 = 256;

/// Errors from the bucket codec and layout validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("position ({x}, {y}) is outside the representable bucket space")]
    PositionOutOfBounds { x: f32, y: f32 },
    #[error("invalid grid config: {0}")]
    InvalidConfig(String),
}

/// Grid configuration: bucket size, region decomposition and world origin.
///
/// The origin is the world coordinate mapped to address `(0, 0)`; the world
/// spans `regions_per_axis * sub_buckets_per_region` buckets per axis from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of one bucket in world units.
    pub bucket_size: f32,
    /// Sub-buckets per region along one axis (1..=256).
    pub sub_buckets_per_region: u32,
    /// Regions along one axis (1..=256).
    pub regions_per_axis: u32,
    pub origin: Vec2,
}

impl Default for GridConfig {
    /// 64 regions of 533.3333 units split into 8 buckets each, centred on (0, 0).
    fn default() -> Self {
        Self::centered(533.333_3 / 8.0, 8, 64)
    }
}

impl GridConfig {
    /// A layout whose centre bucket boundary sits on world `(0, 0)`.
    pub fn centered(bucket_size: f32, sub_buckets_per_region: u32, regions_per_axis: u32) -> Self {
        let half = (sub_buckets_per_region * regions_per_axis) as f32 * bucket_size / 2.0;
        Self {
            bucket_size,
            sub_buckets_per_region,
            regions_per_axis,
            origin: Vec2::splat(-half),
        }
    }

    /// A layout starting at world `(0, 0)`, covering only non-negative coordinates.
    pub fn non_negative(bucket_size: f32, sub_buckets_per_region: u32, regions_per_axis: u32) -> Self {
        Self {
            bucket_size,
            sub_buckets_per_region,
            regions_per_axis,
            origin: Vec2::ZERO,
        }
    }

    /// Check sizes and counts fit the 8-bit key fields and the origin is finite.
    pub fn validate(&self) -> Result<(), GridError> {
        if !(self.bucket_size.is_finite() && self.bucket_size > 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "bucket_size must be positive, got {}",
                self.bucket_size
            )));
        }
        if !(1..=FIELD_RANGE).contains(&self.sub_buckets_per_region) {
            return Err(GridError::InvalidConfig(format!(
                "sub_buckets_per_region must be in 1..=256, got {}",
                self.sub_buckets_per_region
            )));
        }
        if !(1..=FIELD_RANGE).contains(&self.regions_per_axis) {
            return Err(GridError::InvalidConfig(format!(
                "regions_per_axis must be in 1..=256, got {}",
                self.regions_per_axis
            )));
        }
        if !self.origin.is_finite() {
            return Err(GridError::InvalidConfig("origin must be finite".into()));
        }
        Ok(())
    }
}

/// A validated grid layout: the bucket codec plus the world bounds it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    config: GridConfig,
    /// Buckets per axis.
    dimension: u32,
}

impl GridLayout {
    /// Validate `config` and build the layout.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            config,
            dimension: config.sub_buckets_per_region * config.regions_per_axis,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn bucket_size(&self) -> f32 {
        self.config.bucket_size
    }

    pub fn sub_buckets_per_region(&self) -> u32 {
        self.config.sub_buckets_per_region
    }

    /// Side length of one region in world units.
    pub fn region_size(&self) -> f32 {
        self.config.bucket_size * self.config.sub_buckets_per_region as f32
    }

    /// Number of buckets along each axis.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// The largest valid address on both axes.
    pub fn max_address(&self) -> BucketAddress {
        BucketAddress::new(self.dimension - 1, self.dimension - 1)
    }

    /// Lowest world coordinate covered by the layout.
    pub fn world_min(&self) -> Vec2 {
        self.config.origin
    }

    /// World coordinate just past the last bucket on both axes.
    pub fn world_max(&self) -> Vec2 {
        self.config.origin + Vec2::splat(self.dimension as f32 * self.config.bucket_size)
    }

    /// Unclamped bucket index of `coord` along an axis starting at `origin`.
    ///
    /// Computed in f64 so that coordinates far from the origin quantize the
    /// same way on every platform. `None` for non-finite input.
    pub(crate) fn axis_index(&self, coord: f32, origin: f32) -> Option<i64> {
        if !coord.is_finite() {
            return None;
        }
        let offset = (f64::from(coord) - f64::from(origin)) / f64::from(self.config.bucket_size);
        Some(offset.floor() as i64)
    }

    /// Clamp a signed index into `[0, dimension - 1]`.
    pub(crate) fn clamp_index(&self, index: i64) -> u32 {
        index.clamp(0, i64::from(self.dimension - 1)) as u32
    }

    fn checked_index(&self, coord: f32, origin: f32) -> Option<u32> {
        let index = self.axis_index(coord, origin)?;
        (0..i64::from(self.dimension))
            .contains(&index)
            .then_some(index as u32)
    }

    /// Flattened address of a world position.
    pub fn address_of(&self, position: Vec2) -> Result<BucketAddress, GridError> {
        let origin = self.config.origin;
        match (
            self.checked_index(position.x, origin.x),
            self.checked_index(position.y, origin.y),
        ) {
            (Some(x), Some(y)) => Ok(BucketAddress::new(x, y)),
            _ => Err(GridError::PositionOutOfBounds {
                x: position.x,
                y: position.y,
            }),
        }
    }

    /// Key of the bucket containing a world position.
    pub fn key_of(&self, position: Vec2) -> Result<BucketKey, GridError> {
        self.address_of(position).map(|a| self.key_from_address(a))
    }

    pub fn key_at(&self, x: f32, y: f32) -> Result<BucketKey, GridError> {
        self.key_of(Vec2::new(x, y))
    }

    /// Key for an in-range address.
    pub fn key_from_address(&self, address: BucketAddress) -> BucketKey {
        debug_assert!(address.is_within(self.max_address()));
        BucketKey::from_address(address, self.config.sub_buckets_per_region)
    }

    pub fn address_from_key(&self, key: BucketKey) -> BucketAddress {
        key.to_address(self.config.sub_buckets_per_region)
    }

    pub fn region_of(&self, position: Vec2) -> Result<RegionCoord, GridError> {
        self.key_of(position).map(BucketKey::region)
    }

    /// True if the key's address lies inside this layout.
    pub fn contains_key(&self, key: BucketKey) -> bool {
        u32::from(key.sub_x) < self.config.sub_buckets_per_region
            && u32::from(key.sub_y) < self.config.sub_buckets_per_region
            && self.address_from_key(key).is_within(self.max_address())
    }

    /// World rectangle `(min, max)` covered by a bucket.
    pub fn bucket_bounds(&self, key: BucketKey) -> (Vec2, Vec2) {
        let address = self.address_from_key(key);
        let size = self.config.bucket_size;
        let min = self.config.origin + Vec2::new(address.x as f32, address.y as f32) * size;
        (min, min + Vec2::splat(size))
    }

    pub fn bucket_center(&self, key: BucketKey) -> Vec2 {
        let (min, max) = self.bucket_bounds(key);
        (min + max) * 0.5
    }
}
