use serde::{Deserialize, Serialize};

/// Position of a bucket along both axes of the flattened bucket space.
///
/// Each axis index is `region * sub_buckets_per_region + sub`, so the region
/// and sub-bucket of an address are recovered by a fixed-radix split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BucketAddress {
    pub x: u32,
    pub y: u32,
}

impl BucketAddress {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// True if both indices are at or below `max`.
    pub fn is_within(self, max: BucketAddress) -> bool {
        self.x <= max.x && self.y <= max.y
    }

    /// Clamp both indices to `max`.
    pub fn normalize(self, max: BucketAddress) -> Self {
        Self {
            x: self.x.min(max.x),
            y: self.y.min(max.y),
        }
    }
}

/// Coordinate of a region, the coarse partition made of many buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionCoord {
    pub x: u8,
    pub y: u8,
}

/// Packed identity of one bucket: region and sub-bucket index on each axis.
///
/// Identity, equality and hashing all go through [`BucketKey::packed`], so a
/// key is usable directly as a map key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BucketKey {
    pub region_x: u8,
    pub region_y: u8,
    pub sub_x: u8,
    pub sub_y: u8,
}

impl BucketKey {
    pub const fn new(region_x: u8, region_y: u8, sub_x: u8, sub_y: u8) -> Self {
        Self {
            region_x,
            region_y,
            sub_x,
            sub_y,
        }
    }

    /// Split a flattened address into region and sub-bucket fields.
    ///
    /// `radix` is the number of sub-buckets per region per axis. The caller
    /// guarantees the address fits, i.e. `index / radix < 256` and `radix <= 256`.
    pub fn from_address(address: BucketAddress, radix: u32) -> Self {
        debug_assert!(radix > 0 && radix <= 256);
        debug_assert!(address.x / radix < 256 && address.y / radix < 256);
        Self {
            region_x: (address.x / radix) as u8,
            region_y: (address.y / radix) as u8,
            sub_x: (address.x % radix) as u8,
            sub_y: (address.y % radix) as u8,
        }
    }

    /// Recombine the fields into a flattened address. Exact inverse of
    /// [`BucketKey::from_address`] for the same radix.
    pub fn to_address(self, radix: u32) -> BucketAddress {
        BucketAddress {
            x: u32::from(self.region_x) * radix + u32::from(self.sub_x),
            y: u32::from(self.region_y) * radix + u32::from(self.sub_y),
        }
    }

    /// The 32-bit identity: `region_x | region_y << 8 | sub_x << 16 | sub_y << 24`.
    pub const fn packed(self) -> u32 {
        u32::from_le_bytes([self.region_x, self.region_y, self.sub_x, self.sub_y])
    }

    pub const fn from_packed(value: u32) -> Self {
        let [region_x, region_y, sub_x, sub_y] = value.to_le_bytes();
        Self {
            region_x,
            region_y,
            sub_x,
            sub_y,
        }
    }

    /// True if any field differs.
    pub fn different_bucket(self, other: BucketKey) -> bool {
        self.packed() != other.packed()
    }

    /// True if the region fields differ. Cheaper check used when only the
    /// coarse boundary matters.
    pub fn different_region(self, other: BucketKey) -> bool {
        self.region_x != other.region_x || self.region_y != other.region_y
    }

    pub fn region(self) -> RegionCoord {
        RegionCoord {
            x: self.region_x,
            y: self.region_y,
        }
    }
}

impl PartialEq for BucketKey {
    fn eq(&self, other: &Self) -> bool {
        self.packed() == other.packed()
    }
}

impl Eq for BucketKey {}

impl std::hash::Hash for BucketKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.packed().hash(state);
    }
}
