use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an object living on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a zone (an area with its own environmental state, e.g. weather).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// How an object is resolved when the index is swept.
///
/// Grid-bound objects are only reachable through the spatial buckets.
/// World-bound objects are additionally tracked by a per-map registry keyed
/// by identity, but range queries still reach them through their bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    GridBound,
    WorldBound,
}

impl ObjectCategory {
    /// Every category, in container visiting order.
    pub const ALL: [ObjectCategory; 2] = [ObjectCategory::GridBound, ObjectCategory::WorldBound];

    /// The single-bit mask selecting this category.
    pub const fn mask(self) -> CategoryMask {
        match self {
            Self::GridBound => CategoryMask::GRID,
            Self::WorldBound => CategoryMask::WORLD,
        }
    }
}

bitflags::bitflags! {
    /// Set of categories a sweep touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CategoryMask: u8 {
        const GRID = 1 << 0;
        const WORLD = 1 << 1;
    }
}

impl CategoryMask {
    pub fn includes(self, category: ObjectCategory) -> bool {
        self.contains(category.mask())
    }
}

/// Concrete kind of a map object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Creature,
    GameObject,
    DynamicObject,
    Corpse,
    Player,
}

impl ObjectKind {
    pub const fn category(self) -> ObjectCategory {
        match self {
            Self::Player => ObjectCategory::WorldBound,
            Self::Creature | Self::GameObject | Self::DynamicObject | Self::Corpse => {
                ObjectCategory::GridBound
            }
        }
    }
}
