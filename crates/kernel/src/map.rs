use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::convert::Infallible;

use cellspace_common::{CategoryMask, ObjectCategory, ObjectId, ObjectKind, ZoneId, splitmix64};
use cellspace_grid::{
    Anchor, BucketKey, BucketStore, Dispatcher, GridConfig, GridError, GridLayout, RegionCoord,
    within_radius,
};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Errors from map mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),
}

/// An event record produced by every mutation of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    Spawned {
        id: ObjectId,
        kind: ObjectKind,
        position: Vec2,
        bucket: BucketKey,
    },
    Despawned {
        id: ObjectId,
        position: Vec2,
    },
    /// Object moved into another bucket and was re-registered there.
    Relocated {
        id: ObjectId,
        from: BucketKey,
        to: BucketKey,
    },
    /// Object crossed a region boundary.
    RegionChanged {
        id: ObjectId,
        from: RegionCoord,
        to: RegionCoord,
    },
    Stepped {
        tick: u64,
        seed: u64,
    },
}

/// An object living on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec2,
    pub zone: ZoneId,
    /// Radius of the object's outline, added to queries it anchors.
    pub reach: f32,
    bucket: BucketKey,
}

impl MapObject {
    /// Container the object is registered in.
    pub fn category(&self) -> ObjectCategory {
        self.kind.category()
    }

    /// Bucket the object is currently registered in.
    pub fn bucket(&self) -> BucketKey {
        self.bucket
    }
}

impl Anchor for MapObject {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn reach(&self) -> f32 {
        self.reach
    }
}

/// Outcome of moving an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from: BucketKey,
    pub to: BucketKey,
}

impl Relocation {
    /// True if the object entered another bucket.
    pub fn changed_bucket(&self) -> bool {
        self.from.different_bucket(self.to)
    }

    /// True if the object entered another region.
    pub fn changed_region(&self) -> bool {
        self.from.different_region(self.to)
    }
}

/// Objects of one bucket, one container per category.
#[derive(Debug, Clone, Default)]
struct BucketContents {
    grid: Vec<ObjectId>,
    world: Vec<ObjectId>,
}

impl BucketContents {
    fn container(&self, category: ObjectCategory) -> &[ObjectId] {
        match category {
            ObjectCategory::GridBound => &self.grid,
            ObjectCategory::WorldBound => &self.world,
        }
    }

    fn container_mut(&mut self, category: ObjectCategory) -> &mut Vec<ObjectId> {
        match category {
            ObjectCategory::GridBound => &mut self.grid,
            ObjectCategory::WorldBound => &mut self.world,
        }
    }

    fn is_empty(&self) -> bool {
        self.grid.is_empty() && self.world.is_empty()
    }
}

/// Iterator over one bucket container of a [`Map`].
pub struct BucketObjects<'a> {
    ids: std::slice::Iter<'a, ObjectId>,
    objects: &'a BTreeMap<ObjectId, MapObject>,
}

impl<'a> Iterator for BucketObjects<'a> {
    type Item = &'a MapObject;

    fn next(&mut self) -> Option<Self::Item> {
        let objects = self.objects;
        self.ids.by_ref().find_map(|id| {
            let object = objects.get(id);
            if object.is_none() {
                tracing::warn!(?id, "bucket holds an id with no object");
            }
            object
        })
    }
}

/// The authoritative state of one map.
///
/// Objects are kept in a BTreeMap for deterministic iteration; buckets are
/// materialised only while something is registered in them. Players are
/// additionally tracked by identity.
#[derive(Debug, Clone)]
pub struct Map {
    layout: GridLayout,
    objects: BTreeMap<ObjectId, MapObject>,
    buckets: HashMap<BucketKey, BucketContents>,
    players: BTreeSet<ObjectId>,
    tick: u64,
    /// Seed for deterministic RNG. Advanced each step.
    seed: u64,
    /// Append-only event log of all mutations.
    event_log: Vec<MapEvent>,
}

impl Map {
    /// Create an empty map at tick 0 with seed 0.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        Self::with_seed(config, 0)
    }

    /// Create an empty map with a specific RNG seed.
    pub fn with_seed(config: GridConfig, seed: u64) -> Result<Self, GridError> {
        Ok(Self {
            layout: GridLayout::new(config)?,
            objects: BTreeMap::new(),
            buckets: HashMap::new(),
            players: BTreeSet::new(),
            tick: 0,
            seed,
            event_log: Vec::new(),
        })
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of objects on the map.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of players on the map.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of buckets currently holding at least one object.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Player ids in identity order.
    pub fn players(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.players.iter().copied()
    }

    /// Look up an object by id.
    pub fn get(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(&id)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read the event log without draining.
    pub fn events(&self) -> &[MapEvent] {
        &self.event_log
    }

    /// A dispatcher sweeping this map.
    pub fn dispatcher(&self) -> Dispatcher<'_, Self> {
        Dispatcher::new(self)
    }

    /// Place a new object. Positions outside the layout are rejected.
    pub fn spawn(&mut self, kind: ObjectKind, position: Vec2, zone: ZoneId) -> Result<ObjectId, MapError> {
        let id = ObjectId::new();
        self.spawn_with_id(id, kind, position, zone)?;
        Ok(id)
    }

    /// Place an object with a specific id.
    pub fn spawn_with_id(
        &mut self,
        id: ObjectId,
        kind: ObjectKind,
        position: Vec2,
        zone: ZoneId,
    ) -> Result<(), MapError> {
        let bucket = self.layout.key_of(position)?;
        if self.objects.contains_key(&id) {
            self.despawn(id);
        }
        let object = MapObject {
            id,
            kind,
            position,
            zone,
            reach: 0.0,
            bucket,
        };
        self.register(id, object.category(), bucket);
        if object.category() == ObjectCategory::WorldBound {
            self.players.insert(id);
        }
        self.objects.insert(id, object);
        self.event_log.push(MapEvent::Spawned {
            id,
            kind,
            position,
            bucket,
        });
        Ok(())
    }

    /// Remove an object. Returns it if it existed.
    pub fn despawn(&mut self, id: ObjectId) -> Option<MapObject> {
        let object = self.objects.remove(&id)?;
        self.unregister(id, object.category(), object.bucket);
        self.players.remove(&id);
        self.event_log.push(MapEvent::Despawned {
            id,
            position: object.position,
        });
        Some(object)
    }

    /// Move an object, re-registering it only when it enters another bucket.
    ///
    /// A target outside the layout leaves the object where it was.
    pub fn relocate(&mut self, id: ObjectId, position: Vec2) -> Result<Relocation, MapError> {
        let to = self.layout.key_of(position)?;
        let object = self.objects.get_mut(&id).ok_or(MapError::UnknownObject(id))?;
        let from = object.bucket;
        let category = object.category();
        object.position = position;
        object.bucket = to;

        let relocation = Relocation { from, to };
        if relocation.changed_bucket() {
            self.unregister(id, category, from);
            self.register(id, category, to);
            tracing::debug!(?id, ?from, ?to, "object changed bucket");
            self.event_log.push(MapEvent::Relocated { id, from, to });
        }
        if relocation.changed_region() {
            tracing::debug!(?id, from = ?from.region(), to = ?to.region(), "object crossed region");
            self.event_log.push(MapEvent::RegionChanged {
                id,
                from: from.region(),
                to: to.region(),
            });
        }
        Ok(relocation)
    }

    /// Set the outline reach an object adds to queries it anchors. Negative
    /// values are treated as zero.
    pub fn set_reach(&mut self, id: ObjectId, reach: f32) -> Result<(), MapError> {
        let object = self.objects.get_mut(&id).ok_or(MapError::UnknownObject(id))?;
        object.reach = reach.max(0.0);
        Ok(())
    }

    /// True if any player stands in `zone`.
    pub fn zone_has_players(&self, zone: ZoneId) -> bool {
        self.players
            .iter()
            .filter_map(|id| self.objects.get(id))
            .any(|p| p.zone == zone)
    }

    /// Ids of the objects whose position lies within `radius` of the anchor
    /// object (outline reach included), the anchor itself excluded.
    pub fn objects_within(
        &self,
        anchor: ObjectId,
        radius: f32,
        categories: CategoryMask,
    ) -> Result<Vec<ObjectId>, MapError> {
        let anchor = self.get(anchor).ok_or(MapError::UnknownObject(anchor))?;
        let reach = radius + anchor.reach;
        let mut found = Vec::new();
        let Ok(_) = self
            .dispatcher()
            .visit_around_anchor(anchor, radius, categories, |object| {
                if object.id != anchor.id && within_radius(anchor.position, reach, object.position) {
                    found.push(object.id);
                }
                Ok::<_, Infallible>(())
            });
        Ok(found)
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
        self.event_log.push(MapEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
    }

    fn register(&mut self, id: ObjectId, category: ObjectCategory, bucket: BucketKey) {
        self.buckets
            .entry(bucket)
            .or_default()
            .container_mut(category)
            .push(id);
    }

    fn unregister(&mut self, id: ObjectId, category: ObjectCategory, bucket: BucketKey) {
        // `Some(now_empty)` once the id was found and removed.
        let removed = self.buckets.get_mut(&bucket).and_then(|contents| {
            let container = contents.container_mut(category);
            let index = container.iter().position(|other| *other == id)?;
            container.remove(index);
            Some(contents.is_empty())
        });
        debug_assert!(removed.is_some(), "object {id:?} was not registered in {bucket:?}");
        match removed {
            Some(true) => {
                self.buckets.remove(&bucket);
            }
            Some(false) => {}
            None => tracing::warn!(?id, ?bucket, "object missing from its bucket"),
        }
    }
}

impl BucketStore for Map {
    type Object = MapObject;
    type Objects<'a> = BucketObjects<'a>;

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn objects(&self, key: BucketKey, category: ObjectCategory) -> Self::Objects<'_> {
        let ids = self
            .buckets
            .get(&key)
            .map(|contents| contents.container(category))
            .unwrap_or(&[]);
        BucketObjects {
            ids: ids.iter(),
            objects: &self.objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: ZoneId = ZoneId(1);

    fn unit_map() -> Map {
        Map::new(GridConfig::non_negative(1.0, 16, 16)).unwrap()
    }

    #[test]
    fn map_starts_empty() {
        let m = unit_map();
        assert_eq!(m.tick(), 0);
        assert_eq!(m.object_count(), 0);
        assert_eq!(m.bucket_count(), 0);
    }

    #[test]
    fn spawn_registers_in_one_bucket() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::Creature, Vec2::new(3.5, 4.5), ZONE).unwrap();
        let object = m.get(id).unwrap();
        assert_eq!(object.bucket(), m.layout().key_at(3.5, 4.5).unwrap());
        assert_eq!(m.bucket_count(), 1);
        assert_eq!(m.player_count(), 0);

        let in_bucket: Vec<_> = m
            .objects(object.bucket(), ObjectCategory::GridBound)
            .map(|o| o.id)
            .collect();
        assert_eq!(in_bucket, [id]);
        assert_eq!(m.objects(object.bucket(), ObjectCategory::WorldBound).count(), 0);
    }

    #[test]
    fn spawn_outside_the_world_is_rejected() {
        let mut m = unit_map();
        let err = m
            .spawn(ObjectKind::Creature, Vec2::new(-1.0, -1.0), ZONE)
            .unwrap_err();
        assert_eq!(err, MapError::Grid(GridError::PositionOutOfBounds { x: -1.0, y: -1.0 }));
        assert_eq!(m.object_count(), 0);
        assert!(m.events().is_empty());
    }

    #[test]
    fn every_object_stays_registered_exactly_once() {
        let mut m = unit_map();
        let mut live = Vec::new();
        for i in 0..12 {
            let kind = if i % 3 == 0 { ObjectKind::Player } else { ObjectKind::Creature };
            let id = m.spawn(kind, Vec2::new(i as f32 * 7.5, 3.0), ZONE).unwrap();
            live.push(id);
        }
        for (i, id) in live.iter().enumerate() {
            m.relocate(*id, Vec2::new(100.0 - i as f32 * 4.0, 50.5)).unwrap();
        }
        for id in live.drain(..4) {
            m.despawn(id);
        }
        m.spawn_with_id(live[0], ObjectKind::GameObject, Vec2::new(1.0, 1.0), ZONE).unwrap();

        for id in &live {
            let object = m.get(*id).unwrap();
            let hits = m
                .objects(object.bucket(), object.category())
                .filter(|o| o.id == *id)
                .count();
            assert_eq!(hits, 1, "{id:?} registered {hits} times");
        }
        let registered: usize = m
            .buckets
            .values()
            .map(|b| b.grid.len() + b.world.len())
            .sum();
        assert_eq!(registered, m.object_count());
        assert_eq!(m.object_count(), live.len());
    }

    #[test]
    fn players_go_to_the_registry_and_world_container() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::Player, Vec2::new(10.0, 10.0), ZONE).unwrap();
        assert_eq!(m.player_count(), 1);
        assert_eq!(m.players().collect::<Vec<_>>(), [id]);
        let bucket = m.get(id).unwrap().bucket();
        assert_eq!(m.objects(bucket, ObjectCategory::WorldBound).count(), 1);
        assert!(m.zone_has_players(ZONE));
        assert!(!m.zone_has_players(ZoneId(2)));

        m.despawn(id);
        assert_eq!(m.player_count(), 0);
        assert!(!m.zone_has_players(ZONE));
        assert_eq!(m.bucket_count(), 0);
    }

    #[test]
    fn relocate_within_bucket_keeps_registration() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::Creature, Vec2::new(3.1, 3.1), ZONE).unwrap();
        let r = m.relocate(id, Vec2::new(3.9, 3.9)).unwrap();
        assert!(!r.changed_bucket());
        assert!(!r.changed_region());
        assert_eq!(m.get(id).unwrap().position, Vec2::new(3.9, 3.9));
        // spawn only
        assert_eq!(m.events().len(), 1);
    }

    #[test]
    fn relocate_across_buckets_and_regions() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::Creature, Vec2::new(3.5, 3.5), ZONE).unwrap();
        let old = m.get(id).unwrap().bucket();

        let r = m.relocate(id, Vec2::new(4.5, 3.5)).unwrap();
        assert!(r.changed_bucket());
        assert!(!r.changed_region());
        assert_eq!(m.objects(old, ObjectCategory::GridBound).count(), 0);
        assert_eq!(m.objects(r.to, ObjectCategory::GridBound).count(), 1);
        assert_eq!(m.bucket_count(), 1);

        let r = m.relocate(id, Vec2::new(20.5, 3.5)).unwrap();
        assert!(r.changed_region());
        assert!(matches!(
            m.events().last(),
            Some(MapEvent::RegionChanged { from, to, .. })
                if from.x == 0 && to.x == 1
        ));
    }

    #[test]
    fn relocate_out_of_bounds_leaves_object_in_place() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::Creature, Vec2::new(3.5, 3.5), ZONE).unwrap();
        assert!(m.relocate(id, Vec2::new(500.0, 3.5)).is_err());
        assert_eq!(m.get(id).unwrap().position, Vec2::new(3.5, 3.5));
        let ghost = ObjectId::new();
        assert_eq!(m.relocate(ghost, Vec2::ZERO), Err(MapError::UnknownObject(ghost)));
    }

    #[test]
    fn objects_within_filters_the_exact_circle() {
        let mut m = unit_map();
        let caster = m.spawn(ObjectKind::Player, Vec2::new(50.5, 50.5), ZONE).unwrap();
        let near = m.spawn(ObjectKind::Creature, Vec2::new(52.0, 50.5), ZONE).unwrap();
        let corner = m.spawn(ObjectKind::Creature, Vec2::new(53.4, 53.4), ZONE).unwrap();
        let other_player = m.spawn(ObjectKind::Player, Vec2::new(50.5, 48.0), ZONE).unwrap();

        let mut found = m.objects_within(caster, 3.0, CategoryMask::all()).unwrap();
        found.sort();
        let mut expected = vec![near, other_player];
        expected.sort();
        assert_eq!(found, expected);
        assert!(!found.contains(&corner));

        let grid_only = m.objects_within(caster, 3.0, CategoryMask::GRID).unwrap();
        assert_eq!(grid_only, [near]);

        m.set_reach(caster, 2.0).unwrap();
        let found = m.objects_within(caster, 3.0, CategoryMask::GRID).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn step_advances_tick_and_seed() {
        let mut a = Map::with_seed(GridConfig::default(), 42).unwrap();
        let mut b = Map::with_seed(GridConfig::default(), 42).unwrap();
        for _ in 0..10 {
            a.step();
            b.step();
        }
        assert_eq!(a.tick(), 10);
        assert_eq!(a.seed(), b.seed());
        assert_ne!(a.seed(), 42);
    }

    #[test]
    fn drain_events_clears_log() {
        let mut m = unit_map();
        let id = m.spawn(ObjectKind::GameObject, Vec2::new(1.0, 1.0), ZONE).unwrap();
        m.step();
        m.despawn(id);
        let events = m.drain_events();
        assert_eq!(events.len(), 3);
        assert!(m.events().is_empty());
    }
}
