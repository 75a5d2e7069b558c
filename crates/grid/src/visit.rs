use cellspace_common::{CategoryMask, ObjectCategory};
use glam::Vec2;

use crate::area::QueryArea;
use crate::key::BucketKey;
use crate::store::{Anchor, BucketStore};

/// Applies an operation to every object of the requested categories found in
/// a range of buckets.
///
/// Operations return `Result<(), E>`. The first error stops the sweep and is
/// handed back unchanged; objects already visited stay visited. On success the
/// number of objects the operation was applied to is returned.
///
/// Visiting order across buckets carries no meaning. Within one container it
/// follows the container's own order.
pub struct Dispatcher<'m, S> {
    store: &'m S,
}

impl<'m, S: BucketStore> Dispatcher<'m, S> {
    pub fn new(store: &'m S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'m S {
        self.store
    }

    /// Sweep every bucket of `area`. A degenerate area is a no-op.
    ///
    /// The area is clamped to the world first; an area lying wholly past the
    /// last bucket sweeps nothing.
    pub fn visit<E, F>(&self, area: QueryArea, categories: CategoryMask, mut operation: F) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        let layout = self.store.layout();
        let Some(area) = area.clamped(layout.max_address()) else {
            tracing::trace!(?area, "area lies outside the world");
            return Ok(0);
        };
        if area.is_empty() {
            return Ok(0);
        }
        let _span = tracing::trace_span!("visit_area", ?categories).entered();

        let mut visited = 0;
        for address in area.addresses() {
            visited += self.visit_bucket(layout.key_from_address(address), categories, &mut operation)?;
        }

        tracing::trace!(buckets = area.bucket_count(), visited, "sweep complete");
        Ok(visited)
    }

    /// Sweep every container of one bucket. A key outside the layout visits
    /// nothing.
    pub fn visit_bucket<E, F>(&self, key: BucketKey, categories: CategoryMask, operation: &mut F) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        let store: &'m S = self.store;
        if !store.layout().contains_key(key) {
            tracing::trace!(?key, "bucket key outside the layout");
            return Ok(0);
        }
        let mut visited = 0;
        for category in ObjectCategory::ALL {
            if !categories.includes(category) {
                continue;
            }
            for object in store.objects(key, category) {
                operation(object)?;
                visited += 1;
            }
        }
        Ok(visited)
    }

    /// Sweep the buckets within `radius` of a position.
    ///
    /// A centre outside the world visits nothing. When the radius fits inside
    /// the bucket of the centre, only that bucket is visited.
    pub fn visit_around<E, F>(
        &self,
        center: Vec2,
        radius: f32,
        categories: CategoryMask,
        mut operation: F,
    ) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        let layout = self.store.layout();
        let Ok(standing) = layout.key_of(center) else {
            tracing::trace!(?center, "sweep centre outside the world");
            return Ok(0);
        };

        let area = layout.resolve(center, radius);
        if area.is_empty() {
            return self.visit_bucket(standing, categories, &mut operation);
        }
        self.visit(area, categories, operation)
    }

    /// Sweep around an anchor object, with the radius enlarged by its reach.
    pub fn visit_around_anchor<A, E, F>(
        &self,
        anchor: &A,
        radius: f32,
        categories: CategoryMask,
        operation: F,
    ) -> Result<usize, E>
    where
        A: Anchor + ?Sized,
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around(anchor.position(), radius + anchor.reach(), categories, operation)
    }

    /// Grid-bound objects (creatures, game objects) around an anchor.
    pub fn visit_grid_objects<A, E, F>(&self, anchor: &A, radius: f32, operation: F) -> Result<usize, E>
    where
        A: Anchor + ?Sized,
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around_anchor(anchor, radius, CategoryMask::GRID, operation)
    }

    /// World-bound objects (players) around an anchor.
    pub fn visit_world_objects<A, E, F>(&self, anchor: &A, radius: f32, operation: F) -> Result<usize, E>
    where
        A: Anchor + ?Sized,
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around_anchor(anchor, radius, CategoryMask::WORLD, operation)
    }

    /// Every object around an anchor.
    pub fn visit_all_objects<A, E, F>(&self, anchor: &A, radius: f32, operation: F) -> Result<usize, E>
    where
        A: Anchor + ?Sized,
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around_anchor(anchor, radius, CategoryMask::all(), operation)
    }

    pub fn visit_grid_objects_at<E, F>(&self, position: Vec2, radius: f32, operation: F) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around(position, radius, CategoryMask::GRID, operation)
    }

    pub fn visit_world_objects_at<E, F>(&self, position: Vec2, radius: f32, operation: F) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around(position, radius, CategoryMask::WORLD, operation)
    }

    pub fn visit_all_objects_at<E, F>(&self, position: Vec2, radius: f32, operation: F) -> Result<usize, E>
    where
        F: FnMut(&'m S::Object) -> Result<(), E>,
    {
        self.visit_around(position, radius, CategoryMask::all(), operation)
    }
}

/// True if `position` lies within `radius` of `center`.
///
/// Sweeps work at bucket granularity; callers wanting the exact circle filter
/// the visited objects with this.
pub fn within_radius(center: Vec2, radius: f32, position: Vec2) -> bool {
    radius >= 0.0 && center.distance_squared(position) <= radius * radius
}
