use cellspace_common::ObjectCategory;
use glam::Vec2;

use crate::key::BucketKey;
use crate::layout::GridLayout;

/// Bucket contents as seen by the dispatcher.
///
/// Implemented by whatever owns the objects of a map. Every representable key
/// must yield a well-formed container per category, empty when nothing is
/// registered there; storage for empty buckets need not exist. The dispatcher
/// only borrows from the store while a sweep runs.
pub trait BucketStore {
    type Object;

    /// Iterator over one container, in its native order.
    type Objects<'a>: Iterator<Item = &'a Self::Object>
    where
        Self: 'a;

    /// Layout of the map: world bounds and the bucket codec.
    fn layout(&self) -> &GridLayout;

    /// Objects of one category registered in the bucket `key`.
    fn objects(&self, key: BucketKey, category: ObjectCategory) -> Self::Objects<'_>;
}

/// Something whose position seeds a proximity query.
pub trait Anchor {
    fn position(&self) -> Vec2;

    /// Extra reach added to the query radius, so that large objects find
    /// neighbours touching their outline rather than their centre.
    fn reach(&self) -> f32 {
        0.0
    }
}

impl Anchor for Vec2 {
    fn position(&self) -> Vec2 {
        *self
    }
}
