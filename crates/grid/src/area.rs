use glam::Vec2;

use crate::key::BucketAddress;
use crate::layout::GridLayout;

/// Inclusive rectangle of buckets to sweep for one query.
///
/// An area whose bounds coincide is degenerate and means "nothing to sweep";
/// [`QueryArea::EMPTY`] is the canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryArea {
    pub low_bound: BucketAddress,
    pub high_bound: BucketAddress,
}

impl QueryArea {
    pub const EMPTY: QueryArea = QueryArea {
        low_bound: BucketAddress::new(0, 0),
        high_bound: BucketAddress::new(0, 0),
    };

    /// Build an area from two corners in any order.
    pub fn new(a: BucketAddress, b: BucketAddress) -> Self {
        Self {
            low_bound: BucketAddress::new(a.x.min(b.x), a.y.min(b.y)),
            high_bound: BucketAddress::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Area around a point with no anchor object, e.g. a ground-targeted effect.
    pub fn around(layout: &GridLayout, x: f32, y: f32, radius: f32) -> Self {
        layout.resolve(Vec2::new(x, y), radius)
    }

    /// True when the area is degenerate, or inverted on either axis.
    pub fn is_empty(&self) -> bool {
        self.low_bound == self.high_bound || !self.low_bound.is_within(self.high_bound)
    }

    pub fn contains(&self, address: BucketAddress) -> bool {
        (self.low_bound.x..=self.high_bound.x).contains(&address.x)
            && (self.low_bound.y..=self.high_bound.y).contains(&address.y)
    }

    /// Columns spanned, zero when inverted.
    pub fn width(&self) -> u32 {
        span(self.low_bound.x, self.high_bound.x)
    }

    /// Rows spanned, zero when inverted.
    pub fn height(&self) -> u32 {
        span(self.low_bound.y, self.high_bound.y)
    }

    /// The area with both corners clamped to `max`. `None` when the low corner
    /// already lies past `max`, i.e. nothing of the area is inside the world.
    pub fn clamped(&self, max: BucketAddress) -> Option<Self> {
        self.low_bound.is_within(max).then(|| Self {
            low_bound: self.low_bound,
            high_bound: self.high_bound.normalize(max),
        })
    }

    /// Buckets a sweep of this area touches (zero when degenerate).
    pub fn bucket_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width() as usize * self.height() as usize
        }
    }

    /// Every address in the rectangle, x outer, y inner.
    pub fn addresses(&self) -> impl Iterator<Item = BucketAddress> + use<> {
        let (low, high) = (self.low_bound, self.high_bound);
        (low.x..=high.x).flat_map(move |x| (low.y..=high.y).map(move |y| BucketAddress::new(x, y)))
    }
}

fn span(low: u32, high: u32) -> u32 {
    high.checked_sub(low).map_or(0, |d| d.saturating_add(1))
}

impl GridLayout {
    /// Resolve a radius query into the buckets that may hold a match.
    ///
    /// Uses the bounding square of the circle, so some returned buckets may hold
    /// nothing within `radius`; no bucket holding a point strictly inside the
    /// circle is ever left out. Bounds are clamped to the world. A square lying
    /// wholly outside the world, or non-finite input, yields [`QueryArea::EMPTY`].
    /// A radius of zero or less collapses to the single bucket of the centre.
    pub fn resolve(&self, center: Vec2, radius: f32) -> QueryArea {
        if !radius.is_finite() {
            return QueryArea::EMPTY;
        }
        let radius = radius.max(0.0);
        let origin = self.config().origin;

        let corners = (
            self.axis_index(center.x - radius, origin.x),
            self.axis_index(center.y - radius, origin.y),
            self.axis_index(center.x + radius, origin.x),
            self.axis_index(center.y + radius, origin.y),
        );
        let (Some(low_x), Some(low_y), Some(high_x), Some(high_y)) = corners else {
            return QueryArea::EMPTY;
        };

        let max = i64::from(self.dimension() - 1);
        if high_x < 0 || high_y < 0 || low_x > max || low_y > max {
            tracing::trace!(?center, radius, "query square lies outside the world");
            return QueryArea::EMPTY;
        }

        QueryArea {
            low_bound: BucketAddress::new(self.clamp_index(low_x), self.clamp_index(low_y)),
            high_bound: BucketAddress::new(self.clamp_index(high_x), self.clamp_index(high_y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GridConfig;

    fn unit_layout() -> GridLayout {
        GridLayout::new(GridConfig::non_negative(1.0, 256, 1)).unwrap()
    }

    #[test]
    fn resolve_bounding_square() {
        let layout = unit_layout();
        let area = layout.resolve(Vec2::new(10.0, 10.0), 2.5);
        assert_eq!(area.low_bound, BucketAddress::new(7, 7));
        assert_eq!(area.high_bound, BucketAddress::new(12, 12));
        assert_eq!(area.bucket_count(), 36);
        assert!(!area.is_empty());
    }

    #[test]
    fn around_matches_resolve() {
        let layout = unit_layout();
        assert_eq!(
            QueryArea::around(&layout, 40.0, 3.0, 7.0),
            layout.resolve(Vec2::new(40.0, 3.0), 7.0)
        );
    }

    #[test]
    fn clamps_to_world_edges() {
        let layout = unit_layout();
        let area = layout.resolve(Vec2::new(1.0, 254.0), 10.0);
        assert_eq!(area.low_bound, BucketAddress::new(0, 244));
        assert_eq!(area.high_bound, BucketAddress::new(11, 255));
    }

    #[test]
    fn boundary_clamp_at_world_max() {
        let layout = GridLayout::new(GridConfig::default()).unwrap();
        let max = layout.max_address();
        for radius in [0.01, 1.0, 66.0, 500.0, 1.0e6] {
            let area = layout.resolve(layout.world_max(), radius);
            assert_eq!(area.high_bound, max, "radius {radius}");
            assert!(area.low_bound.is_within(area.high_bound));
        }
    }

    #[test]
    fn zero_or_negative_radius_is_degenerate() {
        let layout = unit_layout();
        for radius in [0.0, -3.0] {
            let area = layout.resolve(Vec2::new(10.5, 20.5), radius);
            assert!(area.is_empty());
            assert_eq!(area.low_bound, BucketAddress::new(10, 20));
        }
    }

    #[test]
    fn square_outside_the_world_is_empty() {
        let layout = unit_layout();
        assert_eq!(layout.resolve(Vec2::new(-50.0, 10.0), 5.0), QueryArea::EMPTY);
        assert_eq!(layout.resolve(Vec2::new(10.0, 900.0), 5.0), QueryArea::EMPTY);
        assert_eq!(layout.resolve(Vec2::new(f32::NAN, 10.0), 5.0), QueryArea::EMPTY);
        assert_eq!(layout.resolve(Vec2::new(10.0, 10.0), f32::INFINITY), QueryArea::EMPTY);
    }

    #[test]
    fn area_contains_every_point_inside_the_circle() {
        let layout = GridLayout::new(GridConfig::centered(3.0, 8, 8)).unwrap();
        let centers = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-95.9, 10.2),
            Vec2::new(47.3, -90.0),
            Vec2::new(1.5, 1.5),
        ];
        for center in centers {
            for radius in [0.5, 2.9, 3.0, 7.25, 20.0] {
                let area = layout.resolve(center, radius);
                for i in 0..64 {
                    let angle = i as f32 / 64.0 * std::f32::consts::TAU;
                    for scale in [0.0, 0.5, 0.999] {
                        let p = center + Vec2::new(angle.cos(), angle.sin()) * radius * scale;
                        let Ok(address) = layout.address_of(p) else {
                            continue;
                        };
                        assert!(
                            area.contains(address),
                            "{p:?} missed by {area:?} (center {center:?}, r {radius})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn new_orders_corners() {
        let area = QueryArea::new(BucketAddress::new(5, 1), BucketAddress::new(2, 9));
        assert_eq!(area.low_bound, BucketAddress::new(2, 1));
        assert_eq!(area.high_bound, BucketAddress::new(5, 9));
        assert_eq!(area.addresses().count(), area.bucket_count());
        assert_eq!(area.addresses().next(), Some(BucketAddress::new(2, 1)));
    }

    #[test]
    fn inverted_area_spans_nothing() {
        let area = QueryArea {
            low_bound: BucketAddress::new(8, 2),
            high_bound: BucketAddress::new(3, 9),
        };
        assert_eq!(area.width(), 0);
        assert_eq!(area.height(), 8);
        assert_eq!(area.bucket_count(), 0);
        assert!(area.is_empty());
        assert_eq!(area.addresses().count(), 0);
    }

    #[test]
    fn clamped_cuts_the_area_at_the_world_edge() {
        let max = BucketAddress::new(255, 255);
        let straddling = QueryArea::new(BucketAddress::new(250, 10), BucketAddress::new(300, 12));
        let inside = straddling.clamped(max).unwrap();
        assert_eq!(inside.low_bound, BucketAddress::new(250, 10));
        assert_eq!(inside.high_bound, BucketAddress::new(255, 12));

        let beyond = QueryArea::new(BucketAddress::new(299, 0), BucketAddress::new(301, 1));
        assert_eq!(beyond.clamped(max), None);
    }
}
