//! Per-mesh spatial bookkeeping.
//!
//! A flat table of model-space bounding boxes with overlap, containment,
//! and nearest queries. The model updates it as a side effect of applying
//! commands; edit operations only read it.

use hashbrown::HashMap;

use carve_types::{Aabb, MeshId, Point3};

/// Index from mesh id to its model-space bounding box.
#[derive(Debug, Clone, Default)]
pub struct MeshIndex {
    items: HashMap<MeshId, Aabb>,
}

impl MeshIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item with the given bounds.
    ///
    /// Overwrites any existing entry with the same id.
    pub fn add_item(&mut self, id: MeshId, bounds: Aabb) {
        self.items.insert(id, bounds);
    }

    /// Update an item's bounds.
    pub fn update_item(&mut self, id: MeshId, bounds: Aabb) {
        self.items.insert(id, bounds);
    }

    /// Remove an item.
    pub fn remove_item(&mut self, id: MeshId) {
        self.items.remove(&id);
    }

    /// Whether the index holds an item with the given id.
    #[must_use]
    pub fn has_item(&self, id: MeshId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of items whose bounds intersect the test box.
    #[must_use]
    pub fn intersected_by(&self, test: &Aabb) -> Vec<MeshId> {
        let mut ids: Vec<MeshId> = self
            .items
            .iter()
            .filter(|(_, bounds)| bounds.intersects(test))
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of items fully contained by the test box.
    #[must_use]
    pub fn contained_by(&self, test: &Aabb) -> Vec<MeshId> {
        let mut ids: Vec<MeshId> = self
            .items
            .iter()
            .filter(|(_, bounds)| test.contains_aabb(bounds))
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The item whose bounds are nearest to `point`, within `radius`.
    #[must_use]
    pub fn nearest_to(&self, point: &Point3<f64>, radius: f64) -> Option<MeshId> {
        let radius_squared = radius * radius;
        self.items
            .iter()
            .map(|(&id, bounds)| (id, bounds.distance_squared_to(point)))
            .filter(|(_, d)| *d <= radius_squared)
            .min_by(|(a_id, a), (b_id, b)| {
                a.total_cmp(b).then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_at(x: f64) -> Aabb {
        Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    #[test]
    fn add_update_remove() {
        let mut index = MeshIndex::new();
        index.add_item(MeshId(0), box_at(0.0));
        assert!(index.has_item(MeshId(0)));
        assert_eq!(index.len(), 1);

        index.update_item(MeshId(0), box_at(5.0));
        assert_eq!(index.intersected_by(&box_at(5.0)), vec![MeshId(0)]);

        index.remove_item(MeshId(0));
        assert!(index.is_empty());
    }

    #[test]
    fn intersected_and_contained() {
        let mut index = MeshIndex::new();
        index.add_item(MeshId(0), box_at(0.0));
        index.add_item(MeshId(1), box_at(3.0));

        let test = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(2.0, 2.0, 2.0));
        assert_eq!(index.intersected_by(&test), vec![MeshId(0)]);
        assert_eq!(index.contained_by(&test), vec![MeshId(0)]);

        let wide = Aabb::new(Point3::new(-10.0, -10.0, -10.0), Point3::new(10.0, 10.0, 10.0));
        assert_eq!(index.intersected_by(&wide).len(), 2);
    }

    #[test]
    fn nearest_respects_radius() {
        let mut index = MeshIndex::new();
        index.add_item(MeshId(0), box_at(0.0));
        index.add_item(MeshId(1), box_at(10.0));

        let probe = Point3::new(2.5, 0.5, 0.5);
        assert_eq!(index.nearest_to(&probe, 2.0), Some(MeshId(0)));
        assert_eq!(index.nearest_to(&probe, 0.5), None);
    }
}
