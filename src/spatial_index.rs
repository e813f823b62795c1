//! Spatial index over the coordinates that are still unassigned.
//!
//! Points live in the metric's own space (absolute values in hemisphere-blind
//! mode). Queries return a superset of the coordinates within the radius; the
//! caller applies the exact metric.

use rstar::{AABB, RTree, RTreeObject};

use crate::geo_utils::latitude_band_degrees;
use crate::{Coordinate, DistanceMode};

/// Coordinate wrapper for R-tree indexing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedCoordinate {
    pub idx: usize,
    pub position: [f64; 2],
}

impl RTreeObject for IndexedCoordinate {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// R-tree of unassigned coordinates.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedCoordinate>,
    mode: DistanceMode,
    /// The latitude band bound only holds while every `y` is a real latitude.
    banded: bool,
}

impl SpatialIndex {
    /// Index every coordinate, keyed by its position in `coords`.
    pub fn new(coords: &[Coordinate], mode: DistanceMode) -> Self {
        let entries: Vec<IndexedCoordinate> = coords
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let p = mode.project(*c);
                IndexedCoordinate {
                    idx,
                    position: [p.x, p.y],
                }
            })
            .collect();

        let banded = entries
            .iter()
            .all(|e| (-90.0..=90.0).contains(&e.position[1]));

        Self {
            tree: RTree::bulk_load(entries),
            mode,
            banded,
        }
    }

    /// Indices of unassigned coordinates that may lie within `radius_km` of
    /// `center`, ascending.
    pub fn candidates(&self, center: &Coordinate, radius_km: f64) -> Vec<usize> {
        if radius_km.is_nan() || radius_km < 0.0 {
            return Vec::new();
        }

        let mut found: Vec<usize> = if self.banded {
            let c = self.mode.project(*center);
            // Small slack so rounding in the band never drops a boundary point.
            let band = latitude_band_degrees(radius_km) * (1.0 + 1e-9) + 1e-12;
            let envelope =
                AABB::from_corners([f64::MIN, c.y - band], [f64::MAX, c.y + band]);
            self.tree
                .locate_in_envelope(&envelope)
                .map(|e| e.idx)
                .collect()
        } else {
            self.tree.iter().map(|e| e.idx).collect()
        };

        found.sort_unstable();
        found
    }

    /// Drop an assigned coordinate from the index.
    pub fn remove(&mut self, idx: usize, coordinate: &Coordinate) -> bool {
        let p = self.mode.project(*coordinate);
        self.tree
            .remove(&IndexedCoordinate {
                idx,
                position: [p.x, p.y],
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
