//! Iterative seed-and-grow cluster refinement.
//!
//! Seeds are visited in insertion order. Each unassigned seed starts a
//! [`Refinement`]: every iteration collects the unassigned coordinates within
//! the radius of the current center into `marked`, then moves the center to
//! the rounded mean of `marked`. `marked` is never cleared, so a coordinate
//! seen in several iterations is counted several times and keeps pulling the
//! mean toward the earlier centers. The refinement stops once the center no
//! longer moves, or after `max_iterations`.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::geo_utils::{haversine_distance, rounded_mean};
use crate::spatial_index::SpatialIndex;
use crate::{ClusterConfig, Coordinate, CoordinateSet};

/// State of one cluster's refinement.
///
/// Owns the `marked` accumulator for exactly as long as the cluster is being
/// refined. Can be driven one [`step`](Refinement::step) at a time.
#[derive(Debug, Clone)]
pub struct Refinement {
    seed: usize,
    center: Coordinate,
    marked: Vec<usize>,
    iterations: u32,
    converged: bool,
}

impl Refinement {
    pub fn new(seed: usize, seed_coordinate: Coordinate) -> Self {
        Self {
            seed,
            center: seed_coordinate,
            marked: Vec::new(),
            iterations: 0,
            converged: false,
        }
    }

    /// Run one iteration. Returns true once the center has stopped moving.
    pub fn step(
        &mut self,
        coords: &[Coordinate],
        index: &SpatialIndex,
        config: &ClusterConfig,
    ) -> bool {
        if self.converged {
            return true;
        }

        for idx in index.candidates(&self.center, config.radius_km) {
            let dist = haversine_distance(&self.center, &coords[idx], config.distance_mode);
            if dist <= config.radius_km {
                self.marked.push(idx);
            }
        }

        // Negative radius: nothing matches, not even the seed itself.
        if self.marked.is_empty() {
            self.marked.push(self.seed);
        }

        self.iterations += 1;

        let new_center = rounded_mean(
            self.marked.iter().map(|&idx| &coords[idx]),
            config.center_decimals,
        )
        .unwrap_or(self.center);

        if new_center == self.center {
            self.converged = true;
        } else {
            self.center = new_center;
        }
        self.converged
    }

    /// Step until converged or until `max_iterations` steps have run.
    /// Always runs at least one step.
    pub fn run(mut self, coords: &[Coordinate], index: &SpatialIndex, config: &ClusterConfig) -> Self {
        loop {
            if self.step(coords, index, config) || self.iterations >= config.max_iterations {
                return self;
            }
        }
    }

    pub fn seed(&self) -> usize {
        self.seed
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Every entry collected so far, repeats included.
    pub fn marked(&self) -> &[usize] {
        &self.marked
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Distinct marked indices, ascending.
    pub fn members(&self) -> Vec<usize> {
        let mut members = self.marked.clone();
        members.sort_unstable();
        members.dedup();
        members
    }
}

/// A finished cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Position in creation order
    pub id: usize,
    /// Representative written in place of every member
    pub center: Coordinate,
    /// Indices into the clustered [`CoordinateSet`], ascending
    pub members: Vec<usize>,
    pub iterations: u32,
    pub converged: bool,
}

/// Result of clustering a [`CoordinateSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    clusters: Vec<Cluster>,
    /// Cluster id per coordinate index
    labels: Vec<usize>,
    assignment: HashMap<Coordinate, usize>,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster id of the coordinate at `idx` in the clustered set.
    pub fn label(&self, idx: usize) -> Option<usize> {
        self.labels.get(idx).copied()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Representative for a coordinate of the clustered set.
    pub fn representative(&self, coordinate: &Coordinate) -> Option<Coordinate> {
        self.assignment
            .get(coordinate)
            .map(|&id| self.clusters[id].center)
    }

    /// Cluster centers in creation order.
    pub fn centers(&self) -> Vec<Coordinate> {
        self.clusters.iter().map(|c| c.center).collect()
    }

    /// The full coordinate → representative map.
    pub fn assignment(&self) -> HashMap<Coordinate, Coordinate> {
        self.assignment
            .iter()
            .map(|(coord, &id)| (*coord, self.clusters[id].center))
            .collect()
    }

    /// Clusters that hit the iteration bound.
    pub fn unconverged_count(&self) -> usize {
        self.clusters.iter().filter(|c| !c.converged).count()
    }
}

/// Cluster with the default configuration and the given radius.
///
/// # Example
/// ```
/// use geoanchor::{Coordinate, CoordinateSet, cluster};
///
/// let coords = CoordinateSet::from_coordinates([
///     Coordinate::new(1.0, 1.0),
///     Coordinate::new(50.0, 50.0),
/// ]);
/// let clustering = cluster(0.0, &coords);
/// assert_eq!(clustering.cluster_count(), 2);
/// assert_eq!(
///     clustering.representative(&Coordinate::new(1.0, 1.0)),
///     Some(Coordinate::new(1.0, 1.0))
/// );
/// ```
pub fn cluster(radius_km: f64, coordinates: &CoordinateSet) -> Clustering {
    cluster_with_config(coordinates, &ClusterConfig::with_radius(radius_km))
}

/// Partition `coordinates` into clusters.
///
/// Never fails: an empty set gives an empty clustering and a radius at or
/// below zero gives one singleton cluster per coordinate.
pub fn cluster_with_config(coordinates: &CoordinateSet, config: &ClusterConfig) -> Clustering {
    let points = coordinates.as_slice();
    let mut index = SpatialIndex::new(points, config.distance_mode);
    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut clusters: Vec<Cluster> = Vec::new();

    for seed in 0..points.len() {
        if labels[seed].is_some() {
            continue;
        }

        let refinement = Refinement::new(seed, points[seed]).run(points, &index, config);
        let id = clusters.len();
        let members = refinement.members();

        for &m in &members {
            labels[m] = Some(id);
            index.remove(m, &points[m]);
        }

        if refinement.is_converged() {
            debug!(
                "cluster {} seeded at ({}, {}): {} members, center ({}, {}) after {} iterations",
                id,
                points[seed].x,
                points[seed].y,
                members.len(),
                refinement.center().x,
                refinement.center().y,
                refinement.iterations()
            );
        } else {
            warn!(
                "cluster {} seeded at ({}, {}) did not converge within {} iterations, using ({}, {})",
                id,
                points[seed].x,
                points[seed].y,
                config.max_iterations,
                refinement.center().x,
                refinement.center().y
            );
        }

        clusters.push(Cluster {
            id,
            center: refinement.center(),
            members,
            iterations: refinement.iterations(),
            converged: refinement.is_converged(),
        });
    }

    // Every seed lands in its own cluster, so no label is left empty.
    let labels: Vec<usize> = labels.into_iter().flatten().collect();
    debug_assert_eq!(labels.len(), points.len());

    let assignment: HashMap<Coordinate, usize> = points
        .iter()
        .zip(labels.iter())
        .map(|(coord, &id)| (*coord, id))
        .collect();

    info!(
        "Clustered {} coordinates into {} clusters (radius {} km)",
        points.len(),
        clusters.len(),
        config.radius_km
    );

    Clustering {
        clusters,
        labels,
        assignment,
    }
}
