//! Per-cluster summaries, serializable to JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::{BoundingRect, MultiPoint, Point};
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};
use crate::geo_utils::haversine_distance;
use crate::{ClusterConfig, Clustering, Coordinate, CoordinateSet, DistanceMode};

/// Axis-aligned bounds of a cluster's members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Summary of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub center: Coordinate,
    /// Distinct coordinates in the cluster
    pub members: usize,
    /// Observations carrying one of those coordinates
    pub observations: usize,
    pub bounds: Option<MemberBounds>,
    /// Largest member-to-center distance in km, as the metric measures it
    pub max_distance_km: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Summary of a whole clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub radius_km: f64,
    pub distance_mode: DistanceMode,
    pub coordinates: usize,
    pub observations: usize,
    pub cluster_count: usize,
    pub unconverged: usize,
    pub clusters: Vec<ClusterSummary>,
}

impl ClusterReport {
    /// Build a report for a clustering of `coords`.
    pub fn new(coords: &CoordinateSet, clustering: &Clustering, config: &ClusterConfig) -> Self {
        let clusters: Vec<ClusterSummary> = clustering
            .clusters()
            .iter()
            .map(|cluster| {
                let members: Vec<Coordinate> = cluster
                    .members
                    .iter()
                    .filter_map(|&idx| coords.get(idx).copied())
                    .collect();

                let max_distance_km = members
                    .iter()
                    .map(|m| haversine_distance(m, &cluster.center, config.distance_mode))
                    .fold(0.0, f64::max);

                ClusterSummary {
                    id: cluster.id,
                    center: cluster.center,
                    members: members.len(),
                    observations: cluster.members.iter().map(|&idx| coords.occurrences(idx)).sum(),
                    bounds: member_bounds(&members),
                    max_distance_km,
                    iterations: cluster.iterations,
                    converged: cluster.converged,
                }
            })
            .collect();

        Self {
            radius_km: config.radius_km,
            distance_mode: config.distance_mode,
            coordinates: coords.len(),
            observations: coords.total_occurrences(),
            cluster_count: clustering.cluster_count(),
            unconverged: clustering.unconverged_count(),
            clusters,
        }
    }

    /// Clusters ordered by observation count, largest first. Ties keep
    /// creation order.
    pub fn largest(&self, n: usize) -> Vec<&ClusterSummary> {
        let mut sorted: Vec<&ClusterSummary> = self.clusters.iter().collect();
        sorted.sort_by(|a, b| b.observations.cmp(&a.observations));
        sorted.truncate(n);
        sorted
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ClusterError::Configuration(format!("cannot serialize report: {}", e)))
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let file = File::create(path).map_err(|e| ClusterError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(json.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| ClusterError::io(path, e))
    }
}

fn member_bounds(members: &[Coordinate]) -> Option<MemberBounds> {
    let points: MultiPoint<f64> = members
        .iter()
        .map(|c| Point::from(geo::Coord::from(*c)))
        .collect();
    points.bounding_rect().map(|rect| MemberBounds {
        min_x: rect.min().x,
        max_x: rect.max().x,
        min_y: rect.min().y,
        max_y: rect.max().y,
    })
}
