//! # geoanchor
//!
//! Reduces noisy GPS start/end observations to a small vocabulary of
//! canonical "anchor" coordinates.
//!
//! This library provides:
//! - A codec for `segment_id<TAB>x y` observation lines
//! - A haversine distance metric (hemisphere-blind by default)
//! - An iterative seed-and-grow cluster refiner
//! - A rewrite driver that replaces every observation with its cluster center
//! - JSON cluster reports
//!
//! ## Features
//!
//! - **`parallel`** - Parse input files in parallel with rayon
//! - **`synthetic`** - Seeded synthetic observation generator
//! - **`cli`** - The `geoanchor-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use geoanchor::{Coordinate, CoordinateSet, cluster};
//!
//! let coords = CoordinateSet::from_coordinates([
//!     Coordinate::new(-77.0378, 38.8985),
//!     Coordinate::new(-77.0379, 38.8986),
//!     Coordinate::new(-122.4194, 37.7749),
//! ]);
//!
//! let clustering = cluster(0.5, &coords);
//! assert_eq!(clustering.cluster_count(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::Path;

// Unified error handling
pub mod error;
pub use error::{ClusterError, OptionExt, Result};

// Observation line parsing and formatting
pub mod codec;
pub use codec::{format_line, parse_coordinate, parse_line, read_observations};

// Distance metric and coordinate arithmetic
pub mod geo_utils;
pub use geo_utils::{DistanceMode, haversine_distance};

// Deduplicated coordinate vocabulary
pub mod coordinate_set;
pub use coordinate_set::CoordinateSet;

// R-tree over unassigned coordinates
pub mod spatial_index;
pub use spatial_index::SpatialIndex;

// Cluster refinement
pub mod refine;
pub use refine::{Cluster, Clustering, Refinement, cluster, cluster_with_config};

// Per-cluster summaries
pub mod report;
pub use report::{ClusterReport, ClusterSummary};

// File rewriting
pub mod rewrite;
pub use rewrite::{RewriteSummary, run, run_with_config};

// Synthetic observation generator
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate pair in degrees.
///
/// `x` is the first value on an observation line and `y` the second. The
/// distance metric treats `x` as longitude and `y` as latitude.
///
/// Equality is exact: two coordinates are the same location only if both
/// components compare equal as `f64` (`-0.0 == 0.0`). The codec never
/// produces non-finite components, so coordinates read from files are safe
/// to use as hash keys.
///
/// # Example
/// ```
/// use geoanchor::Coordinate;
/// let a = Coordinate::new(-77.0378, 38.8985);
/// assert_eq!(a, Coordinate::new(-77.0378, 38.8985));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.x).hash(state);
        canonical_bits(self.y).hash(state);
    }
}

/// `-0.0` and `0.0` compare equal, so they must hash equal too.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord { x: c.x, y: c.y }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// One line of an observation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Opaque segment identifier, echoed verbatim on output
    pub segment_id: String,
    pub coordinate: Coordinate,
}

impl Observation {
    pub fn new(segment_id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            segment_id: segment_id.into(),
            coordinate,
        }
    }
}

/// Configuration for clustering and rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Distance threshold for joining the cluster being refined.
    /// Default: 0.5 km
    pub radius_km: f64,

    /// Maximum refinement iterations per cluster before giving up.
    /// Default: 1000
    pub max_iterations: u32,

    /// How the distance metric treats coordinate signs.
    /// Default: hemisphere-blind (absolute values)
    pub distance_mode: DistanceMode,

    /// Decimal places the refined center is rounded to.
    /// Default: 4
    pub center_decimals: u32,

    /// Fractional digits written for each coordinate in output files.
    /// Default: 6
    pub output_decimals: usize,

    /// Fail the rewrite when any cluster hits `max_iterations`.
    /// Default: false (log a warning instead)
    pub strict: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_km: 0.5,
            max_iterations: 1000,
            distance_mode: DistanceMode::HemisphereBlind,
            center_decimals: 4,
            output_decimals: 6,
            strict: false,
        }
    }
}

impl ClusterConfig {
    /// Default configuration with the given radius.
    pub fn with_radius(radius_km: f64) -> Self {
        Self {
            radius_km,
            ..Self::default()
        }
    }

    /// Reject settings the refiner cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ClusterError::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.radius_km.is_nan() {
            return Err(ClusterError::Configuration(
                "radius_km must be a number".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ClusterError::io(path, e))?;
        let config: ClusterConfig = serde_json::from_str(&content).map_err(|e| {
            ClusterError::Configuration(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
