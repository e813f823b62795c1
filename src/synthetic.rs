//! Synthetic observation generator for tests and benchmarks.
//!
//! Scatters a handful of anchors around an origin, then draws observations
//! from them with Gaussian GPS noise, plus a fraction of uniformly random
//! outliers. The anchor each observation came from is kept as ground truth.
//!
//! Feature-gated behind `synthetic`.
//!
//! # Example
//!
//! ```rust
//! use geoanchor::synthetic::SyntheticScenario;
//!
//! let dataset = SyntheticScenario::commuter().generate();
//! assert_eq!(dataset.observations.len(), 200);
//! ```

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::codec::write_observations;
use crate::error::{ClusterError, Result};
use crate::{Coordinate, Observation};

/// Kilometers per degree of latitude (approximately constant).
const KM_PER_DEG_LAT: f64 = 111.32;

/// Scenario configuration for generating synthetic observations.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Center of the generated area (x = longitude, y = latitude).
    pub origin: Coordinate,
    /// Number of true anchor locations.
    pub anchor_count: usize,
    /// Number of observation lines.
    pub observation_count: usize,
    /// Anchors are placed uniformly within this distance of the origin.
    pub anchor_spread_km: f64,
    /// GPS noise standard deviation around an anchor.
    pub noise_km: f64,
    /// Fraction of observations placed uniformly at random (0.0-1.0).
    pub outlier_fraction: f64,
    /// Decimal places observations are rounded to, like upstream writers do.
    pub decimals: u32,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// A generated dataset with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub anchors: Vec<Coordinate>,
    pub observations: Vec<Observation>,
    /// Anchor index per observation; `None` for outliers.
    pub truth: Vec<Option<usize>>,
}

impl SyntheticDataset {
    /// Write observations in line format.
    pub fn write(&self, path: impl AsRef<Path>, decimals: usize) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ClusterError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        write_observations(&mut writer, &self.observations, decimals)
            .and_then(|_| writer.flush())
            .map_err(|e| ClusterError::io(path, e))
    }
}

impl SyntheticScenario {
    /// A few hundred commute endpoints around central Washington, DC.
    pub fn commuter() -> Self {
        Self {
            origin: Coordinate::new(-77.0369, 38.9072),
            anchor_count: 5,
            observation_count: 200,
            anchor_spread_km: 15.0,
            noise_km: 0.05,
            outlier_fraction: 0.1,
            decimals: 4,
            seed: 42,
        }
    }

    /// Scenario sized for benchmarks.
    pub fn with_observation_count(count: usize, anchors: usize) -> Self {
        Self {
            observation_count: count,
            anchor_count: anchors.max(1),
            anchor_spread_km: 50.0,
            ..Self::commuter()
        }
    }

    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let anchors: Vec<Coordinate> = (0..self.anchor_count)
            .map(|_| {
                let p = random_in_disk(&self.origin, self.anchor_spread_km, &mut rng);
                self.round(p)
            })
            .collect();

        let mut observations = Vec::with_capacity(self.observation_count);
        let mut truth = Vec::with_capacity(self.observation_count);

        for i in 0..self.observation_count {
            let outlier = anchors.is_empty() || rng.gen_bool(self.outlier_fraction.clamp(0.0, 1.0));
            let (coordinate, anchor) = if outlier {
                let p = random_in_disk(&self.origin, self.anchor_spread_km * 2.0, &mut rng);
                (p, None)
            } else {
                let idx = rng.gen_range(0..anchors.len());
                (gaussian_offset(&anchors[idx], self.noise_km, &mut rng), Some(idx))
            };
            observations.push(Observation::new(i.to_string(), self.round(coordinate)));
            truth.push(anchor);
        }

        SyntheticDataset {
            anchors,
            observations,
            truth,
        }
    }

    fn round(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(
            crate::geo_utils::round_to(c.x, self.decimals),
            crate::geo_utils::round_to(c.y, self.decimals),
        )
    }
}

/// Offset a coordinate by (east, north) kilometers.
fn offset(origin: &Coordinate, east_km: f64, north_km: f64) -> Coordinate {
    let lat = origin.y + north_km / KM_PER_DEG_LAT;
    let km_per_deg_lng = KM_PER_DEG_LAT * origin.y.to_radians().cos();
    let lng = if km_per_deg_lng.abs() < 1e-10 {
        origin.x
    } else {
        origin.x + east_km / km_per_deg_lng
    };
    Coordinate::new(lng, lat)
}

fn random_in_disk(origin: &Coordinate, radius_km: f64, rng: &mut StdRng) -> Coordinate {
    let r = radius_km * rng.r#gen::<f64>().sqrt();
    let theta = rng.gen_range(0.0..(2.0 * PI));
    offset(origin, r * theta.cos(), r * theta.sin())
}

fn gaussian_offset(origin: &Coordinate, sigma_km: f64, rng: &mut StdRng) -> Coordinate {
    if sigma_km <= 0.0 {
        return *origin;
    }
    // Box-Muller transform for Gaussian noise
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let mag = sigma_km * (-2.0 * u1.ln()).sqrt();
    offset(origin, mag * (2.0 * PI * u2).cos(), mag * (2.0 * PI * u2).sin())
}
