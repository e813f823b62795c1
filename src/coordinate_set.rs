//! The deduplicated coordinate vocabulary of one run.

use std::collections::HashMap;
use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::codec::read_observations;
use crate::error::Result;
use crate::{Coordinate, Observation};

/// Distinct coordinates in order of first appearance.
///
/// Each entry remembers how many observations carried it. Indices are stable
/// and are what the refiner and the spatial index refer to.
#[derive(Debug, Clone, Default)]
pub struct CoordinateSet {
    coords: Vec<Coordinate>,
    counts: Vec<usize>,
    index: HashMap<Coordinate, usize>,
}

impl CoordinateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_coordinates<I: IntoIterator<Item = Coordinate>>(coords: I) -> Self {
        let mut set = Self::new();
        for c in coords {
            set.insert(c);
        }
        set
    }

    pub fn from_observations<'a, I>(observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        Self::from_coordinates(observations.into_iter().map(|o| o.coordinate))
    }

    /// Load and deduplicate the coordinates of every file, in file order.
    pub fn load<P: AsRef<Path> + Sync>(files: &[P]) -> Result<Self> {
        let observations = load_observations(files)?;
        Ok(Self::from_observations(observations.iter().flatten()))
    }

    /// Add one occurrence; returns the coordinate's index.
    pub fn insert(&mut self, coordinate: Coordinate) -> usize {
        if let Some(&idx) = self.index.get(&coordinate) {
            self.counts[idx] += 1;
            return idx;
        }
        let idx = self.coords.len();
        self.coords.push(coordinate);
        self.counts.push(1);
        self.index.insert(coordinate, idx);
        idx
    }

    pub fn index_of(&self, coordinate: &Coordinate) -> Option<usize> {
        self.index.get(coordinate).copied()
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.index.contains_key(coordinate)
    }

    pub fn get(&self, idx: usize) -> Option<&Coordinate> {
        self.coords.get(idx)
    }

    /// Number of observations that carried the coordinate at `idx`.
    pub fn occurrences(&self, idx: usize) -> usize {
        self.counts.get(idx).copied().unwrap_or(0)
    }

    /// Total observations folded into this set.
    pub fn total_occurrences(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.coords.iter()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coords.iter()
    }
}

/// Parse every file, preserving file order.
pub(crate) fn load_observations<P: AsRef<Path> + Sync>(files: &[P]) -> Result<Vec<Vec<Observation>>> {
    #[cfg(feature = "parallel")]
    {
        files.par_iter().map(read_observations).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        files.iter().map(read_observations).collect()
    }
}
