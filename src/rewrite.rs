//! Rewrite driver: cluster every input file together, then write each file
//! back out with its coordinates replaced by their cluster centers.

use std::fs::{self, Permissions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::codec::format_line;
use crate::coordinate_set::load_observations;
use crate::error::{ClusterError, Result};
use crate::report::ClusterReport;
use crate::{ClusterConfig, Clustering, CoordinateSet, Observation, cluster_with_config};

/// What a rewrite run produced.
#[derive(Debug, Clone)]
pub struct RewriteSummary {
    /// Output files, in the order given
    pub outputs: Vec<PathBuf>,
    /// Lines written per output file
    pub lines_written: Vec<usize>,
    pub coordinates: CoordinateSet,
    pub clustering: Clustering,
}

impl RewriteSummary {
    pub fn cluster_count(&self) -> usize {
        self.clustering.cluster_count()
    }

    pub fn report(&self, config: &ClusterConfig) -> ClusterReport {
        ClusterReport::new(&self.coordinates, &self.clustering, config)
    }
}

/// Rewrite `inputs[i]` into `outputs[i]` using the default configuration
/// with the given radius.
pub fn run<P, Q>(radius_km: f64, inputs: &[P], outputs: &[Q]) -> Result<RewriteSummary>
where
    P: AsRef<Path> + Sync,
    Q: AsRef<Path>,
{
    run_with_config(inputs, outputs, &ClusterConfig::with_radius(radius_km))
}

/// Rewrite `inputs[i]` into `outputs[i]`.
///
/// All inputs are parsed and clustered together before anything is written.
/// Outputs are staged next to their destinations and only moved into place
/// once every one of them has been written, so a failed run leaves existing
/// files untouched.
pub fn run_with_config<P, Q>(
    inputs: &[P],
    outputs: &[Q],
    config: &ClusterConfig,
) -> Result<RewriteSummary>
where
    P: AsRef<Path> + Sync,
    Q: AsRef<Path>,
{
    if inputs.len() != outputs.len() {
        return Err(ClusterError::Configuration(format!(
            "{} input file(s) but {} output file(s)",
            inputs.len(),
            outputs.len()
        )));
    }
    config.validate()?;

    let files = load_observations(inputs)?;
    let coordinates = CoordinateSet::from_observations(files.iter().flatten());
    info!(
        "Loaded {} observations ({} distinct coordinates) from {} file(s)",
        coordinates.total_occurrences(),
        coordinates.len(),
        inputs.len()
    );

    let clustering = cluster_with_config(&coordinates, config);

    let unconverged = clustering.unconverged_count();
    if config.strict && unconverged > 0 {
        return Err(ClusterError::NonConvergence {
            clusters: unconverged,
            max_iterations: config.max_iterations,
        });
    }

    let mut staged = Vec::with_capacity(outputs.len());
    let mut lines_written = Vec::with_capacity(outputs.len());
    for (observations, output) in files.iter().zip(outputs) {
        let output = output.as_ref();
        staged.push(stage_output(output, observations, &clustering, config)?);
        lines_written.push(observations.len());
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (tmp, output) in staged.into_iter().zip(outputs) {
        let output = output.as_ref();
        tmp.persist(output)
            .map_err(|e| ClusterError::io(output, e.error))?;
        written.push(output.to_path_buf());
    }

    info!(
        "Wrote {} file(s) using {} cluster representatives",
        written.len(),
        clustering.cluster_count()
    );

    Ok(RewriteSummary {
        outputs: written,
        lines_written,
        coordinates,
        clustering,
    })
}

/// Render one output file into a temporary file beside it.
fn stage_output(
    output: &Path,
    observations: &[Observation],
    clustering: &Clustering,
    config: &ClusterConfig,
) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| ClusterError::io(output, e))?;
    if let Some(permissions) = output_permissions(output) {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| ClusterError::io(output, e))?;
    }

    {
        let mut writer = BufWriter::new(tmp.as_file());
        for obs in observations {
            // Every parsed coordinate went into the clustered set.
            let center = clustering
                .representative(&obs.coordinate)
                .unwrap_or(obs.coordinate);
            writer
                .write_all(format_line(&obs.segment_id, &center, config.output_decimals).as_bytes())
                .map_err(|e| ClusterError::io(output, e))?;
        }
        writer.flush().map_err(|e| ClusterError::io(output, e))?;
    }

    Ok(tmp)
}

/// Permissions the output should carry once persisted: those of the file it
/// replaces, otherwise the usual mode for a newly created file.
fn output_permissions(output: &Path) -> Option<Permissions> {
    match fs::metadata(output) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}
