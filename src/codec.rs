//! Observation line codec.
//!
//! Lines look like `segment_id<TAB>x y`. The segment id is everything before
//! the first tab and is kept verbatim; the coordinate half holds exactly two
//! numbers separated by a space.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{ClusterError, OptionExt, Result};
use crate::{Coordinate, Observation};

/// Parse the `x y` half of a line.
///
/// Returns `None` unless there are exactly two finite numbers.
///
/// # Example
/// ```
/// use geoanchor::{Coordinate, parse_coordinate};
/// assert_eq!(parse_coordinate("100 100"), Some(Coordinate::new(100.0, 100.0)));
/// assert_eq!(parse_coordinate("100"), None);
/// ```
pub fn parse_coordinate(text: &str) -> Option<Coordinate> {
    let (first, second) = text.split_once(' ')?;
    let x: f64 = first.trim().parse().ok()?;
    let y: f64 = second.trim().parse().ok()?;
    let coordinate = Coordinate::new(x, y);
    coordinate.is_finite().then_some(coordinate)
}

/// Parse one observation line. `path` and `line_no` only feed error messages.
pub fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<Observation> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (segment_id, location) = line
        .split_once('\t')
        .ok_or_parse(path, line_no, "missing tab between segment id and coordinate")?;
    let coordinate = parse_coordinate(location).ok_or_parse(
        path,
        line_no,
        &format!("expected two space-separated numbers, found {:?}", location.trim_end()),
    )?;
    Ok(Observation::new(segment_id, coordinate))
}

/// Format an observation line, newline included.
pub fn format_line(segment_id: &str, coordinate: &Coordinate, decimals: usize) -> String {
    format!(
        "{}\t{:.*} {:.*}\n",
        segment_id, decimals, coordinate.x, decimals, coordinate.y
    )
}

/// Read every observation in a file, in order.
pub fn read_observations(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClusterError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut observations = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ClusterError::io(path, e))?;
        observations.push(parse_line(&line, path, idx + 1)?);
    }
    Ok(observations)
}

/// Write observations in line format.
pub fn write_observations<W: Write>(
    writer: &mut W,
    observations: &[Observation],
    decimals: usize,
) -> std::io::Result<()> {
    for obs in observations {
        writer.write_all(format_line(&obs.segment_id, &obs.coordinate, decimals).as_bytes())?;
    }
    Ok(())
}
