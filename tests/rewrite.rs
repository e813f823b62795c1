//! Tests for rewrite module

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use geoanchor::{
    ClusterConfig, ClusterError, Coordinate, parse_line, read_observations, run, run_with_config,
};

const START: &str = "0\t-77.0378 38.8985\n\
                     1\t-122.4194 37.7749\n\
                     2\t-77.0380 38.8987\n";

const END: &str = "0\t-122.4196 37.7751\n\
                   1\t-77.0376 38.8983\n\
                   2\t-77.0378 38.8985\n";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_rewrite_replaces_coordinates_with_centers() {
    let dir = tempfile::tempdir().unwrap();
    let start = write(dir.path(), "start_location_obs.txt", START);
    let end = write(dir.path(), "end_location_obs.txt", END);
    let start_out = dir.path().join("start_out.txt");
    let end_out = dir.path().join("end_out.txt");

    let summary = run(1.0, &[&start, &end], &[&start_out, &end_out]).unwrap();
    assert_eq!(summary.cluster_count(), 2);
    assert_eq!(summary.lines_written, vec![3, 3]);
    assert_eq!(summary.outputs, vec![start_out.clone(), end_out.clone()]);

    assert_eq!(
        fs::read_to_string(&start_out).unwrap(),
        "0\t-77.037800 38.898500\n\
         1\t-122.419500 37.775000\n\
         2\t-77.037800 38.898500\n"
    );
    assert_eq!(
        fs::read_to_string(&end_out).unwrap(),
        "0\t-122.419500 37.775000\n\
         1\t-77.037800 38.898500\n\
         2\t-77.037800 38.898500\n"
    );
}

#[test]
fn test_rewrite_preserves_line_count_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "obs.txt",
        "trip-b\t1.0001 1.0001\ntrip-a\t1.0002 1.0002\ntrip-b\t40.0 40.0\ntrip-c\t1.0001 1.0001\n",
    );
    let output = dir.path().join("obs_out.txt");

    let summary = run(1.0, &[&input], &[&output]).unwrap();
    let centers: HashSet<Coordinate> = summary.clustering.centers().into_iter().collect();

    let original = read_observations(&input).unwrap();
    let rewritten = read_observations(&output).unwrap();
    assert_eq!(rewritten.len(), original.len());
    for (before, after) in original.iter().zip(&rewritten) {
        assert_eq!(before.segment_id, after.segment_id);
        assert!(centers.contains(&after.coordinate));
    }
}

#[test]
fn test_rewrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let start = write(dir.path(), "start.txt", START);
    let end = write(dir.path(), "end.txt", END);
    let once = [dir.path().join("start_1.txt"), dir.path().join("end_1.txt")];
    let twice = [dir.path().join("start_2.txt"), dir.path().join("end_2.txt")];

    run(1.0, &[&start, &end], &once).unwrap();
    run(1.0, &once, &twice).unwrap();

    for (a, b) in once.iter().zip(&twice) {
        assert_eq!(fs::read_to_string(a).unwrap(), fs::read_to_string(b).unwrap());
    }
}

#[test]
fn test_mismatched_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let start = write(dir.path(), "start.txt", START);
    let end = write(dir.path(), "end.txt", END);
    let out = dir.path().join("out.txt");

    let err = run(1.0, &[&start, &end], &[&out]).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
    assert!(!out.exists());
}

#[test]
fn test_parse_error_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let start = write(dir.path(), "start.txt", START);
    let end = write(dir.path(), "end.txt", "0\t1 1\n1\t2\n");
    let start_out = dir.path().join("start_out.txt");
    let end_out = dir.path().join("end_out.txt");

    let err = run(1.0, &[&start, &end], &[&start_out, &end_out]).unwrap_err();
    match err {
        ClusterError::Parse { path, line, .. } => {
            assert_eq!(path, end);
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!start_out.exists());
    assert!(!end_out.exists());
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let out = dir.path().join("out.txt");

    let err = run(1.0, &[&missing], &[&out]).unwrap_err();
    match err {
        ClusterError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
}

#[test]
fn test_overwrites_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.txt", "7\t5.0 5.0\n");
    let output = write(dir.path(), "out.txt", "stale content\nmore stale content\n");

    run(0.0, &[&input], &[&output]).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "7\t5.000000 5.000000\n");
    // Inputs are untouched
    assert_eq!(fs::read_to_string(&input).unwrap(), "7\t5.0 5.0\n");
}

#[test]
fn test_empty_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "empty.txt", "");
    let output = dir.path().join("empty_out.txt");

    let summary = run(1.0, &[&input], &[&output]).unwrap();
    assert_eq!(summary.cluster_count(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "");
}

#[test]
fn test_strict_mode_rejects_unconverged_clusters() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "line.txt", "0\t0.0 0.0\n1\t0.009 0.0\n2\t0.018 0.0\n");
    let output = dir.path().join("line_out.txt");

    let config = ClusterConfig {
        max_iterations: 3,
        strict: true,
        ..ClusterConfig::with_radius(1.6)
    };
    let err = run_with_config(&[&input], &[&output], &config).unwrap_err();
    assert!(matches!(
        err,
        ClusterError::NonConvergence {
            clusters: 1,
            max_iterations: 3
        }
    ));
    assert!(!output.exists());

    // Without strict mode the last center is used
    let lenient = ClusterConfig {
        strict: false,
        ..config
    };
    let summary = run_with_config(&[&input], &[&output], &lenient).unwrap();
    assert_eq!(summary.clustering.unconverged_count(), 1);
    let first = fs::read_to_string(&output).unwrap();
    let obs = parse_line(first.lines().next().unwrap(), &output, 1).unwrap();
    assert_eq!(obs.coordinate, Coordinate::new(0.0079, 0.0));
}

#[test]
fn test_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.txt", "0\t1 1\n");
    let output = dir.path().join("out.txt");

    let config = ClusterConfig {
        max_iterations: 0,
        ..ClusterConfig::default()
    };
    let err = run_with_config(&[&input], &[&output], &config).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
}

#[test]
fn test_output_precision_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.txt", "a\t1.5 2.25\n");
    let output = dir.path().join("out.txt");

    let config = ClusterConfig {
        output_decimals: 2,
        ..ClusterConfig::with_radius(0.0)
    };
    run_with_config(&[&input], &[&output], &config).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "a\t1.50 2.25\n");
}

#[cfg(unix)]
#[test]
fn test_new_output_gets_regular_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "start_location_obs.txt", START);
    let output = dir.path().join("start_out.txt");

    run(1.0, &[&input], &[&output]).unwrap();

    let mode = fs::metadata(&output).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[cfg(unix)]
#[test]
fn test_overwritten_output_keeps_its_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "start_location_obs.txt", START);
    let output = write(dir.path(), "start_out.txt", "stale\n");
    fs::set_permissions(&output, fs::Permissions::from_mode(0o640)).unwrap();

    run(1.0, &[&input], &[&output]).unwrap();

    let mode = fs::metadata(&output).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
    assert!(fs::read_to_string(&output).unwrap().starts_with("0\t"));
}
