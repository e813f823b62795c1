//! Tests for coordinate_set module

use std::collections::HashSet;
use std::fs;

use geoanchor::{ClusterError, Coordinate, CoordinateSet};

#[test]
fn test_load_distinct_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("location1.txt");
    fs::write(&path, "0\t100 100\n1\t200 200\n2\t300 300\n").unwrap();

    let set = CoordinateSet::load(&[&path]).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(
        set.as_slice(),
        &[
            Coordinate::new(100.0, 100.0),
            Coordinate::new(200.0, 200.0),
            Coordinate::new(300.0, 300.0),
        ]
    );
}

#[test]
fn test_duplicates_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dupes.txt");
    fs::write(&path, "0\t100 100\n1\t100 100\n2\t100.0 100.000\n").unwrap();

    let set = CoordinateSet::load(&[&path]).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.occurrences(0), 3);
    assert_eq!(set.total_occurrences(), 3);
}

#[test]
fn test_duplicates_across_files_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let start = dir.path().join("start.txt");
    let end = dir.path().join("end.txt");
    fs::write(&start, "0\t1 1\n1\t2 2\n").unwrap();
    fs::write(&end, "0\t2 2\n1\t3 3\n").unwrap();

    let set = CoordinateSet::load(&[&start, &end]).unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.len() <= set.total_occurrences());
    // First appearance decides the order
    assert_eq!(set.index_of(&Coordinate::new(1.0, 1.0)), Some(0));
    assert_eq!(set.index_of(&Coordinate::new(2.0, 2.0)), Some(1));
    assert_eq!(set.index_of(&Coordinate::new(3.0, 3.0)), Some(2));
    assert_eq!(set.occurrences(1), 2);
}

#[test]
fn test_load_propagates_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let bad = dir.path().join("bad.txt");
    fs::write(&good, "0\t1 1\n").unwrap();
    fs::write(&bad, "0\t1 1\n1\tnot a number\n").unwrap();

    let err = CoordinateSet::load(&[&good, &bad]).unwrap_err();
    match err {
        ClusterError::Parse { path, line, .. } => {
            assert_eq!(path, bad);
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_negative_zero_is_the_same_coordinate() {
    let set = CoordinateSet::from_coordinates([
        Coordinate::new(0.0, 1.0),
        Coordinate::new(-0.0, 1.0),
    ]);
    assert_eq!(set.len(), 1);

    let mut hashed = HashSet::new();
    hashed.insert(Coordinate::new(0.0, -0.0));
    assert!(hashed.contains(&Coordinate::new(-0.0, 0.0)));
}

#[test]
fn test_insert_returns_stable_index() {
    let mut set = CoordinateSet::new();
    assert_eq!(set.insert(Coordinate::new(5.0, 5.0)), 0);
    assert_eq!(set.insert(Coordinate::new(6.0, 6.0)), 1);
    assert_eq!(set.insert(Coordinate::new(5.0, 5.0)), 0);
    assert!(set.contains(&Coordinate::new(6.0, 6.0)));
    assert!(!set.contains(&Coordinate::new(7.0, 7.0)));
    assert_eq!(set.get(1), Some(&Coordinate::new(6.0, 6.0)));
    assert_eq!(set.get(2), None);
    assert_eq!(set.occurrences(9), 0);
}

#[test]
fn test_empty_set() {
    let set = CoordinateSet::new();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.iter().count(), 0);
}
