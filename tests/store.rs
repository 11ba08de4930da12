//! Integration tests for the reading store

use tankd::common::unix_epoch_now;
use tankd::sensor::SensorSample;
use tankd::store::{Order, Period, ReadingStore};
use tempfile::TempDir;

fn sample(distance_cm: i64, timestamp: &str, epoch: f64) -> SensorSample {
    SensorSample {
        distance_cm,
        timestamp: timestamp.to_string(),
        ip: "10.0.0.7".to_string(),
        fetched_at_epoch: epoch,
    }
}

fn open_store(dir: &TempDir) -> ReadingStore {
    ReadingStore::open(dir.path().join("readings.sqlite3")).unwrap()
}

#[test]
fn test_last_n_orders_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert(&sample(50, "t1", 100.0), false).unwrap();
    store.insert(&sample(40, "t2", 300.0), false).unwrap();
    store.insert(&sample(30, "t3", 200.0), false).unwrap();

    let rows = store.last_n(10).unwrap();
    let distances: Vec<i64> = rows.iter().map(|r| r.distance_cm).collect();
    assert_eq!(distances, vec![40, 30, 50]);

    assert_eq!(store.last().unwrap().unwrap().distance_cm, 40);
}

#[test]
fn test_last_n_breaks_epoch_ties_by_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert(&sample(10, "t1", 500.0), false).unwrap();
    store.insert(&sample(20, "t2", 500.0), false).unwrap();
    store.insert(&sample(30, "t3", 500.0), false).unwrap();

    let rows = store.last_n(3).unwrap();
    let distances: Vec<i64> = rows.iter().map(|r| r.distance_cm).collect();
    assert_eq!(distances, vec![30, 20, 10]);
}

#[test]
fn test_last_n_truncates() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    for i in 0..5 {
        store
            .insert(&sample(i, &format!("t{i}"), 100.0 + i as f64), false)
            .unwrap();
    }

    let rows = store.last_n(2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].distance_cm, 4);
    assert_eq!(rows[1].distance_cm, 3);
}

#[test]
fn test_ids_are_monotonic() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert(&sample(10, "t1", 100.0), false).unwrap();
    store.insert(&sample(20, "t2", 200.0), false).unwrap();
    store.insert(&sample(30, "t3", 300.0), false).unwrap();

    let rows = store.last_n(3).unwrap();
    assert_eq!(rows[0].id, 3);
    assert_eq!(rows[1].id, 2);
    assert_eq!(rows[2].id, 1);
}

#[test]
fn test_dedupe_compares_only_latest_row() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(store.insert(&sample(40, "t1", 100.0), true).unwrap());
    assert!(!store.insert(&sample(41, "t1", 101.0), true).unwrap());
    assert!(store.insert(&sample(42, "t2", 102.0), true).unwrap());
    // t1 is no longer the latest row, so it inserts again
    assert!(store.insert(&sample(43, "t1", 103.0), true).unwrap());

    assert_eq!(store.last_n(10).unwrap().len(), 3);
}

#[test]
fn test_dedupe_ignores_empty_timestamps() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(store.insert(&sample(40, "", 100.0), true).unwrap());
    assert!(store.insert(&sample(41, "", 101.0), true).unwrap());

    assert_eq!(store.last_n(10).unwrap().len(), 2);
}

#[test]
fn test_extremes_ranks_by_distance() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert(&sample(50, "t1", 100.0), false).unwrap();
    store.insert(&sample(10, "t2", 200.0), false).unwrap();
    store.insert(&sample(30, "t3", 300.0), false).unwrap();

    let highest = store.extremes(Period::All, 2, Order::Max).unwrap();
    let distances: Vec<i64> = highest.iter().map(|r| r.distance_cm).collect();
    assert_eq!(distances, vec![50, 30]);

    let lowest = store.extremes(Period::All, 2, Order::Min).unwrap();
    let distances: Vec<i64> = lowest.iter().map(|r| r.distance_cm).collect();
    assert_eq!(distances, vec![10, 30]);
}

#[test]
fn test_extremes_breaks_distance_ties_by_recency() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert(&sample(25, "t1", 100.0), false).unwrap();
    store.insert(&sample(25, "t2", 300.0), false).unwrap();
    store.insert(&sample(25, "t3", 200.0), false).unwrap();

    let rows = store.extremes(Period::All, 3, Order::Max).unwrap();
    let timestamps: Vec<&str> = rows.iter().map(|r| r.sensor_timestamp.as_str()).collect();
    assert_eq!(timestamps, vec!["t2", "t3", "t1"]);
}

#[test]
fn test_extremes_day_window_filters_old_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let now = unix_epoch_now();
    store.insert(&sample(10, "recent", now - 10.0), false).unwrap();
    store.insert(&sample(99, "stale", now - 90_000.0), false).unwrap();

    let day = store.extremes(Period::Day, 5, Order::Max).unwrap();
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].distance_cm, 10);

    let week = store.extremes(Period::Week, 5, Order::Max).unwrap();
    assert_eq!(week.len(), 2);
    assert_eq!(week[0].distance_cm, 99);

    let all = store.extremes(Period::All, 5, Order::Max).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(store.last().unwrap().is_none());
    assert!(store.last_n(5).unwrap().is_empty());
    assert!(store.extremes(Period::Day, 5, Order::Max).unwrap().is_empty());
    assert!(store.extremes(Period::All, 5, Order::Min).unwrap().is_empty());
}

#[test]
fn test_reopen_preserves_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.sqlite3");

    {
        let store = ReadingStore::open(&path).unwrap();
        store.insert(&sample(40, "t1", 100.0), false).unwrap();
        store.insert(&sample(41, "t2", 200.0), false).unwrap();
    }

    let store = ReadingStore::open(&path).unwrap();
    let rows = store.last_n(10).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].distance_cm, 41);
}
