//! Engine integration tests
//!
//! Exercise the public Engine API from several threads at once:
//! conflicts, timeouts, snapshot consistency and close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use seatbook_core::{Error, Key, SnapshotView};
use seatbook_engine::{Engine, EngineConfig};

fn key(s: &str) -> Key {
    Key::from(s)
}

#[test]
fn test_check_then_write_is_exclusive() {
    const THREADS: usize = 12;
    let engine = Engine::open().unwrap();
    engine
        .transaction(|txn| txn.put(key("seat"), b"free".to_vec()))
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let sold = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let sold = Arc::clone(&sold);
            thread::spawn(move || {
                barrier.wait();
                let result = engine.transaction(|txn| {
                    match txn.get(&key("seat"))? {
                        Some(v) if v == b"free".to_vec() => {
                            txn.put(key("seat"), format!("sold:{}", i).into_bytes())?;
                            Ok(true)
                        }
                        _ => Ok::<_, Error>(false),
                    }
                });
                match result {
                    Ok(true) => {
                        sold.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(false) => {}
                    Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sold.load(Ordering::SeqCst), 1);
    let stored = engine.snapshot().unwrap().get(&key("seat")).unwrap().unwrap();
    assert!(stored.value.starts_with(b"sold:"));
}

#[test]
fn test_conflict_leaves_no_partial_writes() {
    let engine = Engine::open().unwrap();
    engine
        .transaction(|txn| txn.put(key("guard"), b"0".to_vec()))
        .unwrap();

    let result = engine.transaction(|txn| {
        txn.get(&key("guard"))?;
        txn.put(key("side/1"), vec![1])?;
        txn.put(key("side/2"), vec![2])?;

        // Another writer commits the guard key before this commit.
        engine.transaction(|inner| inner.put(key("guard"), b"1".to_vec()))?;
        Ok::<_, Error>(())
    });

    let err = result.unwrap_err();
    assert!(err.is_conflict());
    let snapshot = engine.snapshot().unwrap();
    assert!(snapshot.scan_prefix(&key("side/")).unwrap().is_empty());
    assert_eq!(snapshot.get(&key("guard")).unwrap().unwrap().value, b"1".to_vec());
}

#[test]
fn test_configured_timeout_applies() {
    let cfg = EngineConfig::default().with_commit_timeout(Duration::from_millis(15));
    let engine = Engine::open_with_config(cfg).unwrap();

    let guard = engine.pause_commits();
    let err = engine
        .transaction(|txn| txn.put(key("a"), vec![1]))
        .unwrap_err();
    drop(guard);

    assert!(matches!(err, Error::EngineTimeout(d) if d == Duration::from_millis(15)));
    engine
        .transaction(|txn| txn.put(key("a"), vec![1]))
        .unwrap();
}

#[test]
fn test_snapshot_is_stable_across_commits() {
    let engine = Engine::open().unwrap();
    engine
        .transaction(|txn| {
            for i in 0..5 {
                txn.put(key(&format!("item/{}", i)), vec![i as u8])?;
            }
            Ok::<_, Error>(())
        })
        .unwrap();

    let snapshot = engine.snapshot().unwrap();
    let mut iter = snapshot.iter_prefix(&key("item/"));
    let first = iter.next().unwrap();

    engine
        .transaction(|txn| txn.put(key("item/9"), vec![9]))
        .unwrap();

    assert_eq!(first.0, key("item/0"));
    assert_eq!(iter.count(), 4);
    assert_eq!(engine.snapshot().unwrap().scan_prefix(&key("item/")).unwrap().len(), 6);
}

#[test]
fn test_close_rejects_new_work() {
    let engine = Engine::open().unwrap();
    engine
        .transaction(|txn| txn.put(key("a"), vec![1]))
        .unwrap();

    engine.close();

    assert!(matches!(engine.snapshot(), Err(Error::EngineClosed)));
    assert!(matches!(
        engine.transaction(|txn| txn.get(&key("a"))),
        Err(Error::EngineClosed)
    ));
}

#[test]
fn test_metrics_track_outcomes() {
    let engine = Engine::open().unwrap();
    engine
        .transaction(|txn| txn.put(key("a"), vec![1]))
        .unwrap();
    let _ = engine.transaction(|_| Err::<(), _>(Error::invalid_input("no")));

    let metrics = engine.metrics();
    assert_eq!(metrics.total_started, 2);
    assert_eq!(metrics.total_committed, 1);
    assert_eq!(metrics.total_aborted, 1);
    assert_eq!(metrics.active_count, 0);
}

#[test]
fn test_straggler_after_close_timeout_applies_nothing() {
    let config = EngineConfig::default().with_commit_timeout(Duration::from_millis(50));
    let engine = Engine::open_with_config(config).unwrap();
    let paused = engine.pause_commits();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            engine.transaction_with_timeout(Duration::from_secs(10), |txn| {
                txn.put(key("late"), b"v".to_vec())
            })
        })
    };
    while engine.metrics().active_count == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));

    // close() gives up waiting on the writer, then blocks on the commit lock
    let closer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.close())
    };
    while engine.is_open() {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(300));
    drop(paused);

    let result = writer.join().unwrap();
    closer.join().unwrap();

    assert!(matches!(result, Err(Error::EngineClosed)), "{:?}", result);
    let metrics = engine.metrics();
    assert_eq!(metrics.total_committed, 0);
    assert_eq!(metrics.total_aborted, 1);
    assert_eq!(metrics.active_count, 0);
    assert_eq!(engine.current_version(), 0);
}
