//! Concurrent writers on shared and separate branches.
//!
//! Every commit either lands or reports `CommitConflict`; nothing is dropped.

use crate::common::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const TABLE: &str = "/lake/hot";

/// 8 threads x 20 appends to one table on one branch with a generous retry
/// budget. Assert: all 160 land and versions are gapless.
#[test]
fn concurrent_appends_on_one_branch_all_land() {
    let catalog = Arc::new(catalog_with_retries(10_000));
    let num_threads = 8;
    let per_thread = 20;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Every(10));
                barrier.wait();
                for _ in 0..per_thread {
                    writer.append("main").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = (num_threads * per_thread) as u64;
    let content = catalog.resolve_content("main", TABLE).unwrap().unwrap();
    let versions: Vec<u64> = content.metadata_history().iter().map(|e| e.version).collect();
    assert_eq!(versions, (0..total).collect::<Vec<_>>());
    assert_eq!(content.checkpoint_history().len() as u64, (total + 9) / 10);

    let metrics = catalog.commit_metrics();
    assert_eq!(metrics.total_committed, total);
    assert_eq!(metrics.total_conflicts, 0);
    // root + one commit per append
    assert_eq!(catalog.commit_log("main", usize::MAX).unwrap().len() as u64, total + 1);
}

/// No retries: some commits report `CommitConflict`. Assert: the recorded
/// history length equals the number of successes exactly.
#[test]
fn conflicts_are_reported_never_dropped() {
    let catalog = Arc::new(catalog_with_retries(0));
    let num_threads = 6;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(num_threads));
    let landed = Arc::new(AtomicU64::new(0));
    let errors = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            let landed = Arc::clone(&landed);
            let errors = Arc::clone(&errors);
            thread::spawn(move || {
                let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Never);
                barrier.wait();
                for _ in 0..per_thread {
                    match writer.append("main") {
                        Ok(_) => {
                            landed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => errors.lock().push(e),
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let landed = landed.load(Ordering::SeqCst);
    let errors = errors.lock();
    assert_eq!(landed + errors.len() as u64, (num_threads * per_thread) as u64);
    for e in errors.iter() {
        assert!(
            matches!(e, CatalogError::CommitConflict { attempts: 1, .. }),
            "unexpected error {:?}",
            e
        );
        assert!(e.is_retryable());
    }

    let len = catalog
        .resolve_content("main", TABLE)
        .unwrap()
        .map_or(0, |c| c.metadata_history().len());
    assert_eq!(len as u64, landed);
    assert_eq!(catalog.commit_metrics().total_conflicts, errors.len() as u64);
}

/// Writers on different branches never conflict with each other.
#[test]
fn writers_on_separate_branches_do_not_interfere() {
    let catalog = Arc::new(catalog_with_retries(0));
    let num_threads = 4;
    let per_thread = 30;
    for i in 0..num_threads {
        catalog.create_branch(&format!("worker-{}", i), "main").unwrap();
    }
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Never);
                let branch = format!("worker-{}", i);
                barrier.wait();
                for _ in 0..per_thread {
                    // One writer per branch, so the single attempt always wins
                    writer.append(&branch).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for i in 0..num_threads {
        let content = catalog
            .resolve_content(&format!("worker-{}", i), TABLE)
            .unwrap()
            .unwrap();
        assert_eq!(content.metadata_history().len(), per_thread);
    }
    assert!(catalog.resolve_content("main", TABLE).unwrap().is_none());
    assert_eq!(catalog.commit_metrics().total_retries, 0);
}

/// Readers pin a head and never see a half-applied commit.
#[test]
fn readers_see_whole_commits_during_writes() {
    let catalog = Arc::new(catalog_with_retries(10_000));
    let done = Arc::new(AtomicU64::new(0));

    let writer_handle = {
        let catalog = Arc::clone(&catalog);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Every(4));
            writer.append_n("main", 200);
            done.store(1, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last_len = 0;
                while done.load(Ordering::SeqCst) == 0 {
                    if let Some(content) = catalog.resolve_content("main", TABLE).unwrap() {
                        content.check_invariants().unwrap();
                        let len = content.metadata_history().len();
                        assert!(len >= last_len, "history shrank from {} to {}", last_len, len);
                        last_len = len;
                    }
                }
            })
        })
        .collect();

    writer_handle.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(
        catalog.resolve_content("main", TABLE).unwrap().unwrap().metadata_history().len(),
        200
    );
}

/// Deleting a branch under active writers: every append either landed
/// before the delete or fails with `RefNotFound`.
#[test]
fn delete_during_writes_fails_cleanly() {
    let catalog = Arc::new(catalog_with_retries(10_000));
    catalog.create_branch("doomed", "main").unwrap();
    let barrier = Arc::new(Barrier::new(3));
    let landed = Arc::new(AtomicU64::new(0));

    let writers: Vec<_> = (0..2)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            let landed = Arc::clone(&landed);
            thread::spawn(move || {
                let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Never);
                barrier.wait();
                loop {
                    match writer.append("doomed") {
                        Ok(_) => {
                            landed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            assert!(e.is_not_found(), "unexpected error {:?}", e);
                            break;
                        }
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(std::time::Duration::from_millis(5));
    let final_head = catalog.delete_branch("doomed").unwrap();
    for w in writers {
        w.join().unwrap();
    }

    let content = catalog.resolve_content(&final_head.to_string(), TABLE).unwrap();
    let len = content.map_or(0, |c| c.metadata_history().len()) as u64;
    assert_eq!(len, landed.load(Ordering::SeqCst));
}
