//! Checkpoint bookkeeping under different writer checkpoint intervals.

use crate::common::*;
use proptest::prelude::*;

const TABLE: &str = "/data/metrics";

fn run(catalog: &Catalog, appends: u64, policy: CheckpointPolicy) -> std::sync::Arc<TableContent> {
    let writer = TableLogWriter::new(catalog, TABLE, policy);
    writer.append_n("main", appends);
    writer.read("main").unwrap()
}

#[test]
fn sixteen_appends_every_interval_counting_version_zero() {
    for interval in 1..=17 {
        let catalog = catalog();
        let policy = CheckpointPolicy::Every(interval);
        let content = run(&catalog, 16, policy);

        // ceil(16 / interval)
        let expected = (16 + interval - 1) / interval;
        assert_eq!(
            content.checkpoint_history().len() as u64,
            expected,
            "interval {}",
            interval
        );
        let last = (15 / interval) * interval;
        assert_eq!(
            content.last_checkpoint(),
            Some(&LogEntry::new(last, checkpoint_location(TABLE, last)))
        );
    }
}

#[test]
fn sixteen_appends_every_interval_skipping_version_zero() {
    for interval in 1..=17 {
        let catalog = catalog();
        let content = run(&catalog, 16, CheckpointPolicy::EveryAfterFirst(interval));

        // floor(15 / interval)
        let expected = 15 / interval;
        assert_eq!(
            content.checkpoint_history().len() as u64,
            expected,
            "interval {}",
            interval
        );
        if expected == 0 {
            assert!(content.last_checkpoint().is_none());
        } else {
            assert_eq!(content.last_checkpoint().map(|c| c.version), Some(expected * interval));
        }
    }
}

#[test]
fn checkpoints_are_subsequence_of_metadata() {
    let catalog = catalog();
    let content = run(&catalog, 40, CheckpointPolicy::Every(7));
    let metadata: Vec<u64> = content.metadata_history().iter().map(|e| e.version).collect();
    for checkpoint in content.checkpoint_history() {
        assert!(metadata.contains(&checkpoint.version));
        assert_eq!(checkpoint.version % 7, 0);
    }
    content.check_invariants().unwrap();
}

#[test]
fn bounded_retention_keeps_newest_checkpoints() {
    init_tracing();
    let catalog = Catalog::open(CatalogConfig {
        checkpoints: CheckpointRetention::newest(2),
        ..CatalogConfig::default()
    })
    .unwrap();
    let content = run(&catalog, 50, CheckpointPolicy::Every(10));

    assert_eq!(content.metadata_history().len(), 50);
    let kept: Vec<u64> = content.checkpoint_history().iter().map(|c| c.version).collect();
    assert_eq!(kept, vec![30, 40]);
    assert_eq!(content.last_checkpoint().map(|c| c.version), Some(40));
}

#[test]
fn checkpoint_on_branch_does_not_move_sibling_pointer() {
    let catalog = catalog();
    let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Every(5));
    writer.append_n("main", 3);
    catalog.create_branch("feature", "main").unwrap();
    writer.append_n("feature", 3);

    let main = writer.read("main").unwrap();
    let feature = writer.read("feature").unwrap();
    assert_eq!(main.last_checkpoint().map(|c| c.version), Some(0));
    assert_eq!(feature.last_checkpoint().map(|c| c.version), Some(5));
    assert_eq!(main.checkpoint_history().len(), 1);
    assert_eq!(feature.checkpoint_history().len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn checkpoint_count_matches_interval(appends in 1u64..60, interval in 1u64..20, skip_zero in any::<bool>()) {
        let policy = if skip_zero {
            CheckpointPolicy::EveryAfterFirst(interval)
        } else {
            CheckpointPolicy::Every(interval)
        };
        let catalog = catalog();
        let content = run(&catalog, appends, policy);

        prop_assert_eq!(content.metadata_history().len() as u64, appends);
        prop_assert_eq!(
            content.checkpoint_history().len() as u64,
            policy.expected_checkpoints(appends)
        );
        prop_assert_eq!(
            content.last_checkpoint(),
            content.checkpoint_history().last()
        );
    }
}
