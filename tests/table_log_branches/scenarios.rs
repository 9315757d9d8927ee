//! End-to-end writer scenarios on `main` and one fork.

use crate::common::*;

const TABLE: &str = "/tmp/warehouse/people";

#[test]
fn main_and_test_branches_see_their_own_appends() {
    let catalog = catalog();

    catalog
        .record_write("main", TABLE, &log_write(TABLE, 0, CheckpointPolicy::Never))
        .unwrap();
    catalog.create_branch("test", "main").unwrap();
    catalog
        .record_write("main", TABLE, &log_write(TABLE, 1, CheckpointPolicy::Never))
        .unwrap();

    let on_main = catalog.resolve_content("main", TABLE).unwrap().unwrap();
    let on_test = catalog.resolve_content("test", TABLE).unwrap().unwrap();
    assert_eq!(on_main.metadata_history().len(), 2);
    assert_eq!(on_test.metadata_history().len(), 1);
    assert_eq!(on_main.id(), on_test.id());
    assert_eq!(
        on_test.metadata_history(),
        &[LogEntry::new(0, metadata_location(TABLE, 0))]
    );
}

#[test]
fn sixteen_appends_with_checkpoint_every_ten() {
    let catalog = catalog();
    for version in 0..16 {
        catalog
            .record_write("main", TABLE, &log_write(TABLE, version, CheckpointPolicy::Every(10)))
            .unwrap();
    }

    let content = catalog.resolve_content("main", TABLE).unwrap().unwrap();
    assert_eq!(content.metadata_history().len(), 16);
    let checkpoints: Vec<u64> = content.checkpoint_history().iter().map(|c| c.version).collect();
    assert_eq!(checkpoints, vec![0, 10]);
    assert_eq!(
        content.last_checkpoint(),
        Some(&LogEntry::new(10, checkpoint_location(TABLE, 10)))
    );
    content.check_invariants().unwrap();
}

#[test]
fn metadata_history_is_in_append_order() {
    let catalog = catalog();
    let writer = TableLogWriter::new(&catalog, TABLE, CheckpointPolicy::Never);
    writer.append_n("main", 25);

    let content = writer.read("main").unwrap();
    let versions: Vec<u64> = content.metadata_history().iter().map(|e| e.version).collect();
    assert_eq!(versions, (0..25).collect::<Vec<_>>());
    for entry in content.metadata_history() {
        assert_eq!(entry.location, metadata_location(TABLE, entry.version));
    }
}

#[test]
fn table_root_and_log_dir_are_one_table() {
    let catalog = catalog();
    catalog
        .record_write("main", TABLE, &log_write(TABLE, 0, CheckpointPolicy::Never))
        .unwrap();
    catalog
        .record_write(
            "main",
            "file:///tmp/warehouse/people/_delta_log/",
            &log_write(TABLE, 1, CheckpointPolicy::Never),
        )
        .unwrap();
    catalog
        .record_write(
            "main",
            "/tmp/warehouse/./scratch/../people",
            &log_write(TABLE, 2, CheckpointPolicy::Never),
        )
        .unwrap();

    let content = catalog
        .resolve_content("main", "/tmp/warehouse/people/_delta_log")
        .unwrap()
        .unwrap();
    assert_eq!(content.metadata_history().len(), 3);
}

#[test]
fn retried_write_is_recorded_once() {
    let catalog = catalog();
    let write = log_write(TABLE, 0, CheckpointPolicy::Every(10));
    let first = catalog.record_write("main", TABLE, &write).unwrap();
    let second = catalog.record_write("main", TABLE, &write).unwrap();
    assert_eq!(first, second);

    let content = catalog.resolve_content("main", TABLE).unwrap().unwrap();
    assert_eq!(content.metadata_history().len(), 1);
    assert_eq!(content.checkpoint_history().len(), 1);
    assert_eq!(catalog.commit_log("main", usize::MAX).unwrap().len(), 2);
}

#[test]
fn stale_version_is_rejected_and_branch_unchanged() {
    let catalog = catalog();
    for version in 0..3 {
        catalog
            .record_write("main", TABLE, &log_write(TABLE, version, CheckpointPolicy::Never))
            .unwrap();
    }
    let head = catalog.resolve("main").unwrap();

    let err = catalog
        .record_write(
            "main",
            TABLE,
            &LogWrite::new(1, "/somewhere/else/00000000000000000001.json"),
        )
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidContent(_)));
    assert!(!err.is_retryable());
    assert_eq!(catalog.resolve("main").unwrap(), head);
}

#[test]
fn multiple_tables_share_a_branch() {
    let catalog = catalog();
    let people = TableLogWriter::new(&catalog, "/lake/people", CheckpointPolicy::Never);
    let orders = TableLogWriter::new(&catalog, "s3://bucket/lake/orders", CheckpointPolicy::Never);

    people.append_n("main", 3);
    orders.append_n("main", 5);
    people.append_n("main", 1);

    assert_eq!(people.read("main").unwrap().metadata_history().len(), 4);
    assert_eq!(orders.read("main").unwrap().metadata_history().len(), 5);
    assert_ne!(people.read("main").unwrap().id(), orders.read("main").unwrap().id());

    let log = catalog.commit_log("main", usize::MAX).unwrap();
    assert_eq!(log.len(), 10);
    assert_eq!(log[0].keys, vec![people.key().clone()]);
    assert_eq!(log[1].keys, vec![orders.key().clone()]);
}
