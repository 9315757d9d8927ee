//! Opening catalogs from `catalog.toml`.

use crate::common::*;
use branchlog::CONFIG_FILE_NAME;
use tempfile::TempDir;

#[test]
fn open_from_written_default_config() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    CatalogConfig::write_default_if_missing(&path).unwrap();

    let catalog = Catalog::from_config_file(&path).unwrap();
    assert_eq!(catalog.config(), &CatalogConfig::default());
    assert_eq!(catalog.list_branches().len(), 1);
    assert_eq!(catalog.default_branch().as_str(), "main");
}

#[test]
fn custom_default_branch_and_retention() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "default_branch = \"trunk\"\n\n[checkpoints]\nmax_retained = 1\n",
    )
    .unwrap();

    let catalog = Catalog::from_config_file(&path).unwrap();
    assert!(catalog.branch("main").is_none());
    assert_eq!(catalog.branch("trunk").unwrap().head, catalog.root());

    let writer = TableLogWriter::new(&catalog, "/lake/t", CheckpointPolicy::Every(2));
    writer.append_n("trunk", 7);
    let content = writer.read("trunk").unwrap();
    assert_eq!(content.checkpoint_history().len(), 1);
    assert_eq!(content.last_checkpoint().map(|c| c.version), Some(6));
}

#[test]
fn invalid_config_file_is_rejected() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[checkpoints]\nmax_retained = 0\n").unwrap();

    assert!(matches!(
        Catalog::from_config_file(&path),
        Err(CatalogError::Config(_))
    ));
}
