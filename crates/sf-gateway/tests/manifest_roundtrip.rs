use sf_core::{Entry, OptimizerConfig, SubFitError, Timestamp};
use sf_gateway::{load_manifest, write_manifest, ManifestGateway};
use sf_optimizer::SubtitlePipeline;

fn entry(index: usize, start: u64, end: u64, text: &str) -> Entry {
    Entry::from_text(index, Timestamp::from_millis(start), Timestamp::from_millis(end), text)
}

fn dense_sequence() -> Vec<Entry> {
    vec![
        entry(1, 0, 1_000, "I really cannot believe you did that to me"),
        entry(2, 1_000, 2_000, "You would have done exactly the same thing"),
        entry(3, 2_000, 3_000, "Maybe, but I would have apologized by now."),
        entry(4, 3_000, 6_000, "Fine."),
    ]
}

/// Fill every item with text cut to its budget.
fn fill(path: &std::path::Path) {
    let mut items = load_manifest(path).unwrap();
    for item in &mut items {
        let cut: String = item.text.chars().take(item.char_budget).collect();
        item.shortened_text = Some(cut.trim().to_string());
    }
    std::fs::write(path, serde_json::to_string_pretty(&items).unwrap()).unwrap();
}

#[tokio::test]
async fn test_export_fill_apply_resolves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let pipeline = SubtitlePipeline::new(OptimizerConfig::default()).unwrap();

    let local = pipeline.run_local(dense_sequence());
    assert!(!local.unresolved.is_empty());
    write_manifest(&path, &local.unresolved).unwrap();
    fill(&path);

    let gateway = ManifestGateway::load(&path).unwrap();
    gateway.validate(&local.entries).unwrap();
    assert_eq!(gateway.len(), local.unresolved.len());

    let result = pipeline.resume(local.entries.clone(), &gateway.indices(), &gateway).await.unwrap();
    assert!(result.is_fully_resolved(), "still over target: {:?}", result.unresolved);
    assert_eq!(result.entries.len(), local.entries.len());
}

#[tokio::test]
async fn test_partial_manifest_leaves_rest_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let pipeline = SubtitlePipeline::new(OptimizerConfig::default()).unwrap();

    let local = pipeline.run_local(dense_sequence());
    write_manifest(&path, &local.unresolved).unwrap();
    fill(&path);
    let mut items = load_manifest(&path).unwrap();
    items[0].shortened_text = None;
    let skipped = items[0].index;

    let gateway = ManifestGateway::from_items(&items).unwrap();
    let result = pipeline.resume(local.entries.clone(), &gateway.indices(), &gateway).await.unwrap();
    assert_eq!(result.unresolved.len(), 1);
    assert_eq!(result.unresolved[0].index, skipped);
}

#[test]
fn test_manifest_against_other_file_mismatches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    std::fs::write(&path, r#"[{"index": 40, "shortened_text": "Hi."}]"#).unwrap();

    let gateway = ManifestGateway::load(&path).unwrap();
    let err = gateway.validate(&dense_sequence()).unwrap_err();
    assert!(matches!(err, SubFitError::ManifestMismatch(_)));
}

#[test]
fn test_missing_manifest_is_io_error() {
    let err = ManifestGateway::load(std::path::Path::new("/nonexistent/manifest.json")).unwrap_err();
    assert!(matches!(err, SubFitError::Io(_)));
}
