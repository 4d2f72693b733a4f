use super::*;
use canvas::export::MemorySource;

#[tokio::test]
async fn exporter_is_reused_per_project_and_format() {
    let state = test_helpers::test_state(MemorySource::new());
    let project = Uuid::new_v4();

    let a = state.exporter(project, OutputFormat::Png).await;
    let b = state.exporter(project, OutputFormat::Png).await;
    assert!(Arc::ptr_eq(&a, &b));

    let jpeg = state.exporter(project, OutputFormat::Jpeg { quality: 80 }).await;
    assert!(!Arc::ptr_eq(&a, &jpeg));
    assert_eq!(jpeg.format(), OutputFormat::Jpeg { quality: 80 });

    let other = state.exporter(Uuid::new_v4(), OutputFormat::Png).await;
    assert!(!Arc::ptr_eq(&a, &other));
    assert_eq!(state.exporters.read().await.len(), 3);
}

#[tokio::test]
async fn prune_keeps_exporters_still_referenced() {
    let state = test_helpers::test_state(MemorySource::new());
    let held = state.exporter(Uuid::new_v4(), OutputFormat::Png).await;
    let dropped = state.exporter(Uuid::new_v4(), OutputFormat::Png).await;
    drop(dropped);

    assert_eq!(state.prune_idle_exporters().await, 1);
    assert_eq!(state.exporters.read().await.len(), 1);
    drop(held);
    assert_eq!(state.prune_idle_exporters().await, 1);
    assert!(state.exporters.read().await.is_empty());
}

#[test]
fn state_clones_share_maps() {
    let state = test_helpers::test_state(MemorySource::new());
    let clone = state.clone();
    assert!(Arc::ptr_eq(&state.exporters, &clone.exporters));
    assert!(Arc::ptr_eq(&state.config, &clone.config));
}
