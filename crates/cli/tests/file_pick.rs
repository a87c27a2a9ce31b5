use providers::{
    ClassifierProvider, ClassifyRequest, ClassifyResponse, ProviderError, ProviderRegistry,
};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use triage_core::config::AppConfig;
use triage_core::models::RecordStatus;
use triage_core::pipeline::{run_with_registry, PipelineMode, PipelineOptions};

struct FolderPerExtension;

#[async_trait::async_trait]
impl ClassifierProvider for FolderPerExtension {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ProviderError> {
        let folder = if request.mime_type == "application/pdf" {
            "Paperwork"
        } else {
            "Pictures"
        };
        Ok(ClassifyResponse {
            folder: folder.to_string(),
            tags: vec!["one".into(), "two".into(), "three".into()],
            summary: "fixture".into(),
            suggested_filename: request.file_name.clone(),
        })
    }
}

#[tokio::test]
async fn explicit_file_pick_keeps_selection_order_and_moves_from_the_parent() {
    let temp = tempdir().unwrap();
    let first = temp.path().join("b-second.pdf");
    let second = temp.path().join("a-first.png");
    fs::write(&first, b"%PDF-1.4").unwrap();
    fs::write(&second, b"png bytes").unwrap();

    let mut cfg = AppConfig::default();
    cfg.classifier.provider = "static".to_string();
    let registry = ProviderRegistry::new().with_classifier("static", Arc::new(FolderPerExtension));

    let dest = temp.path().join("out");
    fs::create_dir_all(&dest).unwrap();
    let outcome = run_with_registry(
        cfg,
        PipelineMode::Script,
        PipelineOptions {
            sources: vec![first.clone(), second.clone()],
            destination: Some(dest.to_string_lossy().into_owned()),
            use_suggested_names: false,
            folders: None,
        },
        &registry,
    )
    .await
    .unwrap();

    // Records keep the pick order, not alphabetical or settle order.
    assert_eq!(outcome.summary.ingested, 2);
    assert_eq!(outcome.records[0].name, "b-second.pdf");
    assert_eq!(outcome.records[1].name, "a-first.png");
    assert!(outcome
        .records
        .iter()
        .all(|r| r.status == RecordStatus::Done));
    assert_eq!(outcome.summary.folder_hints, 0);

    let script = outcome.script.unwrap();
    // Moves originate from the parent of the picked files; folder joins
    // use the dialect's native separator.
    assert!(script.contains(&format!("{}\\b-second.pdf", temp.path().display())));
    assert!(script.contains(&format!("{}\\Paperwork", dest.display())));
    assert!(script.contains(&format!("{}\\Pictures", dest.display())));
}
