mod common;

use common::{AFIB_TEXT, FlakyStore, HashEmbedder, RecordingGenerator, started_app};
use medqa::adapters::MemoryStore;
use medqa::domain::{Metadata, MetadataValue};
use medqa::{Config, MedQa, MedQaError};
use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_ingest_text_reports_first_entry_id() {
    let (app, _) = started_app(50, 10).await;
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), "cardiology.txt".into());

    let report = assert_ok!(app.ingest_text(AFIB_TEXT, metadata).await);
    assert_eq!(report.chunks_created, 3);
    assert!(report.document_id.is_some());

    let passages = assert_ok!(app.find_similar("palpitations fatigue", 3, None).await);
    for passage in &passages {
        assert_eq!(
            passage.metadata.get("source"),
            Some(&MetadataValue::Text("cardiology.txt".to_string()))
        );
        assert!(passage.metadata.contains_key("chunk_id"));
        assert!(passage.metadata.contains_key("chunk_index"));
    }
}

#[tokio::test]
async fn test_blank_text_is_rejected() {
    let (app, _) = started_app(1000, 100).await;
    let err = assert_err!(app.ingest_text(" \n\t ", Metadata::new()).await);
    assert!(matches!(err, MedQaError::Validation(_)));
}

#[tokio::test]
async fn test_upload_accepts_text_and_records_metadata() {
    let (app, _) = started_app(1000, 100).await;
    let report = assert_ok!(
        app.ingest_upload("stroke.md", "text/markdown", b"# Stroke\nSudden numbness and slurred speech.")
            .await
    );
    assert_eq!(report.chunks_created, 1);

    let passages = assert_ok!(app.find_similar("slurred speech", 1, None).await);
    let metadata = &passages[0].metadata;
    assert_eq!(metadata.get("filename").and_then(MetadataValue::as_str), Some("stroke.md"));
    assert_eq!(metadata.get("content_type").and_then(MetadataValue::as_str), Some("text/markdown"));
    let uploaded = metadata.get("upload_time").and_then(MetadataValue::as_str).unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(uploaded).is_ok());
}

#[tokio::test]
async fn test_upload_rejects_pdf_and_other_types() {
    let (app, _) = started_app(1000, 100).await;

    let err = assert_err!(app.ingest_upload("scan.pdf", "application/pdf", b"%PDF-1.7").await);
    assert!(matches!(err, MedQaError::UnsupportedInput(_)));

    let err = assert_err!(app.ingest_upload("xray.png", "image/png", b"\x89PNG").await);
    assert!(matches!(err, MedQaError::Validation(_)));

    let err = assert_err!(app.ingest_upload("notes.txt", "text/plain", &[0xff, 0xfe, 0x00]).await);
    assert!(matches!(err, MedQaError::Validation(_)));
}

#[tokio::test]
async fn test_ingest_file_by_extension() {
    let (app, _) = started_app(1000, 100).await;
    let dir = tempfile::tempdir().unwrap();

    let notes = dir.path().join("asthma.txt");
    std::fs::write(&notes, "Asthma causes wheezing and shortness of breath.").unwrap();
    let report = assert_ok!(app.ingest_file(&notes).await);
    assert_eq!(report.chunks_created, 1);

    let passages = assert_ok!(app.find_similar("wheezing", 1, None).await);
    assert_eq!(
        passages[0].metadata.get("source").and_then(MetadataValue::as_str),
        Some(notes.display().to_string().as_str())
    );

    let pdf = dir.path().join("asthma.pdf");
    std::fs::write(&pdf, b"%PDF-1.7").unwrap();
    let err = assert_err!(app.ingest_file(&pdf).await);
    assert!(matches!(err, MedQaError::UnsupportedInput(_)));

    let csv = dir.path().join("vitals.csv");
    std::fs::write(&csv, "bp,hr\n120,70").unwrap();
    let err = assert_err!(app.ingest_file(&csv).await);
    assert!(matches!(err, MedQaError::UnsupportedInput(_)));
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_batches() {
    let memory = MemoryStore::new("medical");
    let mut config = Config::default();
    config.ingest.skip_document_processing = true;
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 0;
    config.vector_store.upsert_batch_size = 2;

    let app = MedQa::new(
        config,
        HashEmbedder,
        FlakyStore::failing_after_upserts(memory.clone(), 1),
        RecordingGenerator::default(),
    )
    .unwrap();
    assert_ok!(app.start().await);

    let text = "Heart failure reduces cardiac output and causes fluid retention. ".repeat(5);
    let err = assert_err!(app.ingest_text(&text, Metadata::new()).await);
    assert!(matches!(err, MedQaError::VectorStore(_)));
    assert_eq!(memory.len().await, 2);
}

#[tokio::test]
async fn test_unreachable_store_fails_startup() {
    let app = MedQa::new(
        Config::default(),
        HashEmbedder,
        FlakyStore::unreachable(),
        RecordingGenerator::default(),
    )
    .unwrap();

    let err = assert_err!(app.start().await);
    assert!(err.is_upstream());
    let err = assert_err!(app.ingest_text(AFIB_TEXT, Metadata::new()).await);
    assert!(matches!(err, MedQaError::NotInitialized(_)));
}
