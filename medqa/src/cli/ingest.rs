use std::path::Path;

use medqa::domain::{IngestReport, Metadata};
use medqa::{LiveMedQa, Result};

use super::print_json;

pub async fn run_file(app: &LiveMedQa, path: &Path, json: bool) -> Result<()> {
    let report = app.ingest_file(path).await?;
    output(&report, json)
}

pub async fn run_text(app: &LiveMedQa, text: &str, metadata: Metadata, json: bool) -> Result<()> {
    let report = app.ingest_text(text, metadata).await?;
    output(&report, json)
}

fn output(report: &IngestReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!(
        "Created {} chunks in {:.2}s",
        report.chunks_created, report.latency_seconds
    );
    if let Some(id) = &report.document_id {
        println!("Document id: {id}");
    }
    Ok(())
}
