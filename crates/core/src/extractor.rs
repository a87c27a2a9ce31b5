//! Populates the classifier payload for ingested records: base64 data
//! URLs for images and PDFs, extracted plain text for word documents.

use crate::models::{Payload, RecordStatus, DOCX_MIME};
use crate::store::BatchStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use providers::{ProviderRegistry, TextExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

enum Extracted {
    Payload { mime: String, payload: Payload },
    Failed(String),
}

/// Extract payloads for every pending record that lacks one. Records are
/// processed independently; one failure never affects siblings.
pub async fn run_extractor(store: &BatchStore, registry: &ProviderRegistry) -> anyhow::Result<usize> {
    let pending: Vec<(String, PathBuf, String)> = store
        .snapshot()
        .into_iter()
        .filter(|r| r.status == RecordStatus::Pending && r.payload.is_none())
        .map(|r| (r.id, r.path, r.mime))
        .collect();

    let extractor = registry.extractor(None).ok();
    let mut set: JoinSet<(String, Extracted)> = JoinSet::new();
    for (id, path, mime) in pending {
        let extractor = extractor.clone();
        set.spawn(async move { (id, extract_one(&path, &mime, extractor).await) });
    }

    let mut extracted = 0usize;
    while let Some(joined) = set.join_next().await {
        let (id, outcome) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "extraction task panicked");
                continue;
            }
        };
        match outcome {
            Extracted::Payload { mime, payload } => {
                extracted += 1;
                store.update(&id, |record| {
                    record.mime = mime;
                    record.payload = Some(payload);
                });
            }
            Extracted::Failed(message) => {
                debug!(record = %id, error = %message, "extraction failed");
                store.update(&id, |record| {
                    record.status = RecordStatus::Error;
                    record.error_message = Some(message);
                });
            }
        }
    }
    Ok(extracted)
}

async fn extract_one(
    path: &PathBuf,
    mime: &str,
    extractor: Option<Arc<dyn TextExtractor>>,
) -> Extracted {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => return Extracted::Failed(format!("unreadable: {e}")),
    };

    if mime == DOCX_MIME {
        let Some(extractor) = extractor else {
            return Extracted::Failed("no text extractor configured".to_string());
        };
        return match extractor.extract_text(&bytes).await {
            Ok(text) => Extracted::Payload {
                mime: mime.to_string(),
                payload: Payload::Text { text },
            },
            Err(e) => Extracted::Failed(format!("text extraction failed: {e}")),
        };
    }

    // Extension-based guesses can lie; prefer the sniffed type when the
    // content identifies itself.
    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type().to_string())
        .filter(|sniffed| sniffed.starts_with("image/") || sniffed == "application/pdf")
        .unwrap_or_else(|| mime.to_string());

    let data = STANDARD.encode(&bytes);
    let data_url = format!("data:{mime};base64,{data}");
    Extracted::Payload {
        mime,
        payload: Payload::Base64 { data, data_url },
    }
}
