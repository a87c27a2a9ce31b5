//! Drives pending records through the classifier in fixed-size windows of
//! concurrent calls, reconciling suggested folders into the taxonomy.

use crate::models::{Payload, RecordStatus};
use crate::store::{BatchStore, Progress};
use crate::taxonomy::{sanitize_file_name, TaxonomyStore};
use providers::{ClassifierProvider, ClassifyContent, ClassifyRequest, ClassifyResponse, ProviderError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub const DEFAULT_WINDOW_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error("no destination folders configured")]
    EmptyFolderList,
}

pub struct Orchestrator {
    window_size: usize,
    running: AtomicBool,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl Orchestrator {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Classify every pending record in the store. No-op when a run is
    /// already active or nothing is pending; refuses up front when the
    /// candidate folder list is empty. Every submitted record ends in a
    /// terminal status; partial failures never abort remaining windows.
    pub async fn classify_batch(
        &self,
        store: &BatchStore,
        folders: &[String],
        taxonomy: &TaxonomyStore,
        classifier: Arc<dyn ClassifierProvider>,
        progress: &Progress,
    ) -> Result<(), OrchestrateError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("classification already running, ignoring request");
            return Ok(());
        }
        let result = self
            .classify_batch_inner(store, folders, taxonomy, classifier, progress)
            .await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn classify_batch_inner(
        &self,
        store: &BatchStore,
        folders: &[String],
        taxonomy: &TaxonomyStore,
        classifier: Arc<dyn ClassifierProvider>,
        progress: &Progress,
    ) -> Result<(), OrchestrateError> {
        let pending: Vec<String> = store
            .snapshot()
            .into_iter()
            .filter(|r| r.status == RecordStatus::Pending)
            .map(|r| r.id)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        if folders.is_empty() {
            return Err(OrchestrateError::EmptyFolderList);
        }

        // Eager transition: every pending record shows as processing
        // before the first call is issued.
        store.replace(|records| {
            records
                .into_iter()
                .map(|mut record| {
                    if record.status == RecordStatus::Pending {
                        record.status = RecordStatus::Processing;
                    }
                    record
                })
                .collect()
        });
        progress.begin(pending.len());
        info!(records = pending.len(), window = self.window_size, "starting classification");

        let by_id: std::collections::HashMap<String, _> = store
            .snapshot()
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        // Window N+1 never starts before window N fully settled; records
        // within a window race freely.
        for window in pending.chunks(self.window_size) {
            let mut set: JoinSet<(String, Result<ClassifyResponse, ProviderError>)> = JoinSet::new();
            for id in window {
                let Some(record) = by_id.get(id) else { continue };
                let request = match build_request(record, folders) {
                    Some(request) => request,
                    None => {
                        settle_error(store, progress, id, "no classifier payload");
                        continue;
                    }
                };
                let classifier = classifier.clone();
                let id = id.clone();
                set.spawn(async move {
                    let outcome = classifier.classify(&request).await;
                    (id, outcome)
                });
            }
            while let Some(joined) = set.join_next().await {
                let (id, outcome) = match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "classification task panicked");
                        continue;
                    }
                };
                match outcome {
                    Ok(response) => settle_done(store, taxonomy, progress, &id, response),
                    Err(e) => {
                        warn!(record = %id, error = %e, "classification failed");
                        settle_error(store, progress, &id, "classification failed");
                    }
                }
            }
        }
        info!(settled = progress.settled(), "classification complete");
        Ok(())
    }
}

fn build_request(record: &crate::models::FileRecord, folders: &[String]) -> Option<ClassifyRequest> {
    let content = match record.payload.as_ref()? {
        Payload::Base64 { data_url, .. } => ClassifyContent::DataUrl(data_url.clone()),
        Payload::Text { text } => ClassifyContent::Text(text.clone()),
    };
    Some(ClassifyRequest {
        content,
        mime_type: record.mime.clone(),
        file_name: record.name.clone(),
        candidate_folders: folders.to_vec(),
    })
}

fn settle_done(
    store: &BatchStore,
    taxonomy: &TaxonomyStore,
    progress: &Progress,
    id: &str,
    response: ClassifyResponse,
) {
    let final_folder = taxonomy.merge(&response.folder);
    let suggested_name = {
        let name = sanitize_file_name(&response.suggested_filename);
        (!name.is_empty()).then_some(name)
    };
    store.update(id, |record| {
        record.status = RecordStatus::Done;
        record.suggestion = Some(response.folder.clone());
        record.final_folder = Some(final_folder.clone());
        record.tags = response.tags.clone();
        record.summary = Some(response.summary.clone());
        record.suggested_name = suggested_name.clone();
    });
    progress.record_settled();
}

fn settle_error(store: &BatchStore, progress: &Progress, id: &str, message: &str) {
    store.update(id, |record| {
        record.status = RecordStatus::Error;
        record.error_message = Some(message.to_string());
    });
    progress.record_settled();
}
