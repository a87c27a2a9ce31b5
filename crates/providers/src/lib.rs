//! Provider abstractions for classification and document text extraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod noop;
pub mod ooxml;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// What the classifier sees for one file. Binary payloads travel as a
/// data URL so the same request shape covers images and PDFs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifyContent {
    DataUrl(String),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub content: ClassifyContent,
    pub mime_type: String,
    pub file_name: String,
    pub candidate_folders: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub folder: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub suggested_filename: String,
}

#[async_trait::async_trait]
pub trait ClassifierProvider: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ProviderError>;
}

#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document: &[u8]) -> Result<String, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    classifiers: HashMap<String, Arc<dyn ClassifierProvider>>,
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
    pub preferred_classifier: Option<String>,
    pub preferred_extractor: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, name: &str, provider: Arc<dyn ClassifierProvider>) -> Self {
        self.classifiers.insert(name.to_string(), provider);
        self
    }

    pub fn with_extractor(mut self, name: &str, provider: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_classifier(mut self, name: &str) -> Self {
        self.preferred_classifier = Some(name.to_string());
        self
    }

    pub fn set_preferred_extractor(mut self, name: &str) -> Self {
        self.preferred_extractor = Some(name.to_string());
        self
    }

    pub fn classifier(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<dyn ClassifierProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_classifier.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no classifier configured".into()))?;
        self.classifiers
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }

    pub fn extractor(&self, name: Option<&str>) -> Result<Arc<dyn TextExtractor>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_extractor.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no text extractor configured".into()))?;
        self.extractors
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
