use crate::{
    ClassifierProvider, ClassifyRequest, ClassifyResponse, ProviderError, TextExtractor,
};

#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl ClassifierProvider for NoopProvider {
    async fn classify(&self, _request: &ClassifyRequest) -> Result<ClassifyResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}

#[async_trait::async_trait]
impl TextExtractor for NoopProvider {
    async fn extract_text(&self, _document: &[u8]) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
