use crate::{
    ClassifierProvider, ClassifyContent, ClassifyRequest, ClassifyResponse, ProviderError,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
}

/// Classifier backed by any OpenAI-compatible multimodal chat endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }
}

fn build_prompt(request: &ClassifyRequest) -> String {
    format!(
        "You are a file-triage assistant. Classify the file \"{}\" (MIME {}).\n\
         Prefer one of these existing folders when it fits, otherwise propose a new one:\n{}\n\
         Reply with strict JSON only, no prose, matching:\n\
         {{\"folder\": string, \"tags\": [3-5 strings], \"summary\": string, \
         \"suggested_filename\": string (keep the original extension)}}",
        request.file_name,
        request.mime_type,
        request
            .candidate_folders
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Models habitually wrap JSON in a markdown fence; tolerate that.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[async_trait::async_trait]
impl ClassifierProvider for OpenAiProvider {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ProviderError> {
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessageResp,
        }
        #[derive(Deserialize)]
        struct ChatMessageResp {
            content: String,
        }
        #[derive(Deserialize)]
        struct ChatApiResponse {
            choices: Vec<Choice>,
        }

        let prompt = build_prompt(request);
        let user_content = match &request.content {
            ClassifyContent::DataUrl(url) => json!([
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": url } },
            ]),
            ClassifyContent::Text(text) => json!([
                { "type": "text", "text": format!("{prompt}\n\nDocument text:\n{text}") },
            ]),
        };
        let body = json!({
            "model": self.cfg.chat_model,
            "messages": [{ "role": "user", "content": user_content }],
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.cfg.base_url))
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let parsed: ChatApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| ProviderError::MalformedResponse("no choices".into()))?;

        let response: ClassifyResponse = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let fenced = "```json\n{\"folder\":\"Invoices\"}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"folder\":\"Invoices\"}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn prompt_lists_candidate_folders() {
        let req = ClassifyRequest {
            content: ClassifyContent::Text("hello".into()),
            mime_type: "text/plain".into(),
            file_name: "note.txt".into(),
            candidate_folders: vec!["Invoices".into(), "Receipts".into()],
        };
        let prompt = build_prompt(&req);
        assert!(prompt.contains("- Invoices"));
        assert!(prompt.contains("- Receipts"));
        assert!(prompt.contains("note.txt"));
    }
}
