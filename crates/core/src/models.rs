use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MIME type of OOXML word-processing documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Processing,
    Done,
    Error,
}

/// Classifier payload for one record. The enum makes the "exactly one
/// payload form" invariant structural.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Base64 { data: String, data_url: String },
    Text { text: String },
}

/// One ingested file and its accumulated classification/decision state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Absolute location of the original file on disk.
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
    /// Path relative to the selected source root, or the bare file name.
    pub original_path: String,
    pub payload: Option<Payload>,
    pub status: RecordStatus,
    /// Raw classifier-suggested folder, set only on success.
    pub suggestion: Option<String>,
    /// User-overridable destination folder, initialized from `suggestion`.
    pub final_folder: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub suggested_name: Option<String>,
    pub use_new_name: bool,
    pub error_message: Option<String>,
}

impl FileRecord {
    pub fn new(path: PathBuf, name: String, mime: String, size: u64, original_path: String) -> Self {
        let id = record_id(&name, size);
        Self {
            id,
            path,
            name,
            mime,
            size,
            original_path,
            payload: None,
            status: RecordStatus::Pending,
            suggestion: None,
            final_folder: None,
            tags: Vec::new(),
            summary: None,
            suggested_name: None,
            use_new_name: false,
            error_message: None,
        }
    }

    pub fn failed(mut self, message: &str) -> Self {
        self.status = RecordStatus::Error;
        self.error_message = Some(message.to_string());
        self
    }

    /// File name component of `original_path`.
    pub fn original_file_name(&self) -> &str {
        self.original_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.original_path)
    }

    /// Name the generated script should move/rename the file to.
    pub fn effective_name(&self) -> &str {
        match (&self.suggested_name, self.use_new_name) {
            (Some(name), true) if !name.is_empty() => name,
            _ => self.original_file_name(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RecordStatus::Done | RecordStatus::Error)
    }
}

/// Stable id for the record's lifetime: name + size + intake timestamp,
/// with a process-wide counter so same-instant intakes stay unique.
fn record_id(name: &str, size: u64) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let digest = blake3::hash(format!("{name}|{size}|{stamp}|{seq}").as_bytes());
    digest.to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(original_path: &str) -> FileRecord {
        FileRecord::new(
            PathBuf::from("/src/a.pdf"),
            "a.pdf".into(),
            PDF_MIME.into(),
            10,
            original_path.into(),
        )
    }

    #[test]
    fn original_file_name_strips_directories() {
        assert_eq!(record("Scan/invoice (old).pdf").original_file_name(), "invoice (old).pdf");
        assert_eq!(record("bare.pdf").original_file_name(), "bare.pdf");
        assert_eq!(record("a\\b\\c.pdf").original_file_name(), "c.pdf");
    }

    #[test]
    fn effective_name_honors_rename_choice() {
        let mut rec = record("old.pdf");
        rec.suggested_name = Some("new.pdf".into());
        assert_eq!(rec.effective_name(), "old.pdf");
        rec.use_new_name = true;
        assert_eq!(rec.effective_name(), "new.pdf");
        rec.suggested_name = Some(String::new());
        assert_eq!(rec.effective_name(), "old.pdf");
    }

    #[test]
    fn ids_are_unique_within_a_batch() {
        let a = record("x.pdf");
        let b = record("x.pdf");
        assert_ne!(a.id, b.id);
    }
}
