//! Live folder taxonomy: a user-editable comma-separated configuration
//! string and the normalized selectable list derived from it.

use std::sync::Mutex;
use tracing::debug;

/// Fallback category, always present in the normalized list.
pub const MISC_FOLDER: &str = "Miscellaneous";

/// Sentinel `final_folder` value meaning "leave the file in place".
pub const DO_NOT_MOVE: &str = "(do not move)";

/// Characters Windows forbids in path segments.
const ILLEGAL_PATH_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Strip illegal characters and collapse separators to single `/`.
/// Folder suggestions may legitimately contain `/` as a subfolder
/// delimiter, so separators survive.
pub fn sanitize_folder(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c == '\\' { '/' } else { c })
        .filter(|c| !ILLEGAL_PATH_CHARS.contains(c))
        .collect();
    cleaned
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// File names additionally may not contain separators.
pub fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !ILLEGAL_PATH_CHARS.contains(c) && *c != '/' && *c != '\\')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalize a comma-separated folder configuration into the effective
/// list: sanitized, case-insensitively deduplicated (first-seen casing
/// wins), guaranteed to contain [`MISC_FOLDER`], sorted.
pub fn normalize(config: &str) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    for entry in config.split(',') {
        let folder = sanitize_folder(entry);
        if folder.is_empty() {
            continue;
        }
        if !seen.iter().any(|f| f.eq_ignore_ascii_case(&folder)) {
            seen.push(folder);
        }
    }
    if !seen.iter().any(|f| f.eq_ignore_ascii_case(MISC_FOLDER)) {
        seen.push(MISC_FOLDER.to_string());
    }
    seen.sort_by_key(|f| f.to_lowercase());
    seen
}

#[derive(Debug, Default)]
struct TaxonomyState {
    config: String,
    detected_destination: Option<String>,
}

/// Source of truth for destination folders. Merges from concurrent
/// classification results are monotonic additions under one lock, so a
/// read-decide-write race can at worst produce a duplicate that the next
/// normalization pass collapses.
#[derive(Debug, Default)]
pub struct TaxonomyStore {
    state: Mutex<TaxonomyState>,
}

impl TaxonomyStore {
    pub fn new(initial_config: &str) -> Self {
        Self {
            state: Mutex::new(TaxonomyState {
                config: initial_config.to_string(),
                detected_destination: None,
            }),
        }
    }

    pub fn config(&self) -> String {
        self.state.lock().expect("taxonomy poisoned").config.clone()
    }

    /// Manual edit of the configuration string. Wins over any previously
    /// auto-detected destination directory name.
    pub fn set_config(&self, config: &str) {
        let mut state = self.state.lock().expect("taxonomy poisoned");
        state.config = config.to_string();
        state.detected_destination = None;
    }

    pub fn set_detected_destination(&self, name: &str) {
        let mut state = self.state.lock().expect("taxonomy poisoned");
        state.detected_destination = Some(name.to_string());
    }

    pub fn detected_destination(&self) -> Option<String> {
        self.state
            .lock()
            .expect("taxonomy poisoned")
            .detected_destination
            .clone()
    }

    /// Effective candidate folders offered to the classifier.
    pub fn folders(&self) -> Vec<String> {
        normalize(&self.config())
    }

    /// Folders offered to the user, including the do-not-move sentinel.
    pub fn selectable(&self) -> Vec<String> {
        let mut folders = self.folders();
        folders.push(DO_NOT_MOVE.to_string());
        folders
    }

    /// Add discovered folder names (directory scan hints) that are not
    /// already present case-insensitively.
    pub fn add_folders<I, S>(&self, folders: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for folder in folders {
            self.merge(folder.as_ref());
        }
    }

    /// Merge one raw folder into the taxonomy. Returns the canonical form
    /// to use as `final_folder`: the existing entry's casing when a
    /// case-insensitive match exists, otherwise the sanitized input, now
    /// appended to the configuration. Idempotent.
    pub fn merge(&self, raw: &str) -> String {
        let folder = sanitize_folder(raw);
        if folder.is_empty() {
            return MISC_FOLDER.to_string();
        }
        let mut state = self.state.lock().expect("taxonomy poisoned");
        let current = normalize(&state.config);
        if let Some(existing) = current.iter().find(|f| f.eq_ignore_ascii_case(&folder)) {
            return existing.clone();
        }
        debug!(folder = %folder, "adding suggested folder to taxonomy");
        if state.config.trim().is_empty() {
            state.config = folder.clone();
        } else {
            state.config = format!("{}, {}", state.config, folder);
        }
        folder
    }
}
