//! Turns selected paths into normalized `FileRecord`s and derives folder
//! hints from directory structure.

use crate::models::{FileRecord, DOCX_MIME, PDF_MIME};
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::task::{self, JoinSet};
use tracing::warn;
use walkdir::WalkDir;

/// Result of ingesting a source directory: records for the top-level
/// files plus folder-name hints discovered one level deeper.
#[derive(Debug, Default)]
pub struct IntakeOutcome {
    pub records: Vec<FileRecord>,
    pub folder_hints: Vec<String>,
}

pub fn guess_mime(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "heic" => "image/heic",
            "pdf" => PDF_MIME,
            "docx" => DOCX_MIME,
            _ => "application/octet-stream",
        })
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub fn is_supported(mime: &str) -> bool {
    mime.starts_with("image/") || mime == PDF_MIME || mime == DOCX_MIME
}

/// Ingest explicitly picked files. Metadata reads run fully in parallel;
/// the returned batch is assembled only once every read has settled, so
/// callers can append it to the live batch in one step.
pub async fn ingest_files(paths: &[PathBuf]) -> Vec<FileRecord> {
    let mut set: JoinSet<(usize, FileRecord)> = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        set.spawn(async move { (index, read_record(&path, None).await) });
    }
    let mut indexed = Vec::with_capacity(paths.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => warn!(error = %e, "intake task panicked"),
        }
    }
    // Batch order matches selection order, not settle order.
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, record)| record).collect()
}

async fn read_record(path: &Path, original_path: Option<String>) -> FileRecord {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = guess_mime(path);
    let original_path = original_path.unwrap_or_else(|| name.clone());
    let size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            return FileRecord::new(path.to_path_buf(), name, mime, 0, original_path)
                .failed(&format!("unreadable: {e}"));
        }
    };
    let record = FileRecord::new(path.to_path_buf(), name, mime.clone(), size, original_path);
    if is_supported(&mime) {
        record
    } else {
        record.failed("unsupported type")
    }
}

/// Ingest a selected source directory: files directly below the root are
/// processed, deeper entries only contribute folder-name hints.
pub async fn ingest_dir(root: &Path, excludes: &[String]) -> anyhow::Result<IntakeOutcome> {
    let exclude_set = build_globset(excludes)?;
    let root = root.to_path_buf();

    let (files, folder_hints) = task::spawn_blocking(move || {
        let mut files = Vec::new();
        let mut hints = Vec::new();
        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || should_visit(e.path(), &exclude_set))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if entry.depth() == 0 {
                continue;
            }
            if entry.depth() == 1 {
                if entry.file_type().is_dir() {
                    hints.push(entry.file_name().to_string_lossy().into_owned());
                } else {
                    files.push(entry.path().to_path_buf());
                }
            } else if let Some(hint) = relative_parent(&root, entry.path()) {
                hints.push(hint);
            }
        }
        (files, hints)
    })
    .await
    .context("directory walk")?;

    let mut set: JoinSet<(usize, FileRecord)> = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        let original_path = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        set.spawn(async move { (index, read_record(&path, Some(original_path)).await) });
    }
    let mut indexed = Vec::with_capacity(files.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => warn!(error = %e, "intake task panicked"),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);

    let mut hints = folder_hints;
    hints.dedup();
    Ok(IntakeOutcome {
        records: indexed.into_iter().map(|(_, record)| record).collect(),
        folder_hints: hints,
    })
}

/// Candidate destination folders from an existing destination subtree:
/// every ancestor path segment combination, not just leaves.
pub fn scan_destination(root: &Path, excludes: &[String]) -> anyhow::Result<Vec<String>> {
    let exclude_set = build_globset(excludes)?;
    let mut folders = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || should_visit(e.path(), &exclude_set))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !rel.is_empty() {
                folders.push(rel);
            }
        }
    }
    Ok(folders)
}

fn relative_parent(root: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?.strip_prefix(root).ok()?;
    let rel = parent.to_string_lossy().replace('\\', "/");
    if rel.is_empty() {
        None
    } else {
        Some(rel)
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn should_visit(path: &Path, excludes: &GlobSet) -> bool {
    !excludes.is_match(path) && !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
