//! Generates the shell script that performs the accumulated move/rename
//! decisions. The application itself never touches the filesystem.

use crate::models::FileRecord;
use crate::taxonomy::DO_NOT_MOVE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{0} path must be a non-empty absolute path")]
    RelativePath(&'static str),
}

/// Target-shell dialect: native separator, quoting convention, and the
/// guarded statement shapes. PowerShell is the shipped default; other
/// dialects plug in here.
pub trait ShellDialect: Send + Sync {
    fn name(&self) -> &'static str;
    fn separator(&self) -> char;
    /// Quote a path or name as a literal. Embedded quote characters must
    /// be escaped per the dialect; getting this wrong produces a broken,
    /// unsafe script.
    fn quote(&self, raw: &str) -> String;
    /// Byte-order marker the shell needs to read non-ASCII names.
    fn bom(&self) -> &'static str;
    fn header(&self, moves: usize, folders: usize) -> String;
    fn create_dir_guard(&self, path: &str) -> String;
    fn guarded_move(&self, from: &str, to: &str) -> String;
    fn guarded_rename(&self, from: &str, new_name: &str) -> String;
    fn footer(&self) -> String;
}

#[derive(Debug, Default)]
pub struct PowerShell;

impl ShellDialect for PowerShell {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn separator(&self) -> char {
        '\\'
    }

    fn quote(&self, raw: &str) -> String {
        format!("'{}'", raw.replace('\'', "''"))
    }

    fn bom(&self) -> &'static str {
        "\u{FEFF}"
    }

    fn header(&self, moves: usize, folders: usize) -> String {
        format!(
            "# File triage script\n\
             # Generated: {}\n\
             # Creates {} folder(s) and performs {} file operation(s).\n\
             # Review before running.\n",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            folders,
            moves,
        )
    }

    fn create_dir_guard(&self, path: &str) -> String {
        let q = self.quote(path);
        format!("if (-not (Test-Path -LiteralPath {q})) {{ New-Item -ItemType Directory -Path {q} | Out-Null }}\n")
    }

    fn guarded_move(&self, from: &str, to: &str) -> String {
        format!(
            "if (Test-Path -LiteralPath {from_q}) {{\n    Move-Item -LiteralPath {from_q} -Destination {to_q}\n}} else {{\n    Write-Warning {warn_q}\n}}\n",
            from_q = self.quote(from),
            to_q = self.quote(to),
            warn_q = self.quote(&format!("source missing: {from}")),
        )
    }

    fn guarded_rename(&self, from: &str, new_name: &str) -> String {
        format!(
            "if (Test-Path -LiteralPath {from_q}) {{\n    Rename-Item -LiteralPath {from_q} -NewName {name_q}\n}} else {{\n    Write-Warning {warn_q}\n}}\n",
            from_q = self.quote(from),
            name_q = self.quote(new_name),
            warn_q = self.quote(&format!("source missing: {from}")),
        )
    }

    fn footer(&self) -> String {
        "Write-Host 'File triage complete.'\n".to_string()
    }
}

/// A drive-letter colon or a leading root separator.
fn looks_absolute(path: &str) -> bool {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(first), _) if first == '/' || first == '\\' => true,
        (Some(first), Some(':')) => first.is_ascii_alphabetic(),
        _ => false,
    }
}

enum Statement {
    Move { folder: String },
    Rename,
}

fn decision(record: &FileRecord) -> Option<Statement> {
    match record.final_folder.as_deref() {
        Some(folder) if folder != DO_NOT_MOVE => Some(Statement::Move {
            folder: folder.to_string(),
        }),
        _ if record.effective_name() != record.original_file_name() => Some(Statement::Rename),
        _ => None,
    }
}

fn join(dialect: &dyn ShellDialect, base: &str, tail: &str) -> String {
    let sep = dialect.separator();
    let base = base.trim_end_matches(['/', '\\']);
    let tail: String = tail
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect();
    format!("{base}{sep}{tail}")
}

/// Render the script for every record with an actionable decision. Pure:
/// refuses entirely rather than producing a partial script.
pub fn generate_script(
    records: &[FileRecord],
    source: &str,
    destination: &str,
    dialect: &dyn ShellDialect,
) -> Result<String, ScriptError> {
    if !looks_absolute(source) {
        return Err(ScriptError::RelativePath("source"));
    }
    if !looks_absolute(destination) {
        return Err(ScriptError::RelativePath("destination"));
    }

    let participants: Vec<(&FileRecord, Statement)> = records
        .iter()
        .filter_map(|record| decision(record).map(|statement| (record, statement)))
        .collect();

    // Distinct destination folders, first-seen order and casing.
    let mut folders: Vec<&str> = Vec::new();
    for (_, statement) in &participants {
        if let Statement::Move { folder } = statement {
            if !folders.iter().any(|f| f.eq_ignore_ascii_case(folder)) {
                folders.push(folder);
            }
        }
    }

    let mut script = String::new();
    script.push_str(dialect.bom());
    script.push_str(&dialect.header(participants.len(), folders.len()));
    script.push('\n');

    for folder in &folders {
        script.push_str(&dialect.create_dir_guard(&join(dialect, destination, folder)));
    }
    if !folders.is_empty() {
        script.push('\n');
    }

    for (record, statement) in &participants {
        let from = join(dialect, source, record.original_file_name());
        match statement {
            Statement::Move { folder } => {
                let folder_path = join(dialect, destination, folder);
                let to = join(dialect, &folder_path, record.effective_name());
                script.push_str(&dialect.guarded_move(&from, &to));
            }
            Statement::Rename => {
                script.push_str(&dialect.guarded_rename(&from, record.effective_name()));
            }
        }
    }

    script.push('\n');
    script.push_str(&dialect.footer());
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileRecord, RecordStatus};
    use std::path::PathBuf;

    fn done_record(original_path: &str, folder: Option<&str>) -> FileRecord {
        let name = original_path.rsplit('/').next().unwrap().to_string();
        let mut record = FileRecord::new(
            PathBuf::from(format!("/in/{original_path}")),
            name,
            "application/pdf".into(),
            5,
            original_path.into(),
        );
        record.status = RecordStatus::Done;
        record.final_folder = folder.map(str::to_string);
        record
    }

    #[test]
    fn worked_example_from_the_contract() {
        let mut record = done_record("Scan/invoice (old).pdf", Some("Invoices"));
        record.suggested_name = Some("invoice-2024.pdf".into());
        record.use_new_name = true;

        let script =
            generate_script(&[record], r"C:\In", r"C:\Out", &PowerShell).unwrap();

        assert!(script.starts_with('\u{FEFF}'));
        assert!(script.contains(r"if (-not (Test-Path -LiteralPath 'C:\Out\Invoices'))"));
        assert!(script.contains(r"Move-Item -LiteralPath 'C:\In\invoice (old).pdf' -Destination 'C:\Out\Invoices\invoice-2024.pdf'"));
    }

    #[test]
    fn refuses_relative_paths() {
        let record = done_record("a.pdf", Some("Invoices"));
        let err = generate_script(std::slice::from_ref(&record), "myfolder", r"C:\Dest", &PowerShell)
            .unwrap_err();
        assert!(matches!(err, ScriptError::RelativePath("source")));
        let err = generate_script(std::slice::from_ref(&record), r"C:\Src", "", &PowerShell)
            .unwrap_err();
        assert!(matches!(err, ScriptError::RelativePath("destination")));
        // Unix-style roots are also absolute.
        assert!(generate_script(&[record], "/in", "/out", &PowerShell).is_ok());
    }

    #[test]
    fn sentinel_without_rename_emits_nothing_for_the_record() {
        let parked = done_record("keep.pdf", Some(DO_NOT_MOVE));
        let moved = done_record("go.pdf", Some("Invoices"));
        let script =
            generate_script(&[parked, moved], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert!(!script.contains("keep.pdf"));
        assert!(script.contains("go.pdf"));
    }

    #[test]
    fn sentinel_with_rename_becomes_in_place_rename() {
        let mut record = done_record("draft.pdf", Some(DO_NOT_MOVE));
        record.suggested_name = Some("final.pdf".into());
        record.use_new_name = true;
        let script =
            generate_script(&[record], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert!(script.contains(r"Rename-Item -LiteralPath 'C:\In\draft.pdf' -NewName 'final.pdf'"));
        assert!(!script.contains("Move-Item"));
    }

    #[test]
    fn embedded_single_quotes_are_doubled() {
        let record = done_record("o'brien's scan.pdf", Some("Pat's Files"));
        let script =
            generate_script(&[record], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert!(script.contains(r"'C:\In\o''brien''s scan.pdf'"));
        assert!(script.contains(r"'C:\Out\Pat''s Files'"));
        // Every quoted literal closes: quote count must be even.
        let quotes = script.matches('\'').count();
        assert_eq!(quotes % 2, 0);
    }

    #[test]
    fn folder_guards_are_deduplicated_case_insensitively() {
        let a = done_record("a.pdf", Some("Invoices"));
        let b = done_record("b.pdf", Some("invoices"));
        let script = generate_script(&[a, b], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert_eq!(script.matches("New-Item -ItemType Directory").count(), 1);
        // First-seen casing wins in the guard.
        assert!(script.contains(r"'C:\Out\Invoices'"));
    }

    #[test]
    fn statements_follow_input_order() {
        let records: Vec<FileRecord> = ["z.pdf", "a.pdf", "m.pdf"]
            .into_iter()
            .map(|n| done_record(n, Some("Docs")))
            .collect();
        let script = generate_script(&records, r"C:\In", r"C:\Out", &PowerShell).unwrap();
        let z = script.find("z.pdf").unwrap();
        let a = script.find("a.pdf").unwrap();
        let m = script.find("m.pdf").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn subfolder_separators_use_the_dialect_native_form() {
        let record = done_record("a.pdf", Some("Taxes/2024/Q1"));
        let script = generate_script(&[record], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert!(script.contains(r"'C:\Out\Taxes\2024\Q1'"));
    }

    #[test]
    fn missing_source_is_a_warning_not_a_failure() {
        let record = done_record("gone.pdf", Some("Docs"));
        let script = generate_script(&[record], r"C:\In", r"C:\Out", &PowerShell).unwrap();
        assert!(script.contains(r"Write-Warning 'source missing: C:\In\gone.pdf'"));
    }
}
