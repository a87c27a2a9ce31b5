//! Wires the phases together: intake -> extraction -> classification ->
//! script generation.

use crate::config::AppConfig;
use crate::models::{FileRecord, RecordStatus};
use crate::orchestrator::Orchestrator;
use crate::script::{self, PowerShell, ShellDialect};
use crate::store::{BatchStore, Progress};
use crate::taxonomy::TaxonomyStore;
use crate::{extractor, intake};
use anyhow::Context;
use providers::noop::NoopProvider;
use providers::ooxml::OoxmlExtractor;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub enum PipelineMode {
    Scan,
    Classify,
    Script,
}

#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub ingested: usize,
    pub folder_hints: usize,
    pub extracted: usize,
    pub done: usize,
    pub failed: usize,
}

pub struct PipelineOptions {
    /// Either one source directory or an explicit list of files.
    pub sources: Vec<PathBuf>,
    pub destination: Option<String>,
    /// Adopt every classifier-suggested name in the generated script.
    pub use_suggested_names: bool,
    /// Replaces the configured folder seed when set.
    pub folders: Option<String>,
}

impl PipelineOptions {
    /// Base path the generated script moves files out of: the selected
    /// directory, or the parent of the first picked file.
    fn source_root(&self) -> Option<PathBuf> {
        let first = self.sources.first()?;
        if first.is_dir() {
            Some(first.clone())
        } else {
            first.parent().map(Path::to_path_buf)
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub summary: PipelineSummary,
    pub records: Vec<FileRecord>,
    pub folders: Vec<String>,
    pub script: Option<String>,
}

pub async fn run(
    config: AppConfig,
    mode: PipelineMode,
    options: PipelineOptions,
) -> anyhow::Result<PipelineOutcome> {
    let registry = build_registry(&config);
    run_with_registry(config, mode, options, &registry).await
}

pub async fn run_with_registry(
    config: AppConfig,
    mode: PipelineMode,
    options: PipelineOptions,
    registry: &ProviderRegistry,
) -> anyhow::Result<PipelineOutcome> {
    let taxonomy = TaxonomyStore::new(
        options
            .folders
            .as_deref()
            .unwrap_or(&config.taxonomy.folders),
    );
    let store = BatchStore::new();
    let mut summary = PipelineSummary::default();

    let outcome = match options.sources.as_slice() {
        [dir] if dir.is_dir() => {
            info!(source = %dir.display(), "starting directory intake");
            intake::ingest_dir(dir, &config.scan.exclude)
                .await
                .context("intake")?
        }
        files => {
            info!(files = files.len(), "starting file intake");
            intake::IntakeOutcome {
                records: intake::ingest_files(files).await,
                folder_hints: Vec::new(),
            }
        }
    };
    summary.ingested = outcome.records.len();
    summary.folder_hints = outcome.folder_hints.len();
    taxonomy.add_folders(&outcome.folder_hints);
    store.append_all(outcome.records);
    info!(
        records = summary.ingested,
        hints = summary.folder_hints,
        "intake complete"
    );

    if let Some(destination) = &options.destination {
        let dest_path = PathBuf::from(destination);
        if dest_path.is_dir() {
            let discovered =
                intake::scan_destination(&dest_path, &config.scan.exclude).context("destination scan")?;
            taxonomy.add_folders(&discovered);
            if let Some(name) = dest_path.file_name() {
                taxonomy.set_detected_destination(&name.to_string_lossy());
            }
        }
    }

    if matches!(mode, PipelineMode::Classify | PipelineMode::Script) {
        info!("starting extraction phase");
        summary.extracted = extractor::run_extractor(&store, registry)
            .await
            .context("extraction")?;

        info!("starting classification phase");
        let classifier = registry
            .classifier(Some(&config.classifier.provider))
            .context("classifier provider")?;
        let orchestrator = Orchestrator::new(config.orchestrator.window_size);
        let progress = Progress::new();
        orchestrator
            .classify_batch(
                &store,
                &taxonomy.folders(),
                &taxonomy,
                classifier,
                &progress,
            )
            .await
            .context("classification")?;
    }

    if options.use_suggested_names {
        store.replace(|records| {
            records
                .into_iter()
                .map(|mut record| {
                    if record.suggested_name.is_some() {
                        record.use_new_name = true;
                    }
                    record
                })
                .collect()
        });
    }

    let records = store.snapshot();
    summary.done = records
        .iter()
        .filter(|r| r.status == RecordStatus::Done)
        .count();
    summary.failed = records
        .iter()
        .filter(|r| r.status == RecordStatus::Error)
        .count();

    let script = if matches!(mode, PipelineMode::Script) {
        let destination = options
            .destination
            .as_deref()
            .context("script generation requires a destination path")?;
        let source_root = options
            .source_root()
            .context("script generation requires a source path")?;
        let source = source_root.to_string_lossy().into_owned();
        let dialect = build_dialect(&config.script.shell);
        let terminal: Vec<FileRecord> = records.iter().filter(|r| r.is_terminal()).cloned().collect();
        Some(
            script::generate_script(&terminal, &source, destination, dialect.as_ref())
                .context("script generation")?,
        )
    } else {
        None
    };

    Ok(PipelineOutcome {
        summary,
        folders: taxonomy.folders(),
        records,
        script,
    })
}

pub fn build_dialect(name: &str) -> Box<dyn ShellDialect> {
    match name {
        "powershell" => Box::new(PowerShell),
        other => {
            warn!(shell = other, "unknown shell dialect, using powershell");
            Box::new(PowerShell)
        }
    }
}

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new()
        .with_classifier("noop", Arc::new(NoopProvider))
        .with_extractor("ooxml", Arc::new(OoxmlExtractor))
        .set_preferred_extractor("ooxml");

    if let (Some(key), Some(base)) = (
        std::env::var_os("OPENAI_API_KEY"),
        std::env::var_os("OPENAI_BASE_URL"),
    ) {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base.to_string_lossy().into_owned(),
            chat_model: config.classifier.model.clone(),
        });
        reg = reg.with_classifier("openai", Arc::new(provider));
    }

    reg.set_preferred_classifier(&config.classifier.provider)
}
