use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triage_core::config;
use triage_core::models::FileRecord;
use triage_core::pipeline::{self, PipelineMode, PipelineOptions, PipelineOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { sources, json } => {
            let outcome = pipeline::run(
                cfg,
                PipelineMode::Scan,
                PipelineOptions {
                    sources,
                    destination: None,
                    use_suggested_names: false,
                    folders: None,
                },
            )
            .await?;
            report(&outcome, json, None)
        }
        Commands::Classify {
            sources,
            dest,
            folders,
            json,
        } => {
            let outcome = pipeline::run(
                cfg,
                PipelineMode::Classify,
                PipelineOptions {
                    sources,
                    destination: dest,
                    use_suggested_names: false,
                    folders,
                },
            )
            .await?;
            report(&outcome, json, None)
        }
        Commands::Run {
            sources,
            dest,
            out,
            use_suggested_names,
            folders,
            json,
        } => {
            let outcome = pipeline::run(
                cfg,
                PipelineMode::Script,
                PipelineOptions {
                    sources,
                    destination: Some(dest),
                    use_suggested_names,
                    folders,
                },
            )
            .await?;
            if let (Some(script), Some(path)) = (outcome.script.as_deref(), out.as_deref()) {
                std::fs::write(path, script)?;
            }
            report(&outcome, json, out.as_deref())
        }
    }
}

#[derive(Parser)]
#[command(name = "file-triage")]
#[command(about = "Classify a batch of files and generate a move script", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source directory and list the resulting records
    Scan {
        /// Source directory, or an explicit list of files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify ingested files against the folder taxonomy
    Classify {
        /// Source directory, or an explicit list of files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Destination directory; its subtree seeds the taxonomy
        #[arg(long)]
        dest: Option<String>,
        /// Override the configured folder list (comma-separated)
        #[arg(long)]
        folders: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify and emit the move/rename script
    Run {
        /// Source directory, or an explicit list of files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Absolute destination directory for the generated moves
        #[arg(long)]
        dest: String,
        /// Write the script here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Rename files to the classifier-suggested names
        #[arg(long, default_value_t = false)]
        use_suggested_names: bool,
        /// Override the configured folder list (comma-separated)
        #[arg(long)]
        folders: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

fn report(outcome: &PipelineOutcome, json: bool, script_path: Option<&std::path::Path>) -> Result<()> {
    if json {
        let body = serde_json::json!({
            "status": "ok",
            "summary": {
                "ingested": outcome.summary.ingested,
                "folder_hints": outcome.summary.folder_hints,
                "extracted": outcome.summary.extracted,
                "done": outcome.summary.done,
                "failed": outcome.summary.failed,
            },
            "folders": outcome.folders,
            "records": outcome.records,
            "script_written_to": script_path.map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "ingested {}, extracted {}, classified {} ok / {} failed",
        outcome.summary.ingested, outcome.summary.extracted, outcome.summary.done, outcome.summary.failed
    );
    println!("folders: {}", outcome.folders.join(", "));
    for record in &outcome.records {
        print_record(record);
    }
    match (outcome.script.as_deref(), script_path) {
        (Some(_), Some(path)) => println!("script written to {}", path.display()),
        (Some(script), None) => print!("{script}"),
        _ => {}
    }
    Ok(())
}

fn print_record(record: &FileRecord) {
    let status = serde_json::to_value(record.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    match (&record.final_folder, &record.error_message) {
        (_, Some(error)) => println!("  [{status}] {} - {error}", record.original_path),
        (Some(folder), None) => println!(
            "  [{status}] {} -> {}/{}",
            record.original_path,
            folder,
            record.effective_name()
        ),
        (None, None) => println!("  [{status}] {}", record.original_path),
    }
}
