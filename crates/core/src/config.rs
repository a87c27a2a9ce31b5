use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Seed for the comma-separated folder configuration string.
    pub folders: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            folders: "Documents, Images, Invoices, Receipts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Concurrent in-flight classification calls per window.
    pub window_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { window_size: 5 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub provider: String,
    pub model: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub shell: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            shell: "powershell".to_string(),
        }
    }
}

/// Zoom bounds for the external preview renderers. The core never zooms
/// anything; these only round-trip to whatever front end hosts a preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub zoom_min_percent: u32,
    pub zoom_max_percent: u32,
    pub zoom_step_percent: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            zoom_min_percent: 25,
            zoom_max_percent: 400,
            zoom_step_percent: 25,
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
