use crate::record::Project;
use crate::schema::{ColumnSchema, Field};
use crate::source::SourceSpec;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Named schema variant; ignored when `columns` is given explicitly.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Explicit ordered column list for deployments that drift from the
    /// named variants.
    pub columns: Option<Vec<Field>>,
    /// Consult the compiled-in payload before any network access.
    #[serde(default)]
    pub embedded: bool,
    pub json_url: Option<String>,
    pub sheet_url: Option<String>,
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
}

fn default_schema() -> String {
    "standard".to_string()
}

fn default_local_path() -> PathBuf {
    PathBuf::from("data/projects.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    /// Quiescence delay before a search keystroke burst triggers one
    /// filter/render pass.
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }
}

impl DataConfig {
    pub fn column_schema(&self) -> Result<ColumnSchema> {
        if let Some(columns) = &self.columns {
            return ColumnSchema::new("custom", columns.clone());
        }
        ColumnSchema::by_name(&self.schema)
            .ok_or_else(|| anyhow::anyhow!("unknown schema variant '{}'", self.schema))
    }

    /// Candidate sources in fallback priority order: embedded payload,
    /// committed JSON, published sheet export, local file last.
    pub fn source_chain(&self, embedded: Option<Vec<Project>>) -> Vec<SourceSpec> {
        let mut chain = Vec::new();
        if let Some(projects) = embedded {
            chain.push(SourceSpec::Embedded(projects));
        }
        if let Some(url) = &self.json_url {
            chain.push(SourceSpec::JsonDocument { url: url.clone() });
        }
        if let Some(url) = &self.sheet_url {
            chain.push(SourceSpec::PublishedSheet { url: url.clone() });
        }
        chain.push(SourceSpec::LocalFile {
            path: self.local_path.clone(),
        });
        chain
    }
}
