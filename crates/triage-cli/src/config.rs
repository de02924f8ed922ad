use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use triage_core::settings::{
    ApiKey, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_WORKFLOW_NAME, ModelOverrides,
    WebSearchSettings, WorkflowSettings,
};

/// Built-in config, also written by `triage init`
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub models: ModelOverrides,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub web_search: WebSearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_workflow_name")]
    pub name: String,
    /// Trace identifier attached to every run's log span
    #[serde(default)]
    pub id: Option<String>,
}

fn default_workflow_name() -> String {
    DEFAULT_WORKFLOW_NAME.to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            name: default_workflow_name(),
            id: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_true")]
    pub store: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("store", &self.store)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

/// Mask a secret string for safe display in Debug output / logs.
/// Shows first 3 and last 4 chars for keys longer than 7 chars, otherwise "***".
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".triage")
}

impl TriageConfig {
    /// Load config from `custom_path`, or `~/.triage/config.toml`.
    ///
    /// A missing default file falls back to the built-in config; a missing
    /// custom file is an error.
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = match custom_path {
            Some(path) => path.clone(),
            None => {
                let path = config_dir().join("config.toml");
                if !path.exists() {
                    return Self::from_toml_str(DEFAULT_CONFIG)
                        .context("Failed to parse built-in default config");
                }
                path
            }
        };

        check_permissions(&path)?;

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `triage init` first.",
                path.display()
            )
        })?;

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        if !config.provider.api_key.is_empty() && !content.contains("${OPENAI_API_KEY}") {
            warn!(
                "API key is hardcoded in config file. For security, use environment variables: api_key = \"${{OPENAI_API_KEY}}\""
            );
        }

        Ok(config)
    }

    /// Parse TOML after expanding allowlisted `${VAR}` references
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let mut config: Self = toml::from_str(&expanded)?;
        config.normalize();
        Ok(config)
    }

    /// Turn expanded-but-empty values into absent ones
    fn normalize(&mut self) {
        self.knowledge_base
            .vector_store_ids
            .retain(|id| !id.trim().is_empty());
        if self.workflow.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            self.workflow.id = None;
        }
    }

    /// Startup validation: a missing credential or knowledge base is fatal
    pub fn into_settings(self) -> Result<WorkflowSettings> {
        let api_key = ApiKey::new(self.provider.api_key)?;
        let mut settings = WorkflowSettings::new(api_key, self.knowledge_base.vector_store_ids);
        settings.base_url = self.provider.base_url;
        settings.model = self.provider.model;
        settings.models = self.models;
        settings.web_search = self.web_search;
        settings.store = self.provider.store;
        settings.workflow_name = self.workflow.name;
        settings.workflow_id = self.workflow.id;
        settings.validate()?;
        Ok(settings)
    }

    /// Copy safe to print: the API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.provider.api_key = mask_secret(&config.provider.api_key);
        config
    }
}

/// Refuse config files readable by group or other (Unix only)
fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            let mode = metadata.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(anyhow::anyhow!(
                    "Config file {:?} has overly permissive permissions ({:o}). \
                     It may contain secrets. Fix with: chmod 600 {:?}",
                    path,
                    mode & 0o777,
                    path
                ));
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Allowlist of environment variable names that may be expanded in config files.
const ALLOWED_ENV_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "TRIAGE_VECTOR_STORE_ID",
    "TRIAGE_WORKFLOW_ID",
    "HOME",
    "USER",
];

fn expand_env_vars(s: &str) -> String {
    expand_with(s, |name| std::env::var(name).ok())
}

fn expand_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            // Leave the ${VAR} unexpanded so it's obvious
            pos = abs_start + end + 1;
            continue;
        }

        let value = lookup(&var_name).unwrap_or_default();
        let value_len = value.len();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value_len;
    }
    result
}
