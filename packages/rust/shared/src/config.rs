//! Application configuration for docbind.
//!
//! User config lives at `~/.docbind/docbind.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocbindError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docbind.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docbind";

// ---------------------------------------------------------------------------
// Config structs (matching docbind.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the reference page comes from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Selectors used to segment the page.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Output file names and generated-code knobs.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Versioned documentation URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout. Unset means the fetch waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with the fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_url() -> String {
    "https://core.telegram.org/bots/api".into()
}
fn default_user_agent() -> String {
    concat!("docbind/", env!("CARGO_PKG_VERSION")).into()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Tag of the section headings.
    #[serde(default = "default_heading_selector")]
    pub heading_selector: String,

    /// Anchor element a heading must contain to start an entry.
    #[serde(default = "default_anchor_selector")]
    pub anchor_selector: String,

    /// Container searched for headings.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            heading_selector: default_heading_selector(),
            anchor_selector: default_anchor_selector(),
            content_selector: default_content_selector(),
        }
    }
}

fn default_heading_selector() -> String {
    "h4".into()
}
fn default_anchor_selector() -> String {
    "a.anchor".into()
}
fn default_content_selector() -> String {
    "body".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory all artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Data-type registry dump.
    #[serde(default = "default_types_dump")]
    pub types_dump: String,

    /// Operation registry dump.
    #[serde(default = "default_operations_dump")]
    pub operations_dump: String,

    /// Generated data-model source.
    #[serde(default = "default_models_file")]
    pub models_file: String,

    /// Generated operation-binding source.
    #[serde(default = "default_bindings_file")]
    pub bindings_file: String,

    /// Provenance manifest.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Type the generated bindings are implemented on.
    #[serde(default = "default_client_type")]
    pub client_type: String,

    /// Error type returned by the transport primitive.
    #[serde(default = "default_error_type")]
    pub error_type: String,

    /// Module path the client and error types are imported from.
    #[serde(default = "default_transport_path")]
    pub transport_path: String,

    /// Module path the bindings import the generated models from.
    #[serde(default = "default_models_path")]
    pub models_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            types_dump: default_types_dump(),
            operations_dump: default_operations_dump(),
            models_file: default_models_file(),
            bindings_file: default_bindings_file(),
            manifest_file: default_manifest_file(),
            client_type: default_client_type(),
            error_type: default_error_type(),
            transport_path: default_transport_path(),
            models_path: default_models_path(),
        }
    }
}

fn default_output_dir() -> String {
    "generated".into()
}
fn default_types_dump() -> String {
    "types.json".into()
}
fn default_operations_dump() -> String {
    "operations.json".into()
}
fn default_models_file() -> String {
    "models.rs".into()
}
fn default_bindings_file() -> String {
    "bindings.rs".into()
}
fn default_manifest_file() -> String {
    "manifest.json".into()
}
fn default_client_type() -> String {
    "Client".into()
}
fn default_error_type() -> String {
    "ApiError".into()
}
fn default_transport_path() -> String {
    "super".into()
}
fn default_models_path() -> String {
    "super::models".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docbind/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocbindError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docbind/docbind.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocbindError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocbindError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocbindError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocbindError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocbindError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject configs whose source URL is not absolute http(s).
pub fn validate_source(config: &SourceConfig) -> Result<url::Url> {
    let parsed = url::Url::parse(&config.url)
        .map_err(|e| DocbindError::config(format!("invalid source url '{}': {e}", config.url)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DocbindError::config(format!(
            "unsupported scheme '{other}' in source url '{}'",
            config.url
        ))),
    }
}
