use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use store::MapOptions;

const MAX_INDENT: usize = 16;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backing file location plus the map's persistence options, read from one
/// `[store]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(flatten)]
    pub options: MapOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_path(), options: MapOptions::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_format(), filter: default_filter() }
    }
}

fn default_path() -> String { "config.json".into() }
fn default_format() -> String { "compact".into() }
fn default_filter() -> String { "info".into() }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` (or `config.toml`), falling back to defaults when the
    /// file does not exist, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.store.normalize_from_env();
        self.store.validate()?;
        self.logging.normalize();
        self.logging.validate()?;
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        // JSONMAP_PATH takes precedence over the file
        if let Ok(path) = std::env::var("JSONMAP_PATH") {
            if !path.trim().is_empty() {
                self.path = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(anyhow!("store.path is empty; set it in config.toml or JSONMAP_PATH"));
        }
        if self.options.indent > MAX_INDENT {
            return Err(anyhow!("store.indent must be <= {MAX_INDENT}"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        self.format = self.format.trim().to_lowercase();
        if self.filter.trim().is_empty() {
            self.filter = default_filter();
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be compact or json, got {other:?}")),
        }
    }

    pub fn is_json(&self) -> bool { self.format == "json" }
}
