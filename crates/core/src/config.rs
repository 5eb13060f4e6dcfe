//! Application configuration.
//!
//! Settings are layered: compiled defaults, then the user config file under
//! the platform config directory, then `USSDSIM_*` environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Directory under the user config root holding our files.
pub const CONFIG_DIR: &str = "ussdsim";

/// Main configuration file name.
pub const CONFIG_FILE: &str = "config.toml";

static SERVICE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\d{3,6}#$").expect("failed to compile service code regex"));

/// User-tunable settings for the simulated handset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Subscriber number shown in the handset header.
    pub phone_number: String,
    /// Dial string that opens the service menu.
    pub service_code: String,
    /// Balance the simulated line starts with, in smallest currency units.
    pub initial_balance: u64,
    /// Currency label used by the presentation layer.
    pub currency: String,
    /// Optional JSON catalog file replacing the builtin menu.
    pub catalog_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            phone_number: "0712345678".to_string(),
            service_code: "*444#".to_string(),
            initial_balance: 0,
            currency: "Sh".to_string(),
            catalog_path: None,
        }
    }
}

impl AppConfig {
    /// Load settings with layered precedence: defaults, config file,
    /// environment.
    pub fn load() -> Result<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        if let Some(path) = config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings: AppConfig = builder
            .add_source(Environment::with_prefix("USSDSIM"))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        if !is_service_code(&settings.service_code) {
            warn!(code = %settings.service_code, "Configured service code does not look like a USSD code");
        }
        Ok(settings)
    }
}

/// True when `input` has the `*NNN#` shape of a USSD service code.
pub fn is_service_code(input: &str) -> bool {
    SERVICE_CODE_RE.is_match(input)
}

/// Directory holding the configuration file, if a config root exists.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Write a commented template on first run so the knobs are discoverable.
pub fn ensure_default_config() -> Result<()> {
    let Some(path) = config_path() else {
        return Ok(());
    };
    if path.exists() {
        return Ok(());
    }
    write_template(&path)
}

fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, TEMPLATE).with_context(|| format!("failed to write {}", path.display()))
}

const TEMPLATE: &str = r#"# ussdsim configuration
#
# Values here override the compiled defaults; USSDSIM_* environment
# variables override values here.

# Subscriber number shown in the handset header
# phone_number = "0712345678"

# Dial string that opens the service menu
# service_code = "*444#"

# Starting prepaid balance, in whole currency units
# initial_balance = 0

# Currency label
# currency = "Sh"

# Path to a JSON catalog replacing the builtin menu
# catalog_path = "/path/to/catalog.json"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_stock_handset() {
        let config = AppConfig::default();
        assert_eq!(config.phone_number, "0712345678");
        assert_eq!(config.service_code, "*444#");
        assert_eq!(config.initial_balance, 0);
        assert_eq!(config.currency, "Sh");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn service_code_shape_is_checked() {
        assert!(is_service_code("*444#"));
        assert!(is_service_code("*100#"));
        assert!(is_service_code("*123456#"));
        assert!(!is_service_code("444"));
        assert!(!is_service_code("*44#"));
        assert!(!is_service_code("*444"));
        assert!(!is_service_code("#444*"));
        assert!(!is_service_code("*44a4#"));
    }

    #[test]
    fn template_parses_back_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");

        write_template(&path)?;
        let content = fs::read_to_string(&path)?;
        assert!(content.contains("service_code"));

        // parse the template defaults back out: everything is commented
        let parsed: AppConfig = toml_from_template(&content);
        assert_eq!(parsed.service_code, AppConfig::default().service_code);
        Ok(())
    }

    fn toml_from_template(content: &str) -> AppConfig {
        // the template carries only comments, so deserializing the file via
        // the config crate must fall through to defaults
        let file = File::from_str(content, ::config::FileFormat::Toml);
        let merged = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).expect("defaults"))
            .add_source(file)
            .build()
            .expect("config builds");
        merged.try_deserialize().expect("deserializes")
    }
}
