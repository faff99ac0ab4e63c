//! Factory configuration
//!
//! Settings are read from TOML:
//!
//! ```toml
//! packages = ["java.lang.", "java.util.", "org.example."]
//! style = "paren"
//! pretty = false
//! verbose = false
//! max_depth = 128
//! ```
//!
//! Every key is optional. The syntax can additionally be overridden with the
//! `HYPRED_STYLE` environment variable (`xml` or `paren`, matched by prefix).

use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::{operator::Style, ops::DEFAULT_MAX_DEPTH, registry::DEFAULT_PACKAGES};

pub const STYLE_ENV: &str = "HYPRED_STYLE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file `{file}`: {source}")]
    Io { file: String, source: std::io::Error },

    #[error("Failed to parse configuration `{file}`: {source}")]
    Parse { file: String, source: toml::de::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Xml,
    Paren,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Package prefixes searched for simple class names.
    pub packages: Vec<String>,
    pub style: Syntax,
    pub pretty: bool,
    pub verbose: bool,
    pub max_depth: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            style: Syntax::Xml,
            pretty: true,
            verbose: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FactoryConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        toml::from_str(src).map_err(|source| ConfigError::Parse {
            file: "<inline>".to_string(),
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = path.display().to_string();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            file: file.clone(),
            source,
        })?;
        let config = toml::from_str(&src).map_err(|source| ConfigError::Parse { file: file.clone(), source })?;
        debug!("Loaded configuration from {file}");
        Ok(config)
    }

    /// Applies a style override such as the value of [`STYLE_ENV`]. Any
    /// prefix of `xml` or `paren` is accepted, case-insensitively; other
    /// values are ignored with a warning.
    pub fn with_style_override(mut self, value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return self;
        };
        let value = value.to_ascii_lowercase();
        if "xml".starts_with(&value) {
            self.style = Syntax::Xml;
        } else if "paren".starts_with(&value) {
            self.style = Syntax::Paren;
        } else {
            warn!("Ignoring invalid {STYLE_ENV} value `{value}`, expecting `xml` or `paren`");
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(STYLE_ENV).ok();
        self.with_style_override(value.as_deref())
    }

    pub fn style(&self) -> Style {
        let mut style = match self.style {
            Syntax::Xml => Style::XML,
            Syntax::Paren => Style::PAREN,
        };
        style.set(Style::PRETTY, self.pretty);
        style.set(Style::VERBOSE, self.verbose);
        style
    }
}
