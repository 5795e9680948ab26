use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::articles::{ArticleStore, DEFAULT_ARTICLES_DIR};
use crate::chain::layers::{default_layers, ChainLayerConfig, LayerRegistry};
use crate::error_codes::CodedError;
use crate::progress::ProgressOptions;
use crate::spring::SpringConfig;
use crate::terminal::script;
use crate::terminal::session::SessionOptions;
use crate::terminal::state::DEFAULT_DIRECTORY;
use crate::terminal::typewriter::{ItemKind, TypewriterItem, TypewriterTiming, MAX_DELAY_MS};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub scroll: ProgressOptions,
    pub chain: ChainConfig,
    pub terminal: TerminalConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Smoothing used by the chain backdrop in place of `scroll.spring`.
    pub spring: SpringConfig,
    pub layers: Vec<ChainLayerConfig>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            spring: SpringConfig::scroll_chain(),
            layers: default_layers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    pub reduced_motion: bool,
    pub timing: TypewriterTiming,
    pub sequence: Vec<TypewriterItem>,
    pub current_directory: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            timing: TypewriterTiming::default(),
            sequence: script::intro_sequence(),
            current_directory: DEFAULT_DIRECTORY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    pub articles_dir: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            articles_dir: PathBuf::from(DEFAULT_ARTICLES_DIR),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.scroll.validate()?;
        self.chain.spring.validate("chain.spring")?;
        LayerRegistry::new(self.chain.layers.clone()).context("invalid chain.layers")?;
        self.terminal.timing.validate()?;
        if self.terminal.current_directory.trim().is_empty() {
            bail!("terminal.current_directory cannot be empty");
        }
        for (index, item) in self.terminal.sequence.iter().enumerate() {
            if item.kind == ItemKind::Command && item.text.trim().is_empty() {
                bail!("terminal.sequence[{index}]: command text cannot be empty");
            }
            if item.char_delay_ms == Some(0) {
                bail!("terminal.sequence[{index}]: char_delay_ms must be > 0");
            }
            for (label, value) in [
                ("pre_delay_ms", Some(item.pre_delay_ms)),
                ("char_delay_ms", item.char_delay_ms),
            ] {
                if value.is_some_and(|ms| ms > MAX_DELAY_MS) {
                    bail!("terminal.sequence[{index}]: {label} must be <= {MAX_DELAY_MS}");
                }
            }
        }
        Ok(())
    }

    pub fn layer_registry(&self) -> Result<LayerRegistry> {
        LayerRegistry::new(self.chain.layers.clone())
    }

    pub fn chain_progress_options(&self) -> ProgressOptions {
        ProgressOptions {
            spring: self.chain.spring,
            ..self.scroll
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            reduced_motion: self.terminal.reduced_motion,
            timing: self.terminal.timing,
            sequence: self.terminal.sequence.clone(),
            current_directory: self.terminal.current_directory.clone(),
        }
    }

    pub fn article_store(&self) -> ArticleStore {
        ArticleStore::new(&self.content.articles_dir)
    }
}

/// Reads and validates a YAML config file. Relative paths inside it resolve against its directory.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config = if contents.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str::<AppConfig>(&contents).map_err(|error| {
            let location = error
                .location()
                .map(|location| format!("line {}, column {}", location.line(), location.column()))
                .unwrap_or_else(|| "unknown location".to_owned());
            anyhow!(CodedError::config(format!(
                "failed to parse yaml in {} at {}: {}",
                path.display(),
                location,
                error
            )))
        })?
    };

    config
        .validate()
        .map_err(|error| anyhow!(CodedError::config(format!("{}: {error:#}", path.display()))))?;

    if config.content.articles_dir.is_relative() {
        let config_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.content.articles_dir = config_dir.join(&config.content.articles_dir);
    }
    tracing::info!(
        path = %path.display(),
        layers = config.chain.layers.len(),
        script_items = config.terminal.sequence.len(),
        "loaded config"
    );
    Ok(config)
}

/// Stock settings when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(AppConfig::default()),
    }
}
