//! Configuration file handling for md2html.
//!
//! This module defines the `.md2html.toml` configuration schema and provides
//! functions for locating, loading and validating it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DEFAULT_SUMMARY, RenderOptions, style};

/// The default configuration filename.
pub const CONFIG_FILENAME: &str = ".md2html.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Md2HtmlConfig {
    /// Rendering settings.
    #[serde(default)]
    pub render: RenderSection,
}

/// Rendering settings section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSection {
    /// Summary text for details blocks that do not name one.
    #[serde(default = "default_summary")]
    pub default_summary: String,
    /// Embed a stylesheet at the top of the document.
    #[serde(default = "default_true")]
    pub embed_style: bool,
    /// CSS file replacing the built-in stylesheet, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<PathBuf>,
}

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            default_summary: default_summary(),
            embed_style: true,
            stylesheet: None,
        }
    }
}

impl Md2HtmlConfig {
    /// Load configuration from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Md2HtmlConfig =
            toml::from_str(content).context("failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.render.default_summary.trim().is_empty() {
            anyhow::bail!("render.default_summary cannot be empty");
        }

        if self
            .render
            .stylesheet
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            anyhow::bail!("render.stylesheet cannot be empty");
        }

        Ok(())
    }

    /// Build render options, reading a custom stylesheet if one is set.
    ///
    /// `base_dir` is the directory relative stylesheet paths are resolved
    /// against, normally the directory holding the config file.
    pub fn render_options(&self, base_dir: &Path) -> Result<RenderOptions> {
        let stylesheet = match (&self.render.stylesheet, self.render.embed_style) {
            (_, false) => None,
            (None, true) => Some(style::default_stylesheet()),
            (Some(path), true) => {
                let path = base_dir.join(path);
                let css = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read stylesheet: {}", path.display()))?;
                Some(style::wrap_css(&css))
            }
        };

        Ok(RenderOptions {
            stylesheet,
            default_summary: self.render.default_summary.clone(),
        })
    }
}

/// Find the config file by walking up from `start`.
pub fn find_config_path_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load the nearest config file above `start`, together with the directory
/// it was found in. Without a config file, defaults and `start` are returned.
pub fn load_from(start: &Path) -> Result<(Md2HtmlConfig, PathBuf)> {
    match find_config_path_from(start) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let config = Md2HtmlConfig::load(&path)?;
            let base_dir = path
                .parent()
                .map_or_else(|| start.to_path_buf(), Path::to_path_buf);
            Ok((config, base_dir))
        }
        None => {
            tracing::debug!(start = %start.display(), "no config file found, using defaults");
            Ok((Md2HtmlConfig::default(), start.to_path_buf()))
        }
    }
}
