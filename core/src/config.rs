//! Connection settings for the Poptato API.
//!
//! # Design
//! Settings are layered: built-in defaults, then an optional
//! `poptato.toml`, then `POPTATO_*` environment variables. Each layer only
//! overrides the keys it names. Environment lookup is passed in as a
//! function so tests never touch the process environment.

use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;

pub const DEFAULT_CONFIG_FILE: &str = "poptato.toml";

/// Connection settings for the Poptato API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Page size used when loading the today list.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".into(),
            page_size: 50,
        }
    }
}

/// Defaults, then `poptato.toml` in the working directory, then environment.
pub fn load_config() -> anyhow::Result<ClientConfig> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Like `load_config`, with an explicit file and environment lookup. A
/// missing file is skipped.
pub fn load_config_from(path: &Path, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::default();
    if path.exists() {
        apply_file(&mut config, path)?;
    }
    apply_env(&mut config, var)?;
    Ok(config)
}

pub fn apply_file(config: &mut ClientConfig, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    apply_toml(config, &raw).with_context(|| format!("parsing {}", path.display()))
}

fn apply_toml(config: &mut ClientConfig, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> = toml::from_str(raw)?;
    if let Some(v) = file_cfg.get("base_url").and_then(|v| v.as_str()) {
        config.base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("page_size").and_then(|v| v.as_integer()) {
        config.page_size = u32::try_from(v).context("page_size out of range")?;
    }
    Ok(())
}

fn apply_env(config: &mut ClientConfig, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    if let Some(v) = var("POPTATO_BASE_URL") {
        config.base_url = v;
    }
    if let Some(v) = var("POPTATO_PAGE_SIZE") {
        config.page_size = v
            .parse()
            .with_context(|| format!("POPTATO_PAGE_SIZE is not a page size: {v}"))?;
    }
    Ok(())
}
