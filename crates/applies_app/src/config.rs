use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;
use applies_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::logging::{ContextLevels, LogDestination};

/// Contents of `applies.ron`. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub log: LogDestination,
    pub levels: ContextLevels,
}

/// A missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
