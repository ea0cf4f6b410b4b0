use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("remindful")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    /// Hosted model used for schedule recommendations.
    pub model: String,
    /// API key for the hosted model; absent means the assistant is off.
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Default config with the API key taken from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_directory.join("remindful.db")
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("no API key configured".into()))
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_directory)
            .map_err(|e| Error::Config(format!("cannot create data directory: {e}")))
    }
}
