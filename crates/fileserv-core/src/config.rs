use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g. 127.0.0.1:8000)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory shared through the file manager
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Directory holding the static browser UI
    #[serde(default = "default_webui_dir")]
    pub webui_dir: PathBuf,

    /// Upload size cap in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Upload extension allow-list (lowercase, no dots)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_root_dir() -> PathBuf {
    PathBuf::from("./files")
}
fn default_webui_dir() -> PathBuf {
    PathBuf::from("./webui")
}
fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "pdf", "txt", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            root_dir: default_root_dir(),
            webui_dir: default_webui_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl ServerConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "fileserv", "fileserv") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("fileserv-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}
