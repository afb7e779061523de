use miette::{IntoDiagnostic, Result, WrapErr};
use crate::discovery::is_resource_archive;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the aapt ignore pattern
pub const AAPT_IGNORE_ENV: &str = "ANDROID_AAPT_IGNORE";

/// aapt's built-in ignore pattern
pub const DEFAULT_AAPT_IGNORE: &str = "!.svn:!.git:!.ds_store:!*.scc:.*:<dir>_*:!CVS:!thumbs.db:!picasa.ini:!*~";

const DEFAULT_CONFIG_NAMES: [&str; 6] = [
    ".resrepo.yml",
    ".resrepo.yaml",
    ".resrepo.toml",
    "resrepo.yml",
    "resrepo.yaml",
    "resrepo.toml",
];

/// Configuration for loading resource repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace of the loaded resources: res-auto, android or a package name
    pub namespace: String,

    /// Name of the library the resources belong to
    pub library_name: Option<String>,

    /// Colon-separated aapt ignore pattern
    pub aapt_ignore: Option<String>,

    /// Binary cache configuration
    pub cache: CacheConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Read and write the binary cache
    pub enabled: bool,

    /// Cache file; defaults to `.resrepo-cache.bin` next to the resource root
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "res-auto".to_string(),
            library_name: None,
            aapt_ignore: None,
            cache: CacheConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from the first directory holding one of
    /// the default config file names
    pub fn from_default_locations(directories: &[&Path]) -> Result<Self> {
        for directory in directories {
            for name in &DEFAULT_CONFIG_NAMES {
                let path = directory.join(name);
                if path.exists() {
                    return Self::from_file(&path);
                }
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// The aapt ignore pattern in effect: the configured one, then the
    /// environment, then aapt's default
    pub fn effective_aapt_ignore(&self) -> String {
        self.aapt_ignore
            .clone()
            .or_else(|| std::env::var(AAPT_IGNORE_ENV).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_AAPT_IGNORE.to_string())
    }

    /// Cache file for a resource root: inside a `res` directory, next to a
    /// library archive
    pub fn cache_path_for(&self, resource_root: &Path) -> PathBuf {
        if let Some(path) = &self.cache.path {
            return path.clone();
        }
        if is_resource_archive(resource_root) {
            let name = resource_root.file_name().unwrap_or_default().to_string_lossy();
            return resource_root.with_file_name(format!("{}.resrepo-cache.bin", name));
        }
        resource_root.join(".resrepo-cache.bin")
    }
}
