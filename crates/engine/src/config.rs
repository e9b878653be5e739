//! Engine configuration via `affine.toml`
//!
//! Selects the nearest-neighbor backend and its parameters. A default
//! `affine.toml` can be written next to the data on first use; edit it and
//! reopen the engine to change settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use affine_core::{StoreError, StoreResult};

use crate::vector::{HnswConfig, IndexBackendFactory, KdTreeConfig};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "affine.toml";

/// `[kd_tree]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdTreeSection {
    /// Max rows per leaf
    #[serde(default = "default_leaf_size")]
    pub leaf_size: usize,
}

fn default_leaf_size() -> usize {
    KdTreeConfig::default().leaf_size
}

impl Default for KdTreeSection {
    fn default() -> Self {
        Self {
            leaf_size: default_leaf_size(),
        }
    }
}

/// `[hnsw]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HnswSection {
    /// Max connections per layer
    #[serde(default = "default_m")]
    pub m: usize,
    /// Build-time beam width
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,
    /// Search-time beam width
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
}

fn default_m() -> usize {
    16
}

fn default_ef_construction() -> usize {
    200
}

fn default_ef_search() -> usize {
    50
}

impl Default for HnswSection {
    fn default() -> Self {
        Self {
            m: default_m(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
        }
    }
}

/// Engine configuration loaded from `affine.toml`.
///
/// # Example
///
/// ```toml
/// # Backend: "brute_force" (default), "kd_tree" or "hnsw"
/// backend = "hnsw"
///
/// [hnsw]
/// m = 16
/// ef_construction = 200
/// ef_search = 50
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Backend name: `"brute_force"`, `"kd_tree"` or `"hnsw"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// KD-tree parameters.
    #[serde(default)]
    pub kd_tree: KdTreeSection,
    /// HNSW parameters.
    #[serde(default)]
    pub hnsw: HnswSection,
}

fn default_backend() -> String {
    "brute_force".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            kd_tree: KdTreeSection::default(),
            hnsw: HnswSection::default(),
        }
    }
}

impl EngineConfig {
    /// Parse the backend name into an `IndexBackendFactory`.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the name is not a known backend.
    pub fn index_factory(&self) -> StoreResult<IndexBackendFactory> {
        match self.backend.as_str() {
            "brute_force" => Ok(IndexBackendFactory::BruteForce),
            "kd_tree" => Ok(IndexBackendFactory::KdTree(KdTreeConfig {
                leaf_size: self.kd_tree.leaf_size.max(1),
            })),
            "hnsw" => Ok(IndexBackendFactory::Hnsw(HnswConfig::new(
                self.hnsw.m,
                self.hnsw.ef_construction,
                self.hnsw.ef_search,
            ))),
            other => Err(StoreError::Config(format!(
                "Invalid backend '{}' in {}. Expected \"brute_force\", \"kd_tree\" or \"hnsw\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Affine engine configuration
#
# Nearest-neighbor backend: "brute_force" (default), "kd_tree" or "hnsw"
#   "brute_force" = exact scan, always available
#   "kd_tree"     = exact tree search (Euclidean and Cosine only)
#   "hnsw"        = approximate graph search
backend = "brute_force"

[kd_tree]
leaf_size = 16

[hnsw]
m = 16
ef_construction = 200
ef_search = 50
"#
    }

    /// Parse config from TOML text, validating the backend name.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the text cannot be parsed.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("Failed to parse config: {}", e)))?;
        config.index_factory()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            StoreError::Config(message) => {
                StoreError::Config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
