//! Meridian Configuration
//!
//! Shared configuration crate for anything that builds or checks Meridian
//! transactions.
//!
//! Handles loading configuration from:
//! 1. MERIDIAN_CONFIG env var (explicit path)
//! 2. ./meridian.toml (current directory)
//! 3. ~/.meridian/meridian.toml (user home)
//!
//! Environment variables take precedence over TOML config. There is no
//! process-wide instance: callers load a config and hand the resulting
//! [`TransactionFactory`] to whatever needs it.

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result, bail};
use meridian_crypto::DigestAlgorithm;
use meridian_transaction::metadata::{
    DEFAULT_BATCH_LEAF_PREFIX, DEFAULT_BATCH_NODE_PREFIX, DEFAULT_ROOT_LEAF_PREFIX,
    DEFAULT_ROOT_NODE_PREFIX,
};
use meridian_transaction::{DigestSettings, TransactionFactory, TransactionLimits};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "meridian.toml";
const CONFIG_DIR_NAME: &str = ".meridian";
const CONFIG_PATH_ENV: &str = "MERIDIAN_CONFIG";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeridianConfig {
    #[serde(default)]
    pub digest: DigestToml,
    #[serde(default)]
    pub limits: LimitsToml,
}

/// How transactions are hashed. Prefixes are hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestToml {
    /// Accept settings other than the platform defaults
    #[serde(default)]
    pub allow_custom: bool,
    #[serde(default = "default_algorithm")]
    pub root_algorithm: DigestAlgorithm,
    #[serde(default = "default_algorithm")]
    pub component_algorithm: DigestAlgorithm,
    #[serde(default = "default_algorithm")]
    pub entropy_algorithm: DigestAlgorithm,
    #[serde(default = "default_algorithm")]
    pub batch_algorithm: DigestAlgorithm,
    #[serde(default = "default_root_leaf_prefix")]
    pub root_leaf_prefix: String,
    #[serde(default = "default_root_node_prefix")]
    pub root_node_prefix: String,
    #[serde(default = "default_batch_leaf_prefix")]
    pub batch_leaf_prefix: String,
    #[serde(default = "default_batch_node_prefix")]
    pub batch_node_prefix: String,
}

impl Default for DigestToml {
    fn default() -> Self {
        Self {
            allow_custom: false,
            root_algorithm: default_algorithm(),
            component_algorithm: default_algorithm(),
            entropy_algorithm: default_algorithm(),
            batch_algorithm: default_algorithm(),
            root_leaf_prefix: default_root_leaf_prefix(),
            root_node_prefix: default_root_node_prefix(),
            batch_leaf_prefix: default_batch_leaf_prefix(),
            batch_node_prefix: default_batch_node_prefix(),
        }
    }
}

fn default_algorithm() -> DigestAlgorithm {
    DigestAlgorithm::Sha256D
}
fn default_root_leaf_prefix() -> String {
    hex::encode(DEFAULT_ROOT_LEAF_PREFIX)
}
fn default_root_node_prefix() -> String {
    hex::encode(DEFAULT_ROOT_NODE_PREFIX)
}
fn default_batch_leaf_prefix() -> String {
    hex::encode(DEFAULT_BATCH_LEAF_PREFIX)
}
fn default_batch_node_prefix() -> String {
    hex::encode(DEFAULT_BATCH_NODE_PREFIX)
}

/// Transaction shape limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsToml {
    #[serde(default = "default_max_component_groups")]
    pub max_component_groups: usize,
    #[serde(default = "default_max_components_per_group")]
    pub max_components_per_group: usize,
}

impl Default for LimitsToml {
    fn default() -> Self {
        Self {
            max_component_groups: default_max_component_groups(),
            max_components_per_group: default_max_components_per_group(),
        }
    }
}

fn default_max_component_groups() -> usize {
    TransactionLimits::default().max_component_groups
}
fn default_max_components_per_group() -> usize {
    TransactionLimits::default().max_components_per_group
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("ignoring unparseable {key}={v}"),
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl MeridianConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("{CONFIG_PATH_ENV} points at missing file {}", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Limits
        env_parse("MERIDIAN_MAX_GROUPS", &mut self.limits.max_component_groups);
        env_parse(
            "MERIDIAN_MAX_COMPONENTS",
            &mut self.limits.max_components_per_group,
        );

        // Digest
        if let Ok(v) = env::var("MERIDIAN_DIGEST_ALGORITHM") {
            match v.parse::<DigestAlgorithm>() {
                Ok(algorithm) => {
                    self.digest.root_algorithm = algorithm;
                    self.digest.component_algorithm = algorithm;
                    self.digest.entropy_algorithm = algorithm;
                    self.digest.batch_algorithm = algorithm;
                }
                Err(e) => log::warn!("ignoring MERIDIAN_DIGEST_ALGORITHM: {e}"),
            }
        }
        if let Some(v) = env_bool("MERIDIAN_ALLOW_CUSTOM_DIGEST") {
            self.digest.allow_custom = v;
        }
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Digest settings described by the `[digest]` section
    pub fn digest_settings(&self) -> Result<DigestSettings> {
        let digest = &self.digest;
        Ok(DigestSettings {
            batch_merkle_tree_digest_algorithm_name: digest.batch_algorithm,
            batch_merkle_tree_leaf_prefix: decode_prefix(
                "batch_leaf_prefix",
                &digest.batch_leaf_prefix,
            )?,
            batch_merkle_tree_node_prefix: decode_prefix(
                "batch_node_prefix",
                &digest.batch_node_prefix,
            )?,
            root_merkle_tree_digest_algorithm_name: digest.root_algorithm,
            root_merkle_tree_leaf_prefix: decode_prefix(
                "root_leaf_prefix",
                &digest.root_leaf_prefix,
            )?,
            root_merkle_tree_node_prefix: decode_prefix(
                "root_node_prefix",
                &digest.root_node_prefix,
            )?,
            component_merkle_tree_digest_algorithm_name: digest.component_algorithm,
            component_merkle_tree_entropy_algorithm_name: digest.entropy_algorithm,
            ..DigestSettings::default()
        })
    }

    pub fn transaction_limits(&self) -> TransactionLimits {
        TransactionLimits {
            max_component_groups: self.limits.max_component_groups,
            max_components_per_group: self.limits.max_components_per_group,
        }
    }

    /// Build the factory every wire transaction should come from
    pub fn into_factory(self) -> Result<TransactionFactory> {
        let settings = self.digest_settings()?;
        if settings != DigestSettings::default() && !self.digest.allow_custom {
            bail!(
                "digest settings differ from the platform defaults; \
                 set digest.allow_custom to use them"
            );
        }
        if self.limits.max_component_groups == 0 || self.limits.max_components_per_group == 0 {
            bail!("transaction limits must be positive");
        }
        Ok(TransactionFactory::new(settings, self.transaction_limits()))
    }
}

fn decode_prefix(field: &str, value: &str) -> Result<Vec<u8>> {
    let prefix = hex::decode(value).with_context(|| format!("digest.{field} is not valid hex"))?;
    if prefix.is_empty() {
        bail!("digest.{field} must not be empty");
    }
    Ok(prefix)
}

// ============================================================================
// Tests
// ============================================================================
