use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Case, Config, ConfigError, File};
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};

use crate::chain::{ChainSpec, MatchOptions, Pattern, WildcardMode};
use crate::error::TraceError;
use crate::trace::{ExportOptions, Trace};

/// Chains to match on every run, and where they go in the exported trace.
///
/// # Examples
///
/// ```toml
/// chain-pid = 1000
/// chain-process-name = "Chains"
/// wildcard = "no-repeat"  # or "unrestricted"
///
/// [[chains]]
/// label = "request"
/// pattern = "receive_request+*send_response-"
///
/// [process-names]
/// 1 = "frontend"
/// 2 = "database"
/// ```
///
/// Config file location:
/// - Linux: `$XDG_CONFIG_HOME/tracechain/config.toml` or `~/.config/tracechain/config.toml`
/// - macOS: `$XDG_CONFIG_HOME/tracechain/config.toml` or `~/.config/tracechain/config.toml`
/// - Windows: `%APPDATA%\tracechain\config.toml`
///
/// Environment variables: `TRACECHAIN_CHAIN_PID`, `TRACECHAIN_CHAIN_TID`,
/// `TRACECHAIN_WILDCARD`, `TRACECHAIN_CHAIN_PROCESS_NAME`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// Process ID for chain records in the export
    pub chain_pid: u64,

    /// Thread ID for chain records in the export
    pub chain_tid: u64,

    /// Name shown for the chain process
    #[serde(default)]
    pub chain_process_name: Option<String>,

    #[serde(default)]
    pub wildcard: WildcardMode,

    /// Patterns matched in addition to any given on the command line
    #[serde(default)]
    pub chains: Vec<ChainEntry>,

    /// Process names by pid (TOML keys are strings)
    #[serde(default)]
    pub process_names: BTreeMap<String, String>,
}

/// One `[[chains]]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub label: String,
    pub pattern: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        let export = ExportOptions::default();
        Self {
            chain_pid: export.chain_pid,
            chain_tid: export.chain_tid,
            chain_process_name: None,
            wildcard: WildcardMode::default(),
            chains: Vec::new(),
            process_names: BTreeMap::new(),
        }
    }
}

impl ChainConfig {
    /// Load configuration from a config file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Config file: `path` if given (must exist), else `TRACECHAIN_CONFIG_PATH`,
    ///    else the platform config dir (see struct documentation), if present
    /// 3. Environment variables (TRACECHAIN_*)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("chain-pid", defaults.chain_pid)?
            .set_default("chain-tid", defaults.chain_tid)?
            .set_default("wildcard", defaults.wildcard.to_string())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else if let Some(config_path) = get_config_path()
            && config_path.exists()
        {
            log::debug!("Loading config from {}", config_path.display());
            builder = builder.add_source(File::from(config_path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TRACECHAIN")
                .prefix_separator("_")
                .convert_case(Case::Kebab)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.chain_specs() {
            return Err(ConfigError::Message(format!("invalid [[chains]] entry: {err}")));
        }
        for pid in self.process_names.keys() {
            if pid.parse::<u64>().is_err() {
                return Err(ConfigError::Message(format!(
                    "process-names key `{pid}` is not a process id"
                )));
            }
        }
        for entry in &self.chains {
            if entry.label.is_empty() {
                return Err(ConfigError::Message(format!(
                    "chain with pattern `{}` has an empty label",
                    entry.pattern
                )));
            }
        }
        Ok(())
    }

    /// Compile every `[[chains]]` entry, in file order.
    pub fn chain_specs(&self) -> Result<Vec<ChainSpec>, TraceError> {
        self.chains
            .iter()
            .map(|entry| {
                Ok(ChainSpec::new(
                    entry.label.as_str(),
                    Pattern::compile(&entry.pattern)?,
                ))
            })
            .collect()
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            chain_pid: self.chain_pid,
            chain_tid: self.chain_tid,
            chain_process_name: self.chain_process_name.clone(),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            wildcard: self.wildcard,
        }
    }

    /// Attach the configured process names to `trace`.
    pub fn apply_names(&self, trace: &mut Trace) {
        for (pid, name) in &self.process_names {
            if let Ok(pid) = pid.parse() {
                trace.set_process_name(pid, name.as_str());
            }
        }
    }
}

fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("TRACECHAIN_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    // choose_base_strategy uses:
    // - XDG on Linux (respects XDG_CONFIG_HOME, falls back to ~/.config)
    // - XDG on macOS (~/.config instead of ~/Library/Application Support)
    // - Windows conventions on Windows (%APPDATA%)
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("tracechain").join("config.toml"))
}
