//! Daemon configuration file.
//!
//! ```toml
//! bind = "0.0.0.0:8090"
//!
//! [judges]
//! builtin = "mean-delta-v1"
//! default = "mean-delta-v1"
//!
//! [[accounts]]
//! name = "local"
//! types = ["CONFIGURATION_STORE", "OBJECT_STORE"]
//! root = "/var/lib/canary"   # omit for an in-memory account
//!
//! [executions]
//! max_completed = 1000   # finished executions kept in memory
//! ttl_secs = 86400        # 0 keeps finished executions until the cap evicts them
//!
//! [concourse]
//! igor_url = "http://igor:8088"
//! orca_url = "http://orca:8083"
//! timeout_secs = 10
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use canary_core::{
    CanaryJudge, JudgeRegistry, JudgeService, MeanDeltaJudge, DEFAULT_MEAN_DELTA_JUDGE,
};
use canary_pipeline::PipelineExecutionMapper;
use canary_state::{
    AccountCredentials, AccountRepository, AccountType, ExecutionRepository, ExecutionRetention,
    FsStorageService, MemoryExecutionRepository, MemoryStorageService, StorageService,
    StorageServiceRepository,
};
use concourse_bridge::{ConcourseBridge, DEFAULT_TIMEOUT};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub const DEFAULT_BIND: &str = "127.0.0.1:8090";

/// Name of the account used when no accounts are configured.
pub const IN_MEMORY_ACCOUNT: &str = "in-memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    #[serde(default)]
    pub judges: JudgesConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub executions: ExecutionsConfig,
    #[serde(default)]
    pub concourse: Option<ConcourseConfig>,
}

/// Retention of finished comparison executions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionsConfig {
    #[serde(default)]
    pub max_completed: Option<usize>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JudgesConfig {
    /// Name registered for the built-in mean delta judge.
    #[serde(default)]
    pub builtin: Option<String>,
    /// Judge used when a configuration names none.
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub name: String,
    pub types: Vec<AccountType>,
    /// Filesystem root; the account lives in memory when absent.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConcourseConfig {
    #[serde(default)]
    pub igor_url: Option<String>,
    #[serde(default)]
    pub orca_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Configured accounts, or a single in-memory account of every type.
    pub fn effective_accounts(&self) -> Vec<AccountConfig> {
        if self.accounts.is_empty() {
            vec![AccountConfig {
                name: IN_MEMORY_ACCOUNT.to_string(),
                types: vec![AccountType::ConfigurationStore, AccountType::ObjectStore],
                root: None,
            }]
        } else {
            self.accounts.clone()
        }
    }

    pub fn build_registry(&self) -> Result<JudgeRegistry, ConfigError> {
        let builtin = self
            .judges
            .builtin
            .clone()
            .unwrap_or_else(|| DEFAULT_MEAN_DELTA_JUDGE.to_string());
        let judges: Vec<Arc<dyn CanaryJudge>> = vec![Arc::new(MeanDeltaJudge::new(builtin))];
        let registry =
            JudgeRegistry::new(judges).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        match self.judges.default.as_deref() {
            Some(name) => registry
                .with_default(name)
                .map_err(|e| ConfigError::Invalid(format!("default judge: {e}"))),
            None => Ok(registry),
        }
    }

    pub fn build_storage(&self) -> Result<StorageServiceRepository, ConfigError> {
        let accounts = self.effective_accounts();
        let mut repository = StorageServiceRepository::default();

        let in_memory: Vec<String> = accounts
            .iter()
            .filter(|a| a.root.is_none())
            .map(|a| a.name.clone())
            .collect();
        if !in_memory.is_empty() {
            repository.register(Arc::new(MemoryStorageService::for_accounts(in_memory)));
        }

        for account in &accounts {
            if let Some(root) = &account.root {
                let service = FsStorageService::new(root, vec![account.name.clone()])
                    .map_err(|e| ConfigError::Invalid(format!("account {}: {e}", account.name)))?;
                repository.register(Arc::new(service) as Arc<dyn StorageService>);
            }
        }
        Ok(repository)
    }

    pub fn build_accounts(&self) -> Result<AccountRepository, ConfigError> {
        let credentials = self
            .effective_accounts()
            .into_iter()
            .map(|a| AccountCredentials::new(a.name, a.types));
        AccountRepository::new(credentials).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn build_retention(&self) -> Result<ExecutionRetention, ConfigError> {
        let defaults = ExecutionRetention::default();
        let max_completed = self
            .executions
            .max_completed
            .unwrap_or(defaults.max_completed);
        let ttl = match self.executions.ttl_secs {
            None => defaults.ttl,
            Some(0) => None,
            Some(secs) => Some(
                chrono::Duration::from_std(Duration::from_secs(secs))
                    .map_err(|e| ConfigError::Invalid(format!("executions.ttl_secs: {e}")))?,
            ),
        };
        Ok(ExecutionRetention::new(max_completed, ttl))
    }

    pub fn build_bridge(&self) -> Result<ConcourseBridge, ConfigError> {
        let Some(concourse) = &self.concourse else {
            return Ok(ConcourseBridge::disabled());
        };
        let timeout = concourse
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        ConcourseBridge::new(
            concourse.igor_url.as_deref(),
            concourse.orca_url.as_deref(),
            timeout,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Wire every component into the shared handler state.
    pub fn build_state(&self) -> Result<AppState, ConfigError> {
        let accounts = Arc::new(self.build_accounts()?);
        let storage = Arc::new(self.build_storage()?);
        let judges = Arc::new(self.build_registry()?);
        let retention = self.build_retention()?;
        let executions: Arc<dyn ExecutionRepository> =
            Arc::new(MemoryExecutionRepository::with_retention(retention));
        let mapper = Arc::new(PipelineExecutionMapper::new(
            executions.clone(),
            storage.clone(),
            judges.clone(),
        ));
        let bridge = self.build_bridge()?;

        info!(
            accounts = accounts.all().count(),
            judges = judges.len(),
            max_completed = retention.max_completed,
            igor = bridge.is_igor_configured(),
            orca = bridge.is_orca_configured(),
            "Daemon state assembled"
        );

        let service = JudgeService::new(accounts, storage, executions, mapper, judges);
        Ok(AppState::new(service, bridge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_parses() {
        let config = DaemonConfig::parse(
            r#"
            bind = "0.0.0.0:9000"

            [judges]
            builtin = "house-judge"
            default = "house-judge"

            [[accounts]]
            name = "configs"
            types = ["CONFIGURATION_STORE"]

            [[accounts]]
            name = "metrics"
            types = ["OBJECT_STORE"]
            root = "/tmp/canary-metrics"

            [concourse]
            igor_url = "http://igor:8088"
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.unwrap().port(), 9000);
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].types, vec![AccountType::ConfigurationStore]);
        assert!(config.accounts[1].root.is_some());
        let concourse = config.concourse.unwrap();
        assert!(concourse.orca_url.is_none());
        assert_eq!(concourse.timeout_secs, Some(3));
    }

    #[test]
    fn empty_file_uses_in_memory_account() {
        let config = DaemonConfig::parse("").unwrap();
        let accounts = config.build_accounts().unwrap();
        let account = accounts.get(IN_MEMORY_ACCOUNT).unwrap();
        assert!(account.supports(AccountType::ConfigurationStore));
        assert!(account.supports(AccountType::ObjectStore));
        assert!(!config.build_bridge().unwrap().is_igor_configured());
    }

    #[test]
    fn execution_retention_defaults_and_overrides() {
        let defaults = DaemonConfig::parse("").unwrap().build_retention().unwrap();
        assert_eq!(defaults, ExecutionRetention::default());

        let config =
            DaemonConfig::parse("[executions]\nmax_completed = 10\nttl_secs = 0").unwrap();
        let retention = config.build_retention().unwrap();
        assert_eq!(retention.max_completed, 10);
        assert!(retention.ttl.is_none());

        let config = DaemonConfig::parse("[executions]\nttl_secs = 120").unwrap();
        assert_eq!(
            config.build_retention().unwrap().ttl,
            Some(chrono::Duration::seconds(120))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DaemonConfig::parse("listen = \"x\"").is_err());
    }

    #[test]
    fn default_judge_must_exist() {
        let config = DaemonConfig::parse("[judges]\ndefault = \"missing\"").unwrap();
        let err = config.build_registry().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn builtin_judge_can_be_renamed() {
        let config = DaemonConfig::parse("[judges]\nbuiltin = \"house-judge\"").unwrap();
        let registry = config.build_registry().unwrap();
        assert!(registry.get("house-judge").is_some());
        assert_eq!(registry.default_judge().unwrap().name(), "house-judge");
    }

    #[test]
    fn duplicate_account_names_are_rejected() {
        let config = DaemonConfig::parse(
            r#"
            [[accounts]]
            name = "a"
            types = ["OBJECT_STORE"]
            [[accounts]]
            name = "a"
            types = ["CONFIGURATION_STORE"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.build_accounts(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
