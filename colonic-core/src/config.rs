// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Describes one domain's side of a COLO pair: the agent script, where the
//! store lives, and the NICs taking part. Any invalid field results in a
//! HardValidationError before a single agent is started.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::builder::HOTPLUG_TIMEOUT_MS;
use crate::controller::{CheckpointContext, ColoNicController};
use crate::device::{CheckpointDevice, NicBackend};
use crate::error::{ColoError, ColoResult, HardValidationError};
use crate::exec::Executor;
use crate::mode::{DeviceOps, Side};
use crate::orchestrator::CheckpointDevices;
use crate::store::DirStore;
use crate::types::{DeviceId, DomainId, Mode, NicType, ScriptPath};

/// Longest hotplug timeout accepted: 10 minutes.
const MAX_HOTPLUG_TIMEOUT_MS: u64 = 600_000;

/// Raw agent section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAgentConfig {
    script: String,
    #[serde(default = "default_hotplug_timeout")]
    hotplug_timeout_ms: u64,
}

fn default_hotplug_timeout() -> u64 {
    HOTPLUG_TIMEOUT_MS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStoreConfig {
    #[serde(default = "default_store_root")]
    root: String,
}

fn default_store_root() -> String {
    "/var/lib/colonic/store".to_string()
}

impl Default for RawStoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDomainConfig {
    id: u32,
    side: Mode,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNicConfig {
    devid: u32,
    #[serde(default)]
    forwarddev: Option<String>,
    #[serde(default)]
    nictype: NicType,
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    agent: RawAgentConfig,
    #[serde(default)]
    store: RawStoreConfig,
    domain: RawDomainConfig,
    nics: Vec<RawNicConfig>,
}

/// Validated agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub script: ScriptPath,
    pub hotplug_timeout: Duration,
}

/// Validated store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
}

/// Validated domain configuration.
#[derive(Debug, Clone)]
pub struct DomainConfig {
    pub id: DomainId,
    pub mode: Mode,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub agent: AgentConfig,
    pub store: StoreConfig,
    pub domain: DomainConfig,
    pub nics: Vec<NicBackend>,
}

impl Config {
    /// Controller context for the configured domain, reading from the
    /// configured directory store.
    pub fn context(&self, executor: Arc<dyn Executor>) -> CheckpointContext {
        CheckpointContext::new(
            self.domain.id,
            Arc::new(DirStore::new(&self.store.root)),
            executor,
        )
        .with_hotplug_timeout(self.agent.hotplug_timeout)
    }

    /// Checkpoint session over every configured NIC, on this host's side.
    pub fn session(&self, executor: Arc<dyn Executor>) -> CheckpointDevices {
        let controller = ColoNicController::new(Arc::new(self.context(executor)));
        let ops = DeviceOps::colo_nic(
            controller,
            Side::for_mode(self.domain.mode, self.agent.script.clone()),
        );
        let devices = self
            .nics
            .iter()
            .cloned()
            .map(CheckpointDevice::nic)
            .collect();
        CheckpointDevices::new(vec![ops], devices)
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> ColoResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ColoError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ColoError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> ColoResult<Config> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ColoError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> ColoResult<Config> {
        let agent = Self::validate_agent(raw.agent)?;

        if raw.store.root.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "root",
                context: "store section".to_string(),
            }
            .into());
        }
        let store = StoreConfig {
            root: PathBuf::from(raw.store.root),
        };

        let domain = DomainConfig {
            id: DomainId::new(raw.domain.id)?,
            mode: raw.domain.side,
        };

        if raw.nics.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one NIC must be defined".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        let mut nics = Vec::with_capacity(raw.nics.len());
        for raw_nic in raw.nics {
            let devid = DeviceId::new(raw_nic.devid);
            if !seen.insert(devid) {
                return Err(HardValidationError::DuplicateDeviceId { devid }.into());
            }

            // A missing forwarddev is accepted here and fails that NIC's setup.
            if raw_nic.forwarddev.as_deref() == Some("") {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "forwarddev",
                    value: String::new(),
                    reason: format!("NIC {} has an empty forwarddev; omit it instead", devid),
                }
                .into());
            }

            nics.push(NicBackend {
                devid,
                forwarddev: raw_nic.forwarddev,
                nictype: raw_nic.nictype,
            });
        }

        Ok(Config {
            agent,
            store,
            domain,
            nics,
        })
    }

    fn validate_agent(raw: RawAgentConfig) -> ColoResult<AgentConfig> {
        if raw.script.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "script",
                context: "agent section".to_string(),
            }
            .into());
        }

        if raw.hotplug_timeout_ms == 0 || raw.hotplug_timeout_ms > MAX_HOTPLUG_TIMEOUT_MS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "hotplug_timeout_ms",
                value: raw.hotplug_timeout_ms.to_string(),
                reason: format!("Must be between 1 and {}", MAX_HOTPLUG_TIMEOUT_MS),
            }
            .into());
        }

        // Existence is checked when the agent is launched; a missing script
        // fails each device with a start rejection.
        Ok(AgentConfig {
            script: ScriptPath::new(raw.script),
            hotplug_timeout: Duration::from_millis(raw.hotplug_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
agent:
  script: /etc/xen/scripts/colo-proxy-setup
  hotplug_timeout_ms: 20000
store:
  root: /tmp/colonic-store
domain:
  id: 3
  side: primary
nics:
  - devid: 0
    forwarddev: eth0
  - devid: 1
    forwarddev: eth1
    nictype: vif-ioemu
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.domain.id.value(), 3);
        assert_eq!(config.domain.mode, Mode::Primary);
        assert_eq!(config.agent.hotplug_timeout, Duration::from_secs(20));
        assert_eq!(config.store.root, PathBuf::from("/tmp/colonic-store"));
        assert_eq!(config.nics.len(), 2);
        assert_eq!(config.nics[0].nictype, NicType::Vif);
        assert_eq!(config.nics[1].nictype, NicType::VifIoemu);
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 4
  side: secondary
nics:
  - devid: 2
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(
            config.agent.hotplug_timeout,
            Duration::from_millis(HOTPLUG_TIMEOUT_MS)
        );
        assert_eq!(config.store.root, PathBuf::from("/var/lib/colonic/store"));
        assert_eq!(config.domain.mode, Mode::Secondary);
        assert_eq!(config.nics[0].forwarddev, None);
    }

    #[test]
    fn test_missing_nics() {
        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 4
  side: primary
nics: []
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_duplicate_devids() {
        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 4
  side: primary
nics:
  - devid: 0
    forwarddev: eth0
  - devid: 0
    forwarddev: eth1
"#;
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(
            err,
            ColoError::HardValidation(HardValidationError::DuplicateDeviceId { .. })
        ));
    }

    #[test]
    fn test_control_domain_rejected() {
        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 0
  side: primary
nics:
  - devid: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_bad_side() {
        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 3
  side: tertiary
nics:
  - devid: 0
"#;
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ColoError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_timeout_bounds() {
        for timeout in [0, MAX_HOTPLUG_TIMEOUT_MS + 1] {
            let yaml = format!(
                "agent:\n  script: /agents/colo.sh\n  hotplug_timeout_ms: {}\ndomain:\n  id: 3\n  side: primary\nnics:\n  - devid: 0\n",
                timeout
            );
            assert!(ConfigLoader::load_string(&yaml).is_err());
        }
    }

    #[test]
    fn test_empty_script_and_forwarddev() {
        let yaml = r#"
agent:
  script: ""
domain:
  id: 3
  side: primary
nics:
  - devid: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());

        let yaml = r#"
agent:
  script: /agents/colo.sh
domain:
  id: 3
  side: primary
nics:
  - devid: 0
    forwarddev: ""
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ConfigLoader::load_file("/nonexistent/colonic.yaml"),
            Err(ColoError::ConfigNotFound { .. })
        ));
    }
}
