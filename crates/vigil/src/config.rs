//! Locker configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_actions::ActionsConfig;
use vigil_core::{EscalationPolicy, Features, GrabPolicy, ALARM_AFTER, SEVERE_AFTER};

use crate::error::{ConfigError, Result};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "VIGIL_CONFIG";

/// Locker configuration
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Which countermeasures are armed
    pub features: Features,

    /// Retry budget for pointer and keyboard grabs
    pub grab: GrabPolicy,

    /// Attempt thresholds for the alarm and severe tiers
    pub escalation: EscalationConfig,

    /// Countermeasure backends
    pub actions: ActionsConfig,

    /// File holding the unlock secret; takes precedence over the account password
    pub password_file: PathBuf,

    /// Program that verifies a secret read from its stdin
    pub auth_helper: Option<PathBuf>,

    /// Suppress diagnostics
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Failures tolerated before the alarm tier
    pub alarm_after: u32,
    /// Failures tolerated before the severe tier
    pub severe_after: u32,
    /// Seconds before uploaded evidence is deleted
    pub retract_delay_secs: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            alarm_after: ALARM_AFTER,
            severe_after: SEVERE_AFTER,
            retract_delay_secs: 5,
        }
    }
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            features: Features::default(),
            grab: GrabPolicy::default(),
            escalation: EscalationConfig::default(),
            actions: ActionsConfig::default(),
            password_file: Self::default_password_file(),
            auth_helper: None,
            quiet: false,
        }
    }
}

impl VigilConfig {
    /// `$VIGIL_CONFIG`, or `vigil/config.json` under the user config dir
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("/etc"))
                    .join("vigil")
                    .join("config.json")
            })
    }

    fn default_password_file() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/"))
            .join(".vigil_passwd")
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists; a missing file is not an error
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.grab.attempts == 0 {
            return Err(ConfigError::Invalid(
                "grab.attempts must be at least 1".to_string(),
            ));
        }
        if self.escalation.severe_after < self.escalation.alarm_after {
            return Err(ConfigError::Invalid(format!(
                "escalation.severe_after ({}) is below escalation.alarm_after ({})",
                self.escalation.severe_after, self.escalation.alarm_after
            )));
        }
        Ok(())
    }

    pub fn escalation_policy(&self) -> EscalationPolicy {
        EscalationPolicy::new(self.features)
            .with_thresholds(self.escalation.alarm_after, self.escalation.severe_after)
            .with_retract_delay(Duration::from_secs(self.escalation.retract_delay_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vigil_core::Tier;

    #[test]
    fn test_defaults() {
        let config = VigilConfig::default();
        assert!(config.features.danger_keys);
        assert!(config.features.danger_poweroff);
        assert!(!config.features.image_upload);
        assert_eq!(config.escalation.alarm_after, 2);
        assert_eq!(config.escalation.severe_after, 5);
        assert!(config.password_file.ends_with(".vigil_passwd"));
        assert!(!config.quiet);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = VigilConfig::load_if_present(&dir.path().join("config.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_file_overrides_named_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"quiet": true, "features": {"poweroff": false}, "escalation": {"alarm_after": 1}}"#,
        )
        .unwrap();

        let config = VigilConfig::load(&path).unwrap();
        assert!(config.quiet);
        assert!(!config.features.poweroff);
        assert!(config.features.audio);
        assert_eq!(config.escalation.alarm_after, 1);
        assert_eq!(config.escalation.severe_after, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = VigilConfig::default();
        config.auth_helper = Some(PathBuf::from("/usr/libexec/vigil-auth"));
        config.save(&path).unwrap();

        let loaded = VigilConfig::load(&path).unwrap();
        assert_eq!(loaded.auth_helper, config.auth_helper);
        assert_eq!(loaded.escalation, config.escalation);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(VigilConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = VigilConfig::default();
        config.escalation = EscalationConfig {
            alarm_after: 4,
            severe_after: 3,
            retract_delay_secs: 5,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_policy_uses_thresholds() {
        let mut config = VigilConfig::default();
        config.escalation.alarm_after = 1;
        config.escalation.severe_after = 3;
        let policy = config.escalation_policy();
        assert_eq!(policy.tier(1), Tier::Soft);
        assert_eq!(policy.tier(2), Tier::Alarm);
        assert_eq!(policy.tier(4), Tier::Severe);
    }
}
