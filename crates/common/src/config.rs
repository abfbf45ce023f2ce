//! Threshold configuration
//!
//! Thresholds are resolved before they reach the classifier. Sources, lowest
//! precedence first: built-in defaults, a TOML file, a `key=value` properties
//! file using the `threshold.<profile>.<field>.ms` keys, and `STEPWATCH_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::sla::{SlaBands, SlaThresholds};

/// Warn/fail pair as configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileThresholds {
    pub warn_ms: u64,
    pub fail_ms: u64,
}

impl ProfileThresholds {
    pub fn thresholds(&self) -> Result<SlaThresholds> {
        SlaThresholds::new(self.warn_ms, self.fail_ms)
    }

    pub fn bands(&self) -> SlaBands {
        SlaBands::empty()
            .warn("warn", self.warn_ms)
            .fail("fail", self.fail_ms)
    }
}

/// Three-band profile used by the Get Started flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStartedThresholds {
    pub warn1_ms: u64,
    pub warn2_ms: u64,
    pub fail_ms: u64,
}

impl GetStartedThresholds {
    pub fn bands(&self) -> SlaBands {
        SlaBands::empty()
            .warn("warn1", self.warn1_ms)
            .warn("warn2", self.warn2_ms)
            .fail("fail", self.fail_ms)
    }
}

/// All configured thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Login flow
    pub login: ProfileThresholds,

    /// Every other navigation (menus, tabs, panels)
    pub nav: ProfileThresholds,

    /// Get Started → Mandatory Compliances
    pub get_started: GetStartedThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            login: ProfileThresholds {
                warn_ms: 30_000,
                fail_ms: 60_000,
            },
            nav: ProfileThresholds {
                warn_ms: 10_000,
                fail_ms: 60_000,
            },
            get_started: GetStartedThresholds {
                warn1_ms: 60_000,
                warn2_ms: 90_000,
                fail_ms: 150_000,
            },
        }
    }
}

/// Named profile lookup, as used by scenario specs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Login,
    Nav,
    GetStarted,
}

impl ThresholdConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            info!("Loaded thresholds from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from a properties file, if it exists
    pub fn apply_properties_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)?;
        self.apply_properties(&content);
        Ok(())
    }

    /// Overlay `threshold.*.ms` entries from properties text. Unknown keys
    /// are ignored; unparseable values keep the current value.
    pub fn apply_properties(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, raw)) = line.split_once(['=', ':']) else {
                continue;
            };
            let key = key.trim();
            let Some(slot) = self.slot_for_property(key) else {
                continue;
            };
            match parse_millis(raw) {
                Some(value) => *slot = value,
                None => warn!(
                    "[Thresholds] Keeping {} ms for {}: unparseable value '{}'",
                    slot,
                    key,
                    raw.trim()
                ),
            }
        }
    }

    /// Overlay `STEPWATCH_<PROFILE>_<FIELD>` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (env_key, property) in ENV_KEYS {
            let Some(raw) = lookup(env_key) else {
                continue;
            };
            match (parse_millis(&raw), self.slot_for_property(property)) {
                (Some(value), Some(slot)) => *slot = value,
                (None, _) => warn!("[Thresholds] Ignoring {}: unparseable value '{}'", env_key, raw),
                (_, None) => {}
            }
        }
    }

    /// Defaults, then TOML, then properties, then environment
    pub fn resolve(toml_path: Option<&Path>, properties_path: Option<&Path>) -> Result<Self> {
        let mut config = match toml_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(path) = properties_path {
            config.apply_properties_file(path)?;
        }
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_pair("login", self.login.warn_ms, self.login.fail_ms)?;
        check_pair("nav", self.nav.warn_ms, self.nav.fail_ms)?;
        let gs = &self.get_started;
        if gs.warn2_ms < gs.warn1_ms {
            return Err(Error::InvalidConfig(format!(
                "get_started warn2 ({} ms) must not be below warn1 ({} ms)",
                gs.warn2_ms, gs.warn1_ms
            )));
        }
        check_pair("get_started", gs.warn2_ms, gs.fail_ms)
    }

    pub fn bands(&self, profile: Profile) -> SlaBands {
        match profile {
            Profile::Login => self.login.bands(),
            Profile::Nav => self.nav.bands(),
            Profile::GetStarted => self.get_started.bands(),
        }
    }

    fn slot_for_property(&mut self, key: &str) -> Option<&mut u64> {
        let slot = match key {
            "threshold.login.warn.ms" => &mut self.login.warn_ms,
            "threshold.login.fail.ms" => &mut self.login.fail_ms,
            "threshold.nav.warn.ms" => &mut self.nav.warn_ms,
            "threshold.nav.fail.ms" => &mut self.nav.fail_ms,
            "threshold.getstarted.warn1.ms" => &mut self.get_started.warn1_ms,
            "threshold.getstarted.warn2.ms" => &mut self.get_started.warn2_ms,
            "threshold.getstarted.fail.ms" => &mut self.get_started.fail_ms,
            _ => return None,
        };
        Some(slot)
    }
}

const ENV_KEYS: [(&str, &str); 7] = [
    ("STEPWATCH_LOGIN_WARN_MS", "threshold.login.warn.ms"),
    ("STEPWATCH_LOGIN_FAIL_MS", "threshold.login.fail.ms"),
    ("STEPWATCH_NAV_WARN_MS", "threshold.nav.warn.ms"),
    ("STEPWATCH_NAV_FAIL_MS", "threshold.nav.fail.ms"),
    ("STEPWATCH_GET_STARTED_WARN1_MS", "threshold.getstarted.warn1.ms"),
    ("STEPWATCH_GET_STARTED_WARN2_MS", "threshold.getstarted.warn2.ms"),
    ("STEPWATCH_GET_STARTED_FAIL_MS", "threshold.getstarted.fail.ms"),
];

fn check_pair(profile: &str, warn_ms: u64, fail_ms: u64) -> Result<()> {
    if fail_ms < warn_ms {
        return Err(Error::InvalidThresholds {
            profile: profile.to_string(),
            warn_ms,
            fail_ms,
        });
    }
    Ok(())
}

/// Whole milliseconds, ignoring an inline `#` comment and `_` separators
/// ("30000   # 30s" -> 30000, "30_000" -> 30000). Anything else, including
/// units, signs and decimals, is unparseable.
pub fn parse_millis(raw: &str) -> Option<u64> {
    let value = raw.split('#').next().unwrap_or_default().trim();
    if value.starts_with('_') || value.ends_with('_') {
        return None;
    }
    value.replace('_', "").parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ThresholdConfig::default();
        assert_eq!(config.nav.warn_ms, 10_000);
        assert_eq!(config.nav.fail_ms, 60_000);
        assert_eq!(config.login.warn_ms, 30_000);
        assert_eq!(config.get_started.warn2_ms, 90_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("30000   # 30s"), Some(30_000));
        assert_eq!(parse_millis(" 12_000 "), Some(12_000));
        assert_eq!(parse_millis("# only a comment"), None);
        assert_eq!(parse_millis(""), None);
        assert_eq!(parse_millis("30s"), None);
        assert_eq!(parse_millis("12.5"), None);
        assert_eq!(parse_millis("-1"), None);
        assert_eq!(parse_millis("_100"), None);
    }

    #[test]
    fn test_apply_properties() {
        let mut config = ThresholdConfig::default();
        config.apply_properties(
            "# thresholds\n\
             threshold.nav.warn.ms=12000\n\
             threshold.nav.fail.ms = 20000  # 20s\n\
             threshold.login.warn.ms=\n\
             base.url=https://example.invalid\n",
        );
        assert_eq!(config.nav.warn_ms, 12_000);
        assert_eq!(config.nav.fail_ms, 20_000);
        // Empty value keeps the default
        assert_eq!(config.login.warn_ms, 30_000);
    }

    #[test]
    fn test_apply_properties_keeps_value_on_malformed_input() {
        let mut config = ThresholdConfig::default();
        config.apply_properties(
            "threshold.nav.warn.ms=12.5\n\
             threshold.nav.fail.ms=1e4\n\
             threshold.login.warn.ms=30s\n\
             threshold.login.fail.ms=-1\n",
        );
        assert_eq!(config.nav.warn_ms, 10_000);
        assert_eq!(config.nav.fail_ms, 60_000);
        assert_eq!(config.login.warn_ms, 30_000);
        assert_eq!(config.login.fail_ms, 60_000);
    }

    #[test]
    fn test_apply_env_with() {
        let vars: HashMap<&str, &str> = [
            ("STEPWATCH_LOGIN_FAIL_MS", "40000"),
            ("STEPWATCH_GET_STARTED_WARN1_MS", "abc"),
        ]
        .into_iter()
        .collect();

        let mut config = ThresholdConfig::default();
        config.apply_env_with(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.login.fail_ms, 40_000);
        assert_eq!(config.get_started.warn1_ms, 60_000);
    }

    #[test]
    fn test_toml_roundtrip_and_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thresholds.toml");

        std::fs::write(&path, "[nav]\nwarn_ms = 8000\nfail_ms = 15000\n").unwrap();
        let config = ThresholdConfig::load(&path).unwrap();
        assert_eq!(config.nav.warn_ms, 8000);
        assert_eq!(config.login, ThresholdConfig::default().login);

        let saved = dir.path().join("nested/out.toml");
        config.save(&saved).unwrap();
        assert_eq!(ThresholdConfig::load(&saved).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ThresholdConfig::load(Path::new("/nonexistent/thresholds.toml")).unwrap();
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_profiles() {
        let mut config = ThresholdConfig::default();
        config.nav.fail_ms = 5_000;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidThresholds { ref profile, .. }) if profile == "nav"
        ));

        let mut config = ThresholdConfig::default();
        config.get_started.warn2_ms = 30_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_bands() {
        let config = ThresholdConfig::default();
        let bands = config.bands(Profile::GetStarted);
        assert_eq!(bands.bands().len(), 3);
        assert_eq!(
            bands.classify(95_000, "Get Started").band_name(),
            Some("warn2")
        );
        assert_eq!(config.bands(Profile::Nav).fail_threshold(), Some(60_000));
    }
}
