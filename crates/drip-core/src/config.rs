use crate::calendar::Calendar;
use crate::error::{DripError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ScheduleDefaults
// ---------------------------------------------------------------------------

/// Schedule parameters used when a command does not set them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDefaults {
    #[serde(default = "default_activity_type")]
    pub activity_type: String,
    #[serde(default = "default_per_session")]
    pub activities_per_session: u32,
    #[serde(default = "default_session_length")]
    pub session_length_days: u32,
}

fn default_activity_type() -> String {
    "quiz".to_string()
}

fn default_per_session() -> u32 {
    1
}

fn default_session_length() -> u32 {
    7
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            activity_type: default_activity_type(),
            activities_per_session: default_per_session(),
            session_length_days: default_session_length(),
        }
    }
}

// ---------------------------------------------------------------------------
// DripConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DripConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// IANA zone used for calendar-day arithmetic and display.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub defaults: ScheduleDefaults,
}

fn default_version() -> u32 {
    1
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DripConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            timezone: default_timezone(),
            defaults: ScheduleDefaults::default(),
        }
    }
}

impl DripConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(DripError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: DripConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn calendar(&self) -> Result<Calendar> {
        Calendar::from_name(&self.timezone)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.calendar() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        if self.defaults.activities_per_session == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "defaults.activities_per_session must be at least 1".to_string(),
            });
        }
        if self.defaults.session_length_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "defaults.session_length_days must be at least 1".to_string(),
            });
        }
        if self.defaults.activity_type.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "defaults.activity_type is empty; every command must pass --type"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
