//! Configuration settings for the R2k installer.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::InstallerError;

/// Main configuration structure for the installer.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Service families in menu order.
    #[serde(default = "default_families")]
    pub families: Vec<FamilyConfig>,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root under which each variant gets `<registry_name>/`.
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,
    /// Root under which each service writes `<registry_name>/<registry_name>.log`.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Directory holding the service executables to install.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

/// Wait and escalation timings.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// How long uninstall waits for a graceful stop before force-killing.
    #[serde(default = "default_stop_wait")]
    pub stop_wait_seconds: u64,
    /// How long uninstall waits after a force kill.
    #[serde(default = "default_kill_wait")]
    pub kill_wait_seconds: u64,
    /// How long restart waits for the stop to complete.
    #[serde(default = "default_restart_wait")]
    pub restart_wait_seconds: u64,
    /// Status sampling interval.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Upper bound for a single service-control tool invocation.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
}

/// Crash-recovery policy registered with the OS at install time.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Seconds without failure after which the failure count resets.
    #[serde(default = "default_reset_seconds")]
    pub reset_seconds: u64,
    /// Delay before each automatic restart.
    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,
    /// Number of restart actions.
    #[serde(default = "default_restart_attempts")]
    pub restart_attempts: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Path to the audit log file. Defaults to a file under the data root.
    pub log_path: Option<PathBuf>,
}

/// Dashboard behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Seconds between status refreshes while idle.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

/// One service family (a Local/Remote pair).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FamilyConfig {
    /// Stable key, e.g. "scale".
    pub key: String,
    /// Menu title, e.g. "Scale Service".
    pub title: String,
    /// Base for the generated registry and executable names.
    pub base_name: String,
    /// Base for the generated display names; `base_name` when absent.
    pub display_name: Option<String>,
}

// Default value functions
fn default_install_root() -> PathBuf {
    std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            if cfg!(windows) {
                PathBuf::from(r"C:\Program Files")
            } else {
                PathBuf::from("/opt")
            }
        })
}

fn default_data_root() -> PathBuf {
    std::env::var_os("PROGRAMDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            if cfg!(windows) {
                PathBuf::from(r"C:\ProgramData")
            } else {
                PathBuf::from("/var/lib")
            }
        })
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_stop_wait() -> u64 {
    15
}

fn default_kill_wait() -> u64 {
    5
}

fn default_restart_wait() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    500
}

fn default_command_timeout() -> u64 {
    30
}

fn default_reset_seconds() -> u64 {
    86_400 // one day
}

fn default_restart_delay() -> u64 {
    5_000
}

fn default_restart_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_enabled() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    5
}

/// Base names can be injected at build time; the literals are the
/// names the POS services ship under.
fn default_families() -> Vec<FamilyConfig> {
    vec![
        FamilyConfig {
            key: "scale".to_string(),
            title: "Scale Service".to_string(),
            base_name: option_env!("R2K_SCALE_BASE")
                .unwrap_or("R2k_BasculaServicio")
                .to_string(),
            display_name: None,
        },
        FamilyConfig {
            key: "ticket".to_string(),
            title: "Ticket Service".to_string(),
            base_name: option_env!("R2K_TICKET_BASE")
                .unwrap_or("R2k_TicketServicio")
                .to_string(),
            display_name: None,
        },
    ]
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            data_root: default_data_root(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            stop_wait_seconds: default_stop_wait(),
            kill_wait_seconds: default_kill_wait(),
            restart_wait_seconds: default_restart_wait(),
            poll_interval_ms: default_poll_interval(),
            command_timeout_seconds: default_command_timeout(),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            reset_seconds: default_reset_seconds(),
            restart_delay_ms: default_restart_delay(),
            restart_attempts: default_restart_attempts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            recovery: RecoveryConfig::default(),
            logging: LoggingConfig::default(),
            audit: AuditConfig::default(),
            dashboard: DashboardConfig::default(),
            families: default_families(),
        }
    }
}

impl TimeoutsConfig {
    pub fn stop_wait(&self) -> Duration {
        Duration::from_secs(self.stop_wait_seconds)
    }

    pub fn kill_wait(&self) -> Duration {
        Duration::from_secs(self.kill_wait_seconds)
    }

    pub fn restart_wait(&self) -> Duration {
        Duration::from_secs(self.restart_wait_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InstallerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| InstallerError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            InstallerError::Config { message } => InstallerError::Config {
                message: format!("{} ({})", message, path.display()),
            },
            other => other,
        })
    }

    /// Load settings from `path`, falling back to the built-in defaults
    /// when the file does not exist and was not explicitly requested.
    pub fn load_or_default<P: AsRef<Path>>(path: P, explicit: bool) -> Result<Self, InstallerError> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, InstallerError> {
        let settings: Settings = toml::from_str(content).map_err(|e| InstallerError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Resolved audit log location.
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit.log_path.clone().unwrap_or_else(|| {
            self.paths
                .data_root
                .join("r2k-installer")
                .join("audit.log")
        })
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), InstallerError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(InstallerError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(InstallerError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        let t = &self.timeouts;
        for (name, value) in [
            ("stop_wait_seconds", t.stop_wait_seconds),
            ("kill_wait_seconds", t.kill_wait_seconds),
            ("restart_wait_seconds", t.restart_wait_seconds),
            ("poll_interval_ms", t.poll_interval_ms),
            ("command_timeout_seconds", t.command_timeout_seconds),
            ("refresh_interval_seconds", self.dashboard.refresh_interval_seconds),
        ] {
            if value == 0 {
                return Err(InstallerError::Config {
                    message: format!("'{}' must be greater than zero", name),
                });
            }
        }

        let shortest_wait = t.stop_wait().min(t.kill_wait()).min(t.restart_wait());
        if t.poll_interval() > shortest_wait {
            return Err(InstallerError::Config {
                message: format!(
                    "poll_interval_ms ({}) must not exceed the shortest wait timeout ({}s)",
                    t.poll_interval_ms,
                    shortest_wait.as_secs()
                ),
            });
        }

        if self.families.is_empty() {
            return Err(InstallerError::Config {
                message: "At least one service family must be configured".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for family in &self.families {
            let key_ok = !family.key.is_empty()
                && family
                    .key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !key_ok {
                return Err(InstallerError::Config {
                    message: format!(
                        "Invalid family key '{}'. Use lowercase letters, digits and '_'",
                        family.key
                    ),
                });
            }
            if !seen.insert(family.key.as_str()) {
                return Err(InstallerError::Config {
                    message: format!("Duplicate family key '{}'", family.key),
                });
            }
        }

        Ok(())
    }
}
