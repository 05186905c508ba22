//! Configuration loading and config file resolution

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::normalize::{CellCleaner, ColumnLayout, DEFAULT_MISSING_MARKERS};
use crate::tracker::TrackerKind;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "NPI_CONFIG";

/// Directory under the platform config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "npi-dashboard";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const READINESS_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vT3so_mMFyNEBJGBZuEYzTxaWDMSJg0nGznK4ln9r4i2OTRzL_AxATf8sSBgwEdfA/pub?gid=1714107674&single=true&output=csv";
const MILESTONE_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSERW8jK8wY8-01wqcDBtNY_g8Km2g3QyxNjT1BWIg2II95wvouLQ1wsgWckkY56Q/pub?gid=1960938483&single=true&output=csv";
const SUB_MILESTONE_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRtFXzX7qmZ2yyJPqnr8h_llta3uvIFnVsI0cwUWGMoZuJXPQ9c4Blm-WTFLVABWA/pub?gid=1934231119&single=true&output=csv";

/// Dashboard service configuration (`config.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Socket address the HTTP server binds
    pub bind_addr: String,
    /// Per-request timeout for source fetches
    pub http_timeout_secs: u64,
    /// Cell spellings treated as missing
    pub missing_markers: Vec<String>,
    pub trackers: Vec<TrackerConfig>,
}

/// One configured dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// URL path segment (`/trackers/<id>`)
    pub id: String,
    pub title: String,
    pub kind: TrackerKind,
    /// Published CSV export URL
    pub source_url: String,
    /// Missing-cell token; defaults per tracker kind
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Refresh interval and cache lifetime; defaults per tracker kind
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
    /// Logical field -> header substring (or column index for positional
    /// trackers)
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl TrackerConfig {
    pub fn new(id: &str, title: &str, kind: TrackerKind, source_url: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            source_url: source_url.to_string(),
            placeholder: None,
            refresh_interval_secs: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn placeholder(&self) -> &str {
        self.placeholder
            .as_deref()
            .unwrap_or_else(|| self.kind.default_placeholder())
    }

    pub fn refresh_interval_secs(&self) -> u64 {
        self.refresh_interval_secs
            .unwrap_or_else(|| self.kind.default_refresh_interval_secs())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs())
    }

    pub fn layout(&self) -> ColumnLayout {
        self.kind.layout(&self.columns)
    }

    pub fn cleaner(&self, missing_markers: &[String]) -> CellCleaner {
        CellCleaner::new(self.placeholder(), missing_markers.to_vec())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::compiled_defaults()
    }
}

impl DashboardConfig {
    /// The three published trackers
    pub fn compiled_defaults() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            missing_markers: DEFAULT_MISSING_MARKERS.iter().map(|m| m.to_string()).collect(),
            trackers: vec![
                TrackerConfig::new(
                    "readiness",
                    "UTAH NA - Process Readiness Tracker",
                    TrackerKind::Readiness,
                    READINESS_CSV_URL,
                ),
                TrackerConfig::new(
                    "milestones",
                    "Milestone Tracker Dashboard",
                    TrackerKind::Milestone,
                    MILESTONE_CSV_URL,
                ),
                TrackerConfig::new(
                    "sub-milestones",
                    "DALLAS NA - Sub-Milestones",
                    TrackerKind::SubMilestone,
                    SUB_MILESTONE_CSV_URL,
                ),
            ],
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trackers.is_empty() {
            return Err(Error::Config("no trackers configured".to_string()));
        }

        let mut ids = HashSet::new();
        for tracker in &self.trackers {
            let id_ok = !tracker.id.is_empty()
                && tracker
                    .id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !id_ok {
                return Err(Error::Config(format!(
                    "tracker id {:?} must be non-empty and use only letters, digits, '-' or '_'",
                    tracker.id
                )));
            }
            if !ids.insert(tracker.id.as_str()) {
                return Err(Error::Config(format!("duplicate tracker id {:?}", tracker.id)));
            }
            if tracker.refresh_interval_secs() == 0 {
                return Err(Error::Config(format!(
                    "tracker {:?}: refresh_interval_secs must be positive",
                    tracker.id
                )));
            }
            validate_columns(tracker)?;
            if tracker.placeholder().trim().is_empty() {
                return Err(Error::Config(format!(
                    "tracker {:?}: placeholder must not be blank",
                    tracker.id
                )));
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(Error::Config("http_timeout_secs must be positive".to_string()));
        }

        Ok(())
    }

    pub fn tracker(&self, id: &str) -> Option<&TrackerConfig> {
        self.trackers.iter().find(|t| t.id == id)
    }
}

fn validate_columns(tracker: &TrackerConfig) -> Result<()> {
    let fields = tracker.kind.fields();
    for (field, pattern) in &tracker.columns {
        if !fields.contains(&field.as_str()) {
            return Err(Error::Config(format!(
                "tracker {:?}: unknown column field {:?} (expected one of: {})",
                tracker.id,
                field,
                fields.join(", ")
            )));
        }
        if tracker.kind.is_positional() && pattern.trim().parse::<usize>().is_err() {
            return Err(Error::Config(format!(
                "tracker {:?}: column {:?} must be a column index, got {:?}",
                tracker.id, field, pattern
            )));
        }
    }
    Ok(())
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    CompiledDefaults,
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config file (`<config_dir>/npi-dashboard/config.toml`)
/// 4. Compiled defaults (fallback)
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    user_config_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self {
            cli_path,
            user_config_dir: dirs::config_dir(),
        }
    }

    /// Override the platform config dir (tests)
    pub fn with_user_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_config_dir = dir;
        self
    }

    /// Pick the config file to use, without reading it
    pub fn source(&self) -> ConfigSource {
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(dir) = &self.user_config_dir {
            let path = dir.join(CONFIG_DIR_NAME).join("config.toml");
            if path.exists() {
                return ConfigSource::UserFile(path);
            }
        }

        ConfigSource::CompiledDefaults
    }

    /// Resolve and load the configuration
    ///
    /// A named file that does not exist logs a warning and falls back to the
    /// compiled defaults. A file that exists but does not parse or validate
    /// is an error.
    pub fn resolve(&self) -> Result<(DashboardConfig, ConfigSource)> {
        let source = self.source();
        let path = match &source {
            ConfigSource::CommandLine(p) | ConfigSource::Environment(p) | ConfigSource::UserFile(p) => p,
            ConfigSource::CompiledDefaults => {
                info!("No config file found; using compiled defaults");
                return Ok((DashboardConfig::compiled_defaults(), ConfigSource::CompiledDefaults));
            }
        };

        if !path.exists() {
            warn!(
                "Config file {} not found; using compiled defaults",
                path.display()
            );
            return Ok((DashboardConfig::compiled_defaults(), ConfigSource::CompiledDefaults));
        }

        let config = DashboardConfig::load(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok((config, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_defaults_are_valid() {
        let config = DashboardConfig::compiled_defaults();
        config.validate().unwrap();
        assert_eq!(config.trackers.len(), 3);
        assert_eq!(config.tracker("milestones").unwrap().kind, TrackerKind::Milestone);
    }

    #[test]
    fn test_kind_defaults_apply_when_unset() {
        let config = DashboardConfig::compiled_defaults();
        let sub = config.tracker("sub-milestones").unwrap();
        assert_eq!(sub.placeholder(), "NA");
        assert_eq!(sub.refresh_interval(), Duration::from_secs(300));

        let readiness = config.tracker("readiness").unwrap();
        assert_eq!(readiness.placeholder(), "—");
        assert_eq!(readiness.refresh_interval_secs(), 30);
    }

    #[test]
    fn test_toml_overrides() {
        let config = DashboardConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:9000"

            [[trackers]]
            id = "plant-a"
            title = "Plant A readiness"
            kind = "readiness"
            source_url = "http://localhost/a.csv"
            placeholder = "-"
            refresh_interval_secs = 10

            [trackers.columns]
            owner = "responsible"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        let tracker = &config.trackers[0];
        assert_eq!(tracker.placeholder(), "-");
        assert_eq!(tracker.refresh_interval_secs(), 10);
        assert_eq!(tracker.columns.get("owner").map(String::as_str), Some("responsible"));
    }

    #[test]
    fn test_validation_rejects_duplicate_ids() {
        let mut config = DashboardConfig::compiled_defaults();
        config.trackers[1].id = "readiness".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_ids_and_zero_interval() {
        let mut config = DashboardConfig::compiled_defaults();
        config.trackers[0].id = "a/b".to_string();
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::compiled_defaults();
        config.trackers[0].refresh_interval_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let err = DashboardConfig::from_toml_str(
            r#"
            [[trackers]]
            id = "x"
            title = "x"
            kind = "gantt"
            source_url = "http://localhost/x.csv"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_validation_rejects_unknown_column_fields() {
        let mut config = DashboardConfig::compiled_defaults();
        config.trackers[0]
            .columns
            .insert("target".to_string(), "due".to_string());

        match config.validate() {
            Err(Error::Config(msg)) => assert!(msg.contains("target_date")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_columns_must_be_indices() {
        let mut config = DashboardConfig::compiled_defaults();
        let milestones = config.trackers.iter_mut().find(|t| t.id == "milestones").unwrap();
        milestones.columns.insert("plan_date".to_string(), "5".to_string());
        config.validate().unwrap();

        let milestones = config.trackers.iter_mut().find(|t| t.id == "milestones").unwrap();
        milestones.columns.insert("actual_date".to_string(), "Actual".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
