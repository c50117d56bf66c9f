//! inquest configuration.
//!
//! Loaded from `~/.inquest/config.toml` or an explicit `--config` path.
//! A missing default file means defaults. Everything the assembler would
//! otherwise read from host-wide settings (company identity, output
//! directory, risk visibility) lives here and is passed in explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use crate::format::Locale;
use crate::tabs::ExtraTab;

/// inquest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Output language: `fr_FR` or `en_US`.
    pub language: String,

    /// IANA time zone for dates. The system zone when omitted.
    pub time_zone: Option<String>,

    /// Root directory of generated documents and uploaded images.
    pub output_dir: PathBuf,

    /// URL prefix of the module's pages, used by navigation tabs.
    pub base_url: String,

    pub company: CompanyIdentity,
    pub risks: RiskVisibility,
    pub tabs: TabsConfig,
}

/// The company the documents are issued for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompanyIdentity {
    pub name: String,
    pub siret: String,
    pub managers: String,
    pub email: String,
}

/// Which risks beyond the element's own appear in documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RiskVisibility {
    /// Include risks of parent elements.
    pub show_inherited: bool,

    /// Include risks shared from other entities.
    pub show_shared: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TabsConfig {
    /// Tabs appended after the built-in accident tabs.
    pub extra: Vec<ExtraTab>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "fr_FR".to_string(),
            time_zone: None,
            output_dir: PathBuf::from("documents"),
            base_url: "/custom/digiriskdolibarr".to_string(),
            company: CompanyIdentity::default(),
            risks: RiskVisibility::default(),
            tabs: TabsConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `explicit`, or from `~/.inquest/config.toml`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(format!("no config file found at {}", path.display()));
                }
                path.to_path_buf()
            }
            None => match Self::path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// Parse config from TOML text.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.locale()?;
        Ok(config)
    }

    /// The default config file path: `~/.inquest/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".inquest").join("config.toml"))
    }

    /// Resolve the configured language and time zone.
    pub fn locale(&self) -> Result<Locale, String> {
        let time_zone = match self.time_zone.as_deref() {
            None => TimeZone::system(),
            Some("UTC") => TimeZone::UTC,
            Some(name) => {
                TimeZone::get(name).map_err(|e| format!("unknown time-zone '{name}': {e}"))?
            }
        };
        Locale::new(&self.language, time_zone)
            .ok_or_else(|| format!("unsupported language '{}'", self.language))
    }
}
