use std::{env, fmt, fs, io, path};

use probes::notification::DEFAULT_HUB_TIMEOUT_SECONDS;
use probes::{DatabaseOptions, WatermarkPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file {path}")]
    Read {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write config file {path}")]
    Write {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config path given and neither XDG_CONFIG_HOME nor a home directory is set")]
    ConfigPathUnavailable,
    #[error("probe #{index} has an empty topic")]
    EmptyTopic { index: usize },
    #[error("probe {topic} has a zero poll interval")]
    ZeroInterval { topic: String },
    #[error("hub timeout must be greater than zero")]
    ZeroHubTimeout,
    #[error("probe {topic} has a zero query timeout")]
    ZeroQueryTimeout { topic: String },
}

fn default_hub_timeout() -> u64 {
    DEFAULT_HUB_TIMEOUT_SECONDS
}

fn default_interval() -> u64 {
    30
}

fn default_query_timeout() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub hub: Hub,
    #[serde(default)]
    pub probes: Vec<ProbeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Hub {
    pub base_url: String,
    #[serde(default = "default_hub_timeout")]
    pub timeout_seconds: u64,
}

/// One `[[probes]]` table
#[derive(Debug, Serialize, Deserialize)]
pub struct ProbeEntry {
    pub topic: String,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    #[serde(default)]
    pub on_query_failure: WatermarkPolicy,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub database: DatabaseOptions,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/probes/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("probes/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: Hub {
                base_url: "http://localhost:8080".into(),
                timeout_seconds: DEFAULT_HUB_TIMEOUT_SECONDS,
            },
            probes: Vec::new(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_title_2 = write_title_indented(2);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Probe Configuration:")?;
        write_title_1(f, "Hub")?;
        write_1(f, "Base URL", &self.hub.base_url)?;
        write_1(f, "Timeout (s)", &self.hub.timeout_seconds)?;

        write_title_1(f, "Probes")?;
        if self.probes.is_empty() {
            write_1(f, "Configured", &"none")?;
        }
        for probe in &self.probes {
            write_title_2(f, &probe.topic)?;
            write_2(f, "Enabled", &probe.enabled)?;
            write_2(f, "Interval (s)", &probe.interval_seconds)?;
            write_2(f, "Query timeout (s)", &probe.query_timeout_seconds)?;
            write_2(f, "On query failure", &format!("{:?}", probe.on_query_failure))?;
            write_2(f, "Database URL", &probe.database.database_url)?;
            write_2(f, "Driver", &probe.database.driver_class_name)?;
            write_2(f, "User", &probe.database.user)?;
            let password = if probe.database.password.is_empty() { "<empty>" } else { "********" };
            write_2(f, "Password", &password)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/probes/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::Read { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())
                .map_err(|source| Error::Parse { path: config_path.clone(), source })?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| Error::Write { path: path.to_path_buf(), source })
    }

    /// Structural checks the probes library does not cover
    pub fn validate(&self) -> Result<(), Error> {
        if self.hub.timeout_seconds == 0 {
            return Err(Error::ZeroHubTimeout);
        }
        for (index, probe) in self.probes.iter().enumerate() {
            if probe.topic.trim().is_empty() {
                return Err(Error::EmptyTopic { index });
            }
            if probe.interval_seconds == 0 {
                return Err(Error::ZeroInterval { topic: probe.topic.clone() });
            }
            if probe.query_timeout_seconds == 0 {
                return Err(Error::ZeroQueryTimeout { topic: probe.topic.clone() });
            }
        }
        Ok(())
    }

    pub fn enabled_probes(&self) -> impl Iterator<Item = &ProbeEntry> {
        self.probes.iter().filter(|probe| probe.enabled)
    }
}
