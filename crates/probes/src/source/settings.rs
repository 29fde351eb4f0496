use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Backend a probe connects to, selected by the configured driver id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// libsql/SQLite database file on local disk
    Local,
    /// Remote libsql server, authenticated with the configured password as token
    Remote,
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "libsql" | "sqlite" | "local" => Ok(Driver::Local),
            "libsql-remote" | "remote" | "turso" => Ok(Driver::Remote),
            other => Err(ConfigError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Local => write!(f, "libsql"),
            Driver::Remote => write!(f, "libsql-remote"),
        }
    }
}

/// Everything needed to open the data source a probe watches.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub user: String,
    pub password: String,
    pub url: String,
    pub driver: Driver,
}

impl ConnectionSettings {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        driver: Driver,
    ) -> Self {
        Self { user: user.into(), password: password.into(), url: url.into(), driver }
    }

    /// Settings for a local database file with no credentials
    pub fn local(path: impl Into<String>) -> Self {
        Self::new("", "", path, Driver::Local)
    }

    /// Filesystem path for [`Driver::Local`], with any `file:` scheme removed
    pub fn local_path(&self) -> &str {
        self.url
            .strip_prefix("file://")
            .or_else(|| self.url.strip_prefix("file:"))
            .unwrap_or(&self.url)
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("driver", &self.driver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_aliases() {
        assert_eq!("libsql".parse::<Driver>().unwrap(), Driver::Local);
        assert_eq!(" SQLite ".parse::<Driver>().unwrap(), Driver::Local);
        assert_eq!("turso".parse::<Driver>().unwrap(), Driver::Remote);
        assert_eq!("libsql-remote".parse::<Driver>().unwrap(), Driver::Remote);
    }

    #[test]
    fn test_unknown_driver_is_rejected() {
        let err = "org.postgresql.Driver".parse::<Driver>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDriver(ref name) if name == "org.postgresql.driver"));
    }

    #[test]
    fn test_local_path_strips_file_scheme() {
        assert_eq!(ConnectionSettings::local("file:events.db").local_path(), "events.db");
        assert_eq!(ConnectionSettings::local("file:///tmp/events.db").local_path(), "/tmp/events.db");
        assert_eq!(ConnectionSettings::local("/var/lib/events.db").local_path(), "/var/lib/events.db");
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = ConnectionSettings::new("reader", "hunter2", "libsql://db", Driver::Remote);
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("reader"));
    }
}
