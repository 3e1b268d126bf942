//! Connection and collection-window settings.

use crate::error::StatsError;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
/// Seconds profiling stays at level 2.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
/// Capacity of the capped `system.profile` collection, in bytes.
pub const DEFAULT_SIZE_BYTES: u64 = 10_485_760;
/// Document cap of the capped `system.profile` collection.
pub const DEFAULT_MAX_OBJECTS: u64 = 10_000;
pub const DEFAULT_MAX_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Full connection string; overrides `host` and `port` when set.
    pub uri: Option<String>,
    pub database: String,
    pub interval_secs: u64,
    pub size_bytes: u64,
    pub max_objects: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uri: None,
            database: String::new(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            size_bytes: DEFAULT_SIZE_BYTES,
            max_objects: DEFAULT_MAX_OBJECTS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.database.trim().is_empty() {
            return Err(StatsError::InvalidArgument(
                "database name must not be empty".to_string(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(StatsError::InvalidArgument(
                "--interval must be at least 1 second".to_string(),
            ));
        }
        if self.size_bytes == 0 {
            return Err(StatsError::InvalidArgument(
                "--size must be greater than 0".to_string(),
            ));
        }
        if self.max_objects == 0 {
            return Err(StatsError::InvalidArgument(
                "--max-objects must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn connection_string(&self) -> String {
        match &self.uri {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config {
            database: "test".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults() {
        let c = config();
        assert!(c.validate().is_ok());
        assert_eq!(c.interval(), Duration::from_secs(5));
        assert_eq!(c.connection_string(), "mongodb://localhost:27017/test");
    }

    #[test]
    fn uri_overrides_host_and_port() {
        let c = Config {
            host: "db1".to_string(),
            uri: Some("mongodb://user:pw@db2:27018/?authSource=admin".to_string()),
            ..config()
        };
        assert_eq!(
            c.connection_string(),
            "mongodb://user:pw@db2:27018/?authSource=admin"
        );
    }

    #[test]
    fn rejects_zero_values() {
        let cases = [
            Config { interval_secs: 0, ..config() },
            Config { size_bytes: 0, ..config() },
            Config { max_objects: 0, ..config() },
            Config { database: " ".to_string(), ..config() },
        ];
        for c in cases {
            assert!(matches!(c.validate(), Err(StatsError::InvalidArgument(_))));
        }
    }
}
