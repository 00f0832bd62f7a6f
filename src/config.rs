use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub registration: RegistrationSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Signup source state: whether the current cycle still accepts signups
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationSettings {
    #[serde(default)]
    pub open: bool,
    #[serde(default = "default_min_timeslots")]
    pub min_timeslots: usize,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            open: false,
            min_timeslots: default_min_timeslots(),
        }
    }
}

fn default_min_timeslots() -> usize { 3 }

/// Weekly trigger for the pairing cycle
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0 = Monday ... 6 = Sunday
    #[serde(default = "default_weekday")]
    pub weekday: u8,
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default = "default_minute")]
    pub minute: u32,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            weekday: default_weekday(),
            hour: default_hour(),
            minute: default_minute(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_true() -> bool { true }
fn default_weekday() -> u8 { 4 }
fn default_hour() -> u32 { 9 }
fn default_minute() -> u32 { 3 }
fn default_utc_offset_hours() -> i32 { 1 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_directory_size")]
    pub directory_size: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory_size: default_directory_size(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_directory_size() -> u64 { 1000 }
fn default_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LoggingSettings {
    /// Unknown format names fall back to compact text
    pub fn log_format(&self) -> LogFormat {
        match self.format.as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAIRS__)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAIRS__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PAIRS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// DATABASE_URL wins over every other source for the database URL
fn with_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_friday_morning_cet() {
        let schedule = ScheduleSettings::default();
        assert!(schedule.enabled);
        assert_eq!(schedule.weekday, 4);
        assert_eq!((schedule.hour, schedule.minute), (9, 3));
        assert_eq!(schedule.utc_offset_hours, 1);
    }

    #[test]
    fn test_registration_closed_by_default() {
        let registration = RegistrationSettings::default();
        assert!(!registration.open);
        assert_eq!(registration.min_timeslots, 3);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
        assert_eq!(LoggingSettings::default().log_format(), LogFormat::Json);
    }

    #[test]
    fn test_log_format_names() {
        let with = |format: &str| LoggingSettings {
            level: default_log_level(),
            format: format.to_string(),
        };
        assert_eq!(with("pretty").log_format(), LogFormat::Pretty);
        assert_eq!(with("compact").log_format(), LogFormat::Compact);
        assert_eq!(with("logfmt").log_format(), LogFormat::Compact);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("mock-pairs-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/test"

            [registration]
            open = true
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9000);
        assert!(settings.registration.open);
        assert_eq!(settings.registration.min_timeslots, 3);
        assert_eq!(settings.cache.directory_size, 1000);
    }
}
