use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use tracing::error;

// Numeric settings stay raw strings here; the accessors parse them one field at a time.
#[derive(Envconfig, Debug, Clone, PartialEq)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "PORT", default = "8000")]
    pub port: String,

    // Shell command running the primary application, expected to block for the process lifetime.
    #[envconfig(from = "APP_COMMAND")]
    pub app_command: Option<String>,

    // Shell command running the cleanup operation, see `CommandCleanup`.
    #[envconfig(from = "CLEANUP_COMMAND")]
    pub cleanup_command: Option<String>,

    // Unset means a cleanup request waits for the operation however long it takes.
    #[envconfig(from = "CLEANUP_TIMEOUT_SECS")]
    pub cleanup_timeout: Option<String>,

    // ';' separated shell commands run once before the launch.
    #[envconfig(from = "PREPARE_COMMANDS", default = "")]
    pub prepare_commands: String,

    #[envconfig(from = "KEEPALIVE_INTERVAL_SECS", default = "60")]
    pub keepalive_interval: String,

    #[envconfig(from = "METRICS_BIND_PORT")]
    pub metrics_port: Option<String>,
}

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_KEEPALIVE_INTERVAL: time::Duration = time::Duration::from_secs(60);

impl Config {
    /// Load the configuration from the environment. A broken environment must not keep the
    /// degraded server from coming up: every field is read as text, and the typed accessors
    /// below fall back per field.
    pub fn load() -> Self {
        Config::init_from_env().unwrap_or_else(|e| {
            error!("invalid configuration, continuing with defaults: {}", e);
            Config::default()
        })
    }

    pub fn port(&self) -> u16 {
        parse_or(&self.port, "PORT", DEFAULT_PORT)
    }

    pub fn cleanup_timeout(&self) -> Option<time::Duration> {
        self.cleanup_timeout.as_deref().and_then(|raw| {
            parse_or::<Option<EnvSecsDuration>>(raw, "CLEANUP_TIMEOUT_SECS", None)
                .map(|timeout| timeout.0)
        })
    }

    pub fn keepalive_interval(&self) -> time::Duration {
        parse_or(
            &self.keepalive_interval,
            "KEEPALIVE_INTERVAL_SECS",
            EnvSecsDuration(DEFAULT_KEEPALIVE_INTERVAL),
        )
        .0
    }

    pub fn metrics_port(&self) -> Option<u16> {
        self.metrics_port
            .as_deref()
            .and_then(|raw| parse_or::<Option<u16>>(raw, "METRICS_BIND_PORT", None))
    }

    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port())
    }

    pub fn metrics_bind(&self) -> Option<String> {
        self.metrics_port()
            .map(|port| format!("{}:{}", self.host, port))
    }

    pub fn prepare_commands(&self) -> Vec<String> {
        self.prepare_commands
            .split(';')
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Parse one setting, logging and substituting `default` when the value is unusable.
fn parse_or<T: ParseSetting>(raw: &str, var: &str, default: T) -> T {
    T::parse_setting(raw.trim()).unwrap_or_else(|| {
        error!(
            "invalid value {:?} for {}, continuing with the default",
            raw, var
        );
        default
    })
}

trait ParseSetting: Sized {
    fn parse_setting(raw: &str) -> Option<Self>;
}

impl ParseSetting for u16 {
    fn parse_setting(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl ParseSetting for EnvSecsDuration {
    fn parse_setting(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl<T: ParseSetting> ParseSetting for Option<T> {
    fn parse_setting(raw: &str) -> Option<Self> {
        T::parse_setting(raw).map(Some)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT.to_string(),
            app_command: None,
            cleanup_command: None,
            cleanup_timeout: None,
            prepare_commands: String::new(),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL.as_secs().to_string(),
            metrics_port: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvSecsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvSecsDurationError;

impl FromStr for EnvSecsDuration {
    type Err = ParseEnvSecsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = s.parse::<u64>().map_err(|_| ParseEnvSecsDurationError)?;

        Ok(EnvSecsDuration(time::Duration::from_secs(secs)))
    }
}
