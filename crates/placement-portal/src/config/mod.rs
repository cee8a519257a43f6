use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the portal service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalTimings,
    pub sessions: SessionLimits,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalTimings::from_env()?,
            sessions: SessionLimits::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

const MIN_LOADER_TICK: Duration = Duration::from_millis(1);

/// Loader cadence: the counter advances by `step` every `tick` and signals completion
/// `completion_delay` after it reaches 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderTimings {
    pub tick: Duration,
    pub step: u8,
    pub completion_delay: Duration,
}

impl Default for LoaderTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            step: 2,
            completion_delay: Duration::from_millis(500),
        }
    }
}

/// Simulated latencies standing in for the remote collaborators of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalTimings {
    pub loader: LoaderTimings,
    pub login_latency: Duration,
    pub upload_latency: Duration,
    pub scoring_delay: Duration,
    pub publish_latency: Duration,
}

impl Default for PortalTimings {
    fn default() -> Self {
        Self {
            loader: LoaderTimings::default(),
            login_latency: Duration::from_millis(1500),
            upload_latency: Duration::from_millis(2000),
            scoring_delay: Duration::from_millis(3000),
            publish_latency: Duration::from_millis(1500),
        }
    }
}

impl PortalTimings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let step = match env::var("PORTAL_LOADER_STEP") {
            Ok(raw) => raw
                .trim()
                .parse::<u8>()
                .map_err(|_| ConfigError::InvalidLoaderStep)?,
            Err(_) => defaults.loader.step,
        };
        if step == 0 {
            return Err(ConfigError::InvalidLoaderStep);
        }

        let tick = millis_var("PORTAL_LOADER_TICK_MS", defaults.loader.tick)?;
        if tick.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name: "PORTAL_LOADER_TICK_MS",
            });
        }

        Ok(Self {
            loader: LoaderTimings {
                tick,
                step,
                completion_delay: millis_var(
                    "PORTAL_LOADER_COMPLETION_DELAY_MS",
                    defaults.loader.completion_delay,
                )?,
            },
            login_latency: millis_var("PORTAL_LOGIN_LATENCY_MS", defaults.login_latency)?,
            upload_latency: millis_var("PORTAL_UPLOAD_LATENCY_MS", defaults.upload_latency)?,
            scoring_delay: millis_var("PORTAL_SCORING_DELAY_MS", defaults.scoring_delay)?,
            publish_latency: millis_var("PORTAL_PUBLISH_LATENCY_MS", defaults.publish_latency)?,
        })
    }

    /// Scale every delay by `factor`; the loader step is left alone and the tick never
    /// drops below one millisecond.
    ///
    /// Fails for negative or non-finite factors and for factors whose scaled delays do
    /// not fit in a [`Duration`].
    pub fn scaled(self, factor: f64) -> Result<Self, ConfigError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(ConfigError::InvalidTimeScale { factor });
        }
        let scale = |duration: Duration| {
            Duration::try_from_secs_f64(duration.as_secs_f64() * factor)
                .map_err(|_| ConfigError::InvalidTimeScale { factor })
        };

        Ok(Self {
            loader: LoaderTimings {
                tick: scale(self.loader.tick)?.max(MIN_LOADER_TICK),
                step: self.loader.step,
                completion_delay: scale(self.loader.completion_delay)?,
            },
            login_latency: scale(self.login_latency)?,
            upload_latency: scale(self.upload_latency)?,
            scoring_delay: scale(self.scoring_delay)?,
            publish_latency: scale(self.publish_latency)?,
        })
    }
}

/// Bounds on the portal sessions the HTTP service keeps open at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Sessions untouched for this long are evicted.
    pub idle_ttl: Duration,
    pub max_open: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_open: 1024,
        }
    }
}

impl SessionLimits {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let idle_ttl = millis_var("PORTAL_SESSION_TTL_MS", defaults.idle_ttl)?;
        if idle_ttl.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name: "PORTAL_SESSION_TTL_MS",
            });
        }

        let max_open = match env::var("PORTAL_MAX_SESSIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidSessionLimit)?,
            Err(_) => defaults.max_open,
        };
        if max_open == 0 {
            return Err(ConfigError::InvalidSessionLimit);
        }

        Ok(Self { idle_ttl, max_open })
    }
}

fn millis_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDuration { name }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDuration { name: &'static str },
    InvalidLoaderStep,
    InvalidTimeScale { factor: f64 },
    InvalidSessionLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { name } => {
                write!(f, "{name} must be a whole number of milliseconds")
            }
            ConfigError::InvalidLoaderStep => {
                write!(f, "PORTAL_LOADER_STEP must be an integer between 1 and 255")
            }
            ConfigError::InvalidTimeScale { factor } => {
                write!(f, "time scale {factor} must be non-negative and keep delays in range")
            }
            ConfigError::InvalidSessionLimit => {
                write!(f, "PORTAL_MAX_SESSIONS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDuration { .. }
            | ConfigError::InvalidLoaderStep
            | ConfigError::InvalidTimeScale { .. }
            | ConfigError::InvalidSessionLimit => None,
        }
    }
}
