use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use billpay_core::execution::ExecutionConfig;
use billpay_core::health::HealthConfig;
use tracing::warn;

const DEFAULT_PORT: u16 = 8088;
const DEFAULT_DB_PATH: &str = "./db/billpay.db";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow_origins: Vec<String>,
    pub request_timeout: Duration,
    pub health: HealthConfig,
    pub execution: ExecutionConfig,
    /// `None` disables the background probe scheduler.
    pub probe_interval: Option<Duration>,
}

/// Read and parse `key`, keeping `default` when it is unset or malformed.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        _ => default,
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Build the config from the process environment. Load `.env` before
    /// calling this (and before installing the subscriber).
    pub fn from_env() -> Self {
        let listen_addr = env_parse(
            "BP_LISTEN_ADDR",
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        );
        let db_path = std::env::var("BP_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.into());
        let cors_allow_origins = std::env::var("BP_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout = Duration::from_millis(env_parse(
            "BP_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
        ));

        let defaults = HealthConfig::default();
        let health = HealthConfig {
            window_size: env_parse("BP_HEALTH_WINDOW", defaults.window_size),
            down_success_rate: env_parse("BP_HEALTH_DOWN_RATE", defaults.down_success_rate),
            degraded_success_rate: env_parse(
                "BP_HEALTH_DEGRADED_RATE",
                defaults.degraded_success_rate,
            ),
            latency_threshold_ms: env_parse("BP_HEALTH_LATENCY_MS", defaults.latency_threshold_ms),
            probe_timeout: Duration::from_millis(env_parse(
                "BP_PROBE_TIMEOUT_MS",
                duration_ms(defaults.probe_timeout),
            )),
            ..defaults
        };

        let execution_defaults = ExecutionConfig::default();
        let execution = ExecutionConfig {
            default_timeout: Duration::from_millis(env_parse(
                "BP_VENDOR_TIMEOUT_MS",
                duration_ms(execution_defaults.default_timeout),
            )),
            stale_in_flight_after: Duration::from_secs(env_parse(
                "BP_STALE_IN_FLIGHT_SECS",
                execution_defaults.stale_in_flight_after.as_secs(),
            )),
            ..execution_defaults
        };

        let probe_interval = match env_parse("BP_PROBE_INTERVAL_SECS", 0u64) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            listen_addr,
            db_path,
            cors_allow_origins,
            request_timeout,
            health,
            execution,
            probe_interval,
        }
    }
}
