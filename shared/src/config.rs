use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr, time::Duration};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: required("DATABASE_HOST")?,
            port: required("DATABASE_PORT")?.parse::<u16>()?,
            username: required("DATABASE_USERNAME")?,
            password: required("DATABASE_PASSWORD")?,
            database: required("DATABASE_NAME")?,
        };
        let redis = RedisConfig {
            host: required("REDIS_HOST")?,
            port: required("REDIS_PORT")?.parse::<u16>()?,
        };
        let auth = AuthConfig {
            ttl: required("AUTH_TOKEN_TTL")?.parse::<u64>()?,
        };
        let server = ServerConfig {
            port: optional("SERVER_PORT", 8080)?,
        };
        Ok(Self {
            database,
            redis,
            auth,
            server,
        })
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

pub struct AuthConfig {
    // アクセストークンの有効期間（秒）
    pub ttl: u64,
}

pub struct ServerConfig {
    pub port: u16,
}

/// Settings of the camera loop that sits next to the gate.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Camera endpoint returning one JPEG per GET.
    pub snapshot_url: Option<String>,
    /// Directory of recorded JPEG frames, replayed instead of the camera.
    pub replay_dir: Option<String>,
    pub sample_interval: Duration,
    pub detector_url: String,
    pub detector_timeout: Duration,
    pub access_api_url: String,
    pub access_api_timeout: Duration,
    /// Program run to open the gate. `None` keeps the loop in dry-run mode.
    pub gate_command: Option<String>,
    pub gate_timeout: Duration,
    pub min_plate_confidence: f32,
    pub entry_cooldown: Duration,
    /// Raw `label=category` pairs, e.g. `car=1,auto=1`.
    pub category_labels: String,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl PipelineConfig {
    pub fn new() -> Result<Self> {
        Ok(Self {
            snapshot_url: non_empty("SNAPSHOT_URL"),
            replay_dir: non_empty("REPLAY_DIR"),
            sample_interval: Duration::from_millis(optional("SAMPLE_INTERVAL_MS", 1000)?),
            detector_url: required("DETECTOR_URL")?,
            detector_timeout: Duration::from_millis(optional("DETECTOR_TIMEOUT_MS", 15_000)?),
            access_api_url: required("ACCESS_API_URL")?,
            access_api_timeout: Duration::from_millis(optional("ACCESS_API_TIMEOUT_MS", 5_000)?),
            gate_command: non_empty("GATE_COMMAND"),
            gate_timeout: Duration::from_millis(optional("GATE_TIMEOUT_MS", 5_000)?),
            min_plate_confidence: optional("MIN_PLATE_CONFIDENCE", 0.0)?,
            entry_cooldown: Duration::from_secs(optional("ENTRY_COOLDOWN_SECS", 30)?),
            category_labels: env::var("CATEGORY_LABELS").unwrap_or_else(|_| "car=1,auto=1".into()),
            backoff_initial: Duration::from_millis(optional("BACKOFF_INITIAL_MS", 500)?),
            backoff_max: Duration::from_millis(optional("BACKOFF_MAX_MS", 30_000)?),
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("environment variable {key} is not set"))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
    }
}
