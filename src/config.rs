use std::str::FromStr;

use anyhow::{bail, Context};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("unknown APP_ENV `{}`", other),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server settings, read once at startup from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub pool_size: u32,
    /// Allowed CORS origin, `*` for any
    pub frontend_url: String,
    pub environment: Environment,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Rate limit by the forwarded client address instead of the peer
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: DEFAULT_PORT,
            database_url: None,
            pool_size: 10,
            frontend_url: String::from("*"),
            environment: Environment::Development,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            trust_proxy: false,
        }
    }
}

fn parsed_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: `{}`", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT", defaults.port)?,
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            pool_size: parsed_var("DATABASE_POOL_SIZE", defaults.pool_size)?,
            frontend_url: std::env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            environment: parsed_var("APP_ENV", defaults.environment)?,
            rate_limit_max: parsed_var("RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window_secs: parsed_var(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            trust_proxy: parsed_var("TRUST_PROXY", defaults.trust_proxy)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
