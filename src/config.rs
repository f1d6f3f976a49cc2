use std::{
    env,
    fmt::{self, Display},
    net::SocketAddr,
    path::PathBuf,
    str::FromStr,
};

/// Runtime limits enforced by validation and by the write path.
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    pub min_ingredient_amount: i32,
    pub min_cooking_time: i32,
    pub page_size: i64,
    pub recipes_limit: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_ingredient_amount: 1,
            min_cooking_time: 1,
            page_size: 6,
            recipes_limit: 3,
        }
    }
}

/// Everything the service reads from its environment. Built once at startup
/// and handed to the routes.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_connections: u32,
    pub limits: Limits,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, info: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Environment variable {key} is not set"),
            ConfigError::Invalid { key, info } => write!(f, "Invalid {key} value: {info}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads `.env` (when present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            log::debug!("No .env file found");
        }

        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let limits = Limits::default();

        let config = Self {
            database_url: require(&source, "DATABASE_URL")?,
            bind_address: try_load(&source, "BIND_ADDRESS", "0.0.0.0:8000")?,
            jwt_secret: require(&source, "JWT_SECRET")?,
            session_hours: try_load(&source, "SESSION_HOURS", "24")?,
            media_root: try_load(&source, "MEDIA_ROOT", "media")?,
            media_url: source("MEDIA_URL").unwrap_or_else(|| String::from("/media/")),
            max_connections: try_load(&source, "DATABASE_MAX_CONNECTIONS", "10")?,
            limits: Limits {
                min_ingredient_amount: try_load(
                    &source,
                    "MIN_INGREDIENT_AMOUNT",
                    &limits.min_ingredient_amount.to_string(),
                )?,
                min_cooking_time: try_load(
                    &source,
                    "MIN_COOKING_TIME",
                    &limits.min_cooking_time.to_string(),
                )?,
                page_size: try_load(&source, "PAGE_SIZE", &limits.page_size.to_string())?,
                recipes_limit: try_load(
                    &source,
                    "RECIPES_LIMIT",
                    &limits.recipes_limit.to_string(),
                )?,
            },
        };

        if config.limits.page_size <= 0 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                info: String::from("must be positive"),
            });
        }
        if config.limits.min_ingredient_amount < 1 || config.limits.min_cooking_time < 1 {
            return Err(ConfigError::Invalid {
                key: "MIN_INGREDIENT_AMOUNT/MIN_COOKING_TIME",
                info: String::from("must be at least 1"),
            });
        }

        Ok(config)
    }
}

fn require<F>(source: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    source(key).ok_or(ConfigError::Missing(key))
}

fn try_load<F, T>(source: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    source(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            info: e.to_string(),
        })
}
