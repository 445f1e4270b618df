use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEVELOPMENT_SECRET: &str = "development-secret";

/// Error raised when an environment variable is present but unusable.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

impl ConfigError {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid configuration for {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Bounds both pool acquisition and every statement run on a connection.
    pub timeout: Duration,
}

pub struct AuthConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

pub struct Config {
    pub app_env: String,
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub request_timeout: Duration,
    pub shutdown_timeout: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let app_env = var("APP_ENV", "development");
        let is_production = app_env == "production";

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                var("DATABASE_USER", "postgres"),
                var("DATABASE_PASSWORD", "postgres"),
                var("DATABASE_HOST", "localhost"),
                parse::<u16, _>(&lookup, "DATABASE_PORT", 5432)?,
                var("DATABASE_NAME", "todo"),
            ),
        };

        let secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            Some(_) => return Err(ConfigError::new("JWT_SECRET", "must not be empty")),
            None if is_production => {
                return Err(ConfigError::new("JWT_SECRET", "must be set in production"))
            }
            None => {
                log::warn!("JWT_SECRET not set, using the development secret");
                DEVELOPMENT_SECRET.to_string()
            }
        };

        let algorithm_name = var("JWT_ALGORITHM", "HS256");
        let algorithm = Algorithm::from_str(&algorithm_name)
            .ok()
            .filter(|alg| matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| {
                ConfigError::new("JWT_ALGORITHM", format!("unsupported algorithm {}", algorithm_name))
            })?;

        let token_ttl_secs = parse::<i64, _>(&lookup, "AUTH_TOKEN_TTL_SECS", 3600)?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::new("AUTH_TOKEN_TTL_SECS", "must be positive"));
        }

        let bcrypt_cost = parse::<u32, _>(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::new("BCRYPT_COST", "must be between 4 and 31"));
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_host: var("SERVER_HOST", "127.0.0.1"),
            server_port: parse(&lookup, "SERVER_PORT", 9999)?,
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                timeout: Duration::from_secs(parse(&lookup, "DATABASE_TIMEOUT_SECS", 5)?),
            },
            auth: AuthConfig {
                secret,
                algorithm,
                token_ttl: chrono::Duration::seconds(token_ttl_secs),
                bcrypt_cost,
            },
            request_timeout: Duration::from_secs(parse(&lookup, "REQUEST_TIMEOUT_SECS", 5)?),
            shutdown_timeout: parse(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?,
            cors_allowed_origins,
            app_env,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::new(key, format!("{:?} is not a valid number", raw))),
        None => Ok(default),
    }
}
