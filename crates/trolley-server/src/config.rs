use std::env;

use trolley_auth::AuthConfig;
use trolley_db::DbConfig;

/// Server configuration, read from `TROLLEY_*` environment variables
/// with local-development defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = AuthConfig::default();
        let db_defaults = DbConfig::default();

        Self {
            host: var_or("TROLLEY_HOST", "127.0.0.1"),
            port: parse_or("TROLLEY_PORT", 8080),
            db: DbConfig {
                url: var_or("TROLLEY_DB_URL", &db_defaults.url),
                namespace: var_or("TROLLEY_DB_NS", &db_defaults.namespace),
                database: var_or("TROLLEY_DB_NAME", &db_defaults.database),
                username: var_or("TROLLEY_DB_USER", &db_defaults.username),
                password: var_or("TROLLEY_DB_PASS", &db_defaults.password),
            },
            auth: AuthConfig {
                access_token_lifetime_secs: parse_or(
                    "TROLLEY_ACCESS_TOKEN_LIFETIME_SECS",
                    defaults.access_token_lifetime_secs,
                ),
                refresh_token_lifetime_secs: parse_or(
                    "TROLLEY_REFRESH_TOKEN_LIFETIME_SECS",
                    defaults.refresh_token_lifetime_secs,
                ),
                pepper: env::var("TROLLEY_PEPPER").ok().filter(|p| !p.is_empty()),
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
