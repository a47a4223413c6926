//! Configuration management for the PDF toolkit server

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub jobs: JobConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upload size limit in MiB
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub users: Vec<ApiUser>,
}

/// One `user:password` pair from `API_USERS`
#[derive(Clone, PartialEq, Eq)]
pub struct ApiUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ApiUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiUser")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct JobConfig {
    /// PDF jobs allowed to run at once
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl JobConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Default resolution of rendered and redacted pages
    pub render_dpi: u32,
    /// Resolution of the raster used by the layout heuristics
    pub analysis_dpi: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_upload_mb: 100,
            },
            auth: AuthConfig::default(),
            jobs: JobConfig {
                max_concurrent: 4,
                timeout_secs: 60,
            },
            render: RenderConfig {
                render_dpi: 150,
                analysis_dpi: 144,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or malformed values keep their
    /// defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST")
                    .filter(|h| !h.trim().is_empty())
                    .unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port),
                max_upload_mb: parse_or(&lookup, "MAX_UPLOAD_MB", defaults.server.max_upload_mb),
            },
            auth: AuthConfig {
                users: lookup("API_USERS")
                    .map(|raw| parse_users(&raw))
                    .unwrap_or_default(),
            },
            jobs: JobConfig {
                max_concurrent: parse_or(&lookup, "MAX_CONCURRENT_JOBS", defaults.jobs.max_concurrent)
                    .max(1),
                timeout_secs: parse_or(&lookup, "JOB_TIMEOUT_SECS", defaults.jobs.timeout_secs).max(1),
            },
            render: RenderConfig {
                render_dpi: parse_or(&lookup, "RENDER_DPI", defaults.render.render_dpi),
                analysis_dpi: parse_or(&lookup, "ANALYSIS_DPI", defaults.render.analysis_dpi),
            },
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Parse `key` straight into its target type; out-of-range values fail
/// the parse and keep the default
fn parse_or<T: FromStr + Copy + fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}='{}', using default {}", key, value, default);
            default
        }),
    }
}

/// Parse `user:password` pairs separated by commas
pub fn parse_users(raw: &str) -> Vec<ApiUser> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((user, password)) if !user.trim().is_empty() && !password.is_empty() => {
                Some(ApiUser {
                    username: user.trim().to_string(),
                    password: password.to_string(),
                })
            }
            _ => {
                tracing::warn!("Ignoring malformed API_USERS entry (expected user:password)");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.jobs.max_concurrent, 4);
        assert_eq!(config.render.analysis_dpi, 144);
        assert!(config.auth.users.is_empty());
        assert_eq!(config.max_upload_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_and_malformed_values() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("MAX_CONCURRENT_JOBS", "zwei"),
            ("JOB_TIMEOUT_SECS", "5"),
            ("RENDER_DPI", "300"),
        ]));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jobs.max_concurrent, 4);
        assert_eq!(config.jobs.timeout(), Duration::from_secs(5));
        assert_eq!(config.render.render_dpi, 300);
    }

    #[test]
    fn test_out_of_range_values_keep_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "70000"),
            ("RENDER_DPI", "-150"),
            ("ANALYSIS_DPI", "5000000000"),
            ("MAX_UPLOAD_MB", "-1"),
        ]));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.render.render_dpi, 150);
        assert_eq!(config.render.analysis_dpi, 144);
        assert_eq!(config.server.max_upload_mb, 100);
    }

    #[test]
    fn test_parse_users() {
        let users = parse_users("alice:s3cret, bob:pa:ss ,broken,:nouser");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[1].password, "pa:ss");
        assert!(!format!("{:?}", users[0]).contains("s3cret"));
    }
}
