use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_SITE_BASE_URL: &str = "https://aitoonic.com";
const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes

/// Process configuration, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub site_base_url: String,
    pub cache_ttl: Duration,
    pub similar_tools_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_string()))?;
        Url::parse(&database_url)
            .map_err(|e| Error::Config(format!("Invalid database URL: {e}")))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;

        let site_base_url = lookup("SITE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&site_base_url)
            .map_err(|e| Error::Config(format!("Invalid SITE_BASE_URL: {e}")))?;

        let cache_ttl = Duration::from_secs(parse_or(
            &lookup,
            "CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);
        let similar_tools_ttl = Duration::from_secs(parse_or(
            &lookup,
            "SIMILAR_TOOLS_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            database_url,
            host,
            port,
            site_base_url,
            cache_ttl,
            similar_tools_ttl,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://u:p@localhost/db")]))
                .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.site_base_url, "https://aitoonic.com");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.similar_tools_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@db:5432/tools"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("SITE_BASE_URL", "https://example.com/"),
            ("CACHE_TTL_SECS", "60"),
            ("SIMILAR_TOOLS_TTL_SECS", "900"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.site_base_url, "https://example.com");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.similar_tools_ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_missing_database_url() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@localhost/db"),
            ("PORT", "eighty"),
        ]));
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("PORT")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_database_url() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "not_a_url")]));
        assert!(result.is_err());
    }
}
