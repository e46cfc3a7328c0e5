/*
 * Responsibility
 * - Load settings from the environment (.env supported): listen address,
 *   token issuer/audience, signing keys, transport limits
 * - Validate them (missing or invalid values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where token signing keys come from.
#[derive(Clone)]
pub enum KeySource {
    Ed25519Pem(String),
    Jwks(String),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are public, but keep logs short.
        match self {
            KeySource::Ed25519Pem(_) => f.write_str("Ed25519Pem(..)"),
            KeySource::Jwks(_) => f.write_str("Jwks(..)"),
        }
    }
}

/// Transport limits applied outside the request pipeline.
#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_issuer: String,
    pub auth_audiences: Vec<String>,
    pub auth_algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,
    pub signing_keys: KeySource,

    pub http: HttpLimits,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the process environment in production).
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match var("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let auth_issuer = var("AUTH_ISSUER").ok_or(ConfigError::Missing("AUTH_ISSUER"))?;
        let issuer_url =
            url::Url::parse(&auth_issuer).map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))?;
        // Production tokens must come from an https issuer.
        if app_env.is_production() && issuer_url.scheme() != "https" {
            return Err(ConfigError::Invalid("AUTH_ISSUER"));
        }

        let auth_audiences = list(var("AUTH_AUDIENCE"));
        if auth_audiences.is_empty() {
            return Err(ConfigError::Missing("AUTH_AUDIENCE"));
        }

        let access_token_leeway_seconds = var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        // PEM wins when both are set.
        let signing_keys = match (var("ACCESS_JWT_PUBLIC_KEY_PEM"), var("AUTH_JWKS")) {
            (Some(pem), _) => KeySource::Ed25519Pem(pem.replace("\\n", "\n")),
            (None, Some(jwks)) => KeySource::Jwks(jwks),
            (None, None) => return Err(ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM")),
        };

        let auth_algorithms = match var("AUTH_ALGORITHMS") {
            Some(raw) => list(Some(raw))
                .iter()
                .map(|s| Algorithm::from_str(s))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?,
            None => match &signing_keys {
                KeySource::Ed25519Pem(_) => vec![Algorithm::EdDSA],
                KeySource::Jwks(_) => vec![Algorithm::RS256],
            },
        };
        if auth_algorithms.is_empty() {
            return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
        }

        let defaults = HttpLimits::default();
        let request_timeout = var("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let body_limit_bytes = var("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.body_limit_bytes);

        Ok(Self {
            addr,
            app_env,
            auth_issuer,
            auth_audiences,
            auth_algorithms,
            access_token_leeway_seconds,
            signing_keys,
            http: HttpLimits {
                request_timeout,
                body_limit_bytes,
            },
        })
    }
}

fn list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("AUTH_ISSUER", "https://tenant.b2clogin.com/tenant-id/v2.0/"),
        ("AUTH_AUDIENCE", "patient-api, patient-web"),
        ("ACCESS_JWT_PUBLIC_KEY_PEM", "-----BEGIN PUBLIC KEY-----\\nAAAA\\n-----END PUBLIC KEY-----"),
    ];

    #[test]
    fn defaults_are_applied() {
        let config = load(&BASE).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.auth_audiences, vec!["patient-api", "patient-web"]);
        assert_eq!(config.auth_algorithms, vec![Algorithm::EdDSA]);
        assert_eq!(config.access_token_leeway_seconds, 60);
        assert_eq!(config.http.request_timeout, Duration::from_secs(30));
        match config.signing_keys {
            KeySource::Ed25519Pem(pem) => assert!(pem.contains("\nAAAA\n")),
            KeySource::Jwks(_) => panic!("expected pem"),
        }
    }

    #[test]
    fn jwks_defaults_to_rs256() {
        let config = load(&[
            ("AUTH_ISSUER", "https://issuer.example/"),
            ("AUTH_AUDIENCE", "patient-api"),
            ("AUTH_JWKS", r#"{"keys":[]}"#),
            ("APP_ENV", "Production"),
        ])
        .unwrap();

        assert!(config.app_env.is_production());
        assert_eq!(config.auth_algorithms, vec![Algorithm::RS256]);
        assert!(matches!(config.signing_keys, KeySource::Jwks(_)));
    }

    #[test]
    fn missing_or_invalid_values_fail() {
        assert!(matches!(
            load(&BASE[1..]),
            Err(ConfigError::Missing("AUTH_ISSUER"))
        ));
        assert!(matches!(
            load(&[BASE[0], BASE[2]]),
            Err(ConfigError::Missing("AUTH_AUDIENCE"))
        ));
        assert!(matches!(
            load(&BASE[..2]),
            Err(ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM"))
        ));

        let mut pairs = BASE.to_vec();
        pairs.push(("AUTH_ALGORITHMS", "EdDSA,XS999"));
        assert!(matches!(
            load(&pairs),
            Err(ConfigError::Invalid("AUTH_ALGORITHMS"))
        ));

        let mut pairs = BASE.to_vec();
        pairs[0] = ("AUTH_ISSUER", "not a url");
        assert!(matches!(load(&pairs), Err(ConfigError::Invalid("AUTH_ISSUER"))));

        let mut pairs = BASE.to_vec();
        pairs[0] = ("AUTH_ISSUER", "http://localhost:8080/");
        assert!(load(&pairs).is_ok());
        pairs.push(("APP_ENV", "prod"));
        assert!(matches!(load(&pairs), Err(ConfigError::Invalid("AUTH_ISSUER"))));

        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "http"));
        assert!(matches!(load(&pairs), Err(ConfigError::Invalid("PORT"))));
    }
}
