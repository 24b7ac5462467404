//! Process configuration loaded from the environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use amg_auth::{Algorithm, AuthConfig, KeyMaterial};
pub use amg_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_REVOCATION_PREFIX: &str = "amg:revoked:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("failed to read {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where signing keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Secret(String),
    PemFiles { private: PathBuf, public: PathBuf },
}

impl KeySource {
    pub fn load(&self) -> Result<KeyMaterial, ConfigError> {
        match self {
            KeySource::Secret(secret) => Ok(KeyMaterial::Secret(secret.clone().into_bytes())),
            KeySource::PemFiles { private, public } => Ok(KeyMaterial::Pem {
                private: read_key(private)?,
                public: read_key(public)?,
            }),
        }
    }
}

fn read_key(path: &PathBuf) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::ReadKey {
        path: path.clone(),
        source,
    })
}

/// Bootstrap administrator created at startup if absent.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub auth: AuthConfig,
    pub keys: KeySource,
    pub redis_url: Option<String>,
    pub revocation_prefix: String,
    pub admin: Option<AdminSeed>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// `true` when tokens would be signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        matches!(&self.keys, KeySource::Secret(s) if s == DEV_JWT_SECRET)
    }

    /// Development defaults around a given HMAC secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            port: 8080,
            auth: AuthConfig::default(),
            keys: KeySource::Secret(secret.into()),
            redis_url: None,
            revocation_prefix: DEFAULT_REVOCATION_PREFIX.to_string(),
            admin: None,
            log_format: LogFormat::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit variable map (what `from_env` feeds it).
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let port = parse_or(get("PORT"), "PORT", 8080u16)?;

        let algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => Algorithm::from_str(raw).map_err(|e| ConfigError::Invalid {
                name: "JWT_ALGORITHM",
                reason: e.to_string(),
            })?,
            None => Algorithm::HS256,
        };

        let keys = if matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            KeySource::Secret(get("JWT_SECRET").unwrap_or(DEV_JWT_SECRET).to_string())
        } else {
            KeySource::PemFiles {
                private: get("JWT_PRIVATE_KEY_PATH")
                    .ok_or(ConfigError::Missing("JWT_PRIVATE_KEY_PATH"))?
                    .into(),
                public: get("JWT_PUBLIC_KEY_PATH")
                    .ok_or(ConfigError::Missing("JWT_PUBLIC_KEY_PATH"))?
                    .into(),
            }
        };

        let token_lifetime = Duration::from_secs(parse_or(
            get("TOKEN_LIFETIME_SECS"),
            "TOKEN_LIFETIME_SECS",
            AuthConfig::DEFAULT_TOKEN_LIFETIME.as_secs(),
        )?);
        if token_lifetime.is_zero() {
            return Err(ConfigError::Invalid {
                name: "TOKEN_LIFETIME_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_session = Duration::from_secs(parse_or(
            get("MAX_SESSION_SECS"),
            "MAX_SESSION_SECS",
            token_lifetime.as_secs(),
        )?);
        if max_session < token_lifetime {
            return Err(ConfigError::Invalid {
                name: "MAX_SESSION_SECS",
                reason: "must be at least TOKEN_LIFETIME_SECS".to_string(),
            });
        }

        let store_timeout = Duration::from_millis(parse_or(
            get("REVOCATION_TIMEOUT_MS"),
            "REVOCATION_TIMEOUT_MS",
            AuthConfig::DEFAULT_STORE_TIMEOUT.as_millis() as u64,
        )?);
        if store_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "REVOCATION_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email: email.to_string(),
                password: password.to_string(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                name: "LOG_FORMAT",
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            port,
            auth: AuthConfig {
                algorithm,
                token_lifetime,
                max_session,
                store_timeout,
            },
            keys,
            redis_url: get("REDIS_URL").map(str::to_string),
            revocation_prefix: get("REVOCATION_KEY_PREFIX")
                .unwrap_or(DEFAULT_REVOCATION_PREFIX)
                .to_string(),
            admin,
            log_format,
        })
    }
}

fn parse_or<T>(raw: Option<&str>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_vars(HashMap::new()).unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.auth, AuthConfig::default());
        assert_eq!(cfg.keys, KeySource::Secret(DEV_JWT_SECRET.to_string()));
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.revocation_prefix, DEFAULT_REVOCATION_PREFIX);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn reads_every_knob() {
        let cfg = AppConfig::from_vars(vars(&[
            ("PORT", "9000"),
            ("JWT_SECRET", "s3cr3t"),
            ("JWT_ALGORITHM", "HS512"),
            ("TOKEN_LIFETIME_SECS", "900"),
            ("MAX_SESSION_SECS", "3600"),
            ("REVOCATION_TIMEOUT_MS", "150"),
            ("REDIS_URL", "redis://cache:6379"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "changeme-now"),
            ("LOG_FORMAT", "pretty"),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.auth.algorithm, Algorithm::HS512);
        assert_eq!(cfg.auth.token_lifetime, Duration::from_secs(900));
        assert_eq!(cfg.auth.max_session, Duration::from_secs(3600));
        assert_eq!(cfg.auth.store_timeout, Duration::from_millis(150));
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(cfg.admin.as_ref().map(|a| a.email.as_str()), Some("root@example.com"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn max_session_cannot_undercut_token_lifetime() {
        let err = AppConfig::from_vars(vars(&[
            ("TOKEN_LIFETIME_SECS", "7200"),
            ("MAX_SESSION_SECS", "3600"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_SESSION_SECS", .. }));
    }

    #[test]
    fn asymmetric_algorithms_need_key_paths() {
        let err = AppConfig::from_vars(vars(&[("JWT_ALGORITHM", "RS256")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_PRIVATE_KEY_PATH")));
    }

    #[test]
    fn rejects_garbage_values() {
        assert!(AppConfig::from_vars(vars(&[("PORT", "eighty")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("JWT_ALGORITHM", "none")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("TOKEN_LIFETIME_SECS", "0")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("LOG_FORMAT", "xml")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("ADMIN_EMAIL", "root@example.com")])).is_err());
    }

    #[test]
    fn admin_password_is_not_debug_printed() {
        let seed = AdminSeed {
            email: "root@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{seed:?}").contains("hunter2"));
    }
}
