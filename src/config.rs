// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the database and local media | `./data` |
//! | `SIWE_DOMAIN` | Host the SIWE message must name (`host[:port]`) | `localhost:3000` |
//! | `SESSION_SECRET` | HMAC secret for session tokens | Required (random with `dev` feature) |
//! | `SESSION_TTL_SECS` | Session lifetime, at most 10 years | `2592000` (30 days) |
//! | `NONCE_TTL_SECS` | SIWE nonce lifetime | `600` |
//! | `MEDIA_BACKEND` | `local` or `supabase` | `local` |
//! | `SUPABASE_API_URL` | Supabase project URL | Required for `supabase` |
//! | `SUPABASE_SERVICE_KEY` | Supabase service role key | Required for `supabase` |
//! | `SUPABASE_BUCKET` | Storage bucket for videos | `videos` |
//! | `PUBLIC_BASE_URL` | Base URL for locally served media | `http://localhost:8080` |
//! | `MAX_UPLOAD_BYTES` | Request body limit for uploads | `104857600` |
//! | `EAS_NETWORK` | `optimism`, `optimismSepolia` or `scrollSepolia` | unset (no on-chain check) |
//! | `EAS_RPC_URL` | Override the network's default RPC endpoint | network default |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files to serve HTTPS | unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::{EasNetwork, NetworkConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// Holds `gm-report.redb` and, for the local media backend, `media/`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const SIWE_DOMAIN_ENV: &str = "SIWE_DOMAIN";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const NONCE_TTL_ENV: &str = "NONCE_TTL_SECS";
pub const MEDIA_BACKEND_ENV: &str = "MEDIA_BACKEND";
pub const SUPABASE_API_URL_ENV: &str = "SUPABASE_API_URL";
pub const SUPABASE_SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_KEY";
pub const SUPABASE_BUCKET_ENV: &str = "SUPABASE_BUCKET";
pub const PUBLIC_BASE_URL_ENV: &str = "PUBLIC_BASE_URL";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const EAS_NETWORK_ENV: &str = "EAS_NETWORK";
pub const EAS_RPC_URL_ENV: &str = "EAS_RPC_URL";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_SIWE_DOMAIN: &str = "localhost:3000";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Upper bound on `SESSION_TTL_SECS` (10 years).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_SUPABASE_BUCKET: &str = "videos";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where uploaded videos go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaBackendConfig {
    /// Files under `{DATA_DIR}/media`, served at `{PUBLIC_BASE_URL}/media/`.
    Local { public_base_url: String },
    /// Supabase storage bucket.
    Supabase {
        api_url: String,
        service_key: String,
        bucket: String,
    },
}

/// TLS certificate and key locations.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub siwe_domain: String,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub nonce_ttl: Duration,
    pub media: MediaBackendConfig,
    pub max_upload_bytes: usize,
    pub eas_network: Option<NetworkConfig>,
    pub tls: Option<TlsPaths>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, 8080u16)?;
        let data_dir = PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let siwe_domain = get(SIWE_DOMAIN_ENV).unwrap_or_else(|| DEFAULT_SIWE_DOMAIN.to_string());

        let session_secret = match get(SESSION_SECRET_ENV) {
            Some(secret) => secret,
            None => fallback_session_secret()?,
        };

        let session_ttl = parse_or(get(SESSION_TTL_ENV), SESSION_TTL_ENV, DEFAULT_SESSION_TTL.as_secs())
            .map(Duration::from_secs)?;
        if session_ttl.is_zero() || session_ttl > MAX_SESSION_TTL {
            return Err(ConfigError::Invalid {
                name: SESSION_TTL_ENV,
                reason: format!(
                    "must be between 1 and {} seconds",
                    MAX_SESSION_TTL.as_secs()
                ),
            });
        }
        let nonce_ttl = parse_or(get(NONCE_TTL_ENV), NONCE_TTL_ENV, DEFAULT_NONCE_TTL.as_secs())
            .map(Duration::from_secs)?;

        let media = match get(MEDIA_BACKEND_ENV).as_deref().unwrap_or("local") {
            "local" => MediaBackendConfig::Local {
                public_base_url: get(PUBLIC_BASE_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            "supabase" => MediaBackendConfig::Supabase {
                api_url: get(SUPABASE_API_URL_ENV)
                    .ok_or(ConfigError::Missing(SUPABASE_API_URL_ENV))?
                    .trim_end_matches('/')
                    .to_string(),
                service_key: get(SUPABASE_SERVICE_KEY_ENV)
                    .ok_or(ConfigError::Missing(SUPABASE_SERVICE_KEY_ENV))?,
                bucket: get(SUPABASE_BUCKET_ENV)
                    .unwrap_or_else(|| DEFAULT_SUPABASE_BUCKET.to_string()),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: MEDIA_BACKEND_ENV,
                    reason: format!("unknown backend `{other}` (expected `local` or `supabase`)"),
                })
            }
        };

        let max_upload_bytes = parse_or(get(MAX_UPLOAD_BYTES_ENV), MAX_UPLOAD_BYTES_ENV, DEFAULT_MAX_UPLOAD_BYTES)?;

        let eas_network = match get(EAS_NETWORK_ENV) {
            Some(raw) => {
                let network = EasNetwork::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                    name: EAS_NETWORK_ENV,
                    reason: format!("unknown network `{raw}`"),
                })?;
                let mut config = network.config();
                if let Some(rpc) = get(EAS_RPC_URL_ENV) {
                    config.rpc_url = rpc;
                }
                Some(config)
            }
            None => None,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            host,
            port,
            data_dir,
            siwe_domain,
            session_secret,
            session_ttl,
            nonce_ttl,
            media,
            max_upload_bytes,
            eas_network,
            tls,
        })
    }

    /// Path of the embedded database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("gm-report.redb")
    }

    /// Directory for locally stored media.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(feature = "dev")]
fn fallback_session_secret() -> Result<String, ConfigError> {
    use rand::distr::{Alphanumeric, SampleString};

    tracing::warn!("SESSION_SECRET not set, using an ephemeral secret (dev feature)");
    Ok(Alphanumeric.sample_string(&mut rand::rng(), 48))
}

#[cfg(not(feature = "dev"))]
fn fallback_session_secret() -> Result<String, ConfigError> {
    Err(ConfigError::Missing(SESSION_SECRET_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_secret_set() {
        let config = load(&[(SESSION_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.siwe_domain, DEFAULT_SIWE_DOMAIN);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.eas_network.is_none());
        assert!(config.tls.is_none());
        assert_eq!(
            config.media,
            MediaBackendConfig::Local {
                public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string()
            }
        );
        assert_eq!(config.database_path(), PathBuf::from("./data/gm-report.redb"));
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let err = load(&[(SESSION_SECRET_ENV, "s"), (MEDIA_BACKEND_ENV, "supabase")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SUPABASE_API_URL_ENV)));

        let config = load(&[
            (SESSION_SECRET_ENV, "s"),
            (MEDIA_BACKEND_ENV, "supabase"),
            (SUPABASE_API_URL_ENV, "https://proj.supabase.co/"),
            (SUPABASE_SERVICE_KEY_ENV, "key"),
        ])
        .unwrap();
        assert_eq!(
            config.media,
            MediaBackendConfig::Supabase {
                api_url: "https://proj.supabase.co".to_string(),
                service_key: "key".to_string(),
                bucket: "videos".to_string(),
            }
        );
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = load(&[(SESSION_SECRET_ENV, "s"), (PORT_ENV, "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));
    }

    #[test]
    fn session_ttl_must_be_in_range() {
        for raw in ["0", "9000000000000"] {
            let err = load(&[(SESSION_SECRET_ENV, "s"), (SESSION_TTL_ENV, raw)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: SESSION_TTL_ENV, .. }));
        }
        let config = load(&[(SESSION_SECRET_ENV, "s"), (SESSION_TTL_ENV, "3600")]).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn eas_network_with_rpc_override() {
        let config = load(&[
            (SESSION_SECRET_ENV, "s"),
            (EAS_NETWORK_ENV, "optimismSepolia"),
            (EAS_RPC_URL_ENV, "http://127.0.0.1:8545"),
        ])
        .unwrap();
        let network = config.eas_network.unwrap();
        assert_eq!(network.chain_id, 11155420);
        assert_eq!(network.rpc_url, "http://127.0.0.1:8545");

        let err = load(&[(SESSION_SECRET_ENV, "s"), (EAS_NETWORK_ENV, "fuji")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: EAS_NETWORK_ENV, .. }));
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        let err = load(&[(SESSION_SECRET_ENV, "s"), (TLS_CERT_PATH_ENV, "/c.pem")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(TLS_KEY_PATH_ENV)));
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn session_secret_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SESSION_SECRET_ENV)));
    }
}
