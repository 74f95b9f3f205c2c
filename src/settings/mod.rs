//! Environment-driven service settings.
//!
//! | Variable                        | Default         |
//! |---------------------------------|-----------------|
//! | `ADMIN_PASSWORD`                | (none)          |
//! | `JWT_SECRET`                    | `ADMIN_PASSWORD`|
//! | `FOLIO_AUTH_MODE`               | `bearer`        |
//! | `FOLIO_BIND_ADDR`               | `0.0.0.0:8788`  |
//! | `FOLIO_DATA_DIR`                | in-memory store |
//! | `FOLIO_FALLBACK`                | `builtin`       |
//! | `FOLIO_REQUIRE_VERSION`         | `false`         |
//! | `FOLIO_TOKEN_TTL_SECS`          | `86400`         |
//! | `FOLIO_RECONCILE_INTERVAL_SECS` | disabled        |
//! | `FOLIO_RECONCILE_GRACE_SECS`    | `3600`          |
//! | `FOLIO_MAX_UPLOAD_BYTES`        | 50 MiB          |
//!
//! There is no built-in secret: without `JWT_SECRET` or `ADMIN_PASSWORD`
//! the settings refuse to build.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::{AuthGate, TokenSigner};
use crate::store::{Fallback, VersionPolicy};

pub const DEFAULT_PORT: u16 = 8788;
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_RECONCILE_GRACE: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const MIN_SECRET_LEN: usize = 8;

/// Error type for settings resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// No secret configured for the selected auth mode.
    MissingSecret(&'static str),
    /// The secret is too short to sign or compare with.
    WeakSecret { name: &'static str, min_len: usize },
    /// A variable is set but cannot be parsed.
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::MissingSecret(hint) => write!(f, "missing secret: set {}", hint),
            SettingsError::WeakSecret { name, min_len } => {
                write!(f, "{} must be at least {} bytes", name, min_len)
            }
            SettingsError::Invalid { name, value } => {
                write!(f, "invalid value for {}: {:?}", name, value)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Resolved credentials for the auth gate.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthSettings {
    Bearer {
        signing_secret: String,
        admin_password: Option<String>,
    },
    SharedSecret {
        secret: String,
    },
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthSettings::Bearer { admin_password, .. } => f
                .debug_struct("Bearer")
                .field("signing_secret", &"<redacted>")
                .field("login_enabled", &admin_password.is_some())
                .finish(),
            AuthSettings::SharedSecret { .. } => f
                .debug_struct("SharedSecret")
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Service settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Filesystem store root; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub auth: AuthSettings,
    pub version_policy: VersionPolicy,
    pub fallback: Fallback,
    pub token_ttl: Duration,
    /// Background reconciliation period; `None` disables it.
    pub reconcile_interval: Option<Duration>,
    pub reconcile_grace: Duration,
    pub max_upload_bytes: usize,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let admin_password = var("ADMIN_PASSWORD");
        let auth = match var("FOLIO_AUTH_MODE").as_deref().map(str::trim) {
            None | Some("bearer") => {
                let signing_secret = var("JWT_SECRET")
                    .or_else(|| admin_password.clone())
                    .ok_or(SettingsError::MissingSecret("JWT_SECRET or ADMIN_PASSWORD"))?;
                if signing_secret.len() < MIN_SECRET_LEN {
                    return Err(SettingsError::WeakSecret {
                        name: "JWT_SECRET",
                        min_len: MIN_SECRET_LEN,
                    });
                }
                AuthSettings::Bearer {
                    signing_secret,
                    admin_password,
                }
            }
            Some("shared-secret") => {
                let secret =
                    admin_password.ok_or(SettingsError::MissingSecret("ADMIN_PASSWORD"))?;
                if secret.len() < MIN_SECRET_LEN {
                    return Err(SettingsError::WeakSecret {
                        name: "ADMIN_PASSWORD",
                        min_len: MIN_SECRET_LEN,
                    });
                }
                AuthSettings::SharedSecret { secret }
            }
            Some(other) => {
                return Err(SettingsError::Invalid {
                    name: "FOLIO_AUTH_MODE",
                    value: other.to_string(),
                })
            }
        };

        let bind_addr = parse_or(
            "FOLIO_BIND_ADDR",
            var("FOLIO_BIND_ADDR"),
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        )?;

        let fallback = match var("FOLIO_FALLBACK").as_deref().map(str::trim) {
            None | Some("builtin") => Fallback::Builtin,
            Some("empty") => Fallback::Empty,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    name: "FOLIO_FALLBACK",
                    value: other.to_string(),
                })
            }
        };

        let require_version = parse_flag("FOLIO_REQUIRE_VERSION", var("FOLIO_REQUIRE_VERSION"))?;
        let version_policy = if require_version {
            VersionPolicy::Required
        } else {
            VersionPolicy::Optional
        };

        let token_ttl = secs_or(
            "FOLIO_TOKEN_TTL_SECS",
            var("FOLIO_TOKEN_TTL_SECS"),
            DEFAULT_TOKEN_TTL,
        )?;
        let reconcile_interval = var("FOLIO_RECONCILE_INTERVAL_SECS")
            .map(|raw| parse_value::<u64>("FOLIO_RECONCILE_INTERVAL_SECS", &raw))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let reconcile_grace = secs_or(
            "FOLIO_RECONCILE_GRACE_SECS",
            var("FOLIO_RECONCILE_GRACE_SECS"),
            DEFAULT_RECONCILE_GRACE,
        )?;
        let max_upload_bytes = parse_or(
            "FOLIO_MAX_UPLOAD_BYTES",
            var("FOLIO_MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        Ok(Self {
            bind_addr,
            data_dir: var("FOLIO_DATA_DIR").map(PathBuf::from),
            auth,
            version_policy,
            fallback,
            token_ttl,
            reconcile_interval,
            reconcile_grace,
            max_upload_bytes,
        })
    }

    /// Build the auth gate these settings describe.
    pub fn auth_gate(&self) -> AuthGate {
        match &self.auth {
            AuthSettings::Bearer {
                signing_secret,
                admin_password,
            } => AuthGate::bearer(
                TokenSigner::new(signing_secret, self.token_ttl),
                admin_password.clone(),
            ),
            AuthSettings::SharedSecret { secret } => AuthGate::shared_secret(secret.clone()),
        }
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, SettingsError> {
    raw.trim().parse().map_err(|_| SettingsError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, SettingsError> {
    match raw {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn secs_or(
    name: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, SettingsError> {
    match raw {
        Some(raw) => parse_value::<u64>(name, &raw).map(Duration::from_secs),
        None => Ok(default),
    }
}

fn parse_flag(name: &'static str, raw: Option<String>) -> Result<bool, SettingsError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(SettingsError::Invalid {
                name,
                value: v.clone(),
            }),
        },
    }
}
