use std::path::PathBuf;

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, Utc};
use thiserror::Error;

use crate::models::{BpStatus, PulseStatus};
use crate::sheet::SheetLayout;
use crate::vitals::AlertPolicy;

/// Application-level constants
pub const APP_NAME: &str = "pulsewatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// HS256 keys shorter than this are rejected at startup.
pub const MIN_SECRET_LEN: usize = 32;
const DEFAULT_SHEET_OFFSET_SECS: i32 = 8 * 3600;

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,pulsewatch=debug,tower_http=info"
}

/// Default data directory: ~/.pulsewatch/
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(format!(".{APP_NAME}")))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Cannot determine home directory; set DATABASE_URL")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Relay endpoint. `None` disables alert emails.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub url: Option<String>,
    pub layout: SheetLayout,
    /// Offset the sheet's day-first dates are written in.
    pub utc_offset: FixedOffset,
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub domain: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub database_url: PathBuf,
    pub port: u16,
    pub mail: MailConfig,
    pub sheet: SheetConfig,
    pub http_timeout_secs: u64,
    pub alert_policy: AlertPolicy,
    /// Offset for calendar windows. `None` follows the server's local zone.
    pub window_offset: Option<FixedOffset>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("access_token_secret", &"[redacted]")
            .field("refresh_token_secret", &"[redacted]")
            .field("database_url", &self.database_url)
            .field("port", &self.port)
            .field("mail", &self.mail)
            .field("sheet", &self.sheet)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("alert_policy", &self.alert_policy)
            .field("window_offset", &self.window_offset)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let domain = get("APP_DOMAIN_NAME").ok_or(ConfigError::Missing("APP_DOMAIN_NAME"))?;
        let access_token_secret = secret(get("ACCESS_TOKEN_SECRET"), "ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = secret(get("REFRESH_TOKEN_SECRET"), "REFRESH_TOKEN_SECRET")?;

        let database_url = match get("DATABASE_URL") {
            Some(url) => PathBuf::from(url.strip_prefix("file:").unwrap_or(&url)),
            None => app_data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(format!("{APP_NAME}.db")),
        };

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let http_timeout_secs =
            parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }

        let mail = MailConfig {
            api_url: get("MAIL_API_URL"),
            api_key: get("MAIL_API_KEY"),
            from: get("MAIL_FROM").unwrap_or_else(|| format!("alerts@{domain}")),
        };

        let layout = match get("SHEET_LAYOUT") {
            Some(v) => SheetLayout::from_str(&v).ok_or_else(|| ConfigError::Invalid {
                name: "SHEET_LAYOUT",
                reason: format!("unknown layout {v:?}"),
            })?,
            None => SheetLayout::default(),
        };
        let utc_offset = match get("SHEET_UTC_OFFSET") {
            Some(v) => v.parse::<FixedOffset>().map_err(|e| ConfigError::Invalid {
                name: "SHEET_UTC_OFFSET",
                reason: e.to_string(),
            })?,
            None => FixedOffset::east_opt(DEFAULT_SHEET_OFFSET_SECS).ok_or(ConfigError::Invalid {
                name: "SHEET_UTC_OFFSET",
                reason: "default offset out of range".into(),
            })?,
        };
        let sheet = SheetConfig {
            url: get("SHEET_URL"),
            layout,
            utc_offset,
        };

        let alert_policy = alert_policy(get("ALERT_BP_STATUSES"), get("ALERT_PULSE_STATUSES"))?;

        let window_offset = get("APP_UTC_OFFSET")
            .map(|v| {
                v.parse::<FixedOffset>().map_err(|e| ConfigError::Invalid {
                    name: "APP_UTC_OFFSET",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            domain,
            access_token_secret,
            refresh_token_secret,
            database_url,
            port,
            mail,
            sheet,
            http_timeout_secs,
            alert_policy,
            window_offset,
        })
    }

    /// Current time in the zone daily, weekly and monthly windows truncate in.
    pub fn window_now(&self) -> DateTime<FixedOffset> {
        match self.window_offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }
}

fn secret(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(name))?;
    if value.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
        });
    }
    Ok(value)
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Comma-separated status labels override the default abnormal sets.
fn alert_policy(
    bp: Option<String>,
    pulse: Option<String>,
) -> Result<AlertPolicy, ConfigError> {
    let default = AlertPolicy::default();
    if bp.is_none() && pulse.is_none() {
        return Ok(default);
    }

    let bp_statuses = match bp {
        Some(list) => split_labels(&list, "ALERT_BP_STATUSES", BpStatus::from_str)?,
        None => default.bp_statuses().copied().collect(),
    };
    let pulse_statuses = match pulse {
        Some(list) => split_labels(&list, "ALERT_PULSE_STATUSES", PulseStatus::from_str)?,
        None => default.pulse_statuses().copied().collect(),
    };
    Ok(AlertPolicy::new(bp_statuses, pulse_statuses))
}

fn split_labels<T>(
    list: &str,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|label| {
            parse(label).ok_or_else(|| ConfigError::Invalid {
                name,
                reason: format!("unknown status {label:?}"),
            })
        })
        .collect()
}
