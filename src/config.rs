use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Acuassist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the AI provider credential.
pub const API_KEY_VAR: &str = "MY_OPENAI_KEY";
/// Environment variable for the HTTP listen port.
pub const PORT_VAR: &str = "PORT";

pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_ARCHIVE_FILE: &str = "hasta_gecmisi.json";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "acuassist_lib=info,acuassist=info,tower_http=warn"
}

/// Default directory for generated PDF reports.
pub fn default_reports_dir() -> PathBuf {
    std::env::temp_dir().join("akupunktur_raporlari")
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` is allowed at startup; generation reports it per request.
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub bind_ip: IpAddr,
    pub port: u16,
    pub archive_file: PathBuf,
    pub reports_dir: PathBuf,
    pub images_dir: PathBuf,
    pub font_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            archive_file: PathBuf::from(DEFAULT_ARCHIVE_FILE),
            reports_dir: default_reports_dir(),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        config.api_key = get(API_KEY_VAR);

        if let Some(raw) = get(PORT_VAR) {
            config.port = parse_var(PORT_VAR, &raw)?;
        }
        if let Some(raw) = get("ACUASSIST_BIND") {
            config.bind_ip = parse_var("ACUASSIST_BIND", &raw)?;
        }
        if let Some(raw) = get("ACUASSIST_TIMEOUT_SECS") {
            let secs: u64 = parse_var("ACUASSIST_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "ACUASSIST_TIMEOUT_SECS",
                    value: raw,
                    reason: "must be greater than zero".into(),
                });
            }
            config.request_timeout_secs = secs;
        }
        if let Some(base) = get("ACUASSIST_API_BASE") {
            config.api_base_url = base;
        }
        if let Some(model) = get("ACUASSIST_MODEL") {
            config.model = model;
        }
        if let Some(path) = get("ACUASSIST_ARCHIVE_FILE") {
            config.archive_file = PathBuf::from(path);
        }
        if let Some(path) = get("ACUASSIST_REPORTS_DIR") {
            config.reports_dir = PathBuf::from(path);
        }
        if let Some(path) = get("ACUASSIST_IMAGES_DIR") {
            config.images_dir = PathBuf::from(path);
        }
        if let Some(path) = get("ACUASSIST_FONT") {
            config.font_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
