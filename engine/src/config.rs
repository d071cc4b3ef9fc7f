//! `~/.inksolve/config.toml` loading.
//!
//! ```toml
//! [app]
//! ascii_only = false
//! high_contrast = false
//! reduced_motion = false
//!
//! [google]
//! api_key = "${GEMINI_API_KEY}"
//! model = "gemini-1.5-flash"
//! base_url = "https://generativelanguage.googleapis.com/v1beta"
//! request_timeout_secs = 60
//!
//! [canvas]
//! stroke_width = 3.0
//! ```
//!
//! Every section is optional and a missing file means defaults. String
//! values in `[google]` support `${VAR}` expansion.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs, io};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use inksolve_core::StrokeStyle;
use inksolve_providers::{DEFAULT_REQUEST_TIMEOUT, GEMINI_API_BASE_URL, GeminiSettings};
use inksolve_types::{ApiKey, ModelName, UiOptions};

/// Environment variable consulted when the config has no key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const STROKE_WIDTH_RANGE: (f64, f64) = (0.5, 32.0);

#[derive(Debug, Default, Deserialize)]
pub struct InkConfig {
    pub app: Option<AppConfig>,
    pub google: Option<GoogleConfig>,
    pub canvas: Option<CanvasConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid {field} in config: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Disable spinner animation.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Default, Deserialize)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

// Manual Debug impl to prevent leaking the API key in logs.
impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field(
                "api_key",
                &if self.api_key.is_some() { "[REDACTED]" } else { "None" },
            )
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CanvasConfig {
    pub stroke_width: Option<f64>,
}

/// Replace `${VAR}` with the variable's value; unset variables become empty.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".inksolve").join("config.toml"))
}

impl InkConfig {
    /// Load from [`config_path`]. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app
            .as_ref()
            .map(|app| UiOptions {
                ascii_only: app.ascii_only,
                high_contrast: app.high_contrast,
                reduced_motion: app.reduced_motion,
            })
            .unwrap_or_default()
    }

    /// Key from `[google] api_key` after `${VAR}` expansion, if non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<ApiKey> {
        self.google
            .as_ref()
            .and_then(|google| google.api_key.as_deref())
            .and_then(|raw| ApiKey::new(expand_env_vars(raw)))
    }

    pub fn gemini_settings(&self) -> Result<GeminiSettings, ConfigError> {
        let google = self.google.as_ref();

        let model = match google.and_then(|g| g.model.as_deref()) {
            Some(raw) => ModelName::parse(&expand_env_vars(raw)).map_err(|e| {
                ConfigError::Invalid {
                    field: "google.model",
                    message: e.to_string(),
                }
            })?,
            None => ModelName::default(),
        };

        let raw_base = google
            .and_then(|g| g.base_url.as_deref())
            .map_or_else(|| GEMINI_API_BASE_URL.to_string(), expand_env_vars);
        let base_url = Url::parse(raw_base.trim()).map_err(|e| ConfigError::Invalid {
            field: "google.base_url",
            message: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                field: "google.base_url",
                message: format!("{raw_base} is not an http(s) URL"),
            });
        }

        let timeout = match google.and_then(|g| g.request_timeout_secs) {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    field: "google.request_timeout_secs",
                    message: "must be at least 1".to_string(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(GeminiSettings {
            base_url,
            model,
            timeout,
        })
    }

    /// Pen for both canvases. Widths are clamped to a sane range.
    #[must_use]
    pub fn stroke_style(&self) -> StrokeStyle {
        let mut style = StrokeStyle::default();
        if let Some(width) = self
            .canvas
            .as_ref()
            .and_then(|canvas| canvas.stroke_width)
            .filter(|width| width.is_finite())
        {
            style.width = width.clamp(STROKE_WIDTH_RANGE.0, STROKE_WIDTH_RANGE.1);
        }
        style
    }
}

/// Config key first, then `GEMINI_API_KEY`.
#[must_use]
pub fn resolve_api_key(config: Option<&InkConfig>) -> Option<ApiKey> {
    config
        .and_then(InkConfig::api_key)
        .or_else(|| env::var(API_KEY_ENV).ok().and_then(ApiKey::new))
}
