//! Core domain types for inksolve.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod error;
mod sanitize;
pub mod solution;
pub mod stroke;
pub mod workflow;

pub use error::{EmptyInputKind, FlowError};
pub use sanitize::sanitize_terminal_text;
pub use solution::{
    ChartKind, ChartSeries, ChartSpec, DatasetPayload, GraphData, SolutionPayload, SolutionView,
    StepPayload, StepView, wrap_display_math,
};
pub use stroke::{Bounds, Drawing, Point, Stroke, StrokeInput, SurfaceSize, Touch};
pub use workflow::{StepMark, Workflow, WorkflowError, WorkflowStep};

use std::fmt;

// ============================================================================
// Credential
// ============================================================================

/// Gemini API key.
///
/// `Debug` and `Display` are redacted so the key cannot leak into logs or
/// error messages. Only [`ApiKey::expose_secret`] hands out the raw value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input; surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Masked form for display, keeping the last four characters.
    #[must_use]
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        let tail: String = self.0.chars().skip(count.saturating_sub(4)).collect();
        format!("{}{tail}", "•".repeat(count.saturating_sub(4).min(12)))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

// ============================================================================
// Model
// ============================================================================

/// Gemini model identifier, e.g. `gemini-1.5-flash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelParseError {
    #[error("model name cannot be empty")]
    Empty,
    #[error("model name {0:?} contains characters not allowed in a URL path segment")]
    InvalidCharacters(String),
}

impl ModelName {
    pub const DEFAULT: &'static str = "gemini-1.5-flash";

    /// Accepts `gemini-1.5-flash` or `models/gemini-1.5-flash`.
    pub fn parse(raw: &str) -> Result<Self, ModelParseError> {
        let trimmed = raw.trim();
        let name = trimmed.strip_prefix("models/").unwrap_or(trimmed);
        if name.is_empty() {
            return Err(ModelParseError::Empty);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        {
            return Err(ModelParseError::InvalidCharacters(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// UI options
// ============================================================================

/// Accessibility toggles read from `[app]` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}

#[cfg(test)]
mod tests {
    use super::{ApiKey, ModelName, ModelParseError};

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("  AIzaSecretValue  ").unwrap();
        assert_eq!(key.expose_secret(), "AIzaSecretValue");
        assert_eq!(format!("{key:?}"), "ApiKey(<redacted>)");
        assert_eq!(key.to_string(), "<redacted>");
        assert!(!key.masked().contains("Secret"));
        assert!(key.masked().ends_with("alue"));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        assert!(ApiKey::new("   ").is_none());
    }

    #[test]
    fn model_name_strips_models_prefix() {
        let model = ModelName::parse("models/gemini-2.0-flash").unwrap();
        assert_eq!(model.as_str(), "gemini-2.0-flash");
    }

    #[test]
    fn model_name_rejects_path_characters() {
        assert_eq!(ModelName::parse(""), Err(ModelParseError::Empty));
        assert!(matches!(
            ModelName::parse("gemini/../x"),
            Err(ModelParseError::InvalidCharacters(_))
        ));
    }
}
