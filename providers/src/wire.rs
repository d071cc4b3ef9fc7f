//! `generateContent` response types.
//!
//! Only the fields the client reads are modeled; everything is optional so
//! missing pieces surface as [`FlowError::MalformedResponse`] rather than a
//! deserialization failure.

use serde::Deserialize;

use inksolve_types::FlowError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<ErrorInfo>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
    /// Thinking models may emit thought parts ahead of the answer.
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
pub struct ErrorInfo {
    pub message: Option<String>,
    pub code: Option<i64>,
}

impl ErrorInfo {
    #[must_use]
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Known Gemini finish reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Blocklist,
    ProhibitedContent,
    Spii,
    Other,
    Unknown,
}

impl FinishReason {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" => Self::Safety,
            "RECITATION" => Self::Recitation,
            "LANGUAGE" => Self::Language,
            "BLOCKLIST" => Self::Blocklist,
            "PROHIBITED_CONTENT" => Self::ProhibitedContent,
            "SPII" => Self::Spii,
            "OTHER" => Self::Other,
            _ => Self::Unknown,
        }
    }

    /// Returns error message if this is a blocking reason, None otherwise.
    #[must_use]
    pub fn error_message(self) -> Option<&'static str> {
        match self {
            Self::Stop | Self::MaxTokens | Self::Unknown => None,
            Self::Safety => Some("Content filtered by safety settings"),
            Self::Recitation => Some("Response blocked: recitation"),
            Self::Language => Some("Unsupported language"),
            Self::Blocklist => Some("Content contains blocked terms"),
            Self::ProhibitedContent => Some("Prohibited content detected"),
            Self::Spii => Some("Sensitive PII detected"),
            Self::Other => Some("Generation stopped: unknown reason"),
        }
    }
}

impl Response {
    /// Text of the first candidate's first non-thought part.
    pub fn into_text(self) -> Result<String, FlowError> {
        if let Some(error) = self.error {
            let status = error.code.and_then(|code| u16::try_from(code).ok());
            return Err(FlowError::transport(status, error.message_or_default()));
        }

        let Some(candidate) = self.candidates.and_then(|c| c.into_iter().next()) else {
            let detail = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .map_or_else(
                    || "response has no candidates".to_string(),
                    |reason| format!("prompt blocked: {reason}"),
                );
            return Err(FlowError::MalformedResponse(detail));
        };

        if let Some(message) = candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::parse)
            .and_then(FinishReason::error_message)
        {
            return Err(FlowError::MalformedResponse(message.to_string()));
        }

        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| FlowError::MalformedResponse("candidate has no parts".to_string()))?;

        parts
            .into_iter()
            .find(|part| !part.thought)
            .and_then(|part| part.text)
            .ok_or_else(|| FlowError::MalformedResponse("response part has no text".to_string()))
    }
}
