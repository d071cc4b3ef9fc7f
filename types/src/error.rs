use std::time::Duration;

use thiserror::Error;

/// What was empty when a step needed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInputKind {
    /// No committed strokes.
    Drawing,
    /// Blank expression text.
    Expression,
}

/// Every failure the recognize/solve flow can surface.
///
/// All variants are recoverable: the engine shows the message next to the
/// step that failed and leaves drawing and editor state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Gemini API key is not set (Ctrl+K to enter one)")]
    MissingCredential,
    #[error("{}", empty_input_message(*.0))]
    EmptyInput(EmptyInputKind),
    #[error("{}", transport_message(*.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Unexpected response shape: {0}")]
    MalformedResponse(String),
    #[error("No JSON object found in the solution response")]
    NoJsonFound,
    #[error("Could not parse solution: {0}")]
    SolutionParse(String),
    #[error("Could not encode drawing: {0}")]
    Encode(String),
}

fn empty_input_message(kind: EmptyInputKind) -> &'static str {
    match kind {
        EmptyInputKind::Drawing => "Draw an expression first",
        EmptyInputKind::Expression => "Enter an expression to solve",
    }
}

fn transport_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("API error {status}: {message}"),
        None => format!("Request failed: {message}"),
    }
}

impl FlowError {
    #[must_use]
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        FlowError::Transport {
            status,
            message: message.into(),
        }
    }
}
