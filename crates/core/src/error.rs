use thiserror::Error;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, we couldn't create your tour right now. Please try again.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TourError {
    /// Bad input, caught before any outbound call.
    #[error("invalid tour request: {message}")]
    Validation { message: String },

    /// Missing or placeholder access credential.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The model call itself failed (network, auth, quota, malformed envelope).
    #[error("upstream model call failed: {message}")]
    Upstream { message: String },

    /// Structured-mode body was not valid JSON.
    #[error("could not parse itinerary: {message}")]
    Parse { message: String },

    #[error("tour resolution was cancelled")]
    Cancelled,
}

impl TourError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Configuration { .. } => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::Parse { .. } => "parse",
            Self::Cancelled => "cancelled",
        }
    }

    /// Every failure collapses to one message at the user-facing boundary.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}
