/// Failures raised by the translation and enhancement layers.
///
/// Inside the provider chain `Network` and `InvalidResponse` only mean "try the next
/// backend" and never reach the caller. The enhancement client surfaces `Configuration`
/// and `Provider` as they are.
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Configuration(String),

    #[error("provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TranslatorError {
    pub fn missing_credential() -> Self {
        TranslatorError::Configuration("Gemini API key is not configured".to_string())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        TranslatorError::InvalidResponse(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, TranslatorError::Configuration(_))
    }

    /// What the user can do about it.
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            TranslatorError::Configuration(_) => {
                "Set your Gemini API key with --save-key <KEY> (or GEMINI_API_KEY) and try again."
            }
            TranslatorError::Provider { status, .. } if *status == 400 || *status == 403 => {
                "Check that your Gemini API key is valid."
            }
            TranslatorError::Provider { status, .. } if *status == 429 => {
                "The Gemini quota is exhausted; wait a moment before retrying."
            }
            TranslatorError::InvalidRequest(_) => "Select between 1 and 1000 characters of text.",
            _ => "Check your network connection and try again.",
        }
    }
}
