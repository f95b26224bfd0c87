//! Domain error types.

/// Failure reported by a market data provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("provider temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Top-level error type for finbot.
#[derive(Debug, thiserror::Error)]
pub enum FinbotError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid configuration [{section}] {key}: {reason}")]
    InvalidConfiguration {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data unavailable for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("notification failed: {reason}")]
    Notify { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FinbotError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        FinbotError::InvalidConfiguration {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Collapse a provider failure into the single "no data for this run" condition.
    pub fn data_unavailable(instrument: &str, err: &DataError) -> Self {
        FinbotError::DataUnavailable {
            instrument: instrument.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<&FinbotError> for std::process::ExitCode {
    fn from(err: &FinbotError) -> Self {
        let code: u8 = match err {
            FinbotError::Io(_) | FinbotError::Notify { .. } => 1,
            FinbotError::ConfigParse { .. }
            | FinbotError::ConfigMissing { .. }
            | FinbotError::InvalidConfiguration { .. }
            | FinbotError::UnknownStrategy(_) => 2,
            FinbotError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
