//! Domain error types.

/// Top-level error type for signaltrader.
#[derive(Debug, thiserror::Error)]
pub enum SignaltraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("decision oracle failed on {date}: {reason}")]
    Oracle { date: String, reason: String },

    #[error("unparseable decision content: {reason}")]
    DecisionParse { reason: String },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignaltraderError> for std::process::ExitCode {
    fn from(err: &SignaltraderError) -> Self {
        let code: u8 = match err {
            SignaltraderError::Io(_) | SignaltraderError::Report { .. } => 1,
            SignaltraderError::ConfigParse { .. }
            | SignaltraderError::ConfigMissing { .. }
            | SignaltraderError::ConfigInvalid { .. }
            | SignaltraderError::InvalidDate { .. } => 2,
            SignaltraderError::PriceData { .. } => 3,
            SignaltraderError::Oracle { .. } | SignaltraderError::DecisionParse { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
