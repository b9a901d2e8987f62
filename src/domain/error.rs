//! Domain error types.

/// Top-level error type for trailtrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
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

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("position limit reached ({max} open)")]
    PositionLimit { max: usize },

    #[error("position already open for {symbol}")]
    DuplicatePosition { symbol: String },

    #[error("no open position for {symbol}")]
    UnknownPosition { symbol: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("trade log error: {reason}")]
    TradeLog { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    /// Configuration problems are fatal at startup; everything else is
    /// scoped to a symbol, an update, or a single command.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TraderError::ConfigParse { .. }
                | TraderError::ConfigMissing { .. }
                | TraderError::ConfigInvalid { .. }
        )
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::TradeLog { .. } => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Data { .. } => 3,
            TraderError::PositionLimit { .. }
            | TraderError::DuplicatePosition { .. }
            | TraderError::UnknownPosition { .. } => 4,
            TraderError::InsufficientData { .. } | TraderError::InvalidPrice { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
