use thiserror::Error;

/// Main error type for the scenario generation system
#[derive(Error, Debug)]
pub enum SgError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SgError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SgError::Backend(BackendError::Timeout { .. }))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SgError::Backend(BackendError::Transport { .. }))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, SgError::Parse(_))
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, SgError::Data(DataError::Unavailable { .. }))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, SgError::Config(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SgError::Validation(_))
    }
}

/// Errors raised while talking to the generative backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport failure calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("backend did not respond within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Errors raised while interpreting backend text
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no structured payload found")]
    NoPayload,

    #[error("invalid payload structure at line {line}, column {column}: {message}")]
    InvalidStructure {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("rejected record: {message}")]
    RejectedRecord { message: String },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::InvalidStructure {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Risk data errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No risk universe available for selector '{selector}'")]
    Unavailable { selector: String },

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },
}

impl DataError {
    /// Unavailable error for an optional selector (`None` renders as `<default>`).
    pub fn unavailable(selector: Option<&str>) -> Self {
        DataError::Unavailable {
            selector: selector.unwrap_or("<default>").to_string(),
        }
    }
}

/// Result type alias for scenario generation operations
pub type SgResult<T> = Result<T, SgError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SgError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::SgError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SgError::Config(format!($($arg)*))
    };
}
