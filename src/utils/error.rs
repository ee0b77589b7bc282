use thiserror::Error;

#[derive(Error, Debug)]
pub enum Ev3Error {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timed out after {millis}ms waiting for {operation}")]
    TimeoutError { operation: String, millis: u64 },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Direct command #{counter} was rejected by the brick")]
    DirectCommandFailed { counter: u16 },

    #[error("Unsupported operation: {message}")]
    UnsupportedError { message: String },

    #[error("Invalid argument '{name}' = {value}: {reason}")]
    InvalidArgumentError {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    Protocol,
    Usage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl Ev3Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Ev3Error::ConfigValidationError { .. }
            | Ev3Error::InvalidConfigValueError { .. }
            | Ev3Error::MissingConfigError { .. } => ErrorCategory::Configuration,
            Ev3Error::ConnectionError { .. } | Ev3Error::TimeoutError { .. } => {
                ErrorCategory::Connection
            }
            Ev3Error::ProtocolError { .. } | Ev3Error::DirectCommandFailed { .. } => {
                ErrorCategory::Protocol
            }
            Ev3Error::UnsupportedError { .. } | Ev3Error::InvalidArgumentError { .. } => {
                ErrorCategory::Usage
            }
            Ev3Error::IoError(_) | Ev3Error::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Usage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            // 逾時或指令被拒通常重試即可
            ErrorCategory::Connection | ErrorCategory::Protocol => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Ev3Error::ConnectionError { .. } => {
                "Check that the brick is switched on and the cable, Bluetooth pairing or Wi-Fi dongle is connected. \
                 If Bluetooth worked before, disconnect this computer under Settings > Bluetooth > Connections on the brick"
            }
            Ev3Error::TimeoutError { .. } => {
                "The brick did not answer in time; raise connection.timeout_ms or move closer to the brick"
            }
            Ev3Error::ProtocolError { .. } => {
                "The reply did not match the command; reconnect to the brick and try again"
            }
            Ev3Error::DirectCommandFailed { .. } => {
                "Check that the addressed port has the expected device attached and the file paths exist on the brick"
            }
            Ev3Error::UnsupportedError { .. } => {
                "Use a more specific device handle (e.g. LargeMotor or MediumMotor instead of Motor)"
            }
            Ev3Error::InvalidArgumentError { .. } => "Adjust the argument to the documented range",
            Ev3Error::ConfigValidationError { .. }
            | Ev3Error::InvalidConfigValueError { .. }
            | Ev3Error::MissingConfigError { .. } => {
                "Fix the configuration file or command line flags and run again"
            }
            Ev3Error::IoError(_) => "Check device permissions (e.g. udev rules for /dev/hidraw*)",
            Ev3Error::SerializationError(_) => "Report this as a bug",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Connection => format!("Could not talk to the EV3 brick: {}", self),
            ErrorCategory::Protocol => format!("The EV3 brick reported a problem: {}", self),
            ErrorCategory::Usage => format!("Invalid request: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Ev3Error::ProtocolError {
            message: message.into(),
        }
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Ev3Error::ConnectionError {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Ev3Error {
    fn from(e: toml::de::Error) -> Self {
        Ev3Error::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Ev3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = Ev3Error::DirectCommandFailed { counter: 3 };
        assert_eq!(err.category(), ErrorCategory::Protocol);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = Ev3Error::MissingConfigError {
            field: "connection.device".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: Ev3Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
