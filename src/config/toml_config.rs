use crate::domain::model::{Protocol, SyncMode};
use crate::domain::ports::ConnectionSettings;
use crate::utils::error::{Ev3Error, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ev3Config {
    pub connection: ConnectionConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub protocol: Protocol,
    /// hidraw node (USB) or RFCOMM device (Bluetooth)
    pub device: Option<String>,
    /// `ip:port` of a Wi-Fi brick; skips UDP discovery
    pub host: Option<String>,
    pub serial: Option<String>,
    pub timeout_ms: Option<u64>,
    pub sync_mode: Option<SyncMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl Default for Ev3Config {
    fn default() -> Self {
        Self::for_protocol(Protocol::Usb)
    }
}

impl Ev3Config {
    pub fn for_protocol(protocol: Protocol) -> Self {
        Self {
            connection: ConnectionConfig {
                protocol,
                device: None,
                host: None,
                serial: None,
                timeout_ms: None,
                sync_mode: None,
            },
            logging: None,
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(Ev3Error::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${EV3_SERIAL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| Ev3Error::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let conn = &self.connection;

        if let Some(device) = &conn.device {
            validate_path("connection.device", device)?;
        }

        match conn.protocol {
            Protocol::Bluetooth => {
                validate_required_field("connection.device", &conn.device)?;
            }
            Protocol::Wifi if conn.host.is_some() => {
                let serial = validate_required_field("connection.serial", &conn.serial)?;
                validate_non_empty_string("connection.serial", serial)?;
            }
            _ => {}
        }

        if let Some(host) = &conn.host {
            if host.parse::<std::net::SocketAddr>().is_err() {
                return Err(Ev3Error::InvalidConfigValueError {
                    field: "connection.host".to_string(),
                    value: host.clone(),
                    reason: "Expected ip:port, e.g. 192.168.0.10:5555".to_string(),
                });
            }
        }

        if let Some(timeout) = conn.timeout_ms {
            validate_positive_number("connection.timeout_ms", timeout, 1)?;
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(Ev3Error::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if format != "compact" && format != "json" {
                return Err(Ev3Error::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }
}

impl ConnectionSettings for Ev3Config {
    fn protocol(&self) -> Protocol {
        self.connection.protocol
    }

    fn device(&self) -> Option<&str> {
        self.connection.device.as_deref()
    }

    fn host(&self) -> Option<&str> {
        self.connection.host.as_deref()
    }

    fn serial(&self) -> Option<&str> {
        self.connection.serial.as_deref()
    }

    fn timeout_ms(&self) -> u64 {
        self.connection.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    fn sync_mode(&self) -> SyncMode {
        self.connection
            .sync_mode
            .unwrap_or_else(|| SyncMode::default_for(self.connection.protocol))
    }
}

impl Validate for Ev3Config {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_wifi_config() {
        let toml_content = r#"
[connection]
protocol = "wifi"
host = "192.168.0.10:5555"
serial = "0016535D7E2D"
timeout_ms = 500
sync_mode = "sync"

[logging]
level = "debug"
format = "json"
"#;

        let config = Ev3Config::from_toml_str(toml_content).unwrap();

        assert_eq!(config.protocol(), Protocol::Wifi);
        assert_eq!(config.host(), Some("192.168.0.10:5555"));
        assert_eq!(config.timeout_ms(), 500);
        assert_eq!(config.sync_mode(), SyncMode::Sync);
        assert_eq!(config.log_level(), "debug");
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Ev3Config::from_toml_str("[connection]\nprotocol = \"usb\"\n").unwrap();

        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert_eq!(config.sync_mode(), SyncMode::Sync);
        assert_eq!(config.log_level(), "info");
        assert!(!config.json_logs());
    }

    #[test]
    fn test_bluetooth_requires_device() {
        let config = Ev3Config::from_toml_str("[connection]\nprotocol = \"bluetooth\"\n").unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Ev3Error::MissingConfigError { ref field } if field == "connection.device"));
    }

    #[test]
    fn test_wifi_host_requires_serial_and_valid_address() {
        let config = Ev3Config::from_toml_str(
            "[connection]\nprotocol = \"wifi\"\nhost = \"192.168.0.10:5555\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = Ev3Config::from_toml_str(
            "[connection]\nprotocol = \"wifi\"\nhost = \"brick\"\nserial = \"0016535D7E2D\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let err = Ev3Config::from_toml_str("[connection]\nprotocol = \"serial\"\n").unwrap_err();
        assert!(matches!(err, Ev3Error::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("LEGO_EV3_TEST_DEVICE", "/dev/rfcomm7");
        let config = Ev3Config::from_toml_str(
            "[connection]\nprotocol = \"bluetooth\"\ndevice = \"${LEGO_EV3_TEST_DEVICE}\"\n",
        )
        .unwrap();

        assert_eq!(config.device(), Some("/dev/rfcomm7"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\nprotocol = \"bluetooth\"\ndevice = \"/dev/rfcomm0\"").unwrap();

        let config = Ev3Config::from_file(file.path()).unwrap();
        assert_eq!(config.protocol(), Protocol::Bluetooth);
        assert_eq!(config.sync_mode(), SyncMode::Std);
        assert!(config.validate().is_ok());
    }
}
