#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::Protocol;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::Ev3Config;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ev3ctl")]
#[command(about = "Control a LEGO EV3 brick with direct commands")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub protocol: Option<Protocol>,

    /// hidraw node (USB) or RFCOMM device (Bluetooth)
    #[arg(long)]
    pub device: Option<String>,

    /// Wi-Fi brick address as ip:port
    #[arg(long)]
    pub host: Option<String>,

    /// Brick serial number (Wi-Fi)
    #[arg(long)]
    pub serial: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: cli::Command,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the config file (if any) and applies the command line overrides.
    pub fn resolve(&self) -> Result<Ev3Config> {
        let mut config = match &self.config {
            Some(path) => Ev3Config::from_file(path)?,
            None => Ev3Config::for_protocol(self.protocol.unwrap_or(Protocol::Usb)),
        };

        if let Some(protocol) = self.protocol {
            config.connection.protocol = protocol;
        }
        if let Some(device) = &self.device {
            config.connection.device = Some(device.clone());
        }
        if let Some(host) = &self.host {
            config.connection.host = Some(host.clone());
        }
        if let Some(serial) = &self.serial {
            config.connection.serial = Some(serial.clone());
        }
        if let Some(timeout) = self.timeout_ms {
            config.connection.timeout_ms = Some(timeout);
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::ports::ConnectionSettings;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[connection]\nprotocol = \"wifi\"\nhost = \"10.0.0.2:5555\"\nserial = \"AAAA\"\ntimeout_ms = 100"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from([
            "ev3ctl",
            "--config",
            &path,
            "--serial",
            "0016535D7E2D",
            "--timeout-ms",
            "900",
            "info",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.protocol(), Protocol::Wifi);
        assert_eq!(config.serial(), Some("0016535D7E2D"));
        assert_eq!(config.timeout_ms(), 900);
    }

    #[test]
    fn test_defaults_to_usb_without_file() {
        let cli = CliConfig::parse_from(["ev3ctl", "stop-sound"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.protocol(), Protocol::Usb);
    }
}
