use serde::{Deserialize, Serialize};

/// Output ports A-D. Values are the bit flags the firmware expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[repr(u8)]
pub enum MotorPort {
    A = 0x01,
    B = 0x02,
    C = 0x04,
    D = 0x08,
    All = 0x0F,
}

impl MotorPort {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Input port number under which the motor's tachometer can be read.
    pub fn input_port(self) -> Option<u8> {
        match self {
            MotorPort::A => Some(16),
            MotorPort::B => Some(17),
            MotorPort::C => Some(18),
            MotorPort::D => Some(19),
            MotorPort::All => None,
        }
    }
}

/// Input ports 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[repr(u8)]
pub enum SensorPort {
    #[cfg_attr(feature = "cli", value(name = "1"))]
    One = 0,
    #[cfg_attr(feature = "cli", value(name = "2"))]
    Two = 1,
    #[cfg_attr(feature = "cli", value(name = "3"))]
    Three = 2,
    #[cfg_attr(feature = "cli", value(name = "4"))]
    Four = 3,
}

impl SensorPort {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Colors reported by the color sensor in color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    NoColor = 0,
    Black = 1,
    Blue = 2,
    Green = 3,
    Yellow = 4,
    Red = 5,
    White = 6,
    Brown = 7,
}

impl TryFrom<i32> for Color {
    type Error = i32;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Color::NoColor),
            1 => Ok(Color::Black),
            2 => Ok(Color::Blue),
            3 => Ok(Color::Green),
            4 => Ok(Color::Yellow),
            5 => Ok(Color::Red),
            6 => Ok(Color::White),
            7 => Ok(Color::Brown),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BeaconChannel {
    #[cfg_attr(feature = "cli", value(name = "1"))]
    One = 0,
    #[cfg_attr(feature = "cli", value(name = "2"))]
    Two = 1,
    #[cfg_attr(feature = "cli", value(name = "3"))]
    Three = 2,
    #[cfg_attr(feature = "cli", value(name = "4"))]
    Four = 3,
}

impl BeaconChannel {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Button combinations the IR beacon / remote can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconButtons {
    NoButton = 0,
    RedUpper = 1,
    RedLower = 2,
    BlueUpper = 3,
    BlueLower = 4,
    RedUpperAndBlueUpper = 5,
    RedUpperAndBlueLower = 6,
    RedLowerAndBlueUpper = 7,
    RedLowerAndBlueLower = 8,
    Beacon = 9,
    RedUpperAndRedLower = 10,
    BlueUpperAndBlueLower = 11,
}

impl BeaconButtons {
    /// Splits a combination into the individual buttons pressed.
    /// `NoButton` yields an empty list.
    pub fn individual(self) -> Vec<BeaconButtons> {
        use BeaconButtons::*;

        match self {
            NoButton => vec![],
            RedUpper | RedLower | BlueUpper | BlueLower | Beacon => vec![self],
            RedUpperAndBlueUpper => vec![RedUpper, BlueUpper],
            RedUpperAndBlueLower => vec![RedUpper, BlueLower],
            RedLowerAndBlueUpper => vec![RedLower, BlueUpper],
            RedLowerAndBlueLower => vec![RedLower, BlueLower],
            RedUpperAndRedLower => vec![RedUpper, RedLower],
            BlueUpperAndBlueLower => vec![BlueUpper, BlueLower],
        }
    }
}

impl TryFrom<i32> for BeaconButtons {
    type Error = i32;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        use BeaconButtons::*;

        Ok(match value {
            0 => NoButton,
            1 => RedUpper,
            2 => RedLower,
            3 => BlueUpper,
            4 => BlueLower,
            5 => RedUpperAndBlueUpper,
            6 => RedUpperAndBlueLower,
            7 => RedLowerAndBlueUpper,
            8 => RedLowerAndBlueLower,
            9 => Beacon,
            10 => RedUpperAndRedLower,
            11 => BlueUpperAndBlueLower,
            other => return Err(other),
        })
    }
}

/// Colors of the light behind the brick buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LightColor {
    Off,
    Red,
    Orange,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LightEffect {
    #[default]
    Solid,
    Flash,
    Pulse,
}

/// Firmware LED pattern for a color / effect pair.
pub fn led_mode(color: LightColor, effect: LightEffect) -> u8 {
    let base = match color {
        LightColor::Off => return 0,
        LightColor::Green => 1,
        LightColor::Red => 2,
        LightColor::Orange => 3,
    };
    match effect {
        LightEffect::Solid => base,
        LightEffect::Flash => base + 3,
        LightEffect::Pulse => base + 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DrawableColor {
    White = 0,
    Black = 1,
}

impl DrawableColor {
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// Images stored on the brick that can be drawn on the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawableImage {
    MotorCtlAD,
    MotorCtlBC,
    Custom(String),
}

impl DrawableImage {
    pub fn path(&self) -> &str {
        match self {
            DrawableImage::MotorCtlAD => "../apps/Motor Control/MotorCtlAD.rgf",
            DrawableImage::MotorCtlBC => "../apps/Motor Control/MotorCtlBC.rgf",
            DrawableImage::Custom(path) => path,
        }
    }
}

impl std::str::FromStr for DrawableImage {
    type Err = std::convert::Infallible;

    /// Known image names (`motor-ctl-ad`, `motor-ctl-bc`); anything else is a brick path.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "motor-ctl-ad" => DrawableImage::MotorCtlAD,
            "motor-ctl-bc" => DrawableImage::MotorCtlBC,
            path => DrawableImage::Custom(path.to_string()),
        })
    }
}

/// The physical buttons on the brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Button {
    Up = 1,
    Enter = 2,
    Down = 3,
    Right = 4,
    Left = 5,
    Back = 6,
}

impl Button {
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// Sound files shipped with the brick firmware (paths without the `.rsf` suffix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundFile {
    DownloadSuccess,
    OverpowerAlert,
    GeneralAlarm,
    PowerDown,
    Startup,
    Click,
    Custom(String),
}

impl SoundFile {
    pub fn path(&self) -> &str {
        match self {
            // 檔名長度限制，所以少一個 s
            SoundFile::DownloadSuccess => "./ui/DownloadSucces",
            SoundFile::OverpowerAlert => "./ui/OverpowerAlert",
            SoundFile::GeneralAlarm => "./ui/GeneralAlarm",
            SoundFile::PowerDown => "./ui/PowerDown",
            SoundFile::Startup => "./ui/Startup",
            SoundFile::Click => "./ui/Click",
            SoundFile::Custom(path) => path,
        }
    }
}

impl std::str::FromStr for SoundFile {
    type Err = std::convert::Infallible;

    /// Kebab-case names of the stock sounds; anything else is a brick path.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "download-success" => SoundFile::DownloadSuccess,
            "overpower-alert" => SoundFile::OverpowerAlert,
            "general-alarm" => SoundFile::GeneralAlarm,
            "power-down" => SoundFile::PowerDown,
            "startup" => SoundFile::Startup,
            "click" => SoundFile::Click,
            path => SoundFile::Custom(path.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Protocol {
    Usb,
    Bluetooth,
    Wifi,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Usb => write!(f, "usb"),
            Protocol::Bluetooth => write!(f, "bluetooth"),
            Protocol::Wifi => write!(f, "wifi"),
        }
    }
}

/// When the brick is asked to acknowledge a direct command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Reply only when the command reads global memory.
    Std,
    /// Every command is acknowledged.
    Sync,
}

impl SyncMode {
    pub fn default_for(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Usb => SyncMode::Sync,
            Protocol::Bluetooth | Protocol::Wifi => SyncMode::Std,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub voltage: f32,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickInfo {
    pub name: String,
    pub firmware_version: String,
    pub protocol: Protocol,
    pub battery: Battery,
}
