pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::Ev3Config;

pub use crate::core::brick::Brick;
pub use crate::core::connection::Connection;
pub use crate::core::motor::{LargeMotor, MediumMotor, Motor, MotorKind};
pub use crate::core::protocol::Command;
pub use crate::core::sensor::{
    ColorSensor, GyroSensor, InfraredSensor, Sensor, TouchSensor, UltrasonicSensor,
};
pub use domain::model::*;
pub use domain::ports::{ConnectionSettings, Transport};
pub use utils::error::{Ev3Error, Result};
