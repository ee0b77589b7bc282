pub mod color;
pub mod gyro;
pub mod infrared;
pub mod touch;
pub mod ultrasonic;

pub use color::ColorSensor;
pub use gyro::GyroSensor;
pub use infrared::InfraredSensor;
pub use touch::TouchSensor;
pub use ultrasonic::UltrasonicSensor;

use crate::core::brick::{Brick, SharedConnection};
use crate::core::protocol::{opcodes, read_f32, read_i32, subcodes, Command};
use crate::domain::model::SensorPort;
use crate::utils::error::Result;

/// Any device on an input port, addressed by its firmware type number.
#[derive(Clone)]
pub struct Sensor {
    connection: SharedConnection,
    port: SensorPort,
    type_number: u8,
}

impl Sensor {
    pub fn new(brick: &mut Brick, port: SensorPort, type_number: u8) -> Self {
        brick.add_sensor(port, type_number);
        Self {
            connection: brick.connection(),
            port,
            type_number,
        }
    }

    pub fn port(&self) -> SensorPort {
        self.port
    }

    pub fn type_number(&self) -> u8 {
        self.type_number
    }

    /// Reads one SI-scaled value in `mode`.
    pub async fn read_mode(&self, mode: u8) -> Result<f32> {
        let values = self.read_si(mode, 1).await?;
        Ok(values[0])
    }

    /// Reads `count` SI-scaled floats in `mode`.
    pub async fn read_si(&self, mode: u8, count: u8) -> Result<Vec<f32>> {
        let reply = self.read_values(subcodes::READY_SI, mode, count).await?;
        (0..count as usize).map(|i| read_f32(&reply, i * 4)).collect()
    }

    /// Reads `count` raw 32-bit values in `mode`.
    pub async fn read_raw(&self, mode: u8, count: u8) -> Result<Vec<i32>> {
        let reply = self.read_values(subcodes::READY_RAW, mode, count).await?;
        (0..count as usize).map(|i| read_i32(&reply, i * 4)).collect()
    }

    async fn read_values(&self, ready: i32, mode: u8, count: u8) -> Result<Vec<u8>> {
        let mut cmd = Command::new()
            .op(opcodes::INPUT_DEVICE)
            .lcx(ready)
            .lcx(0)
            .lcx(self.port.value() as i32)
            .lcx(self.type_number as i32)
            .lcx(mode as i32)
            .lcx(count as i32);
        for i in 0..count as u32 {
            cmd = cmd.gvx(i * 4);
        }
        let cmd = cmd.with_global_mem(count as u16 * 4);

        self.connection.lock().await.send_direct_cmd(&cmd).await
    }
}

/// Generates the `new` constructor and `Deref<Target = Sensor>` for a typed sensor.
macro_rules! typed_sensor {
    ($name:ident, $type_number:expr) => {
        impl $name {
            pub const TYPE_NUMBER: u8 = $type_number;

            pub fn new(
                brick: &mut $crate::core::brick::Brick,
                port: $crate::domain::model::SensorPort,
            ) -> Self {
                Self($crate::core::sensor::Sensor::new(brick, port, Self::TYPE_NUMBER))
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::core::sensor::Sensor;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

pub(crate) use typed_sensor;
