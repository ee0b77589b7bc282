use super::{typed_sensor, Sensor};
use crate::utils::error::Result;

/// EV3 gyro sensor (45505).
#[derive(Clone)]
pub struct GyroSensor(Sensor);

typed_sensor!(GyroSensor, 32);

impl GyroSensor {
    /// Degrees turned since the sensor was plugged in or reset.
    pub async fn angle(&self) -> Result<f32> {
        self.read_mode(0).await
    }

    /// Degrees per second.
    pub async fn rate(&self) -> Result<f32> {
        self.read_mode(1).await
    }
}
