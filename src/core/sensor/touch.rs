use super::{typed_sensor, Sensor};
use crate::utils::error::Result;

/// EV3 touch sensor (45507 / 95648).
#[derive(Clone)]
pub struct TouchSensor(Sensor);

typed_sensor!(TouchSensor, 16);

impl TouchSensor {
    pub async fn is_pressed(&self) -> Result<bool> {
        Ok(self.read_mode(0).await? != 0.0)
    }

    /// Presses counted since the port was last reset.
    pub async fn press_count(&self) -> Result<u32> {
        Ok(self.read_mode(1).await?.max(0.0) as u32)
    }
}
