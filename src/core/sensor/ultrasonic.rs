use super::{typed_sensor, Sensor};
use crate::utils::error::Result;

/// EV3 ultrasonic sensor (45504).
#[derive(Clone)]
pub struct UltrasonicSensor(Sensor);

typed_sensor!(UltrasonicSensor, 30);

impl UltrasonicSensor {
    pub async fn distance_cm(&self) -> Result<f32> {
        self.read_mode(0).await
    }

    pub async fn distance_in(&self) -> Result<f32> {
        self.read_mode(1).await
    }

    /// True when another ultrasonic sensor is pinging nearby.
    pub async fn listen(&self) -> Result<bool> {
        Ok(self.read_mode(2).await? != 0.0)
    }
}
