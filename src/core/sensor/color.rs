use super::{typed_sensor, Sensor};
use crate::domain::model::Color;
use crate::utils::error::{Ev3Error, Result};

/// EV3 color sensor (45506 / 95650).
#[derive(Clone)]
pub struct ColorSensor(Sensor);

typed_sensor!(ColorSensor, 29);

impl ColorSensor {
    /// Reflected red light, 0 (none) to 100 (full).
    pub async fn reflected_light_intensity(&self) -> Result<f32> {
        self.read_mode(0).await
    }

    /// Ambient light, 0 (darkness) to 100 (pointing at sunlight).
    pub async fn ambient_light_intensity(&self) -> Result<f32> {
        self.read_mode(1).await
    }

    /// One of seven colors, or `NoColor` when the reading is ambiguous.
    pub async fn color(&self) -> Result<Color> {
        let raw = self.read_mode(2).await? as i32;
        Color::try_from(raw)
            .map_err(|value| Ev3Error::protocol(format!("unknown color code {}", value)))
    }
}
