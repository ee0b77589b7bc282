use super::{typed_sensor, Sensor};
use crate::domain::model::{BeaconButtons, BeaconChannel};
use crate::utils::error::{Ev3Error, Result};

const PROXIMITY_MODE: u8 = 0;
const SEEKER_MODE: u8 = 1;
const REMOTE_MODE: u8 = 2;

/// EV3 infrared sensor (45509 / 95654).
#[derive(Clone)]
pub struct InfraredSensor(Sensor);

typed_sensor!(InfraredSensor, 33);

impl InfraredSensor {
    /// Approximate distance to whatever is in front of the sensor, 0-100.
    pub async fn distance(&self) -> Result<f32> {
        self.read_mode(PROXIMITY_MODE).await
    }

    /// Heading and distance of a beacon broadcasting on `channel`.
    ///
    /// The beacon must be switched on (green light). A beacon two units away
    /// and two units to the left reads as `(-2, 2)`.
    pub async fn beacon_proximity(&self, channel: BeaconChannel) -> Result<(i32, i32)> {
        // heading / proximity 一組，四個頻道
        let states = self.read_raw(SEEKER_MODE, 8).await?;
        let i = channel.index() * 2;
        Ok((states[i], states[i + 1]))
    }

    /// Button combination currently held on the remote, e.g. `RedUpperAndBlueUpper`.
    pub async fn beacon_buttons_raw(&self, channel: BeaconChannel) -> Result<BeaconButtons> {
        let values = self.read_si(REMOTE_MODE, 4).await?;
        let raw = values[channel.index()] as i32;
        BeaconButtons::try_from(raw)
            .map_err(|value| Ev3Error::protocol(format!("unknown beacon button code {}", value)))
    }

    /// Individual buttons held on the remote; empty when none.
    pub async fn beacon_buttons(&self, channel: BeaconChannel) -> Result<Vec<BeaconButtons>> {
        Ok(self.beacon_buttons_raw(channel).await?.individual())
    }
}
