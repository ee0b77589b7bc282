use crate::core::brick::{duration_millis, stop_command, Brick, SharedConnection};
use crate::core::protocol::{opcodes, read_f32, subcodes, Command};
use crate::domain::model::MotorPort;
use crate::utils::error::{Ev3Error, Result};
use crate::utils::validation::validate_range;
use std::ops::Deref;
use std::time::Duration;

const LARGE_MOTOR_TYPE: i32 = 7;
const MEDIUM_MOTOR_TYPE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MotorKind {
    Generic,
    Large,
    Medium,
}

impl MotorKind {
    /// Top speed at 100% in revolutions per minute.
    pub fn max_rpm(self) -> Option<f64> {
        match self {
            MotorKind::Generic => None,
            MotorKind::Large => Some(170.0),
            MotorKind::Medium => Some(250.0),
        }
    }

    fn type_number(self) -> i32 {
        match self {
            MotorKind::Medium => MEDIUM_MOTOR_TYPE,
            MotorKind::Generic | MotorKind::Large => LARGE_MOTOR_TYPE,
        }
    }
}

/// A motor on one of the brick's output ports.
///
/// Creating the handle registers it on the brick; a motor is only stopped by
/// [`Brick::close`] if it was registered.
#[derive(Clone)]
pub struct Motor {
    connection: SharedConnection,
    port: MotorPort,
    kind: MotorKind,
}

impl Motor {
    pub fn new(brick: &mut Brick, port: MotorPort) -> Self {
        Self::with_kind(brick, port, MotorKind::Generic)
    }

    pub fn with_kind(brick: &mut Brick, port: MotorPort, kind: MotorKind) -> Self {
        brick.add_motor(port, kind);
        Self {
            connection: brick.connection(),
            port,
            kind,
        }
    }

    pub fn port(&self) -> MotorPort {
        self.port
    }

    pub fn kind(&self) -> MotorKind {
        self.kind
    }

    pub fn max_rpm(&self) -> Option<f64> {
        self.kind.max_rpm()
    }

    async fn send(&self, command: &Command) -> Result<Vec<u8>> {
        self.connection.lock().await.send_direct_cmd(command).await
    }

    /// Starts turning at `speed` percent (negative reverses) until stopped.
    pub async fn rotate(&self, speed: i32) -> Result<()> {
        validate_range("speed", speed, -100, 100)?;

        let port = self.port.value() as i32;
        let cmd = Command::new()
            .op(opcodes::OUTPUT_SPEED)
            .lcx(0)
            .lcx(port)
            .lcx(speed)
            .op(opcodes::OUTPUT_START)
            .lcx(0)
            .lcx(port);
        self.send(&cmd).await?;
        Ok(())
    }

    /// Turns for `duration`, then stops. The connection stays usable by
    /// other handles while waiting.
    pub async fn rotate_for_time(&self, speed: i32, duration: Duration) -> Result<()> {
        duration_millis(duration)?;
        self.rotate(speed).await?;
        tokio::time::sleep(duration).await;
        self.stop().await
    }

    /// Turns roughly `angle` degrees by timing the rotation from the motor's
    /// rated top speed. Not exact: load and battery level change the real speed.
    pub async fn rotate_degrees(&self, speed: i32, angle: f64) -> Result<()> {
        let max_rpm = self.kind.max_rpm().ok_or_else(|| Ev3Error::UnsupportedError {
            message: "rotate_degrees needs a known top speed; create the motor as LargeMotor or MediumMotor".to_string(),
        })?;
        validate_range("speed", speed, -100, 100)?;
        if speed == 0 {
            return Err(Ev3Error::InvalidArgumentError {
                name: "speed".to_string(),
                value: "0".to_string(),
                reason: "A motor at zero speed never reaches the angle".to_string(),
            });
        }

        let duration = degrees_duration(speed, angle, max_rpm)?;
        let signed_speed = if angle < 0.0 { -speed } else { speed };
        tracing::debug!(
            "Rotating {:?} by {}° at {}% for {:?}",
            self.port,
            angle,
            speed,
            duration
        );
        self.rotate_for_time(signed_speed, duration).await
    }

    /// Cuts power and lets the motor coast.
    pub async fn stop(&self) -> Result<()> {
        self.send(&stop_command(self.port, false)).await?;
        Ok(())
    }

    /// Stops and holds the current position.
    pub async fn brake(&self) -> Result<()> {
        self.send(&stop_command(self.port, true)).await?;
        Ok(())
    }

    /// Tachometer reading in degrees since the last reset.
    pub async fn rotation(&self) -> Result<f32> {
        let input_port = self.port.input_port().ok_or_else(|| Ev3Error::UnsupportedError {
            message: "rotation can only be read from a single port".to_string(),
        })?;

        let cmd = Command::new()
            .op(opcodes::INPUT_DEVICE)
            .lcx(subcodes::READY_SI)
            .lcx(0)
            .lcx(input_port as i32)
            .lcx(self.kind.type_number())
            .lcx(0)
            .lcx(1)
            .gvx(0)
            .with_global_mem(4);
        let reply = self.send(&cmd).await?;
        read_f32(&reply, 0)
    }

    pub async fn reset_rotation(&self) -> Result<()> {
        let cmd = Command::new()
            .op(opcodes::OUTPUT_CLR_COUNT)
            .lcx(0)
            .lcx(self.port.value() as i32);
        self.send(&cmd).await?;
        Ok(())
    }
}

/// Time needed to turn `angle` degrees at `speed` percent of `max_rpm`.
pub fn degrees_duration(speed: i32, angle: f64, max_rpm: f64) -> Result<Duration> {
    let invalid_angle = |reason: &str| Ev3Error::InvalidArgumentError {
        name: "angle".to_string(),
        value: angle.to_string(),
        reason: reason.to_string(),
    };
    if !angle.is_finite() {
        return Err(invalid_angle("Angle must be a finite number of degrees"));
    }

    let rpm = (speed.unsigned_abs() as f64 / 100.0) * max_rpm;
    // rpm * 360 / 60 = 每秒轉幾度
    let seconds_per_degree = 1.0 / (rpm * 6.0);
    Duration::try_from_secs_f64(seconds_per_degree * angle.abs())
        .map_err(|_| invalid_angle("Angle is too large to time"))
}

/// EV3 large servo motor (45502 / 95658).
#[derive(Clone)]
pub struct LargeMotor(Motor);

impl LargeMotor {
    pub fn new(brick: &mut Brick, port: MotorPort) -> Self {
        Self(Motor::with_kind(brick, port, MotorKind::Large))
    }
}

impl Deref for LargeMotor {
    type Target = Motor;

    fn deref(&self) -> &Motor {
        &self.0
    }
}

/// EV3 medium servo motor (45503 / 99455).
#[derive(Clone)]
pub struct MediumMotor(Motor);

impl MediumMotor {
    pub fn new(brick: &mut Brick, port: MotorPort) -> Self {
        Self(Motor::with_kind(brick, port, MotorKind::Medium))
    }
}

impl Deref for MediumMotor {
    type Target = Motor;

    fn deref(&self) -> &Motor {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_duration() {
        // 50% of 170 rpm = 85 rpm = 510°/s
        let d = degrees_duration(50, 510.0, 170.0).unwrap();
        assert!((d.as_secs_f64() - 1.0).abs() < 1e-6);

        let d = degrees_duration(-100, -250.0 * 6.0, 250.0).unwrap();
        assert!((d.as_secs_f64() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degrees_duration_rejects_unusable_angles() {
        for angle in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e300] {
            let err = degrees_duration(1, angle, 170.0).unwrap_err();
            assert!(
                matches!(err, Ev3Error::InvalidArgumentError { ref name, .. } if name == "angle"),
                "angle {} gave {:?}",
                angle,
                err
            );
        }
    }

    #[test]
    fn test_max_rpm() {
        assert_eq!(MotorKind::Generic.max_rpm(), None);
        assert_eq!(MotorKind::Large.max_rpm(), Some(170.0));
        assert_eq!(MotorKind::Medium.max_rpm(), Some(250.0));
    }
}
