use crate::core::connection::Connection;
use crate::core::motor::MotorKind;
use crate::core::protocol::{opcodes, read_cstr, read_f32, subcodes, Command};
use crate::domain::model::{
    led_mode, Battery, BrickInfo, Button, DrawableColor, DrawableImage, LightColor, LightEffect,
    MotorPort, Protocol, SensorPort, SoundFile,
};
use crate::domain::ports::{ConnectionSettings, Transport};
use crate::utils::error::{Ev3Error, Result};
use crate::utils::validation::{validate_brick_string, validate_range};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub type SharedConnection = Arc<Mutex<Connection>>;

pub const DISPLAY_WIDTH: i32 = 178;
pub const DISPLAY_HEIGHT: i32 = 128;

const BRICK_NAME_LEN: u16 = 16;
const MAX_BRICK_NAME: usize = 12;
const FIRMWARE_VERSION_LEN: u16 = 16;

/// An EV3 programmable brick.
///
/// Owns the connection and keeps track of every motor and sensor handle
/// created for it, so [`Brick::close`] can stop all motors before hanging up.
pub struct Brick {
    connection: SharedConnection,
    protocol: Protocol,
    motors: BTreeMap<MotorPort, MotorKind>,
    sensors: BTreeMap<SensorPort, u8>,
    closed: bool,
}

impl Brick {
    pub fn new(connection: Connection) -> Self {
        let protocol = connection.protocol();
        Self {
            connection: Arc::new(Mutex::new(connection)),
            protocol,
            motors: BTreeMap::new(),
            sensors: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn from_transport(transport: Box<dyn Transport>) -> Self {
        Self::new(Connection::new(transport))
    }

    /// Connects over USB to the first EV3 found.
    pub async fn usb() -> Result<Self> {
        let transport = crate::adapters::usb::UsbTransport::open(None).await?;
        Ok(Self::from_transport(Box::new(transport)))
    }

    /// Connects over a bound RFCOMM serial device such as `/dev/rfcomm0`.
    ///
    /// Bluetooth is the most reliable link, but the brick sometimes refuses
    /// to reconnect after a few runs. Disconnecting this computer under
    /// Settings > Bluetooth > Connections on the brick fixes that.
    pub async fn bluetooth(device: &str) -> Result<Self> {
        let transport = crate::adapters::bluetooth::BluetoothTransport::open(device).await?;
        Ok(Self::from_transport(Box::new(transport)))
    }

    /// Connects to the first brick that announces itself on the local network.
    pub async fn wifi() -> Result<Self> {
        let transport = crate::adapters::wifi::WifiTransport::discover(None, None).await?;
        Ok(Self::from_transport(Box::new(transport)))
    }

    pub async fn connect<C: ConnectionSettings>(settings: &C) -> Result<Self> {
        let connection = crate::adapters::connect(settings).await?;
        Ok(Self::new(connection))
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub(crate) fn connection(&self) -> SharedConnection {
        Arc::clone(&self.connection)
    }

    /// Registers a motor. A second motor on the same port replaces the first.
    pub fn add_motor(&mut self, port: MotorPort, kind: MotorKind) {
        if self.motors.insert(port, kind).is_some() {
            tracing::warn!("⚠️ The port '{:?}' already has a motor assigned", port);
        }
    }

    /// Registers a sensor. A second sensor on the same port replaces the first.
    pub fn add_sensor(&mut self, port: SensorPort, type_number: u8) {
        if self.sensors.insert(port, type_number).is_some() {
            tracing::warn!("⚠️ The port '{:?}' already has a sensor assigned", port);
        }
    }

    pub fn motor_ports(&self) -> Vec<MotorPort> {
        self.motors.keys().copied().collect()
    }

    pub fn sensor_ports(&self) -> Vec<SensorPort> {
        self.sensors.keys().copied().collect()
    }

    /// Sends raw operations; escape hatch for anything without a typed method.
    pub async fn send_direct_cmd(&self, command: &Command) -> Result<Vec<u8>> {
        self.connection.lock().await.send_direct_cmd(command).await
    }

    pub async fn set_status_light(&self, color: LightColor, effect: LightEffect) -> Result<()> {
        let cmd = Command::new()
            .op(opcodes::UI_WRITE)
            .lcx(subcodes::LED)
            .lcx(led_mode(color, effect) as i32);
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_image(
        &self,
        image: &DrawableImage,
        x: i32,
        y: i32,
        color: DrawableColor,
    ) -> Result<()> {
        validate_point(x, y)?;
        validate_range("image", image.path().len(), 1, 255)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::TOPLINE)
            .lcx(0)
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::BMPFILE)
            .lcx(color.value())
            .lcx(x)
            .lcx(y)
            .lcs(image.path())
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn clear_display(&self, color: DrawableColor) -> Result<()> {
        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::TOPLINE)
            .lcx(1)
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::FILLWINDOW)
            .lcx(color.value())
            .lcx(0)
            .lcx(0)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_line(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: DrawableColor,
    ) -> Result<()> {
        validate_point(x1, y1)?;
        validate_point(x2, y2)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::LINE)
            .lcx(color.value())
            .lcx(x1)
            .lcx(y1)
            .lcx(x2)
            .lcx(y2)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_pixel(&self, x: i32, y: i32, color: DrawableColor) -> Result<()> {
        validate_point(x, y)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::PIXEL)
            .lcx(color.value())
            .lcx(x)
            .lcx(y)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_text(&self, text: &str, x: i32, y: i32, color: DrawableColor) -> Result<()> {
        validate_point(x, y)?;
        validate_brick_string("text", text, 255)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(subcodes::TEXT)
            .lcx(color.value())
            .lcx(x)
            .lcx(y)
            .lcs(text)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_rect(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: DrawableColor,
        filled: bool,
    ) -> Result<()> {
        validate_point(x, y)?;
        validate_range("width", width, 1, DISPLAY_WIDTH)?;
        validate_range("height", height, 1, DISPLAY_HEIGHT)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(if filled { subcodes::FILLRECT } else { subcodes::RECT })
            .lcx(color.value())
            .lcx(x)
            .lcx(y)
            .lcx(width)
            .lcx(height)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn display_circle(
        &self,
        x: i32,
        y: i32,
        radius: i32,
        color: DrawableColor,
        filled: bool,
    ) -> Result<()> {
        validate_point(x, y)?;
        validate_range("radius", radius, 1, DISPLAY_WIDTH)?;

        let cmd = Command::new()
            .op(opcodes::UI_DRAW)
            .lcx(if filled {
                subcodes::FILLCIRCLE
            } else {
                subcodes::CIRCLE
            })
            .lcx(color.value())
            .lcx(x)
            .lcx(y)
            .lcx(radius)
            .then(update_display());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    /// Makes the brick believe `button` was pressed. With
    /// `wait_for_completion` the command returns after the press has been
    /// processed, which only takes a few milliseconds.
    pub async fn simulate_button_press(&self, button: Button, wait_for_completion: bool) -> Result<()> {
        let mut cmd = Command::new()
            .op(opcodes::UI_BUTTON)
            .lcx(subcodes::PRESS)
            .lcx(button.value());

        if wait_for_completion {
            cmd = cmd.op(opcodes::UI_BUTTON).lcx(subcodes::WAIT_FOR_PRESS);
        }

        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    /// Plays a tone. `volume` is a percentage independent of the brick's own
    /// volume setting; `frequency` is in Hz.
    pub async fn play_tone(&self, volume: u8, frequency: u16, duration: Duration) -> Result<()> {
        validate_range("volume", volume, 0, 100)?;
        validate_range("frequency", frequency, 250, 10000)?;
        let millis = duration_millis(duration)?;

        let cmd = Command::new()
            .op(opcodes::SOUND)
            .lcx(subcodes::TONE)
            .lcx(volume as i32)
            .lcx(frequency as i32)
            .lcx(millis);
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    /// Plays a sound file. With `repeat` it loops until [`Brick::stop_sound`].
    pub async fn play_sound(&self, sound: &SoundFile, volume: u8, repeat: bool) -> Result<()> {
        validate_range("volume", volume, 0, 100)?;
        validate_brick_string("sound", sound.path(), 255)?;

        let cmd = Command::new()
            .op(opcodes::SOUND)
            .lcx(if repeat { subcodes::REPEAT } else { subcodes::PLAY })
            .lcx(volume as i32)
            .lcs(sound.path());
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    pub async fn stop_sound(&self) -> Result<()> {
        let cmd = Command::new().op(opcodes::SOUND).lcx(subcodes::BREAK);
        self.send_direct_cmd(&cmd).await?;
        Ok(())
    }

    /// Name set in the brick's settings.
    pub async fn brick_name(&self) -> Result<String> {
        let cmd = Command::new()
            .op(opcodes::COM_GET)
            .lcx(subcodes::GET_BRICKNAME)
            .lcx(BRICK_NAME_LEN as i32)
            .gvx(0)
            .with_global_mem(BRICK_NAME_LEN);
        let reply = self.send_direct_cmd(&cmd).await?;
        read_cstr(&reply)
    }

    pub async fn set_brick_name(&self, name: &str) -> Result<()> {
        validate_brick_string("name", name, MAX_BRICK_NAME)?;

        let cmd = Command::new()
            .op(opcodes::COM_SET)
            .lcx(subcodes::SET_BRICKNAME)
            .lcs(name);
        self.send_direct_cmd(&cmd).await?;
        tracing::info!("✏️ Brick renamed to '{}'", name);
        Ok(())
    }

    pub async fn battery(&self) -> Result<Battery> {
        let cmd = Command::new()
            .op(opcodes::UI_READ)
            .lcx(subcodes::GET_VBATT)
            .gvx(0)
            .op(opcodes::UI_READ)
            .lcx(subcodes::GET_LBATT)
            .gvx(4)
            .with_global_mem(5);
        let reply = self.send_direct_cmd(&cmd).await?;

        Ok(Battery {
            voltage: read_f32(&reply, 0)?,
            percent: reply[4].min(100),
        })
    }

    pub async fn firmware_version(&self) -> Result<String> {
        let cmd = Command::new()
            .op(opcodes::UI_READ)
            .lcx(subcodes::GET_FW_VERS)
            .lcx(FIRMWARE_VERSION_LEN as i32)
            .gvx(0)
            .with_global_mem(FIRMWARE_VERSION_LEN);
        let reply = self.send_direct_cmd(&cmd).await?;
        read_cstr(&reply)
    }

    pub async fn info(&self) -> Result<BrickInfo> {
        Ok(BrickInfo {
            name: self.brick_name().await?,
            firmware_version: self.firmware_version().await?,
            protocol: self.protocol,
            battery: self.battery().await?,
        })
    }

    /// Stops every registered motor and closes the connection. Every stop is
    /// attempted and the transport is closed even when one fails; the first
    /// error is returned.
    ///
    /// Skipping this can leave the link half-open on the brick's side, which
    /// then refuses the next connection attempt.
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        let mut connection = self.connection.lock().await;

        let mut first_error = None;
        for port in self.motors.keys() {
            tracing::debug!("Stopping motor on port {:?}", port);
            if let Err(e) = connection.send_direct_cmd(&stop_command(*port, false)).await {
                tracing::warn!("⚠️ Could not stop motor on port {:?}: {}", port, e);
                first_error.get_or_insert(e);
            }
        }

        // 停馬達失敗也要關閉 transport
        let closed = connection.close().await;
        match first_error {
            Some(e) => Err(e),
            None => closed,
        }
    }
}

impl Drop for Brick {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("⚠️ Brick dropped without close(); motors may still be running");
        }
    }
}

pub(crate) fn stop_command(port: MotorPort, brake: bool) -> Command {
    Command::new()
        .op(opcodes::OUTPUT_STOP)
        .lcx(0)
        .lcx(port.value() as i32)
        .lcx(brake as i32)
}

fn update_display() -> Command {
    Command::new().op(opcodes::UI_DRAW).lcx(subcodes::UPDATE)
}

fn validate_point(x: i32, y: i32) -> Result<()> {
    validate_range("x", x, 0, DISPLAY_WIDTH - 1)?;
    validate_range("y", y, 0, DISPLAY_HEIGHT - 1)
}

pub(crate) fn duration_millis(duration: Duration) -> Result<i32> {
    i32::try_from(duration.as_millis()).map_err(|_| Ev3Error::InvalidArgumentError {
        name: "duration".to_string(),
        value: format!("{:?}", duration),
        reason: "Duration is too long".to_string(),
    })
}
