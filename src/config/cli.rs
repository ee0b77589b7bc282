use crate::core::brick::Brick;
use crate::core::motor::{Motor, MotorKind};
use crate::core::sensor::{
    ColorSensor, GyroSensor, InfraredSensor, Sensor, TouchSensor, UltrasonicSensor,
};
use crate::domain::model::{
    BeaconChannel, Button, DrawableColor, DrawableImage, LightColor, LightEffect, MotorPort,
    SensorPort, SoundFile,
};
use crate::utils::error::Result;
use clap::Subcommand;
use std::time::Duration;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show brick name, firmware and battery
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Print the brick name, or rename the brick
    Name { new_name: Option<String> },
    /// Set the button light
    Led {
        #[arg(value_enum)]
        color: LightColor,
        #[arg(value_enum, default_value = "solid")]
        effect: LightEffect,
    },
    /// Play a tone
    Tone {
        #[arg(long, default_value = "440")]
        frequency: u16,
        #[arg(long, default_value = "500")]
        duration_ms: u64,
        #[arg(long, default_value = "50")]
        volume: u8,
    },
    /// Play a stock sound (e.g. click, startup) or a sound file path on the brick
    Sound {
        sound: String,
        #[arg(long, default_value = "50")]
        volume: u8,
        #[arg(long)]
        repeat: bool,
    },
    StopSound,
    /// Fill the display
    Clear {
        #[arg(value_enum, default_value = "white")]
        color: DrawableColor,
    },
    /// Draw an image (motor-ctl-ad, motor-ctl-bc or a .rgf path on the brick)
    Image {
        image: String,
        #[arg(default_value = "0")]
        x: i32,
        #[arg(default_value = "0")]
        y: i32,
    },
    /// Write text on the display
    Text {
        text: String,
        #[arg(default_value = "0")]
        x: i32,
        #[arg(default_value = "0")]
        y: i32,
    },
    /// Simulate a press of one of the brick buttons
    Press {
        #[arg(value_enum)]
        button: Button,
        #[arg(long)]
        no_wait: bool,
    },
    Motor {
        #[arg(value_enum)]
        port: MotorPort,
        #[arg(long, value_enum, default_value = "large")]
        kind: MotorKind,
        #[command(subcommand)]
        action: MotorAction,
    },
    Sensor {
        #[arg(value_enum)]
        port: SensorPort,
        #[command(subcommand)]
        reading: SensorReading,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum MotorAction {
    /// Run until Ctrl-C
    Rotate {
        #[arg(allow_negative_numbers = true)]
        speed: i32,
    },
    Time {
        #[arg(allow_negative_numbers = true)]
        speed: i32,
        millis: u64,
    },
    Degrees {
        #[arg(allow_negative_numbers = true)]
        speed: i32,
        #[arg(allow_negative_numbers = true)]
        angle: f64,
    },
    Stop {
        #[arg(long)]
        brake: bool,
    },
    Rotation,
    Reset,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SensorReading {
    Touch,
    Presses,
    Color,
    Reflected,
    Ambient,
    IrDistance,
    Beacon {
        #[arg(value_enum, default_value = "1")]
        channel: BeaconChannel,
    },
    Remote {
        #[arg(value_enum, default_value = "1")]
        channel: BeaconChannel,
    },
    UltrasonicCm,
    Gyro,
    /// Read any device by firmware type number and mode
    Raw { type_number: u8, mode: u8 },
}

/// Runs one subcommand against `brick`; returns the text to print, if any.
pub async fn execute(command: &Command, brick: &mut Brick) -> Result<Option<String>> {
    match command {
        Command::Info { json } => {
            let info = brick.info().await?;
            if *json {
                return Ok(Some(serde_json::to_string_pretty(&info)?));
            }
            Ok(Some(format!(
                "Name: {}\nFirmware: {}\nConnection: {}\nBattery: {:.2} V ({}%)",
                info.name,
                info.firmware_version,
                info.protocol,
                info.battery.voltage,
                info.battery.percent
            )))
        }
        Command::Name { new_name: None } => Ok(Some(brick.brick_name().await?)),
        Command::Name {
            new_name: Some(name),
        } => {
            brick.set_brick_name(name).await?;
            Ok(None)
        }
        Command::Led { color, effect } => {
            brick.set_status_light(*color, *effect).await?;
            Ok(None)
        }
        Command::Tone {
            frequency,
            duration_ms,
            volume,
        } => {
            brick
                .play_tone(*volume, *frequency, Duration::from_millis(*duration_ms))
                .await?;
            Ok(None)
        }
        Command::Sound {
            sound,
            volume,
            repeat,
        } => {
            let sound: SoundFile = sound.parse().unwrap_or_else(|e| match e {});
            brick.play_sound(&sound, *volume, *repeat).await?;
            Ok(None)
        }
        Command::StopSound => {
            brick.stop_sound().await?;
            Ok(None)
        }
        Command::Clear { color } => {
            brick.clear_display(*color).await?;
            Ok(None)
        }
        Command::Image { image, x, y } => {
            let image: DrawableImage = image.parse().unwrap_or_else(|e| match e {});
            brick
                .display_image(&image, *x, *y, DrawableColor::Black)
                .await?;
            Ok(None)
        }
        Command::Text { text, x, y } => {
            brick.display_text(text, *x, *y, DrawableColor::Black).await?;
            Ok(None)
        }
        Command::Press { button, no_wait } => {
            brick.simulate_button_press(*button, !*no_wait).await?;
            Ok(None)
        }
        Command::Motor { port, kind, action } => {
            let motor = Motor::with_kind(brick, *port, *kind);
            run_motor(&motor, action).await
        }
        Command::Sensor { port, reading } => read_sensor(brick, *port, reading).await,
    }
}

async fn run_motor(motor: &Motor, action: &MotorAction) -> Result<Option<String>> {
    match action {
        MotorAction::Rotate { speed } => {
            motor.rotate(*speed).await?;
            tracing::info!("🔄 Motor {:?} running, press Ctrl-C to stop", motor.port());
            tokio::signal::ctrl_c().await?;
            motor.stop().await?;
            Ok(None)
        }
        MotorAction::Time { speed, millis } => {
            motor
                .rotate_for_time(*speed, Duration::from_millis(*millis))
                .await?;
            Ok(None)
        }
        MotorAction::Degrees { speed, angle } => {
            motor.rotate_degrees(*speed, *angle).await?;
            Ok(None)
        }
        MotorAction::Stop { brake: true } => {
            motor.brake().await?;
            Ok(None)
        }
        MotorAction::Stop { brake: false } => {
            motor.stop().await?;
            Ok(None)
        }
        MotorAction::Rotation => Ok(Some(format!("{}", motor.rotation().await?))),
        MotorAction::Reset => {
            motor.reset_rotation().await?;
            Ok(None)
        }
    }
}

async fn read_sensor(
    brick: &mut Brick,
    port: SensorPort,
    reading: &SensorReading,
) -> Result<Option<String>> {
    let text = match reading {
        SensorReading::Touch => TouchSensor::new(brick, port).is_pressed().await?.to_string(),
        SensorReading::Presses => TouchSensor::new(brick, port).press_count().await?.to_string(),
        SensorReading::Color => format!("{:?}", ColorSensor::new(brick, port).color().await?),
        SensorReading::Reflected => ColorSensor::new(brick, port)
            .reflected_light_intensity()
            .await?
            .to_string(),
        SensorReading::Ambient => ColorSensor::new(brick, port)
            .ambient_light_intensity()
            .await?
            .to_string(),
        SensorReading::IrDistance => InfraredSensor::new(brick, port).distance().await?.to_string(),
        SensorReading::Beacon { channel } => {
            let (heading, distance) = InfraredSensor::new(brick, port)
                .beacon_proximity(*channel)
                .await?;
            format!("heading {} distance {}", heading, distance)
        }
        SensorReading::Remote { channel } => format!(
            "{:?}",
            InfraredSensor::new(brick, port)
                .beacon_buttons(*channel)
                .await?
        ),
        SensorReading::UltrasonicCm => UltrasonicSensor::new(brick, port)
            .distance_cm()
            .await?
            .to_string(),
        SensorReading::Gyro => GyroSensor::new(brick, port).angle().await?.to_string(),
        SensorReading::Raw { type_number, mode } => Sensor::new(brick, port, *type_number)
            .read_mode(*mode)
            .await?
            .to_string(),
    };
    Ok(Some(text))
}
