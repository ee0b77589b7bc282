mod common;

use common::MockBrick;
use lego_ev3::{
    BeaconButtons, BeaconChannel, Color, ColorSensor, Ev3Error, GyroSensor, InfraredSensor,
    Protocol, Sensor, SensorPort, TouchSensor, UltrasonicSensor,
};

#[tokio::test]
async fn test_touch_sensor() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_f32s(&[1.0]);
    mock.queue_f32s(&[3.0]);
    let mut brick = mock.brick();
    let touch = TouchSensor::new(&mut brick, SensorPort::One);

    assert!(touch.is_pressed().await.unwrap());
    assert_eq!(touch.press_count().await.unwrap(), 3);

    let ops = mock.ops();
    assert_eq!(ops[0], vec![0x99, 0x1D, 0x00, 0x00, 0x10, 0x00, 0x01, 0x60]);
    assert_eq!(ops[1], vec![0x99, 0x1D, 0x00, 0x00, 0x10, 0x01, 0x01, 0x60]);
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_color_sensor() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_f32s(&[5.0]);
    mock.queue_f32s(&[42.0]);
    mock.queue_f32s(&[17.0]);
    let mut brick = mock.brick();
    let sensor = ColorSensor::new(&mut brick, SensorPort::Three);

    assert_eq!(sensor.color().await.unwrap(), Color::Red);
    let err = sensor.color().await.unwrap_err();
    assert!(matches!(err, Ev3Error::ProtocolError { .. }));
    assert_eq!(sensor.reflected_light_intensity().await.unwrap(), 17.0);

    let ops = mock.ops();
    assert_eq!(ops[0], vec![0x99, 0x1D, 0x00, 0x02, 0x1D, 0x02, 0x01, 0x60]);
    assert_eq!(ops[2], vec![0x99, 0x1D, 0x00, 0x02, 0x1D, 0x00, 0x01, 0x60]);
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_infrared_beacon_proximity_per_channel() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_i32s(&[0, -128, -5, 12, 0, -128, 0, -128]);
    let mut brick = mock.brick();
    let ir = InfraredSensor::new(&mut brick, SensorPort::Four);

    let (heading, distance) = ir.beacon_proximity(BeaconChannel::Two).await.unwrap();
    assert_eq!((heading, distance), (-5, 12));

    let frame = &mock.frames()[0];
    assert_eq!(&frame[5..7], &[0x20, 0x00]);
    assert_eq!(
        &frame[7..],
        &[
            0x99, 0x1C, 0x00, 0x03, 0x21, 0x01, 0x08, 0x60, 0x64, 0x68, 0x6C, 0x70, 0x74, 0x78,
            0x7C
        ]
    );
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_infrared_remote_buttons() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_f32s(&[0.0, 0.0, 0.0, 6.0]);
    mock.queue_f32s(&[0.0, 0.0, 0.0, 0.0]);
    let mut brick = mock.brick();
    let ir = InfraredSensor::new(&mut brick, SensorPort::Two);

    assert_eq!(
        ir.beacon_buttons(BeaconChannel::Four).await.unwrap(),
        vec![BeaconButtons::RedUpper, BeaconButtons::BlueLower]
    );
    assert!(ir.beacon_buttons(BeaconChannel::One).await.unwrap().is_empty());

    assert_eq!(
        mock.ops()[0],
        vec![0x99, 0x1D, 0x00, 0x01, 0x21, 0x02, 0x04, 0x60, 0x64, 0x68, 0x6C]
    );
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_ultrasonic_and_gyro() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_f32s(&[25.5]);
    mock.queue_f32s(&[-90.0]);
    let mut brick = mock.brick();
    let ultrasonic = UltrasonicSensor::new(&mut brick, SensorPort::One);
    let gyro = GyroSensor::new(&mut brick, SensorPort::Two);

    assert_eq!(ultrasonic.distance_cm().await.unwrap(), 25.5);
    assert_eq!(gyro.angle().await.unwrap(), -90.0);

    let ops = mock.ops();
    assert_eq!(ops[0][4], 0x1E);
    assert_eq!(ops[1][4], 0x20);
    assert_eq!(brick.sensor_ports(), vec![SensorPort::One, SensorPort::Two]);
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_generic_sensor_reads_any_type() {
    let mock = MockBrick::new(Protocol::Usb);
    mock.queue_f32s(&[1.5, 2.5]);
    let mut brick = mock.brick();
    let sensor = Sensor::new(&mut brick, SensorPort::Three, 99);

    assert_eq!(sensor.type_number(), 99);
    assert_eq!(sensor.read_si(4, 2).await.unwrap(), vec![1.5, 2.5]);
    assert_eq!(
        mock.ops()[0],
        vec![0x99, 0x1D, 0x00, 0x02, 0x81, 0x63, 0x04, 0x02, 0x60, 0x64]
    );
    brick.close().await.unwrap();
}

#[tokio::test]
async fn test_reusing_a_sensor_port_keeps_one_registration() {
    let mock = MockBrick::new(Protocol::Usb);
    let mut brick = mock.brick();

    let _touch = TouchSensor::new(&mut brick, SensorPort::One);
    let _color = ColorSensor::new(&mut brick, SensorPort::One);

    assert_eq!(brick.sensor_ports(), vec![SensorPort::One]);
    assert!(brick.motor_ports().is_empty());
    brick.close().await.unwrap();
}
