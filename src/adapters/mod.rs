// Adapters layer: concrete transports to the brick (USB HID, Bluetooth RFCOMM, Wi-Fi TCP).

pub mod bluetooth;
pub mod usb;
pub mod wifi;

use crate::core::connection::Connection;
use crate::domain::model::Protocol;
use crate::domain::ports::{ConnectionSettings, Transport};
use crate::utils::error::{Ev3Error, Result};
use crate::utils::validation::validate_required_field;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Opens the transport described by `settings` and wraps it in a [`Connection`].
pub async fn connect<C: ConnectionSettings + ?Sized>(settings: &C) -> Result<Connection> {
    let protocol = settings.protocol();
    tracing::info!("🔗 Connecting to EV3 over {}", protocol);

    let transport: Box<dyn Transport> = match protocol {
        Protocol::Usb => Box::new(usb::UsbTransport::open(settings.device()).await?),
        Protocol::Bluetooth => {
            let device = settings.device();
            let device = validate_required_field("connection.device", &device)?;
            Box::new(bluetooth::BluetoothTransport::open(device).await?)
        }
        Protocol::Wifi => match settings.host() {
            Some(host) => {
                let serial = settings.serial();
                let serial = validate_required_field("connection.serial", &serial)?;
                Box::new(wifi::WifiTransport::connect(host, serial).await?)
            }
            None => Box::new(wifi::WifiTransport::discover(settings.serial(), None).await?),
        },
    };

    tracing::info!("✅ Connected over {}", protocol);
    Ok(Connection::new(transport)
        .with_sync_mode(settings.sync_mode())
        .with_timeout(Duration::from_millis(settings.timeout_ms())))
}

/// Collects bytes from a stream and hands out complete length-prefixed frames.
///
/// Bytes already read stay buffered when `read_frame` is dropped mid-frame
/// (e.g. by a reply timeout), so the next call resumes at the same position.
#[derive(Debug, Default)]
pub(crate) struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub(crate) async fn read_frame<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<Vec<u8>> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(frame);
            }

            let mut chunk = [0u8; 1024];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(Ev3Error::connection("the brick closed the connection"));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn take_frame(&mut self) -> Option<Vec<u8>> {
        if self.buf.len() < 2 {
            return None;
        }
        let total = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize + 2;
        if self.buf.len() < total {
            return None;
        }
        Some(self.buf.drain(..total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_read_frame_splits_stream() {
        let data: &[u8] = &[0x03, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x02, 0x00, 0x02, 0x2A];
        let mut reader = data;

        let mut frames = FrameBuffer::default();

        let first = frames.read_frame(&mut reader).await.unwrap();
        let second = frames.read_frame(&mut reader).await.unwrap();

        assert_eq!(first, vec![0x03, 0x00, 0x01, 0x00, 0x02]);
        assert_eq!(second, vec![0x04, 0x00, 0x02, 0x00, 0x02, 0x2A]);
    }

    #[tokio::test]
    async fn test_read_frame_reports_closed_stream() {
        let data: &[u8] = &[0x05, 0x00, 0x01];
        let mut reader = data;

        let err = FrameBuffer::default()
            .read_frame(&mut reader)
            .await
            .unwrap_err();
        assert!(matches!(err, Ev3Error::ConnectionError { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_frame_survives_timeout() {
        let (mut brick, mut host) = tokio::io::duplex(64);
        let mut frames = FrameBuffer::default();

        brick.write_all(&[0x04, 0x00]).await.unwrap();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), frames.read_frame(&mut host)).await;
        assert!(timed_out.is_err());

        brick
            .write_all(&[0x00, 0x00, 0x02, 0x2A, 0x03, 0x00, 0x01, 0x00, 0x02])
            .await
            .unwrap();

        let late = frames.read_frame(&mut host).await.unwrap();
        let next = frames.read_frame(&mut host).await.unwrap();
        assert_eq!(late, vec![0x04, 0x00, 0x00, 0x00, 0x02, 0x2A]);
        assert_eq!(next, vec![0x03, 0x00, 0x01, 0x00, 0x02]);
    }
}
