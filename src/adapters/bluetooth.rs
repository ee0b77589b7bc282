use super::FrameBuffer;
use crate::domain::model::Protocol;
use crate::domain::ports::Transport;
use crate::utils::error::{Ev3Error, Result};
use async_trait::async_trait;
use nix::fcntl::OFlag;
use nix::sys::termios::{self, SetArg};
use std::os::unix::fs::OpenOptionsExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// EV3 over Bluetooth through an RFCOMM serial device.
///
/// Pair the brick first, then bind it, e.g.
/// `rfcomm bind /dev/rfcomm0 00:16:53:5D:7E:2D 1`. The brick's address is
/// listed under Brick Info > ID on the brick.
pub struct BluetoothTransport {
    device: File,
    path: String,
    frames: FrameBuffer,
}

impl BluetoothTransport {
    /// Opens the TTY and switches it to raw mode.
    pub async fn open(path: &str) -> Result<Self> {
        let owned = path.to_string();
        let device = tokio::task::spawn_blocking(move || open_raw(&owned))
            .await
            .map_err(|e| Ev3Error::connection(format!("cannot open {}: {}", path, e)))?
            .map_err(|e| {
                Ev3Error::connection(format!(
                    "cannot open {}: {} (is Bluetooth on and the brick bound?)",
                    path, e
                ))
            })?;

        tracing::info!("📶 Opened Bluetooth device {}", path);
        Ok(Self {
            device: File::from_std(device),
            path: path.to_string(),
            frames: FrameBuffer::default(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn open_raw(path: &str) -> std::io::Result<std::fs::File> {
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NOCTTY.bits())
        .open(path)?;
    set_raw_mode(&file)?;
    Ok(file)
}

/// No newline translation, no echo, reads return as soon as a byte arrives.
fn set_raw_mode(file: &std::fs::File) -> std::io::Result<()> {
    let mut settings = termios::tcgetattr(file)?;
    termios::cfmakeraw(&mut settings);
    termios::tcsetattr(file, SetArg::TCSANOW, &settings)?;
    Ok(())
}

#[async_trait]
impl Transport for BluetoothTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.device.write_all(frame).await?;
        self.device.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        self.frames.read_frame(&mut self.device).await
    }

    async fn close(&mut self) -> Result<()> {
        self.device.flush().await?;
        Ok(())
    }

    fn protocol(&self) -> Protocol {
        Protocol::Bluetooth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt, PtyMaster};
    use std::io::{Read, Write};

    fn open_pty() -> (PtyMaster, String) {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).unwrap();
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let slave = ptsname_r(&master).unwrap();
        (master, slave)
    }

    #[tokio::test]
    async fn test_newline_bytes_pass_through_unchanged() {
        let (mut master, slave) = open_pty();
        let mut transport = BluetoothTransport::open(&slave).await.unwrap();

        // 長度 10 的 frame，開頭就是 0x0A
        let frame = [0x0A, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x94, 0x00, 0x00, 0x00, 0x00];
        transport.send(&frame).await.unwrap();

        let mut received = [0u8; 12];
        master.read_exact(&mut received).unwrap();
        assert_eq!(received, frame);

        let reply = [0x05, 0x00, 0x0A, 0x00, 0x02, 0x0D, 0x0A];
        master.write_all(&reply).unwrap();
        assert_eq!(transport.recv().await.unwrap(), reply.to_vec());
    }

    #[tokio::test]
    async fn test_open_missing_device() {
        let err = BluetoothTransport::open("/dev/does-not-exist-rfcomm")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Ev3Error::ConnectionError { .. }));
    }
}
