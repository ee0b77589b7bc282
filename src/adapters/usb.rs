use crate::domain::model::Protocol;
use crate::domain::ports::Transport;
use crate::utils::error::{Ev3Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const EV3_VENDOR_ID: u32 = 0x0694;
pub const EV3_PRODUCT_ID: u32 = 0x0005;

/// The brick exchanges fixed-size HID reports.
pub const REPORT_SIZE: usize = 1024;

const HIDRAW_CLASS: &str = "/sys/class/hidraw";

/// EV3 over USB, through the Linux hidraw interface.
pub struct UsbTransport {
    device: File,
    path: PathBuf,
}

impl UsbTransport {
    /// Opens `path`, or the first hidraw node that belongs to an EV3.
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => find_device(Path::new(HIDRAW_CLASS)).await?,
        };

        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| {
                Ev3Error::connection(format!("cannot open {}: {}", path.display(), e))
            })?;

        tracing::info!("🔌 Opened EV3 HID device {}", path.display());
        Ok(Self { device, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for UsbTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > REPORT_SIZE {
            return Err(Ev3Error::protocol(format!(
                "frame of {} bytes does not fit a {} byte report",
                frame.len(),
                REPORT_SIZE
            )));
        }

        // 第一個 byte 是 report id (0)
        let mut report = vec![0u8; REPORT_SIZE + 1];
        report[1..=frame.len()].copy_from_slice(frame);
        self.device.write_all(&report).await?;
        self.device.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        let mut report = vec![0u8; REPORT_SIZE];
        let n = self.device.read(&mut report).await?;
        if n < 2 {
            return Err(Ev3Error::protocol(format!("HID report of {} bytes", n)));
        }

        let length = u16::from_le_bytes([report[0], report[1]]) as usize + 2;
        report.truncate(length.min(n));
        Ok(report)
    }

    async fn close(&mut self) -> Result<()> {
        self.device.flush().await?;
        Ok(())
    }

    fn protocol(&self) -> Protocol {
        Protocol::Usb
    }
}

/// Scans `class_dir` (normally `/sys/class/hidraw`) for an EV3.
pub async fn find_device(class_dir: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(class_dir).await.map_err(|e| {
        Ev3Error::connection(format!("cannot list {}: {}", class_dir.display(), e))
    })?;

    while let Some(entry) = entries.next_entry().await? {
        let uevent = entry.path().join("device").join("uevent");
        let Ok(contents) = tokio::fs::read_to_string(&uevent).await else {
            continue;
        };

        if is_ev3_uevent(&contents) {
            let node = Path::new("/dev").join(entry.file_name());
            tracing::debug!("Found EV3 at {}", node.display());
            return Ok(node);
        }
    }

    Err(Ev3Error::connection(
        "no EV3 brick found on USB; is it switched on and plugged in?",
    ))
}

/// Matches `HID_ID=<bus>:<vendor>:<product>` against the EV3 ids.
pub fn is_ev3_uevent(contents: &str) -> bool {
    contents
        .lines()
        .filter_map(|line| line.strip_prefix("HID_ID="))
        .any(|id| {
            let mut parts = id.split(':').skip(1);
            let vendor = parts.next().and_then(|v| u32::from_str_radix(v, 16).ok());
            let product = parts.next().and_then(|p| u32::from_str_radix(p, 16).ok());
            vendor == Some(EV3_VENDOR_ID) && product == Some(EV3_PRODUCT_ID)
        })
}
