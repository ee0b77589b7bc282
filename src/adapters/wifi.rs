use super::FrameBuffer;
use crate::domain::model::Protocol;
use crate::domain::ports::Transport;
use crate::utils::error::{Ev3Error, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// UDP port on which bricks with a Wi-Fi dongle announce themselves.
pub const DISCOVERY_PORT: u16 = 3015;
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

const UNLOCK_REPLY: &[u8] = b"Accept:EV340";
const UNLOCK_REPLY_LEN: usize = 16;

/// The announcement a brick broadcasts every few seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub serial: String,
    pub port: u16,
    pub name: String,
    pub protocol: String,
    pub source: SocketAddr,
}

impl Beacon {
    pub fn tcp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.source.ip(), self.port)
    }
}

/// Parses `Serial-Number: …\r\nPort: …\r\nName: …\r\nProtocol: EV3\r\n`.
pub fn parse_beacon(text: &str, source: SocketAddr) -> Option<Beacon> {
    let mut serial = None;
    let mut port = None;
    let mut name = None;
    let mut protocol = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Serial-Number" => serial = Some(value.to_string()),
            "Port" => port = value.parse().ok(),
            "Name" => name = Some(value.to_string()),
            "Protocol" => protocol = Some(value.to_string()),
            _ => {}
        }
    }

    Some(Beacon {
        serial: serial?,
        port: port?,
        name: name.unwrap_or_default(),
        protocol: protocol?,
        source,
    })
}

/// EV3 over Wi-Fi (TCP after a UDP discovery handshake).
pub struct WifiTransport {
    stream: TcpStream,
    serial: String,
    frames: FrameBuffer,
}

impl WifiTransport {
    /// Waits for a brick's beacon, optionally one with the given serial number,
    /// and connects to it.
    pub async fn discover(serial: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT);
        let socket = UdpSocket::bind(("0.0.0.0", DISCOVERY_PORT)).await.map_err(|e| {
            Ev3Error::connection(format!("cannot listen on UDP {}: {}", DISCOVERY_PORT, e))
        })?;

        tracing::info!("📡 Waiting for an EV3 beacon on UDP {}", DISCOVERY_PORT);
        let beacon = tokio::time::timeout(timeout, wait_for_beacon(&socket, serial))
            .await
            .map_err(|_| Ev3Error::TimeoutError {
                operation: "EV3 Wi-Fi beacon".to_string(),
                millis: timeout.as_millis() as u64,
            })??;

        tracing::info!(
            "Found brick '{}' ({}) at {}",
            beacon.name,
            beacon.serial,
            beacon.source.ip()
        );

        // 回一個 byte，brick 才會開 TCP port
        socket.send_to(b" ", beacon.source).await?;

        let addr = beacon.tcp_addr().to_string();
        Self::connect(&addr, &beacon.serial).await
    }

    /// Connects directly to `addr` (`ip:port`) and unlocks the brick with its serial number.
    pub async fn connect(addr: &str, serial: &str) -> Result<Self> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Ev3Error::connection(format!("failed to connect to {}: {}", addr, e)))?;

        unlock(&mut stream, serial).await?;
        tracing::info!("📶 Connected to EV3 {} at {}", serial, addr);

        Ok(Self {
            stream,
            serial: serial.to_string(),
            frames: FrameBuffer::default(),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }
}

async fn wait_for_beacon(socket: &UdpSocket, serial: Option<&str>) -> Result<Beacon> {
    let mut buf = [0u8; 256];
    loop {
        let (n, source) = socket.recv_from(&mut buf).await?;
        let text = String::from_utf8_lossy(&buf[..n]);

        let Some(beacon) = parse_beacon(&text, source) else {
            tracing::debug!("Ignoring datagram from {}", source);
            continue;
        };

        if beacon.protocol != "EV3" {
            continue;
        }
        if let Some(wanted) = serial {
            if !beacon.serial.eq_ignore_ascii_case(wanted) {
                tracing::debug!("Skipping brick {}", beacon.serial);
                continue;
            }
        }
        return Ok(beacon);
    }
}

async fn unlock<S>(stream: &mut S, serial: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!("GET /target?sn={} VMTP1.0\r\nProtocol: EV3", serial);
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let mut reply = [0u8; UNLOCK_REPLY_LEN];
    stream.read_exact(&mut reply).await?;
    if !reply.starts_with(UNLOCK_REPLY) {
        return Err(Ev3Error::connection(format!(
            "brick refused the connection: {:?}",
            String::from_utf8_lossy(&reply).trim()
        )));
    }
    Ok(())
}

#[async_trait]
impl Transport for WifiTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        self.frames.read_frame(&mut self.stream).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    fn protocol(&self) -> Protocol {
        Protocol::Wifi
    }
}
