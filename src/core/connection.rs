use crate::core::protocol::{decode_reply, encode_frame, Command};
use crate::domain::model::{Protocol, SyncMode};
use crate::domain::ports::Transport;
use crate::utils::error::{Ev3Error, Result};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Frames direct commands onto a transport and matches replies by counter.
pub struct Connection {
    transport: Box<dyn Transport>,
    counter: u16,
    sync_mode: SyncMode,
    timeout: Duration,
}

impl Connection {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let sync_mode = SyncMode::default_for(transport.protocol());
        Self {
            transport,
            counter: 0,
            sync_mode,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn protocol(&self) -> Protocol {
        self.transport.protocol()
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Sends `command` and returns the global memory the brick filled in.
    /// The result is empty when no reply was requested.
    pub async fn send_direct_cmd(&mut self, command: &Command) -> Result<Vec<u8>> {
        let counter = self.next_counter();
        let wants_reply = command.global_mem() > 0 || self.sync_mode == SyncMode::Sync;
        let frame = encode_frame(counter, wants_reply, command)?;

        tracing::debug!(
            counter,
            ops = command.ops().len(),
            global_mem = command.global_mem(),
            "sending direct command"
        );
        tracing::trace!("frame {:02X?}", frame);

        self.transport.send(&frame).await?;

        if !wants_reply {
            return Ok(Vec::new());
        }

        let timeout = self.timeout;
        let payload = tokio::time::timeout(timeout, self.await_reply(counter))
            .await
            .map_err(|_| Ev3Error::TimeoutError {
                operation: format!("reply to direct command #{}", counter),
                millis: timeout.as_millis() as u64,
            })??;

        let expected = command.global_mem() as usize;
        if payload.len() < expected {
            return Err(Ev3Error::protocol(format!(
                "reply #{} carries {} bytes, expected {}",
                counter,
                payload.len(),
                expected
            )));
        }

        Ok(payload[..expected].to_vec())
    }

    async fn await_reply(&mut self, counter: u16) -> Result<Vec<u8>> {
        loop {
            let raw = self.transport.recv().await?;
            tracing::trace!("reply {:02X?}", raw);
            let reply = decode_reply(&raw)?;

            if reply.counter != counter {
                // 舊指令遲到的回覆，丟掉繼續等
                tracing::debug!(
                    expected = counter,
                    received = reply.counter,
                    "discarding stale reply"
                );
                continue;
            }

            if !reply.ok {
                return Err(Ev3Error::DirectCommandFailed { counter });
            }
            return Ok(reply.payload);
        }
    }

    fn next_counter(&mut self) -> u16 {
        let current = self.counter;
        self.counter = self.counter.wrapping_add(1);
        current
    }

    pub async fn close(&mut self) -> Result<()> {
        tracing::info!("🔌 Closing {} connection", self.transport.protocol());
        self.transport.close().await
    }
}
