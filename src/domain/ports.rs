use crate::domain::model::{Protocol, SyncMode};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A byte channel to one EV3 brick.
///
/// `send` writes one complete direct-command frame. `recv` returns one
/// complete reply frame, length prefix included.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: &[u8]) -> Result<()>;
    async fn recv(&mut self) -> Result<Vec<u8>>;
    async fn close(&mut self) -> Result<()>;
    fn protocol(&self) -> Protocol;
}

pub trait ConnectionSettings: Send + Sync {
    fn protocol(&self) -> Protocol;
    fn device(&self) -> Option<&str>;
    fn host(&self) -> Option<&str>;
    fn serial(&self) -> Option<&str>;
    fn timeout_ms(&self) -> u64;
    fn sync_mode(&self) -> SyncMode {
        SyncMode::default_for(self.protocol())
    }
}
