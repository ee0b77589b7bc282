pub mod brick;
pub mod connection;
pub mod motor;
pub mod protocol;
pub mod sensor;

pub use crate::domain::model::*;
pub use crate::domain::ports::{ConnectionSettings, Transport};
pub use crate::utils::error::Result;
