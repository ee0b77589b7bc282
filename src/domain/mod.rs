// Domain layer: device enums, value types and the transport port.

pub mod model;
pub mod ports;
