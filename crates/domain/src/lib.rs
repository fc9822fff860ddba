pub mod entities;
pub mod ports;
pub mod repositories;

pub use entities::*;
pub use gateway_errors::{GatewayError, GatewayResult};
pub use ports::*;
pub use repositories::*;
