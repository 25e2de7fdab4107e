pub mod entities;
pub mod optimizer;
pub mod ports;
pub mod services;

pub use entities::*;
pub use ports::*;
