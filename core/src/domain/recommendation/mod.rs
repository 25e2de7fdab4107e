pub mod combination;
pub mod engine;
pub mod entities;
pub mod fusion;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use value_objects::*;
