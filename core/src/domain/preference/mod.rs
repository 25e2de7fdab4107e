pub mod entities;
pub mod ports;
pub mod services;
pub mod statistics;
pub mod store;
pub mod tokenizer;
pub mod trainer;

pub use entities::*;
pub use ports::*;
