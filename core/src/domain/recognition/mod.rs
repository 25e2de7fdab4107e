pub mod entities;
pub mod merger;
pub mod normalizer;
pub mod pool;
pub mod ports;
pub mod schema;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use value_objects::*;
