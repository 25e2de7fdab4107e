pub mod entities;
pub mod gate;
pub mod registry;

pub use entities::*;
