pub mod advisory;
pub mod common;
pub mod events;
pub mod feedback;
pub mod food;
pub mod learning;
pub mod meal;
pub mod preference;
pub mod profile;
pub mod recognition;
pub mod recommendation;
pub mod validation;
