pub mod advisory;
pub mod feedback;
pub mod health;
pub mod learning;
pub mod meal;
pub mod preference;
pub mod profile;
pub mod recognition;
pub mod recommendation;
pub mod server;
