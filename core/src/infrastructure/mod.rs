pub mod feedback;
pub mod food;
pub mod learning;
pub mod llm;
pub mod meal;
pub mod preference;
pub mod profile;
pub mod recognition;
