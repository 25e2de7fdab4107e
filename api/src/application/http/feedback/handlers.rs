pub mod get_feedback;
pub mod record_feedback;
