pub mod feedback_repository;

pub use feedback_repository::InMemoryFeedbackRepository;
