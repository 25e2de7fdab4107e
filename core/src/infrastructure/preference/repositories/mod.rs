pub mod preference_model_repository;

pub use preference_model_repository::InMemoryPreferenceModelRepository;
