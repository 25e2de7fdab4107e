pub mod repositories;

pub use repositories::InMemoryPreferenceModelRepository;
