pub mod repositories;

pub use repositories::InMemoryCorrectionRepository;
