pub mod correction_repository;

pub use correction_repository::InMemoryCorrectionRepository;
