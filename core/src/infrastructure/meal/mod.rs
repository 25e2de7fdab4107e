pub mod repositories;

pub use repositories::InMemoryMealRecordRepository;
