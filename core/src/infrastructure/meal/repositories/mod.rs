pub mod meal_record_repository;

pub use meal_record_repository::InMemoryMealRecordRepository;
