pub mod reference_database;

pub use reference_database::InMemoryFoodDatabase;
