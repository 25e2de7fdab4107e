pub mod get_learning_snapshot;
