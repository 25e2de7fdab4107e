pub mod get_current_model;
pub mod get_model_versions;
pub mod retrain_model;
pub mod rollback_model;
