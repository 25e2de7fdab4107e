use std::sync::Arc;

use mealwise_core::application::MealwiseService;

use crate::args::Args;

#[derive(Clone)]
pub struct AppState {
    pub args: Arc<Args>,
    pub service: MealwiseService,
}

impl AppState {
    pub fn new(args: Arc<Args>, service: MealwiseService) -> Self {
        Self { args, service }
    }
}
