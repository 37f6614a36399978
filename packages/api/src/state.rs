use std::sync::Arc;

use promptgate_core::PromptService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PromptService>,
}

impl AppState {
    pub fn new(service: PromptService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
