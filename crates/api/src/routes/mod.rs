pub mod common;
pub mod completions;
pub mod health;
pub mod models;

use services::CompletionService;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub completion_service: Arc<dyn CompletionService>,
}

pub use completions::{chat_completions, completions};
pub use health::health_check;
pub use models::list_models;
