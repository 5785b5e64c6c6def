pub mod completions;
pub mod inference_provider_pool;
pub mod models;

pub use completions::{CompletionRouter, CompletionService};
pub use inference_provider_pool::InferenceProviderPool;
pub use models::ModelRegistry;
