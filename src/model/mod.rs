mod backend;
mod pipeline;
mod store;
mod types;

pub mod sampling;

#[cfg(feature = "tch-backend")]
mod tch_backend;

pub use backend::InferenceBackend;
pub use pipeline::generate_text;
pub use store::{BackendLoader, ModelStore};
pub use types::{GenerationParams, GenerationRequest, GenerationResponse};

#[cfg(feature = "tch-backend")]
pub use tch_backend::TchBackend;
