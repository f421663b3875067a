pub mod config;
pub mod demo;
pub mod error;
pub mod generator;
pub mod model;
pub mod server;

pub use config::AppConfig;
pub use error::ServiceError;
pub use generator::TextGenerator;
pub use model::{GenerationParams, GenerationRequest, GenerationResponse, ModelStore};
pub use server::build_router;
