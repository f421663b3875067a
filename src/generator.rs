use crate::error::ServiceError;
use crate::model::{GenerationRequest, GenerationResponse, ModelStore, generate_text};

/// Programmatic entry point: owns a [`ModelStore`] and generates directly,
/// without the HTTP layer. The first `generate` call loads the model; later
/// calls reuse the cached handle.
pub struct TextGenerator {
    store: ModelStore,
}

impl TextGenerator {
    #[cfg(feature = "tch-backend")]
    pub fn new(model_dir: impl Into<std::path::PathBuf>, device: tch::Device) -> Self {
        Self::with_store(ModelStore::new(model_dir, device))
    }

    pub fn with_store(store: ModelStore) -> Self {
        Self { store }
    }

    /// Generates a completion for `prompt` with the documented default
    /// parameters. The returned text starts with the prompt verbatim.
    pub fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            ..GenerationRequest::default()
        };
        Ok(self.generate_with(&request)?.generated_text)
    }

    /// Generation with explicit per-field overrides.
    pub fn generate_with(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ServiceError> {
        let backend = self.store.ensure_loaded()?;
        generate_text(backend.as_ref(), request)
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }
}
