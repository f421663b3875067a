use crate::error::ServiceError;
use crate::model::GenerationParams;

/// Capability surface of a loaded causal LM. The pipeline only ever talks to
/// the model through these three operations, so the inference runtime stays
/// swappable (and mockable in tests).
pub trait InferenceBackend: Send + Sync {
    /// Text to token ids.
    fn encode(&self, text: &str) -> Result<Vec<i64>, ServiceError>;

    /// Autoregressive completion. Takes the prompt ids, returns the full
    /// sequence with the prompt ids still at the front.
    fn generate(
        &self,
        input_ids: &[i64],
        params: &GenerationParams,
    ) -> Result<Vec<i64>, ServiceError>;

    /// Token ids back to text, special tokens stripped.
    fn decode(&self, ids: &[i64]) -> Result<String, ServiceError>;
}

impl std::fmt::Debug for dyn InferenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InferenceBackend")
    }
}
