use crate::error::ServiceError;
use crate::model::{GenerationParams, GenerationRequest, GenerationResponse, InferenceBackend};

/// Runs one prompt through the backend: merge parameters, encode, generate,
/// decode. No retries, no caching; sampling is stochastic so identical calls
/// are regenerated from scratch every time.
///
/// The decoded text includes the prompt verbatim followed by the
/// continuation. Callers that only want the continuation strip the prefix
/// themselves; the pipeline never does.
pub fn generate_text(
    backend: &dyn InferenceBackend,
    request: &GenerationRequest,
) -> Result<GenerationResponse, ServiceError> {
    let parameters = GenerationParams::merged(request);

    let input_ids = backend.encode(&request.prompt)?;
    let output_ids = backend.generate(&input_ids, &parameters)?;
    let generated_text = backend.decode(&output_ids)?;

    Ok(GenerationResponse {
        generated_text,
        prompt: request.prompt.clone(),
        parameters,
    })
}
