use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub const MIN_TEMPERATURE: f64 = 0.1;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MIN_MAX_LENGTH: usize = 10;
pub const MAX_MAX_LENGTH: usize = 1000;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_length: Option<usize>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<usize>,
}

impl GenerationRequest {
    /// Rejects out-of-range parameters before anything touches the model.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.prompt.trim().is_empty() {
            return Err(ServiceError::Validation("prompt cannot be empty".into()));
        }
        if let Some(temperature) = self.temperature {
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ServiceError::Validation(format!(
                    "temperature must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}"
                )));
            }
        }
        if let Some(max_length) = self.max_length {
            if !(MIN_MAX_LENGTH..=MAX_MAX_LENGTH).contains(&max_length) {
                return Err(ServiceError::Validation(format!(
                    "max_length must be between {MIN_MAX_LENGTH} and {MAX_MAX_LENGTH}"
                )));
            }
        }
        Ok(())
    }
}

/// The merged parameter set handed to the backend. Built fresh per call:
/// documented defaults overridden field-by-field by the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: usize,
    pub repetition_penalty: f64,
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 200,
            temperature: 0.8,
            top_p: 0.9,
            top_k: 50,
            repetition_penalty: 1.2,
            do_sample: true,
        }
    }
}

impl GenerationParams {
    pub fn merged(request: &GenerationRequest) -> Self {
        let defaults = Self::default();
        Self {
            max_length: request.max_length.unwrap_or(defaults.max_length),
            temperature: request.temperature.unwrap_or(defaults.temperature),
            top_p: request.top_p.unwrap_or(defaults.top_p),
            top_k: request.top_k.unwrap_or(defaults.top_k),
            repetition_penalty: defaults.repetition_penalty,
            do_sample: defaults.do_sample,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub generated_text: String,
    pub prompt: String,
    pub parameters: GenerationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            ..GenerationRequest::default()
        }
    }

    #[test]
    fn blank_prompt_is_rejected() {
        assert!(request("   \n\t").validate().is_err());
        assert!(request("").validate().is_err());
        assert!(request("The court holds that").validate().is_ok());
    }

    #[test]
    fn temperature_bounds_are_enforced() {
        let mut req = request("CONTRACT CLAUSE:");
        req.temperature = Some(0.05);
        assert!(req.validate().is_err());
        req.temperature = Some(2.5);
        assert!(req.validate().is_err());
        req.temperature = Some(0.1);
        assert!(req.validate().is_ok());
        req.temperature = Some(2.0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn max_length_bounds_are_enforced() {
        let mut req = request("LEGAL OPINION:");
        req.max_length = Some(9);
        assert!(req.validate().is_err());
        req.max_length = Some(1001);
        assert!(req.validate().is_err());
        req.max_length = Some(10);
        assert!(req.validate().is_ok());
        req.max_length = Some(1000);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn merge_keeps_defaults_for_unset_fields() {
        let mut req = request("The plaintiff alleges that");
        req.temperature = Some(1.0);
        let params = GenerationParams::merged(&req);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.max_length, 200);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.top_k, 50);
        assert_eq!(params.repetition_penalty, 1.2);
        assert!(params.do_sample);
    }
}
