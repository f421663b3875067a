use std::path::Path;

use parking_lot::Mutex;
use tch::{Device, Kind, Tensor, no_grad};
use tokenizers::Tokenizer;

use crate::error::ServiceError;
use crate::model::{GenerationParams, InferenceBackend, sampling};

const DEFAULT_EOS_TOKEN_ID: i64 = 50256; // GPT-2 <|endoftext|>

/// Tokenizer + TorchScript module bound to one device. Loading is
/// all-or-nothing: any missing artifact or libtorch failure aborts the load
/// and nothing is cached.
///
/// TorchScript modules make no reentrancy promise, so every generation call
/// takes the module mutex; a handle serves one generation at a time.
pub struct TchBackend {
    tokenizer: Tokenizer,
    module: Mutex<tch::CModule>,
    device: Device,
    eos_token_id: i64,
}

impl TchBackend {
    pub fn load(model_dir: &Path, device: Device) -> Result<Self, ServiceError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let module_path = model_dir.join("model.ts");
        if !tokenizer_path.exists() {
            return Err(ServiceError::ModelNotFound(tokenizer_path));
        }
        if !module_path.exists() {
            return Err(ServiceError::ModelNotFound(module_path));
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))?;
        let mut module = tch::CModule::load_on_device(&module_path, device)
            .map_err(|e| ServiceError::Generation(e.to_string()))?;
        module.set_eval();

        let eos_token_id = tokenizer
            .token_to_id("<|endoftext|>")
            .map(i64::from)
            .unwrap_or(DEFAULT_EOS_TOKEN_ID);

        Ok(Self {
            tokenizer,
            module: Mutex::new(module),
            device,
            eos_token_id,
        })
    }

    fn extract_logits(output: tch::IValue) -> Result<Tensor, ServiceError> {
        // A traced causal LM returns either the logits tensor directly or a
        // tuple of (logits, past_key_values).
        match output {
            tch::IValue::Tensor(t) => Ok(t),
            tch::IValue::Tuple(ref tuple) if !tuple.is_empty() => match &tuple[0] {
                tch::IValue::Tensor(t) => Ok(t.shallow_clone()),
                _ => Err(ServiceError::Generation(
                    "expected tensor as first tuple element".into(),
                )),
            },
            _ => Err(ServiceError::Generation(
                "unexpected model output format".into(),
            )),
        }
    }
}

impl InferenceBackend for TchBackend {
    fn encode(&self, text: &str) -> Result<Vec<i64>, ServiceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().iter().map(|&id| i64::from(id)).collect())
    }

    fn generate(
        &self,
        input_ids: &[i64],
        params: &GenerationParams,
    ) -> Result<Vec<i64>, ServiceError> {
        let mut ids = input_ids.to_vec();
        if ids.is_empty() {
            // EOS doubles as the pad token for a single sequence
            ids.push(self.eos_token_id);
        }
        let mut rng = rand::thread_rng();

        no_grad(|| {
            let module = self.module.lock();

            while ids.len() < params.max_length {
                let input_tensor = Tensor::from_slice(&ids)
                    .reshape([1, ids.len() as i64])
                    .to(self.device);

                let output = module
                    .forward_is(&[tch::IValue::Tensor(input_tensor)])
                    .map_err(|e| ServiceError::Generation(e.to_string()))?;
                let logits = Self::extract_logits(output)?;

                // logits shape [1, seq_len, vocab]: take the last position
                let last_logits = logits
                    .select(1, -1)
                    .squeeze()
                    .to_kind(Kind::Float)
                    .to(Device::Cpu);
                let mut row = Vec::<f32>::try_from(&last_logits)
                    .map_err(|e| ServiceError::Generation(e.to_string()))?;

                sampling::apply_repetition_penalty(
                    &mut row,
                    &ids,
                    params.repetition_penalty as f32,
                );
                let next_token_id = sampling::sample_token(&row, params, &mut rng) as i64;

                ids.push(next_token_id);
                if next_token_id == self.eos_token_id {
                    break;
                }
            }

            Ok::<(), ServiceError>(())
        })?;

        Ok(ids)
    }

    fn decode(&self, ids: &[i64]) -> Result<String, ServiceError> {
        let ids: Vec<u32> = ids.iter().map(|&id| id as u32).collect();
        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))
    }
}
