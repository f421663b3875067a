use crate::error::ServiceError;
use crate::generator::TextGenerator;
use crate::model::GenerationRequest;

/// The canned prompts the demo binary walks through.
pub const DEMO_PROMPTS: [(&str, &str); 5] = [
    ("Contract Law", "CONTRACT CLAUSE: The parties agree that"),
    ("Tort Law", "The plaintiff alleges that"),
    ("Constitutional Law", "Pursuant to the First Amendment"),
    ("Case Summary", "CASE SUMMARY: Smith v. Johnson"),
    ("Legal Opinion", "LEGAL OPINION: The court holds that"),
];

const DEMO_MAX_LENGTH: usize = 100;
const DEMO_TEMPERATURE: f64 = 0.8;
const DISPLAY_LIMIT: usize = 150;

pub struct PromptReport {
    pub category: &'static str,
    pub prompt: &'static str,
    pub outcome: Result<String, ServiceError>,
}

/// Runs every demo prompt and collects one report per prompt. A failing
/// prompt is reported in place and never aborts the remaining ones.
pub fn run_demo(generator: &TextGenerator) -> Vec<PromptReport> {
    DEMO_PROMPTS
        .iter()
        .map(|&(category, prompt)| {
            let request = GenerationRequest {
                prompt: prompt.to_string(),
                max_length: Some(DEMO_MAX_LENGTH),
                temperature: Some(DEMO_TEMPERATURE),
                ..GenerationRequest::default()
            };
            let outcome = generator
                .generate_with(&request)
                .map(|response| display_continuation(&response.generated_text, prompt));
            PromptReport {
                category,
                prompt,
                outcome,
            }
        })
        .collect()
}

/// Display-only trim: drop the echoed prompt prefix and cap the continuation
/// at 150 characters.
pub fn display_continuation(generated: &str, prompt: &str) -> String {
    let continuation = generated.strip_prefix(prompt).unwrap_or(generated).trim();
    if continuation.chars().count() > DISPLAY_LIMIT {
        let mut truncated: String = continuation.chars().take(DISPLAY_LIMIT).collect();
        truncated.push_str("...");
        truncated
    } else {
        continuation.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{GenerationParams, InferenceBackend, ModelStore};

    /// Byte-level echo backend that refuses one specific prompt.
    struct FlakyBackend {
        poison: &'static str,
    }

    impl InferenceBackend for FlakyBackend {
        fn encode(&self, text: &str) -> Result<Vec<i64>, ServiceError> {
            Ok(text.bytes().map(i64::from).collect())
        }

        fn generate(
            &self,
            input_ids: &[i64],
            _: &GenerationParams,
        ) -> Result<Vec<i64>, ServiceError> {
            let prompt: String = input_ids.iter().map(|&id| id as u8 as char).collect();
            if prompt.contains(self.poison) {
                return Err(ServiceError::Generation("out of memory".into()));
            }
            let mut ids = input_ids.to_vec();
            ids.extend(" the parties shall comply".bytes().map(i64::from));
            Ok(ids)
        }

        fn decode(&self, ids: &[i64]) -> Result<String, ServiceError> {
            Ok(ids.iter().map(|&id| id as u8 as char).collect())
        }
    }

    fn flaky_generator(dir: &tempfile::TempDir, poison: &'static str) -> TextGenerator {
        let store = ModelStore::with_loader(
            dir.path(),
            Box::new(move |_| Ok(Arc::new(FlakyBackend { poison }) as Arc<dyn InferenceBackend>)),
        );
        TextGenerator::with_store(store)
    }

    #[test]
    fn one_failing_prompt_does_not_abort_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let generator = flaky_generator(&dir, "Smith v. Johnson");
        let reports = run_demo(&generator);

        assert_eq!(reports.len(), DEMO_PROMPTS.len());
        let failures: Vec<_> = reports.iter().filter(|r| r.outcome.is_err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].category, "Case Summary");
        for report in reports.iter().filter(|r| r.outcome.is_ok()) {
            assert_eq!(report.outcome.as_ref().unwrap(), "the parties shall comply");
        }
    }

    #[test]
    fn display_strips_prompt_and_truncates() {
        let prompt = "The plaintiff alleges that";
        let long_tail = "x".repeat(400);
        let generated = format!("{prompt} {long_tail}");
        let shown = display_continuation(&generated, prompt);
        assert_eq!(shown.chars().count(), 153); // 150 chars + "..."
        assert!(shown.ends_with("..."));
        assert!(!shown.starts_with(prompt));
    }
}
