//! Walks the canned legal prompts against the local model and prints each
//! continuation. A prompt that fails is reported and the rest still run.

use legal_llm_service::demo::run_demo;
use legal_llm_service::{AppConfig, TextGenerator};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    println!("Legal LLM demo");
    println!("model dir: {}", config.model_dir.display());
    println!("{}", "=".repeat(50));

    let generator = TextGenerator::new(&config.model_dir, config.device);

    for report in run_demo(&generator) {
        println!();
        println!("{}:", report.category);
        println!("Prompt: '{}'", report.prompt);
        match report.outcome {
            Ok(continuation) => println!("Result: {continuation}"),
            Err(err) => println!("Error: {err}"),
        }
    }

    println!();
    println!("{}", "=".repeat(50));
    println!("Demo complete");

    Ok(())
}
