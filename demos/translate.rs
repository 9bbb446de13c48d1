//! Translate a phrase with the configured backends and show the fallback trail.
//!
//! Usage: cargo run --example translate -- <target-lang> <text...>

use polytrans::{Orchestrator, TranslationError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", polytrans::NAME).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let target = args.next().unwrap_or_else(|| "es".to_string());
    let text = args.collect::<Vec<_>>().join(" ");
    let text = if text.is_empty() { "Hello, world!".to_string() } else { text };

    let translator = Orchestrator::from_env()?;
    println!("Backends: {}", translator.backend_names().join(" -> "));

    match translator.translate(&text, &target, None).await {
        Ok(outcome) => {
            for (backend, error) in outcome.errors.iter() {
                println!("  {} failed: {}", backend, error);
            }
            let result = outcome.into_inner();
            println!("[{}] {}", result.backend, result.translation);
        }
        Err(TranslationError::AllFailed(failure)) => {
            for (backend, error) in failure.errors.iter() {
                println!("  {} failed: {}", backend, error);
            }
            anyhow::bail!("no backend could translate the text");
        }
        Err(e) => return Err(e.into()),
    }

    match translator.detect_language(&text).await {
        Ok(outcome) => println!("Detected: {} via {}", outcome.result.language, outcome.result.backend),
        Err(e) => println!("Detection failed: {}", e),
    }

    translator.dispose();
    Ok(())
}
