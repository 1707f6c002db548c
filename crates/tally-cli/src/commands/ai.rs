//! Model backend command implementations

use anyhow::Result;
use tally_core::{AIBackend, AIClient, BackendKind, Config};

/// Check that the configured backend answers
pub async fn cmd_ai_check(config: &Config) -> Result<()> {
    println!("🔍 Checking model backend...\n");
    println!("  Backend: {}", config.ai.backend);

    if config.ai.backend == BackendKind::None {
        println!("\n⚠️  No backend configured; categorization uses keyword rules only.");
        println!("\nTo enable one, set TALLY_AI_BACKEND (gemini, ollama, openai_compatible)");
        println!("or the [ai] section of your config file.");
        return Ok(());
    }

    let Some(client) = AIClient::from_config(&config.ai)? else {
        println!("\n⚠️  Backend is not usable (missing API key?); keyword rules will be used.");
        return Ok(());
    };

    println!("  Host:    {}", client.host());
    println!("  Model:   {}", client.model());
    println!();

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!(
            "\n⚠️  Could not reach {} at {}",
            client.backend_name(),
            client.host()
        );
        println!("Categorization will fall back to keyword rules until it is reachable.");
    }

    Ok(())
}
