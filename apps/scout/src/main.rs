mod boards;
mod classifier;
mod config;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod scheduler;
mod sink;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::boards::{BoardProbe, Platform};
use crate::config::Config;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::ollama::OllamaClient;
use crate::pipeline::Pipeline;
use crate::scheduler::run_scheduler;
use crate::sink::OutputSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing backend secrets)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scout v{}", env!("CARGO_PKG_VERSION"));

    // Initialize generative backends
    let gemini = GeminiClient::new(config.google_api_key.clone());
    info!("Gemini client initialized (model: {})", llm_client::gemini::MODEL);

    let ollama = OllamaClient::new(&config.ollama_host, config.ollama_api_key.clone());
    info!(
        "Ollama client initialized (model: {}, host: {})",
        llm_client::ollama::MODEL,
        config.ollama_host
    );

    // Initialize board probes
    let greenhouse = BoardProbe::new(Platform::Greenhouse, config.max_in_flight);
    let lever = BoardProbe::new(Platform::Lever, config.max_in_flight);
    info!(max_in_flight = config.max_in_flight, "Board probes initialized");

    let pipeline = Pipeline {
        fetchers: vec![Arc::new(gemini), Arc::new(ollama)],
        greenhouse,
        lever,
        sink: OutputSink::new(&config.output_dir),
        exclusions: Vec::new(),
    };
    info!("Writing output to {}", config.output_dir.display());

    let counters = run_scheduler(&pipeline, config.interval, shutdown_signal()).await;

    info!(
        cycles = counters.cycle_count,
        total_fetched = counters.total_candidates_fetched,
        "Scout stopped"
    );
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the process runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
