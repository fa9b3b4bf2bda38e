//! # zkgate-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to a configurable port (default
//! 8080); all toolchain locations come from the environment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use zkgate_api::state::{AppConfig, AppState, Store};
use zkgate_archive::ProofArchive;
use zkgate_pipeline::{ArtifactStore, PipelineOrchestrator, ToolchainConfig, ToolchainExecutor};
use zkgate_verify::{ProofVerifier, SnarkjsChecker, SnarkjsConfig};

fn env_secs(name: &str) -> Option<std::time::Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(std::time::Duration::from_secs)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let auth_token = std::env::var("AUTH_TOKEN").ok();
    if auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication is disabled");
    }
    let config = AppConfig { port, auth_token };

    let data_dir: PathBuf = std::env::var("ZKGATE_DATA_DIR")
        .unwrap_or_else(|_| "./data".to_string())
        .into();
    let tool_dir: PathBuf = std::env::var("ZKGATE_TOOL_DIR")
        .unwrap_or_else(|_| "./tools".to_string())
        .into();
    let verification_key: PathBuf = std::env::var("ZKGATE_VERIFICATION_KEY")
        .map(PathBuf::from)
        .unwrap_or_else(|_| tool_dir.join("verification_key.json"));
    let max_concurrent: usize = std::env::var("ZKGATE_MAX_CONCURRENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4);

    // Pipeline over the external toolchain.
    let store = ArtifactStore::open(&data_dir)
        .with_context(|| format!("opening artifact store at {}", data_dir.display()))?;
    let mut toolchain = ToolchainConfig::with_tool_dir(&tool_dir);
    if let Some(secs) = env_secs("ZKGATE_PREPROCESS_TIMEOUT_SECS") {
        toolchain.preprocess_timeout = secs;
    }
    if let Some(secs) = env_secs("ZKGATE_CIRCUIT_INPUT_TIMEOUT_SECS") {
        toolchain.circuit_input_timeout = secs;
    }
    if let Some(secs) = env_secs("ZKGATE_WITNESS_TIMEOUT_SECS") {
        toolchain.witness_timeout = secs;
    }
    if let Some(secs) = env_secs("ZKGATE_PROVE_TIMEOUT_SECS") {
        toolchain.prove_timeout = secs;
    }
    let executor = Arc::new(ToolchainExecutor::new(toolchain));
    let orchestrator = Arc::new(PipelineOrchestrator::new(store, executor, max_concurrent));

    // Verification service.
    let checker = Arc::new(SnarkjsChecker::new(SnarkjsConfig::with_key(
        &verification_key,
    )));
    let key_available = checker.key_available();
    if !key_available {
        tracing::warn!(
            key = %verification_key.display(),
            "verification key not found; proof checks will report clean failures"
        );
    }
    let verifier = Arc::new(
        ProofVerifier::new(checker, data_dir.join("verify"), key_available)
            .context("creating verification work directory")?,
    );

    let state = AppState {
        orchestrator,
        archive: Arc::new(ProofArchive::new()),
        verifier,
        users: Store::new(),
        config,
    };

    let app = zkgate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("ZKGate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
