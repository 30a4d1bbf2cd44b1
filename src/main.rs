//! Host orchestrator entry point.

use std::process::ExitCode;

use host_orchestrator::{lifecycle, observability, OrchestratorConfig};

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_logging();

    tracing::info!("host-orchestrator v{} starting", env!("CARGO_PKG_VERSION"));

    let config = OrchestratorConfig::from_env();
    tracing::info!(
        socket_path = %config.socket_path.display(),
        http_port = %config.http_port,
        https_port = ?config.https_port,
        web_ui_url = ?config.web_ui_url,
        artifacts_root = %config.paths.root_dir.display(),
        "Configuration loaded"
    );

    let outcome = host_orchestrator::run(config).await;
    ExitCode::from(lifecycle::exit::report(&outcome))
}
