use anyhow::Context;
use clap::Parser;
use client_side_lb::app::server::{serve, shutdown_signal};
use client_side_lb::utils::constants::IMAGE_NAME;
use client_side_lb::utils::error::{ErrorSeverity, LbError};
use client_side_lb::utils::{logger, validation::Validate};
use client_side_lb::{AppState, ServiceConfig, TomlConfig};

fn exit_with(e: &LbError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = ServiceConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);

    if let Some(path) = config.config.clone() {
        tracing::info!("📁 Loading configuration overrides from: {}", path.display());
        match TomlConfig::from_file(&path) {
            Ok(overrides) => overrides.apply_to(&mut config),
            Err(e) => exit_with(&e),
        }
    }

    tracing::info!("🚀 Starting {} ({})", IMAGE_NAME, config.verticle);
    if config.verbose {
        tracing::debug!("Service config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => exit_with(&e),
    };

    let addr = match config.listen_address() {
        Ok(addr) => addr,
        Err(e) => exit_with(&e),
    };
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "✅ HTTP server started on port {}, forwarding to service {} via {:?} balancing",
        config.port,
        config.service_name,
        config.load_balancer
    );

    serve(listener, state, shutdown_signal())
        .await
        .context("HTTP server terminated abnormally")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
