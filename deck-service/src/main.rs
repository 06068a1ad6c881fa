use anyhow::Context;
use deck_service::api;
use deck_service::config::ServiceConfig;
use deck_service::dialects::DialectKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deck_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FEA Deck Service");

    let config = ServiceConfig::from_env();
    std::fs::create_dir_all(&config.scratch_dir)
        .with_context(|| format!("creating scratch directory {:?}", config.scratch_dir))?;
    tracing::info!("Scratch directory: {:?}", config.scratch_dir);

    for kind in DialectKind::ALL {
        let exe = config.executable(kind);
        match std::process::Command::new(&exe).arg("-v").output() {
            Ok(_) => tracing::info!("{} solver found: {}", kind, exe),
            Err(e) => tracing::warn!(
                "{} solver '{}' not accessible ({}); decks can be written but runs will fail",
                kind,
                exe,
                e
            ),
        }
    }

    let addr = config.addr();
    let app = api::create_router(config);

    tracing::info!("Listening on {}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/v1/version");
    tracing::info!("  GET  /api/v1/dialects");
    tracing::info!("  POST /api/v1/validate");
    tracing::info!("  POST /api/v1/deck");
    tracing::info!("  POST /api/v1/analyze");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
