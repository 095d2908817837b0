use std::net::SocketAddr;
use std::sync::Arc;

use ai_advisor::advisor::{Coordinator, app};
use ai_advisor::config::AppConfig;
use ai_advisor::llm::create_provider;

#[tokio::main]
async fn main() -> ai_advisor::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export GEMINI_API_KEY=...");
            return Err(e.into());
        }
    };

    let llm = create_provider(&config.llm)?;
    let coordinator = Arc::new(Coordinator::new(llm, config.workflow.clone()));
    let app = app(coordinator, &config.server.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    eprintln!("💰 AI Advisor v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Chat page: http://{addr}/");
    eprintln!("   Chat stream: http://{addr}/chat");
    eprintln!("   Workflow API: http://{addr}/api/workflow/status\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(port = config.server.port, "AI Advisor server started");
    axum::serve(listener, app).await?;

    Ok(())
}
