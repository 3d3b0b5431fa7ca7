use anyhow::Result;

use sitecost_backend::{app, config, db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting sitecost backend"
    );

    // Create database pool
    let pool = db::create_pool(&settings).await?;

    if settings.run_migrations {
        db::run_migrations(&pool).await?;
    }

    // Create application state
    let state = app::AppState::new(pool, settings.clone());

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
