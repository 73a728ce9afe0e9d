use clap::Parser;
use sqlchat::ai_sql::{PromptGenerator, QueryPipeline, StatementGuard, create_ai_client};
use sqlchat::cli::Args;
use sqlchat::config::Config;
use sqlchat::database::DatabaseClient;
use sqlchat::database_mysql::MySqlClient;
use sqlchat::logging;
use sqlchat::password_sanitizer::sanitize_text_for_logging;
use sqlchat::server::{AppState, router};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    // A missing .env file is fine; real environment variables still apply
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;

    let _log_guard = logging::init(&config.logging)?;
    info!("Starting sqlchat with {:?}", args);

    let schema = config.ai_sql.schema_descriptor()?;
    let provider = create_ai_client(&config.ai_sql)?;
    let guard = StatementGuard::from_read_only(config.ai_sql.read_only);
    if config.ai_sql.read_only {
        info!("Read-only statement guard enabled");
    } else {
        warn!("Generated SQL is executed without validation (ai_sql.read_only = false)");
    }

    let database: Arc<dyn DatabaseClient> = match MySqlClient::connect(&config.database).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(
                "Failed to connect to MySQL: {}",
                sanitize_text_for_logging(&e.to_string())
            );
            return Err(e.into());
        }
    };

    let pipeline = Arc::new(QueryPipeline::new(
        provider,
        Arc::clone(&database),
        PromptGenerator::new(schema),
        guard,
    ));
    info!("Using {} for SQL generation", pipeline.provider_name());

    let app = router(
        AppState::new(pipeline, Arc::clone(&database)),
        config.server.cors_permissive,
    );

    let bind_addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server running on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
