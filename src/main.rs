use std::net::SocketAddr;
use std::sync::Arc;

use hidden_polls::config::Config;
use hidden_polls::db::Database;
use hidden_polls::handlers;
use hidden_polls::voting::PollService;
use log::{error, info};

async fn seed_demo_poll(database: &Database) -> Result<(), hidden_polls::PollError> {
    if database.count_polls().await? > 0 {
        return Ok(());
    }

    let poll = database.insert_poll("Tabs or spaces?", true).await?;
    database.insert_choice(poll.id, "Tabs").await?;
    database.insert_choice(poll.id, "Spaces").await?;
    info!("Seeded demo poll {}", poll.id);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    // Missing configuration is fatal at startup
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let database = match Database::connect(&config.database_url, config.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    if config.seed_demo_poll {
        if let Err(e) = seed_demo_poll(&database).await {
            error!("Failed to seed demo poll: {}", e);
        }
    }

    let service = PollService::new(Arc::new(database));
    let app = handlers::router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Listening on http://{}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {:?}", e);
    }
}
