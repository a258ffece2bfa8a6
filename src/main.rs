use clap::{Parser, Subcommand};
use std::{net::SocketAddr, process::ExitCode, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use offer_api::{
    config::Config,
    create_router,
    db::Database,
    middleware::init_tracing,
    migration::SchemaManager,
    OfferRepository, SchemaError,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Offer listing service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Manage the offers table
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateAction {
    /// Create the offers table
    Up,
    /// Drop the offers table
    Down,
    /// Show whether the offers table exists and its columns
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.environment) {
        eprintln!("Failed to initialize tracing: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Configuration loaded successfully");

    let database = match Database::new(config.database.clone()).await {
        Ok(db) => {
            info!("Database connection established");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, database).await,
        Command::Migrate { action } => migrate(action, &database).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn migrate(action: MigrateAction, database: &Database) -> anyhow::Result<()> {
    let manager = SchemaManager::new(database.schema_catalog());

    match action {
        MigrateAction::Up => manager.apply().await?,
        MigrateAction::Down => manager.revert().await?,
        MigrateAction::Status => {
            let status = manager.status().await?;
            println!("{} {}", status.version, status.description);
            match status.columns {
                Some(columns) => {
                    println!("applied");
                    for column in columns {
                        println!(
                            "  {} {}{}{}",
                            column.name,
                            column.column_type,
                            if column.primary_key { " PRIMARY KEY" } else { "" },
                            if column.nullable { " NULL" } else { " NOT NULL" },
                        );
                    }
                }
                None => println!("not applied"),
            }
        }
    }

    Ok(())
}

async fn serve(config: Config, database: Database) -> anyhow::Result<()> {
    if config.run_migrations {
        match SchemaManager::new(database.schema_catalog()).apply().await {
            Ok(()) => info!("Database migrations completed successfully"),
            Err(SchemaError::Conflict { table }) => {
                info!("Table '{}' already exists, skipping migration", table)
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        info!("RUN_MIGRATIONS is off; expecting the offers table to exist");
    }

    let repository: Arc<dyn OfferRepository> = Arc::new(database);
    let app = create_router(repository, config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
