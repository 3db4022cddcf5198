//! Service entry point.

use std::sync::Arc;
use taskdesk::{
    auth::jwt::JwtService,
    bootstrap,
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    routes,
    services::{
        AnalyticsService, AuthService, DisabledDirectory, Notifier, ReminderLoop,
        SettingsService, TaskService,
    },
    telemetry,
};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("taskdesk {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // .env loading is a development convenience; production sets real
    // environment variables.
    if let Ok(profile) = std::env::var("TASKDESK_ENV") {
        dotenv::from_filename(format!(".env.{}", profile)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Taskdesk starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    bootstrap::run(&db_pool).await?;

    let jwt_service = Arc::new(JwtService::from_config(&config)?);
    let directory: Arc<dyn taskdesk::services::Directory> = Arc::new(DisabledDirectory);
    let notifier = Arc::new(Notifier::new(db_pool.clone(), config.notifier.clone()));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_pool.clone(),
        auth_service: Arc::new(AuthService::new(
            db_pool.clone(),
            jwt_service.clone(),
            directory.clone(),
            Arc::new(config.clone()),
        )),
        task_service: Arc::new(TaskService::new(db_pool.clone(), notifier.clone())),
        analytics_service: Arc::new(AnalyticsService::new(db_pool.clone())),
        settings_service: Arc::new(SettingsService::new(db_pool.clone())),
        notifier: notifier.clone(),
        directory,
        jwt_service,
    });

    if config.reminder.enabled {
        let reminder = ReminderLoop::new(db_pool.clone(), notifier, config.reminder.clone());
        tokio::spawn(reminder.run());
    }

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            config.server.graceful_shutdown_timeout_secs,
        ))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
    tracing::warn!("Graceful shutdown timeout reached, forcing exit");
}

fn print_help() {
    println!("taskdesk {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: taskdesk [options]");
    println!();
    println!("Options:");
    println!("  --version     Print version information and exit");
    println!("  --help        Print this help and exit");
    println!();
    println!("Environment:");
    println!("  All configuration is read from TASKDESK_* environment variables");
    println!("  See .env.example for available settings");
}
