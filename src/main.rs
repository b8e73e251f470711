use chrono::Utc;
use clap::Parser;
use ecosentry::adapters::start_api_server;
use ecosentry::app::App;
use ecosentry::cli::{Cli, Commands};
use ecosentry::config::{AppConfig, LoggingConfig};
use ecosentry::error::{Result, SentryError};
use ecosentry::services::CycleStatus;
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir)?;

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => {
            let _guard = init_logging(&config.logging);
            run_service(config).await
        }
        Commands::Report { json } => {
            init_logging_simple();
            run_report(config, json).await
        }
        Commands::Status => {
            init_logging_simple();
            show_status(config).await
        }
        Commands::CheckConfig => check_config(&config),
    }
}

async fn run_service(config: AppConfig) -> Result<()> {
    let app = App::build(config)?;
    info!(
        "ecosentry starting: monitoring {} every {}s",
        if app.cycle.is_enabled() { "enabled" } else { "disabled" },
        app.config.monitoring.interval_secs
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let scheduler = app.scheduler();
    let scheduler_rx = shutdown_tx.subscribe();
    let scheduler_handle = tokio::spawn(async move { scheduler.run(scheduler_rx).await });

    let api_handle = if app.config.api.enabled {
        let addr: SocketAddr = app
            .config
            .api
            .bind
            .parse()
            .map_err(|e| SentryError::Validation(format!("api.bind: {e}")))?;
        let mut api_rx = shutdown_tx.subscribe();
        let state = app.api_state();
        Some(tokio::spawn(async move {
            let shutdown = async move {
                let _ = api_rx.recv().await;
            };
            if let Err(e) = start_api_server(state, addr, shutdown).await {
                error!("API server error: {}", e);
            }
        }))
    } else {
        info!("API server disabled");
        None
    };

    shutdown_signal().await;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());

    if let Err(e) = scheduler_handle.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }
    if let Some(handle) = api_handle {
        if let Err(e) = handle.await {
            warn!("API task ended abnormally: {}", e);
        }
    }

    info!("ecosentry stopped");
    Ok(())
}

async fn run_report(config: AppConfig, json: bool) -> Result<()> {
    let app = App::build(config)?;
    let outcome = app.cycle.run_tick(Utc::now()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        if let Some(report) = &outcome.report {
            println!("{}", report.summary);
        }
        println!("Status: {:?}", outcome.status);
        if let Some(key) = &outcome.report_key {
            println!("Saved to: {key}");
        }
        for e in &outcome.errors {
            println!("Error: {e}");
        }
    }

    match outcome.status {
        CycleStatus::Failed => Err(SentryError::Internal(
            "report cycle failed; see the logged errors".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn show_status(config: AppConfig) -> Result<()> {
    let app = App::build(config)?;
    let report = app.cycle.governor().generate_report(Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            println!("Configuration OK");
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("  - {e}");
            }
            Err(SentryError::Validation(format!(
                "{} configuration problem(s)",
                errors.len()
            )))
        }
    }
}

/// Console logging plus an optional daily-rotated file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},ecosentry=debug", config.level)));

    let mut guard = None;
    let file_layer = config.directory.as_deref().and_then(|dir| {
        // `rolling::daily` panics if the first file can't be created, so
        // check writability first.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory {dir} ({e}), file logging disabled");
            return None;
        }
        let marker = std::path::Path::new(dir).join(".ecosentry_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&marker)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&marker);
                let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
                let (writer, file_guard) = tracing_appender::non_blocking(appender);
                guard = Some(file_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not write to log directory {dir} ({e}), file logging disabled");
                None
            }
        }
    });

    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    if file_logging_enabled {
        if let Some(dir) = &config.directory {
            eprintln!("Logging to: {}/{}", dir, config.file_prefix);
        }
    }
    guard
}

fn init_logging_simple() {
    // Minimal logging for one-shot commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
