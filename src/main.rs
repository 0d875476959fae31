// ABOUTME: Main entry point for the deskchat terminal client
// ABOUTME: Parses the CLI, sets up file logging, loads config, and runs the chosen surface

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskchat::config::Config;
use deskchat::{paths, tui};
use deskchat_core::console::AdminConsole;
use deskchat_core::session::CustomerSession;
use deskchat_core::traits::ChatBackend;
use deskchat_core::widget::CustomerChat;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

#[derive(Parser)]
#[command(name = "deskchat", version, about = "Realtime support chat for the storefront")]
struct Cli {
    /// Log to stderr instead of the rolling log file
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the admin dashboard
    Admin,
    /// Open the support chat for one order
    Customer {
        /// Order the chat is about
        #[arg(long)]
        order: String,
        /// Customer's user id
        #[arg(long)]
        user: String,
    },
    /// Print the admin conversation list and exit
    Conversations,
}

fn init_logging(to_stderr: bool, json: bool) -> Result<Option<WorkerGuard>> {
    let (writer, guard) = if to_stderr {
        (BoxMakeWriter::new(std::io::stderr), None)
    } else {
        let dir = paths::log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(&dir, "deskchat.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (BoxMakeWriter::new(writer), Some(guard))
    };

    let format: Box<dyn Layer<Registry> + Send + Sync> = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(to_stderr)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(format)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.log_stderr, cli.log_json)?;

    // The TUI owns the screen, so panics go to the log as well
    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "deskchat panicked");
        eprintln!("{}", panic_info);
    }));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting deskchat");

    let config = Config::load()?;
    tracing::info!(
        gateway = %config.gateway.url,
        transports = ?config.gateway.transports,
        admin_id = %config.admin.admin_id,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Admin => run_admin(config).await,
        Commands::Customer { order, user } => run_customer(config, order, user).await,
        Commands::Conversations => list_conversations(config).await,
    }
}

async fn run_admin(config: Config) -> Result<()> {
    let connection = Arc::new(deskchat::connection_manager(&config.gateway, true)?);
    let backend = deskchat::rest_backend(&config.gateway)?;
    let console = AdminConsole::start(
        Arc::clone(&connection),
        backend,
        config.admin.dashboard_options(),
    );

    let result = tui::run_admin(&console, &config.admin.admin_id).await;

    console.shutdown().await;
    connection.disconnect();
    tracing::info!("Admin dashboard closed");
    result
}

async fn run_customer(config: Config, order: String, user: String) -> Result<()> {
    if order.trim().is_empty() || user.trim().is_empty() {
        anyhow::bail!("--order and --user must not be empty");
    }

    let connection = deskchat::connection_manager(&config.gateway, false)?;
    let backend = deskchat::rest_backend(&config.gateway)?;
    let session = CustomerSession::open(order.trim(), user.trim(), config.admin.admin_id.clone());
    let chat = CustomerChat::open(connection, backend, session);

    let result = tui::run_customer(&chat, user.trim()).await;

    chat.close().await;
    result
}

async fn list_conversations(config: Config) -> Result<()> {
    let backend = deskchat::rest_backend(&config.gateway)?;
    let conversations = backend
        .list_conversations()
        .await
        .context("Failed to list conversations")?;

    let now = chrono::Local::now();
    if conversations.is_empty() {
        println!("No conversations yet");
    }
    for (i, conv) in conversations.iter().enumerate() {
        println!("{}", tui::format::conversation_line(i + 1, conv, &now));
    }
    Ok(())
}
