use cacatua_cli::commands::{cli, ping};
use cacatua_cli::http;
use cacatua_core::api::{AppContext, CliError, LoggingConfig};
use cacatua_plugins::services::PluginServicesFactory;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => cacatua_core::config::load_from_path(path),
        None => cacatua_core::config::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));

    match args.command.unwrap_or(cli::Commands::Serve(cli::ServeArgs::default())) {
        cli::Commands::Serve(serve_args) => {
            http::handle_serve(serve_args, &ctx).await?;
            Ok(0)
        }
        cli::Commands::Ping(ping_args) => ping::handle_ping(ping_args, &ctx).await,
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 11: config, 20: backend unreachable, 30: bind/serve failure
    match e {
        CliError::Config(_) => 11,
        CliError::Backend(_) => 20,
        CliError::Server(_) => 30,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = env_filter(&logging.level)?;
    let file_writer = match logging.file {
        true => Some(file_writer(logging.directory.as_deref())?),
        false => None,
    };
    if !logging.console && file_writer.is_none() {
        return Err("logging enabled but both console and file output are off".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });
    let file_layer = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> Result<EnvFilter, String> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(level).map_err(|e| format!("invalid log level {level:?}: {e}")),
    }
}

/// Daily-rolled `cacatua.log`; the worker guard lives for the whole process.
fn file_writer(directory: Option<&str>) -> Result<NonBlocking, String> {
    let dir = directory
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("cacatua"));
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("create log dir {} failed: {e}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, "cacatua.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}
