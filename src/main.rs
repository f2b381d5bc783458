use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use filedrop::{
    config::{AppConfig, Cli, Command, Listen, ServeArgs},
    services::{
        auth::{Authenticator, generate_credential},
        storage_service::StorageService,
    },
};
use std::{fs, io::ErrorKind, path::Path};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Newuser => {
            let credential = generate_credential();
            println!("{}", credential);
            eprintln!("add it to FILEDROP_USERS or pass it with --user");
            Ok(())
        }
        Command::Serve(args) => serve(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let cfg = AppConfig::from_env_and_args(args)?;
    tracing::info!("Starting filedrop with config: {:?}", cfg);

    // --- Ensure storage directory exists ---
    if !cfg.storage_dir.exists() {
        fs::create_dir_all(&cfg.storage_dir)
            .with_context(|| format!("creating {}", cfg.storage_dir.display()))?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir.display());
    }

    if cfg.users.is_empty() {
        tracing::warn!("No users configured; every upload will be rejected");
    }

    // --- Build router ---
    let storage = StorageService::new(cfg.storage_dir.clone());
    let app = filedrop::app(storage, Authenticator::new(&cfg.users), cfg.max_upload_bytes);

    // --- Start server ---
    match cfg.listen {
        Listen::Tcp { host, port } => serve_tcp(&host, port, app).await,
        Listen::Unix(path) => serve_unix(&path, app).await,
    }
}

async fn serve_tcp(host: &str, port: u16, app: Router) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied && matches!(host, "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(unix)]
async fn serve_unix(path: &Path, app: Router) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::net::UnixListener;

    // A socket left behind by a previous run would make bind fail.
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed stale socket {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("removing {}", path.display()));
        }
    }

    let listener = UnixListener::bind(path)
        .with_context(|| format!("binding unix socket {}", path.display()))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o666))?;

    tracing::info!("Server listening on unix:{}", path.display());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(not(unix))]
async fn serve_unix(path: &Path, _app: Router) -> Result<()> {
    anyhow::bail!(
        "unix sockets are not supported on this platform: {}",
        path.display()
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
