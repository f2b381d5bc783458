use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::{env, path::PathBuf, str::FromStr};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Where the server accepts connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listen {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub listen: Listen,
    pub storage_dir: PathBuf,
    /// Allow-listed upload credentials.
    pub users: Vec<String>,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen", &self.listen)
            .field("storage_dir", &self.storage_dir)
            .field("users", &self.users.len())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Anonymous, ephemeral file drop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Print a freshly generated upload credential
    Newuser,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides FILEDROP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILEDROP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen on a Unix socket instead of TCP (overrides FILEDROP_SOCKET)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Directory where uploads are stored (overrides FILEDROP_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Allow-listed credential, repeatable (overrides FILEDROP_USERS)
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// Request body limit in bytes (overrides FILEDROP_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Merge `args` over the process environment over built-in defaults.
    pub fn from_env_and_args(args: ServeArgs) -> Result<Self> {
        Self::from_sources(args, |key| env::var(key))
    }

    /// Same as [`AppConfig::from_env_and_args`] with an injectable
    /// environment lookup.
    pub fn from_sources<F>(args: ServeArgs, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let lookup = |key: &str| -> Result<Option<String>> {
            match var(key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };

        // --- Environment fallback ---
        let env_host = lookup("FILEDROP_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "FILEDROP_PORT")?.unwrap_or(3000);
        let env_socket = lookup("FILEDROP_SOCKET")?
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let env_storage = lookup("FILEDROP_STORAGE_DIR")?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./files"));
        let env_users: Vec<String> = lookup("FILEDROP_USERS")?
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        let env_max_upload =
            parse_var(&lookup, "FILEDROP_MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        // --- Merge ---
        let listen = match args.socket.or(env_socket) {
            Some(path) => Listen::Unix(path),
            None => Listen::Tcp {
                host: args.host.unwrap_or(env_host),
                port: args.port.unwrap_or(env_port),
            },
        };
        let users = if args.users.is_empty() {
            env_users
        } else {
            args.users
        };

        let cfg = Self {
            listen,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            users: normalize_users(users)?,
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<Option<String>>,
{
    match lookup(key)? {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(None),
    }
}

/// Trim entries and drop blanks. A blank credential would let an empty
/// password through, so an explicitly blank-only list is an error.
fn normalize_users(raw: Vec<String>) -> Result<Vec<String>> {
    let had_entries = !raw.is_empty();
    let users: Vec<String> = raw
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if had_entries && users.is_empty() {
        bail!("user allow-list contains only blank entries");
    }
    Ok(users)
}
