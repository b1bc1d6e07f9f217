use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_URL: &str = "sqlite://classroom.sqlite3";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidBind { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBind { raw } => write!(f, "invalid --bind value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Seed,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub bind: SocketAddr,
    pub verbose: bool,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_bind(raw: String) -> Result<SocketAddr, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidBind { raw })
}

impl Args {
    /// Parse command-line arguments (without the program name).
    ///
    /// `env` resolves `CLASSROOM_DB_URL` and `CLASSROOM_BIND`; flags win over it.
    /// With no subcommand, or when the first argument is a flag, `serve` is assumed.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown commands or flags and malformed values.
    pub fn parse(
        argv: Vec<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut iter = argv.into_iter().peekable();
        let mut command = match iter.peek() {
            None => Command::Serve,
            Some(first) if first.starts_with('-') => Command::Serve,
            Some(first) => Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.clone()))?,
        };
        if iter.peek().is_some_and(|first| !first.starts_with('-')) {
            iter.next();
        }

        let mut db_url = env("CLASSROOM_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(
                || normalize_sqlite_url(DEFAULT_DB_URL.to_owned()),
                normalize_sqlite_url,
            );
        let mut bind = parse_bind(env("CLASSROOM_BIND").unwrap_or_else(|| DEFAULT_BIND.into()))?;
        let mut verbose = false;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bind" => bind = parse_bind(require_value(&mut iter, "--bind")?)?,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => command = Command::Help,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            command,
            db_url,
            bind,
            verbose,
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  classroom [serve] [--db <sqlite_url>] [--bind <addr>] [--verbose]");
    eprintln!("  classroom seed    [--db <sqlite_url>] [--verbose]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --bind {DEFAULT_BIND}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CLASSROOM_DB_URL, CLASSROOM_BIND, RUST_LOG");
}

/// Turn a bare path, `sqlite:path` or relative `sqlite://path` into an
/// absolute `sqlite://` URL. In-memory and `file:` URLs pass through.
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    if path_str == ":memory:" || path_str.starts_with("file:") {
        return raw;
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its parent directories) if missing.
///
/// # Errors
///
/// Returns an error for a URL that names no file, or on I/O failure.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_owned(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_owned(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
