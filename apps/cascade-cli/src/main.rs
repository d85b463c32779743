//! # Cascade CLI
//!
//! Loads settings, seeds an in-memory store and runs one command against it.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cascade get general/locale/code --store 3                             │
//! │      scoped read: store → group → website → default                    │
//! │                                                                         │
//! │  cascade set general/locale/code de_CH --store 3 --watch general      │
//! │      write + print change notifications for the watched topics         │
//! │                                                                         │
//! │  cascade dump [--json]                                                 │
//! │      every stored key, grouped by scope                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cascade_config::{Arg, ConfigResult, ConfigService, MemoryStore, ScopedReader, Settings};
use cascade_core::{ConfigValue, PathKey, Scope, ScopeRef};

#[derive(Debug, Parser)]
#[command(name = "cascade", version, about = "Scoped configuration with change notification")]
struct Cli {
    /// Settings file (defaults to $CASCADE_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a value with scope fallback
    Get {
        /// Path such as general/locale/code
        path: String,
        #[arg(long, default_value_t = 0)]
        website: i64,
        #[arg(long, default_value_t = 0)]
        group: i64,
        #[arg(long, default_value_t = 0)]
        store: i64,
        /// Read as this type (only `string` falls back to broader scopes)
        #[arg(long = "as", value_enum, default_value_t = ValueKind::String)]
        kind: ValueKind,
    },

    /// Write a value at one scope
    Set {
        path: String,
        /// JSON scalars (true, 12, 0.5) keep their type; anything else is a string
        value: String,
        #[arg(long, conflicts_with_all = ["group", "store"])]
        website: Option<i64>,
        #[arg(long, conflicts_with_all = ["website", "store"])]
        group: Option<i64>,
        #[arg(long, conflicts_with_all = ["website", "group"])]
        store: Option<i64>,
        /// Print notifications for these topics (a, a/b or a/b/c)
        #[arg(long)]
        watch: Vec<String>,
    },

    /// Print every stored value
    Dump {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ValueKind {
    String,
    Bool,
    Int,
    Float,
    Datetime,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(Some(path.clone()))
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::load_or_default(None),
    };
    init_tracing(&settings.logging.filter);

    let store = Arc::new(MemoryStore::new());
    let seeded = settings.seed(store.as_ref())?;
    let svc = ConfigService::new(store.clone())?;
    debug!(seeded, "Config service ready");

    match cli.command {
        Command::Get {
            path,
            website,
            group,
            store: store_id,
            kind,
        } => {
            let reader = svc.scoped(website, group, store_id);
            println!("{}", read(&reader, &path, kind)?);
        }

        Command::Set {
            path,
            value,
            website,
            group,
            store: store_id,
            watch,
        } => {
            for topic in &watch {
                svc.subscribe(topic, print_change)?;
            }

            let scope = match (website, group, store_id) {
                (Some(id), _, _) => ScopeRef::website(id),
                (_, Some(id), _) => ScopeRef::group(id),
                (_, _, Some(id)) => ScopeRef::store(id),
                _ => ScopeRef::default_scope(),
            };
            let (scope_kind, scope_id): (Scope, i64) = scope.into();
            let arg = Arg::builder()
                .path([path.as_str()])
                .scope(scope_kind, scope_id)
                .value(parse_value(&value))
                .build()?;
            let key = arg.key.clone();

            svc.write(arg)?;
            // close() waits for the worker, so every notification is printed
            svc.close()?;
            info!(key = %key, "Value written");
            println!("{key} = {}", svc.string(&key)?);
        }

        Command::Dump { json } => {
            let entries = store.entries();
            if json {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .into_iter()
                    .map(|(k, v)| serde_json::to_value(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?;
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                let mut current = None;
                for (raw, value) in entries {
                    match PathKey::parse_fq(&raw) {
                        Ok(key) => {
                            if current != Some(key.scope_ref()) {
                                current = Some(key.scope_ref());
                                println!("[{}]", key.scope_ref());
                            }
                            println!("{} = {value}", key.level_all());
                        }
                        Err(_) => println!("{raw} = {value}"),
                    }
                }
            }
        }
    }

    if !svc.is_closed() {
        svc.close()?;
    }
    Ok(())
}

fn read(reader: &ScopedReader, path: &str, kind: ValueKind) -> Result<String> {
    let parts = [path];
    let value = match kind {
        ValueKind::String => reader.string(&parts)?,
        ValueKind::Bool => reader.bool(&parts)?.to_string(),
        ValueKind::Int => reader.int(&parts)?.to_string(),
        ValueKind::Float => reader.float64(&parts)?.to_string(),
        ValueKind::Datetime => reader.date_time(&parts)?.to_rfc3339(),
    };
    Ok(value)
}

fn parse_value(raw: &str) -> ConfigValue {
    match serde_json::from_str::<ConfigValue>(raw) {
        Ok(value @ (ConfigValue::Bool(_) | ConfigValue::Int(_) | ConfigValue::Float(_))) => value,
        _ => ConfigValue::from(raw),
    }
}

fn print_change(path: &str, scope: Scope, scope_id: i64) -> ConfigResult<()> {
    println!("changed: {path} at {}", ScopeRef::new(scope, scope_id));
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the settings filter. Logs go to stderr so command
/// output stays clean.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_keeps_scalars() {
        assert_eq!(parse_value("true"), ConfigValue::Bool(true));
        assert_eq!(parse_value("12"), ConfigValue::Int(12));
        assert_eq!(parse_value("0.5"), ConfigValue::Float(0.5));
        assert_eq!(parse_value("de_CH"), ConfigValue::from("de_CH"));
        assert_eq!(parse_value("\"quoted\""), ConfigValue::from("\"quoted\""));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "cascade", "set", "a/b/c", "1", "--store", "3", "--watch", "a", "--watch", "a/b",
        ])
        .unwrap();
        match cli.command {
            Command::Set { store, watch, .. } => {
                assert_eq!(store, Some(3));
                assert_eq!(watch, ["a", "a/b"]);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["cascade", "set", "a/b/c", "1", "--store", "3", "--group", "2"])
            .is_err());
    }

    #[test]
    fn test_read_kinds() {
        let svc = ConfigService::in_memory().unwrap();
        svc.write(Arg::builder().path(["a/b/n"]).store(3).value(7i64).build().unwrap())
            .unwrap();
        let reader = svc.scoped(0, 0, 3);
        assert_eq!(read(&reader, "a/b/n", ValueKind::String).unwrap(), "7");
        assert_eq!(read(&reader, "a/b/n", ValueKind::Int).unwrap(), "7");
        assert_eq!(read(&reader, "a/b/n", ValueKind::Float).unwrap(), "7");
        assert_eq!(read(&reader, "a/b/n", ValueKind::Bool).unwrap(), "true");
    }
}
