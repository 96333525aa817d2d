use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use database::{DatabaseConfig, SqliteStore};
use engine::{CommandParser, ConsoleNotifier, Engine, EngineConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
struct Params {
    /// YAML engine config
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// SQLite database file or URL; overrides DATABASE_URL and the config file
    #[arg(short, long)]
    database: Option<String>,
    /// Read one JSON command per line and print JSON notifications
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let db_config =
        DatabaseConfig::from_cli_or_env_or_yaml(args.database.clone(), config.database_url.clone());
    log::info!("Using database {}", db_config.url);

    let store = SqliteStore::new(db_config.create_pool().await?);
    store.run_migrations().await?;

    let engine = Engine::new(
        Arc::new(store),
        Arc::new(ConsoleNotifier { json: args.json }),
        Arc::new(config),
    );
    let seeded = engine.seed_games().await?;
    if seeded > 0 {
        log::info!("Registered {seeded} configured game(s)");
    }

    let parser = CommandParser::new()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = if args.json {
            parser.parse_json(&line)
        } else {
            parser.parse_line(&line)
        };
        match parsed {
            // Rejections have already been reported through the notifier.
            Ok(command) => {
                let _ = engine.handle(command).await;
            }
            Err(err) => log::error!("Error parsing command from stdin: {err}"),
        }
    }
    Ok(())
}
