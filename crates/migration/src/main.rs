//! Schema maintenance for the pocketbook database.
//!
//! `migration [up|down|fresh|status] [DATABASE_URL]`. Without an explicit
//! URL, `POCKETBOOK_DATABASE__URL` then `DATABASE_URL` are consulted.

use std::str::FromStr;

use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_URL: &str = "sqlite:./pocketbook.db?mode=rwc";

enum Command {
    Up,
    Down,
    Fresh,
    Status,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "fresh" => Ok(Self::Fresh),
            "status" => Ok(Self::Status),
            other => Err(format!("unknown command `{other}`")),
        }
    }
}

fn database_url(arg: Option<String>) -> String {
    arg.or_else(|| std::env::var("POCKETBOOK_DATABASE__URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let command = match args.next().as_deref().map_or(Ok(Command::Up), str::parse) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\nUsage: migration [up|down|fresh|status] [DATABASE_URL]");
            std::process::exit(2);
        }
    };
    let db = Database::connect(database_url(args.next())).await?;

    match command {
        // Schema version 1 is the only one: `down` drops every collection.
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, None).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
