//! Handles settings for the application.
//!
//! Values are layered: built-in defaults, then the optional TOML file
//! (`pocketbook.toml` unless `--config` says otherwise), then `POCKETBOOK_*`
//! environment variables, e.g. `POCKETBOOK_DATABASE__URL`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./pocketbook.db?mode=rwc";

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level of the pocketbook crates (`error`..`trace`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new(file: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("POCKETBOOK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::new("does-not-exist").unwrap();
        assert_eq!(settings.database.url, DEFAULT_DATABASE_URL);
        assert!(!settings.app.level.is_empty());
    }
}
