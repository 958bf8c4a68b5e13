//! Configuration management CLI commands.
//!
//! Provides `config init` and `config show`.

use std::path::Path;

use clap::Subcommand;
use regionwatch::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(path, force),
        ConfigCommands::Show => run_show(path),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists(path)? {
        println!("Created {}", path.display());
    } else {
        println!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    for (key, value) in settings_table(&config) {
        println!("{:<24} {}", key, value);
    }
    Ok(())
}

fn settings_table(config: &ConfigFile) -> Vec<(&'static str, String)> {
    vec![
        ("store.data_file", config.store.data_file.display().to_string()),
        ("regions.file", config.regions.file.display().to_string()),
        ("ingest.retry_attempts", config.ingest.retry_attempts.to_string()),
        ("ingest.retry_delay_ms", config.ingest.retry_delay_ms.to_string()),
        ("ingest.bbox_prefilter", config.ingest.bbox_prefilter.to_string()),
        ("query.default_limit", config.query.default_limit.to_string()),
        ("query.max_limit", config.query.max_limit.to_string()),
        ("logging.directory", config.logging.directory.display().to_string()),
        ("logging.file", config.logging.file.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_then_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        run(ConfigCommands::Init { force: false }, &path).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[query]\nmax_limit = 10\ndefault_limit = 5\n").unwrap();
        run(ConfigCommands::Init { force: false }, &path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().query.max_limit, 10);

        run(ConfigCommands::Init { force: true }, &path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().query.max_limit, 1000);
    }

    #[test]
    fn test_settings_table_covers_every_key() {
        let table = settings_table(&ConfigFile::default());
        assert_eq!(table.len(), 9);
        assert!(table
            .iter()
            .any(|(k, v)| *k == "ingest.retry_attempts" && v == "3"));
    }
}
