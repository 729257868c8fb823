use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use smarthome_config::AppConfig;
use smarthome_db::{Database, MigrationSource, Migrator};
use tracing::info;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Database URL; falls back to the configured one.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, value_enum, default_value_t = MigrateCommand::Up)]
    pub command: MigrateCommand,

    /// Read scripts from this directory instead of the bundled set.
    #[arg(long)]
    pub migrations_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MigrateCommand {
    Up,
    Status,
}

pub fn run(args: &MigrateArgs, config: &AppConfig, out: &mut impl Write) -> Result<()> {
    let url = args
        .database_url
        .as_deref()
        .unwrap_or(&config.database.url);
    let timeout = Duration::from_secs(config.database.connect_timeout_secs);

    let db = Database::connect(url, timeout).context("failed to connect to database")?;
    info!("connected to {:?}", db.location());

    let source = match &args.migrations_dir {
        Some(dir) => MigrationSource::directory(dir),
        None => MigrationSource::bundled(),
    };
    let migrator = Migrator::with_source(Arc::new(db), source);

    match args.command {
        MigrateCommand::Up => up(&migrator, out),
        MigrateCommand::Status => status(&migrator, out),
    }
}

fn up(migrator: &Migrator, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Running database migrations...")?;
    let report = migrator.run().context("migration failed")?;

    if report.is_noop() {
        writeln!(out, "Database is already up to date")?;
    }
    for script in &report.applied {
        writeln!(out, "  applied {}: {}", script.version, script.name)?;
    }
    writeln!(out, "Migrations completed successfully!")?;
    Ok(())
}

fn status(migrator: &Migrator, out: &mut impl Write) -> Result<()> {
    let applied = migrator
        .status()
        .context("failed to read migration status")?;

    writeln!(out, "Migration status:")?;
    if applied.is_empty() {
        writeln!(out, "No migrations applied")?;
    }
    for record in &applied {
        writeln!(
            out,
            "  {}: {} (applied at {})",
            record.version,
            record.name,
            record.applied_at.format("%Y-%m-%d %H:%M:%S")
        )?;
    }

    let pending = migrator
        .pending()
        .context("failed to compute pending migrations")?;
    writeln!(out, "{} pending migration(s)", pending.len())?;
    Ok(())
}
