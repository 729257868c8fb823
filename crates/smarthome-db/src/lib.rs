pub mod database;
pub mod migrations;
pub mod sensor_store;

pub use database::{Database, DatabaseLocation};
pub use migrations::{
    AppliedMigrationRecord, MigrationReport, MigrationScript, MigrationSource, Migrator,
};
pub use sensor_store::SensorStore;
