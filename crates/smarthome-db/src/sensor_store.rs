use std::sync::Arc;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use smarthome_common::{
    Error, Result, Sensor, SensorCreate, SensorStatus, SensorType, SensorUpdate,
};
use tracing::info;

use crate::database::{
    Database, format_datetime, is_check_violation, is_unique_violation, parse_datetime,
};

const SELECT_SENSOR: &str = "SELECT id, name, type, location, value, unit, status, last_updated, created_at
     FROM sensors";

/// CRUD access to the `sensors` table.
#[derive(Clone)]
pub struct SensorStore {
    db: Arc<Database>,
}

impl SensorStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn list(&self) -> Result<Vec<Sensor>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_SENSOR} ORDER BY id"))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], row_to_sensor)
            .map_err(|e| Error::Database(format!("failed to query sensors: {e}")))?;

        let mut sensors = Vec::new();
        for row in rows {
            sensors
                .push(row.map_err(|e| Error::Database(format!("failed to read sensor row: {e}")))?);
        }
        Ok(sensors)
    }

    pub fn get(&self, id: i64) -> Result<Option<Sensor>> {
        let conn = self.db.connection()?;
        fetch(&conn, id)
    }

    pub fn create(&self, input: &SensorCreate) -> Result<Sensor> {
        let now = format_datetime(Utc::now());
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sensors (name, type, location, value, unit, status, last_updated, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6)",
            params![
                input.name,
                input.sensor_type.as_str(),
                input.location,
                input.unit.as_deref().unwrap_or(""),
                SensorStatus::Inactive.as_str(),
                now,
            ],
        )
        .map_err(|e| write_error(e, &input.name, &input.location))?;

        let id = conn.last_insert_rowid();
        info!("sensor {} created: {} @ {}", id, input.name, input.location);
        fetch(&conn, id)?.ok_or_else(|| Error::Database(format!("sensor {id} vanished after insert")))
    }

    /// Merge `input` into the stored sensor. Absent fields and blank strings
    /// keep their current value.
    pub fn update(&self, id: i64, input: &SensorUpdate) -> Result<Sensor> {
        let conn = self.db.connection()?;
        let mut sensor = fetch(&conn, id)?.ok_or_else(|| not_found(id))?;

        if let Some(name) = non_empty(&input.name) {
            sensor.name = name.to_string();
        }
        if let Some(sensor_type) = input.sensor_type {
            sensor.sensor_type = sensor_type;
        }
        if let Some(location) = non_empty(&input.location) {
            sensor.location = location.to_string();
        }
        if let Some(value) = input.value {
            sensor.value = value;
        }
        if let Some(unit) = non_empty(&input.unit) {
            sensor.unit = unit.to_string();
        }
        if let Some(status) = input.status {
            sensor.status = status;
        }
        sensor.last_updated = Utc::now();

        conn.execute(
            "UPDATE sensors
             SET name = ?1, type = ?2, location = ?3, value = ?4, unit = ?5, status = ?6, last_updated = ?7
             WHERE id = ?8",
            params![
                sensor.name,
                sensor.sensor_type.as_str(),
                sensor.location,
                sensor.value,
                sensor.unit,
                sensor.status.as_str(),
                format_datetime(sensor.last_updated),
                id,
            ],
        )
        .map_err(|e| write_error(e, &sensor.name, &sensor.location))?;

        fetch(&conn, id)?.ok_or_else(|| not_found(id))
    }

    /// Record a new reading and status for a sensor.
    pub fn update_value(&self, id: i64, value: f64, status: SensorStatus) -> Result<Sensor> {
        let conn = self.db.connection()?;
        let changed = conn
            .execute(
                "UPDATE sensors SET value = ?1, status = ?2, last_updated = ?3 WHERE id = ?4",
                params![value, status.as_str(), format_datetime(Utc::now()), id],
            )
            .map_err(|e| {
                if is_check_violation(&e) {
                    Error::Validation(format!("sensor value rejected: {e}"))
                } else {
                    Error::Database(format!("failed to update sensor value: {e}"))
                }
            })?;

        if changed == 0 {
            return Err(not_found(id));
        }
        fetch(&conn, id)?.ok_or_else(|| not_found(id))
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.db.connection()?;
        let changed = conn
            .execute("DELETE FROM sensors WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(format!("failed to delete sensor: {e}")))?;

        if changed == 0 {
            return Err(not_found(id));
        }
        info!("sensor {} deleted", id);
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sensors", [], |row| row.get(0))
            .map_err(|e| Error::Database(format!("failed to count sensors: {e}")))?;
        Ok(count as usize)
    }
}

fn fetch(conn: &Connection, id: i64) -> Result<Option<Sensor>> {
    conn.query_row(&format!("{SELECT_SENSOR} WHERE id = ?1"), params![id], row_to_sensor)
        .optional()
        .map_err(|e| Error::Database(format!("failed to get sensor {id}: {e}")))
}

fn row_to_sensor(row: &Row<'_>) -> rusqlite::Result<Sensor> {
    let sensor_type: String = row.get(2)?;
    let status: String = row.get(6)?;

    Ok(Sensor {
        id: row.get(0)?,
        name: row.get(1)?,
        sensor_type: sensor_type
            .parse::<SensorType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        location: row.get(3)?,
        value: row.get(4)?,
        unit: row.get(5)?,
        status: status
            .parse::<SensorStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        last_updated: parse_datetime(row.get::<_, String>(7)?),
        created_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn write_error(e: rusqlite::Error, name: &str, location: &str) -> Error {
    if is_unique_violation(&e) {
        Error::Conflict(format!("sensor '{name}' already exists in '{location}'"))
    } else if is_check_violation(&e) {
        Error::Validation(format!("sensor rejected by schema constraint: {e}"))
    } else {
        Error::Database(format!("failed to write sensor: {e}"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("sensor {id}"))
}
