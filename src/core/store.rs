//! Purpose: Persist user records in a single `SQLite` table.
//! Exports: `RecordStore`, `DEFAULT_LIST_LIMIT`.
//! Role: Synchronous data-access layer behind the HTTP handlers.
//! Invariants: Fields are validated before any statement runs.
//! Invariants: Each operation is one statement under the connection lock.
//! Invariants: List order is primary-key (creation) order.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::error::{Error, ErrorKind};
use super::record::{Record, RecordFields};
use super::schema::SCHEMA_STATEMENTS;

pub const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open or create the database at `path`, creating parent directories
    /// and the users table as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message(format!(
                            "failed to create database directory {}",
                            parent.display()
                        ))
                        .with_source(err)
                })?;
            }
        }

        debug!("opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|err| {
            Error::new(ErrorKind::Storage)
                .with_message(format!("failed to open database {}", path.display()))
                .with_source(err)
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        initialize_schema(&conn)?;

        info!("database ready at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create(&self, fields: &RecordFields) -> Result<Record, Error> {
        fields.validate()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (name, age, gender, pincode, address) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.name,
                fields.age,
                fields.gender,
                fields.pincode,
                fields.address
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, "created user");
        Ok(Record::from_fields(id, fields.clone()))
    }

    pub fn list(&self, skip: u32, limit: u32) -> Result<Vec<Record>, Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, age, gender, pincode, address FROM users ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let records = stmt
            .query_map(params![i64::from(limit), i64::from(skip)], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(skip, limit, count = records.len(), "listed users");
        Ok(records)
    }

    pub fn get(&self, id: i64) -> Result<Record, Error> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, age, gender, pincode, address FROM users WHERE id = ?1",
            [id],
            row_to_record,
        )
        .optional()?
        .ok_or_else(|| Error::not_found(id))
    }

    /// Replace every non-id field of the user with `id`.
    pub fn update(&self, id: i64, fields: &RecordFields) -> Result<Record, Error> {
        fields.validate()?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE users SET name = ?1, age = ?2, gender = ?3, pincode = ?4, address = ?5 WHERE id = ?6",
            params![
                fields.name,
                fields.age,
                fields.gender,
                fields.pincode,
                fields.address,
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(id));
        }
        debug!(id, "updated user");
        Ok(Record::from_fields(id, fields.clone()))
    }

    pub fn delete(&self, id: i64) -> Result<(), Error> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::not_found(id));
        }
        debug!(id, "deleted user");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn
            .lock()
            .map_err(|_| Error::new(ErrorKind::Internal).with_message("database lock poisoned"))
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), Error> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute_batch(statement)?;
    }
    Ok(())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        pincode: row.get(4)?,
        address: row.get(5)?,
    })
}
