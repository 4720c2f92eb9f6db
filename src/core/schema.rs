//! `SQLite` schema for the user table.

/// `AUTOINCREMENT` keeps ids from being reused after the newest row is deleted.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL,
    age INTEGER NOT NULL,
    gender VARCHAR(20) NOT NULL,
    pincode VARCHAR(10) NOT NULL,
    address TEXT NOT NULL
)
";

pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_USERS_TABLE];
