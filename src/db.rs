use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::user::{PasswordUser, User};

/// Only runs on a fresh file. Airflow's own `users` table, when present, is
/// left exactly as the platform created it.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER NOT NULL,
            username VARCHAR(250),
            email VARCHAR(500),
            password VARCHAR(255),
            superuser BOOLEAN,
            PRIMARY KEY (id),
            UNIQUE (username)
        )",
        [],
    )?;

    Ok(())
}

/// Write one row into `users`, touching only the platform's columns
pub fn insert_user(conn: &Connection, user: &PasswordUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (username, email, password, superuser) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.username(),
            user.email(),
            user.password_hash(),
            user.user().superuser,
        ],
    )
    .with_context(|| format!("Failed to insert user `{}`", user.username()))?;

    Ok(())
}

pub fn find_user(conn: &Connection, username: &str) -> Result<Option<PasswordUser>> {
    let found = conn
        .query_row(
            "SELECT username, email, password, superuser FROM users WHERE username = ?1",
            params![username],
            |row| {
                let user = User {
                    username: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    email: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    superuser: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
                };
                let hash: Option<String> = row.get(2)?;
                Ok(PasswordUser::from_hash(user, hash.unwrap_or_default()))
            },
        )
        .optional()?;

    Ok(found)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

/// Unit of work over the metadata database.
///
/// Users are staged with [`Session::add`] and written together by
/// [`Session::commit`] inside one SQL transaction.
pub struct Session {
    conn: Connection,
    pending: Vec<PasswordUser>,
}

impl Session {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn).context("Failed to initialize users schema")?;
        Ok(Session {
            conn,
            pending: Vec::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn add(&mut self, user: PasswordUser) {
        self.pending.push(user);
    }

    /// Write every staged user. All or nothing: a constraint violation on
    /// any row rolls the whole batch back and is returned as the error.
    pub fn commit(&mut self) -> Result<usize> {
        for user in &self.pending {
            if !user.is_complete() {
                bail!(
                    "User `{}` is missing username, email or password",
                    user.username()
                );
            }
        }

        let tx = self.conn.transaction()?;
        for user in &self.pending {
            insert_user(&tx, user)?;
        }
        tx.commit()?;

        let written = self.pending.len();
        self.pending.clear();
        tracing::info!(users = written, "session committed");
        Ok(written)
    }

    pub fn close(self) -> Result<()> {
        if !self.pending.is_empty() {
            tracing::warn!(
                staged = self.pending.len(),
                "closing session with uncommitted users"
            );
        }
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }
}
