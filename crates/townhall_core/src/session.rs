//! The signed-in session: the auth token the server issued plus the user it
//! belongs to. This is the only state the client keeps between runs.

use crate::schema::User;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub saved_at: String,
}

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self { conn })
    }

    /// Replaces any stored session.
    pub fn save(&self, token: &str, user: &User) -> Result<Session> {
        let user_json = serde_json::to_string(user)?;
        let saved_at = OffsetDateTime::now_utc().format(&Rfc3339)?;

        self.conn.execute(
            r#"
            INSERT INTO session (slot, token, user_json, saved_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
              token=excluded.token,
              user_json=excluded.user_json,
              saved_at=excluded.saved_at
            "#,
            params![token, user_json, saved_at],
        )?;

        Ok(Session {
            token: token.to_string(),
            user: user.clone(),
            saved_at,
        })
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let row = self
            .conn
            .query_row(
                "SELECT token, user_json, saved_at FROM session WHERE slot = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((token, user_json, saved_at)) => Ok(Some(Session {
                token,
                user: serde_json::from_str(&user_json)?,
                saved_at,
            })),
            None => Ok(None),
        }
    }

    /// Returns whether a session was present.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM session", [])?;
        Ok(removed > 0)
    }
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS session (
          slot INTEGER PRIMARY KEY CHECK (slot = 1),
          token TEXT NOT NULL,
          user_json TEXT NOT NULL,
          saved_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
