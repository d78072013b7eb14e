use rusqlite::Connection;

use crate::models::{UserRef, UserRow};
use crate::{Database, OptionalExt, StoreError, StoreResult, is_constraint_violation};

impl Database {
    // -- Users --

    /// Create an account. The email is case-normalized before insert.
    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<UserRow> {
        let email = email.trim().to_lowercase();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, password, first_name, last_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &email,
                    password_hash,
                    first_name,
                    last_name,
                    crate::now_rfc3339(),
                ),
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict("A user with this email already exists.".into())
                } else {
                    e.into()
                }
            })?;

            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?
                .ok_or_else(|| StoreError::NotFound("User not found.".into()))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRow>> {
        let email = email.trim().to_lowercase();
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, email, password, first_name, last_name, is_staff, is_superuser,
                        created_at
                 FROM users WHERE email = ?1",
                rusqlite::params![email],
            )
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Tokens --

    /// Store an issued session token. One row per session; a user may hold
    /// several live tokens at once.
    pub fn create_token(&self, user_id: i64, token: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                (token, user_id, crate::now_rfc3339()),
            )?;
            Ok(())
        })
    }

    /// Resolve a presented token to its user. `None` means the token is
    /// unknown or has been revoked.
    pub fn get_user_by_token(&self, token: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT u.id, u.email, u.password, u.first_name, u.last_name, u.is_staff,
                        u.is_superuser, u.created_at
                 FROM tokens t
                 JOIN users u ON u.id = t.user_id
                 WHERE t.token = ?1",
                rusqlite::params![token],
            )
        })
    }

    /// Delete a token server-side (logout). Returns false if it was not
    /// present.
    pub fn delete_token(&self, token: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tokens WHERE token = ?1", [token])?;
            Ok(changed > 0)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> StoreResult<Option<UserRow>> {
    query_user(
        conn,
        "SELECT id, email, password, first_name, last_name, is_staff, is_superuser, created_at
         FROM users WHERE id = ?1",
        rusqlite::params![id],
    )
}

/// Fetch the joined display fields for one user, failing with NotFound.
pub(crate) fn query_user_ref(conn: &Connection, id: i64) -> StoreResult<UserRef> {
    conn.query_row(
        "SELECT id, email, first_name, last_name FROM users WHERE id = ?1",
        [id],
        |row| {
            Ok(UserRef {
                id: row.get(0)?,
                email: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound("User not found.".into()))
}

fn query_user(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;

    let row = stmt
        .query_row(params, |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                is_staff: row.get(5)?,
                is_superuser: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}
