use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP_MS,
};
use crate::user::*;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tracing::{debug, info};


const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "handle",
            &SqlType::Text,
            non_null = true,
            collate_nocase = true,
            is_unique = true
        ),
        sqlite_column!(
            "email",
            &SqlType::Text,
            non_null = true,
            collate_nocase = true,
            is_unique = true
        ),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP_MS)
        ),
    ],
    indices: &[],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP_MS)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP_MS)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_V_0,
    ],
    migration: None,
}];

fn system_time_from_millis(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(value.max(0) as u64)
}

fn millis_from_system_time(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn now_millis() -> i64 {
    millis_from_system_time(SystemTime::now())
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!("Failed to open user database at {}", db_path.as_ref().display())
        })?;
        open_versioned(&conn, USER_VERSIONED_SCHEMAS, "user")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        };
        info!("Opened user db with {} users", store.get_users_count()?);
        Ok(store)
    }

    fn parse_auth_token_row(row: &Row) -> rusqlite::Result<AuthToken> {
        Ok(AuthToken {
            user_id: row.get::<_, i64>(0)? as usize,
            value: AuthTokenValue(row.get(1)?),
            created: system_time_from_millis(row.get(2)?),
            last_used: row.get::<_, Option<i64>>(3)?.map(system_time_from_millis),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user: &NewUser) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (handle, email, first_name, last_name, created) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &user.handle,
                &user.email,
                &user.first_name,
                &user.last_name,
                now_millis()
            ],
        )
        .with_context(|| format!("Failed to create user {}", user.handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user(&self, user_id: usize) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, handle, email, first_name, last_name, created FROM user WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row(params![user_id as i64], |row| {
                Ok(User {
                    id: row.get::<_, i64>(0)? as usize,
                    handle: row.get(1)?,
                    email: row.get(2)?,
                    first_name: row.get(3)?,
                    last_name: row.get(4)?,
                    created: row.get(5)?,
                })
            })
            .optional()?)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM user WHERE handle = ?1",
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn is_email_taken(&self, email: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    fn get_users_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
        )?;
        Ok(stmt
            .query_row(params![value.0], Self::parse_auth_token_row)
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(token) = self.get_user_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![token.value.0],
        )?;
        debug!("Deleted auth token of user {}", token.user_id);
        Ok(Some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![now_millis(), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (value, user_id, created) VALUES (?1, ?2, ?3)",
            params![
                token.value.0,
                token.user_id as i64,
                millis_from_system_time(token.created)
            ],
        )?;
        Ok(())
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_password_credentials(
        &self,
        user_handle: &str,
    ) -> Result<Option<UsernamePasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT c.user_id, c.salt, c.hash, c.hasher, c.created, c.last_tried, c.last_used
             FROM user_password_credentials c JOIN user u ON u.id = c.user_id
             WHERE u.handle = ?1",
        )?;
        let row = stmt
            .query_row(params![user_handle], |row| {
                Ok((
                    row.get::<_, i64>(0)? as usize,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                ))
            })
            .optional()?;

        let Some((user_id, salt, hash, hasher, created, last_tried, last_used)) = row else {
            return Ok(None);
        };
        Ok(Some(UsernamePasswordCredentials {
            user_id,
            salt,
            hash,
            hasher: LmnHasher::from_str(&hasher)?,
            created: system_time_from_millis(created),
            last_tried: last_tried.map(system_time_from_millis),
            last_used: last_used.map(system_time_from_millis),
        }))
    }

    fn set_password_credentials(&self, credentials: &UsernamePasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher",
            params![
                credentials.user_id as i64,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                millis_from_system_time(credentials.created)
            ],
        )
        .with_context(|| {
            format!(
                "Failed to store password credentials for user {}",
                credentials.user_id
            )
        })?;
        Ok(())
    }

    fn touch_password_credentials(&self, user_id: usize, succeeded: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = now_millis();
        if succeeded {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1, last_used = ?1 WHERE user_id = ?2",
                params![now, user_id as i64],
            )?;
        } else {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1 WHERE user_id = ?2",
                params![now, user_id as i64],
            )?;
        }
        Ok(())
    }
}
