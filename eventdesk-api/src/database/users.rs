use crate::database::AsyncDbConnection;
use crate::helpers::password::{hash_password, new_salt};
use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub full_name: Option<String>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        password_salt: row.get(3)?,
        full_name: row.get(4)?,
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn insert_user(
    conn: AsyncDbConnection,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<UserRecord> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let id = uuid::Uuid::new_v4().to_string();
    let email = normalize_email(email);
    let salt = new_salt();
    let hash = hash_password(password, &salt);

    conn.execute(
        "INSERT INTO users (id, email, password_hash, password_salt, full_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &email, &hash, &salt, full_name, now],
    )?;

    // Every user gets a profile row, the settings page reads it straight away
    conn.execute(
        "INSERT INTO profiles (id, full_name, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO NOTHING",
        params![&id, full_name, now],
    )?;

    Ok(UserRecord {
        id,
        email,
        password_hash: hash,
        password_salt: salt,
        full_name: full_name.map(str::to_string),
    })
}

pub async fn find_user_by_email(conn: AsyncDbConnection, email: &str) -> Result<Option<UserRecord>> {
    let conn = conn.lock().await?;

    let user = conn
        .query_row(
            "SELECT id, email, password_hash, password_salt, full_name
             FROM users WHERE email = ?1",
            [normalize_email(email)],
            user_from_row,
        )
        .optional()?;

    Ok(user)
}

pub async fn create_auth_session(conn: AsyncDbConnection, user_id: &str) -> Result<String> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let token = uuid::Uuid::new_v4().simple().to_string();

    conn.execute(
        "INSERT INTO auth_sessions (access_token, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![&token, user_id, now],
    )?;

    Ok(token)
}

pub async fn user_for_token(conn: AsyncDbConnection, access_token: &str) -> Result<Option<UserRecord>> {
    let conn = conn.lock().await?;

    let user = conn
        .query_row(
            "SELECT u.id, u.email, u.password_hash, u.password_salt, u.full_name
             FROM auth_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.access_token = ?1",
            [access_token],
            user_from_row,
        )
        .optional()?;

    Ok(user)
}

pub async fn delete_auth_session(conn: AsyncDbConnection, access_token: &str) -> Result<bool> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM auth_sessions WHERE access_token = ?1",
        [access_token],
    )?;
    Ok(deleted > 0)
}
