use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{Profile, ProfileUpsert};

pub async fn get_profile(conn: AsyncDbConnection, user_id: &str) -> Result<Option<Profile>> {
    let conn = conn.lock().await?;

    let profile = conn
        .query_row(
            "SELECT id, full_name, username, avatar_url, updated_at
             FROM profiles WHERE id = ?1",
            [user_id],
            |row| {
                let updated_at: Option<i64> = row.get(4)?;
                Ok(Profile {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    username: row.get(2)?,
                    avatar_url: row.get(3)?,
                    updated_at: updated_at.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
                })
            },
        )
        .optional()?;

    Ok(profile)
}

/// Insert or merge: fields left as `None` keep their stored value
pub async fn upsert_profile(conn: AsyncDbConnection, profile: &ProfileUpsert) -> Result<()> {
    let conn = conn.lock().await?;

    conn.execute(
        "INSERT INTO profiles (id, full_name, username, avatar_url, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            full_name = COALESCE(excluded.full_name, profiles.full_name),
            username = COALESCE(excluded.username, profiles.username),
            avatar_url = COALESCE(excluded.avatar_url, profiles.avatar_url),
            updated_at = excluded.updated_at",
        params![
            &profile.id,
            profile.full_name.as_ref(),
            profile.username.as_ref(),
            profile.avatar_url.as_ref(),
            profile.updated_at.timestamp()
        ],
    )?;

    Ok(())
}
