use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id VARCHAR PRIMARY KEY,
            email VARCHAR NOT NULL UNIQUE,
            password_hash VARCHAR NOT NULL,
            password_salt VARCHAR NOT NULL,
            full_name VARCHAR,
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_sessions (
            access_token VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            name VARCHAR NOT NULL,
            date VARCHAR NOT NULL,
            duration VARCHAR NOT NULL,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Room names are plain strings, not references to a rooms table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS event_rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id VARCHAR NOT NULL,
            room_name VARCHAR NOT NULL,
            FOREIGN KEY (event_id) REFERENCES events (id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id VARCHAR PRIMARY KEY,
            full_name VARCHAR,
            username VARCHAR,
            avatar_url VARCHAR,
            updated_at BIGINT,
            FOREIGN KEY (id) REFERENCES users (id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Create indexes for performance
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_user ON events(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_event_rooms_event ON event_rooms(event_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id)",
        [],
    )?;

    Ok(())
}
