use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{parse_calendar_date, Event, NewEvent};

pub async fn insert_event(conn: AsyncDbConnection, user_id: &str, event: &NewEvent) -> Result<String> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let id = uuid::Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO events (id, user_id, name, date, duration, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &id,
            user_id,
            &event.name,
            event.date.format("%Y-%m-%d").to_string(),
            &event.duration,
            now
        ],
    )?;

    Ok(id)
}

pub async fn event_owner(conn: AsyncDbConnection, event_id: &str) -> Result<Option<String>> {
    let conn = conn.lock().await?;
    let owner = conn
        .query_row(
            "SELECT user_id FROM events WHERE id = ?1",
            [event_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

pub async fn insert_rooms(conn: AsyncDbConnection, event_id: &str, rooms: &[String]) -> Result<()> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction()?;

    {
        let mut stmt =
            tx.prepare("INSERT INTO event_rooms (event_id, room_name) VALUES (?1, ?2)")?;
        for room in rooms {
            stmt.execute(params![event_id, room])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Events in insertion order with their rooms joined in
pub async fn list_events_for_user(conn: AsyncDbConnection, user_id: &str) -> Result<Vec<Event>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, e.date, e.duration, r.room_name
         FROM events e
         LEFT JOIN event_rooms r ON r.event_id = e.id
         WHERE e.user_id = ?1
         ORDER BY e.created_at, e.rowid, r.id",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut events: Vec<Event> = Vec::new();
    for (id, name, date, duration, room) in rows {
        let is_same_event = events.last().map_or(false, |last| last.id == id);
        if !is_same_event {
            let date = parse_calendar_date(&date)
                .ok_or_else(|| anyhow::anyhow!("Event {} has invalid date {:?}", id, date))?;
            events.push(Event {
                id,
                name,
                date,
                duration,
                rooms: Vec::new(),
            });
        }

        if let (Some(room), Some(event)) = (room, events.last_mut()) {
            event.rooms.push(room);
        }
    }

    Ok(events)
}
