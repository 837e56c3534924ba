use std::path::PathBuf;

fn data_dir() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("eventdesk"))
}

/// Returns the path to the local gateway database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/eventdesk/eventdesk.sqlite`
/// - **Linux**: `~/.local/share/eventdesk/eventdesk.sqlite`
/// - **Windows**: `%LOCALAPPDATA%\eventdesk\eventdesk.sqlite`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("eventdesk.sqlite"))
}

/// Directory the local gateway writes uploaded avatars to
pub fn get_avatar_dir() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("avatars"))
}

/// Open (creating if needed) the local gateway database
pub fn initialize_database(
    db_path: Option<PathBuf>,
) -> anyhow::Result<std::sync::Arc<crate::database::Database>> {
    let db_path = match db_path {
        Some(path) => path,
        None => get_db_path()?,
    };

    tracing::info!("Opening local gateway database at {}", db_path.display());
    let db = crate::database::Database::new(&db_path)?;
    Ok(std::sync::Arc::new(db))
}
