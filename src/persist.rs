use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::Session;

const CONFIG_DIR: &str = "club_dashboard";
const SESSION_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session: Session,
}

/// Stored session, if one exists, parses, and has the current version.
/// Expiry is left to the caller.
pub fn load_session_from(path: &Path) -> Option<Session> {
    let raw = fs::read_to_string(path).ok()?;
    let file = serde_json::from_str::<SessionFile>(&raw).ok()?;
    if file.version != SESSION_VERSION {
        return None;
    }
    Some(file.session)
}

pub fn save_session_to(path: &Path, session: &Session) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = SessionFile {
        version: SESSION_VERSION,
        session: session.clone(),
    };
    let json = serde_json::to_string(&file)?;
    let tmp = path.with_extension("json.tmp");
    write_private(&tmp, json.as_bytes())?;
    fs::rename(&tmp, path)
}

/// Tokens are readable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a leftover tmp file keeps its bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

/// Removes the stored session. A file that is already gone is not an error.
pub fn clear_session(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

pub fn session_path() -> Option<PathBuf> {
    session_path_with(|key| std::env::var(key).ok())
}

fn session_path_with(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    // Prefer XDG config.
    if let Some(base) = lookup("XDG_CONFIG_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CONFIG_DIR).join(SESSION_FILE));
    }
    let home = lookup("HOME")?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(SESSION_FILE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_900_000_000,
            email: "coach@club.test".to_string(),
        }
    }

    #[test]
    fn session_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SESSION_FILE);
        save_session_to(&path, &session()).unwrap();
        assert_eq!(load_session_from(&path), Some(session()));

        clear_session(&path).unwrap();
        assert_eq!(load_session_from(&path), None);
        // Clearing twice is fine.
        clear_session(&path).unwrap();
    }

    #[test]
    fn clear_session_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be removed with remove_file.
        assert!(clear_session(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);
        save_session_to(&path, &session()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn prefers_xdg_config_home() {
        let path = session_path_with(|key| match key {
            "XDG_CONFIG_HOME" => Some("/tmp/xdg".to_string()),
            "HOME" => Some("/home/coach".to_string()),
            _ => None,
        });
        assert_eq!(
            path,
            Some(PathBuf::from("/tmp/xdg/club_dashboard/session.json"))
        );
    }

    #[test]
    fn falls_back_to_home_config() {
        let path = session_path_with(|key| match key {
            "XDG_CONFIG_HOME" => Some("  ".to_string()),
            "HOME" => Some("/home/coach".to_string()),
            _ => None,
        });
        assert_eq!(
            path,
            Some(PathBuf::from("/home/coach/.config/club_dashboard/session.json"))
        );
        assert_eq!(session_path_with(|_| None), None);
    }
}
