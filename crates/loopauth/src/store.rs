//! Token file persistence.
//!
//! The file location is an explicit parameter on every call; the library
//! keeps no process-wide default path. Writes are atomic
//! (write-temp-then-rename) so a crash never leaves a partial file behind.

use crate::error::{Error, Result};
use crate::token::TokenRecord;
use chrono::Utc;
use std::fs;
use std::path::Path;

/// Saves a token record to `path` atomically.
///
/// # Errors
///
/// Returns an I/O error if the temp file cannot be written or renamed.
pub fn save(path: &Path, record: &TokenRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), "token record saved");
    Ok(())
}

/// Loads a token record from `path`.
///
/// # Errors
///
/// Returns [`Error::TokenFileNotFound`] if the file does not exist and
/// [`Error::TokenFileParse`] if its content is not a valid record.
pub fn load(path: &Path) -> Result<TokenRecord> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::TokenFileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|source| Error::TokenFileParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Updates the record at `path` after a refresh.
///
/// Overwrites the access token, lifetime, and issuance timestamp (now).
/// The stored refresh token is overwritten only when `refresh_token` is a
/// non-empty value; providers are not required to rotate refresh tokens on
/// every refresh.
///
/// # Errors
///
/// Propagates [`load`] and [`save`] failures.
pub fn update(
    path: &Path,
    access_token: &str,
    expires_in: u32,
    refresh_token: Option<&str>,
) -> Result<TokenRecord> {
    let mut record = load(path)?;

    record.access_token = access_token.to_string();
    record.expires_in = expires_in;
    record.issued_at = Utc::now();
    if let Some(refresh) = refresh_token
        && !refresh.is_empty()
    {
        record.refresh_token = refresh.to_string();
    }

    save(path, &record)?;
    Ok(record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TokenRecord {
        TokenRecord {
            access_token: "access123".to_string(),
            refresh_token: "refresh456".to_string(),
            expires_in: 3600,
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");

        let record = sample();
        save(&path, &record).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        save(&path, &sample()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("token.json")]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load(&path), Err(Error::TokenFileNotFound(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json!!!").unwrap();
        assert!(matches!(load(&path), Err(Error::TokenFileParse { .. })));
    }

    #[test]
    fn test_update_rotates_refresh_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        save(&path, &sample()).unwrap();

        let updated = update(&path, "access789", 7200, Some("refresh999")).unwrap();
        assert_eq!(updated.access_token, "access789");
        assert_eq!(updated.expires_in, 7200);
        assert_eq!(updated.refresh_token, "refresh999");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn test_update_preserves_refresh_token_when_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        save(&path, &sample()).unwrap();

        let updated = update(&path, "access789", 7200, Some("")).unwrap();
        assert_eq!(updated.refresh_token, "refresh456");

        let updated = update(&path, "access000", 7200, None).unwrap();
        assert_eq!(updated.refresh_token, "refresh456");
    }

    #[test]
    fn test_update_advances_issued_at() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");

        let mut old = sample();
        old.issued_at = Utc::now() - chrono::Duration::seconds(3000);
        save(&path, &old).unwrap();

        let updated = update(&path, "access789", 3600, None).unwrap();
        assert!(updated.issued_at > old.issued_at);
    }
}
