use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` through a synced temp file in the same
/// directory, so readers never observe a half-written catalog or config.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `data` to `path` unless a file is already there. Returns whether
/// anything was written.
pub fn seed_file(path: &Path, data: &[u8]) -> Result<bool> {
    if path.try_exists()? {
        return Ok(false);
    }
    atomic_write(path, data).map(|()| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".drip/nested/activities.yaml");
        atomic_write(&path, b"activities: []").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "activities: []");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        atomic_write(&path, b"timezone: UTC").unwrap();
        atomic_write(&path, b"timezone: GMT").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "timezone: GMT");
    }

    #[test]
    fn seed_file_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activities.yaml");
        assert!(seed_file(&path, b"activities: []").unwrap());
        assert!(!seed_file(&path, b"activities: [{}]").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "activities: []");
    }
}
