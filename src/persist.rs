use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IndexerError, Result};

/// Write `value` as pretty JSON via a temp file in the target directory,
/// so readers never see a half-written store.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| IndexerError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| IndexerError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_parent_dirs_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.json");

        write_json_atomic(&path, &vec![1, 2, 3]).await.unwrap();
        write_json_atomic(&path, &vec![4]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let value: Vec<i32> = serde_json::from_str(&content).unwrap();
        assert_eq!(value, vec![4]);

        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
