use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `data` in one rename.
///
/// The tempfile lives next to the target so the rename never crosses a
/// filesystem. A server polling the file's mtime sees either the old content
/// or the new, never a truncated mix.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".pipeline-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write only when nothing is at `path` yet. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Read a YAML document. A missing file is `Ok(None)`; a blank one reads
/// as YAML `null`.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let doc = if data.trim().is_empty() { "null" } else { data.as_str() };
    Ok(Some(serde_yaml::from_str(doc)?))
}

pub fn write_yaml<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    atomic_write(path, data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/.pipeline/opportunities.yaml");
        atomic_write(&path, b"[]").unwrap();
        atomic_write(&path, b"- id: a1").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "- id: a1");
    }

    #[test]
    fn atomic_write_leaves_no_tempfiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        atomic_write(&path, b"version: 1").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.yaml")]);
    }

    #[test]
    fn write_if_missing_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opportunities.yaml");
        std::fs::write(&path, b"- id: keep").unwrap();
        assert!(!write_if_missing(&path, b"[]").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "- id: keep");
    }

    #[test]
    fn yaml_roundtrip_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.yaml");
        assert_eq!(read_yaml::<Vec<String>>(&path).unwrap(), None);
        write_yaml(&path, &["a1", "b2"]).unwrap();
        assert_eq!(
            read_yaml::<Vec<String>>(&path).unwrap(),
            Some(vec!["a1".to_string(), "b2".to_string()])
        );
    }
}
