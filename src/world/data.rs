//! RON loading helpers shared by every definition registry.

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::DataLoadError;

/// Root of the data files (`sim.ron`, `enemies/`, `projectiles/`, `weapons/`).
///
/// `None` keeps every registry on its built-in defaults, which is what tests
/// and headless runs without assets use.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct DataDir(pub Option<PathBuf>);

impl Default for DataDir {
    fn default() -> Self {
        Self(Some(PathBuf::from("assets/data")))
    }
}

/// Read and parse a single RON file.
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path).map_err(|e| DataLoadError::ReadError {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;

    ron::from_str::<T>(&contents).map_err(|e| DataLoadError::ParseError {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

/// Parse every `.ron` file in `dir`, keyed by file stem.
///
/// A missing directory is an error; individual files that fail to parse are
/// logged and skipped so one bad definition does not take the rest down.
pub fn load_ron_dir<T: DeserializeOwned>(dir: &Path) -> Result<HashMap<String, T>, DataLoadError> {
    if !dir.exists() {
        return Err(DataLoadError::FileNotFound(dir.display().to_string()));
    }

    let entries = fs::read_dir(dir).map_err(|e| DataLoadError::ReadError {
        path: dir.display().to_string(),
        details: e.to_string(),
    })?;

    let mut loaded = HashMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "ron") {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match load_ron::<T>(&path) {
            Ok(definition) => {
                loaded.insert(name, definition);
            }
            Err(e) => error!("Skipping definition {:?}: {}", path, e),
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Sample {
        value: u32,
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("inevitable-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_ron::<Sample>(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound(_)));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = scratch_dir("parse");
        let path = dir.join("broken.ron");
        fs::write(&path, "(value: \"nope\")").expect("write file");

        let err = load_ron::<Sample>(&path).unwrap_err();
        match err {
            DataLoadError::ParseError { path: reported, .. } => assert!(reported.ends_with("broken.ron")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directory_load_skips_bad_files() {
        let dir = scratch_dir("dir");
        fs::write(dir.join("good.ron"), "(value: 3)").expect("write file");
        fs::write(dir.join("bad.ron"), "(value: -1)").expect("write file");
        fs::write(dir.join("notes.txt"), "ignored").expect("write file");

        let loaded = load_ron_dir::<Sample>(&dir).expect("directory exists");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("good"), Some(&Sample { value: 3 }));
    }
}
