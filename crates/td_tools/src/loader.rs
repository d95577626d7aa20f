//! Reading and writing configuration and map files.
//!
//! The core only parses strings; everything touching the filesystem
//! lives here.

use std::fs;
use std::path::Path;

use td_core::data::EnemyCatalogue;
use td_core::error::GameError;
use td_core::map::GameMap;
use td_core::waves::WavePolicy;
use thiserror::Error;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    Read {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("Failed to write file '{path}': {source}")]
    Write {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// File contents were rejected by the core.
    #[error("Invalid file '{path}': {source}")]
    Invalid {
        /// Path to the file.
        path: String,
        /// What the core rejected.
        #[source]
        source: GameError,
    },

    /// Core error not tied to a file.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

fn read(path: &Path) -> ToolResult<String> {
    fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn invalid(path: &Path) -> impl FnOnce(GameError) -> ToolError + '_ {
    move |source| ToolError::Invalid {
        path: path.display().to_string(),
        source,
    }
}

/// Load an enemy catalogue from a JSON file.
pub fn load_catalogue(path: &Path) -> ToolResult<EnemyCatalogue> {
    let text = read(path)?;
    let catalogue = EnemyCatalogue::from_json(&text).map_err(invalid(path))?;
    tracing::debug!(path = %path.display(), types = catalogue.len(), "Read enemy catalogue");
    Ok(catalogue)
}

/// Load a wave policy from a JSON file, checked against `catalogue`.
pub fn load_policy(path: &Path, catalogue: &EnemyCatalogue) -> ToolResult<WavePolicy> {
    let text = read(path)?;
    WavePolicy::from_json(&text, catalogue).map_err(invalid(path))
}

/// Load a map saved with [`save_map`].
pub fn load_map(path: &Path) -> ToolResult<GameMap> {
    let text = read(path)?;
    GameMap::from_ron(&text).map_err(invalid(path))
}

/// Save a map as RON.
pub fn save_map(map: &GameMap, path: &Path) -> ToolResult<()> {
    let text = map.to_ron()?;
    fs::write(path, text).map_err(|source| ToolError::Write {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Saved map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use td_core::map::MapConfig;
    use td_test_utils::fixtures::{SAMPLE_CATALOGUE_JSON, SAMPLE_WAVES_JSON};
    use tempfile::{tempdir, NamedTempFile};

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sample_configs() {
        let types = file_with(SAMPLE_CATALOGUE_JSON);
        let waves = file_with(SAMPLE_WAVES_JSON);
        let catalogue = load_catalogue(types.path()).unwrap();
        let policy = load_policy(waves.path(), &catalogue).unwrap();
        assert_eq!(catalogue.len(), 5);
        assert_eq!(policy.cadence(1).unwrap(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_catalogue(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ToolError::Read { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_invalid_contents_name_the_file() {
        let types = file_with(r#"[{"type": "IA", "max_hp": 0, "speed": 1, "power": 1}]"#);
        let err = load_catalogue(types.path()).unwrap_err();
        match &err {
            ToolError::Invalid { path, source } => {
                assert_eq!(path, &types.path().display().to_string());
                assert!(matches!(source, GameError::Config { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_map_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ron");
        let map = GameMap::from_config(&MapConfig::small()).unwrap();
        save_map(&map, &path).unwrap();
        assert_eq!(load_map(&path).unwrap(), map);
    }
}
