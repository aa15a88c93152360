use std::path::{Path, PathBuf};

use polyroute_core::{Error, Result};
use serde::{Deserialize, Serialize};

use polyroute_loader::ModelDescriptor;

/// On-disk registry snapshot (spec §6): `{ version, models: [...] }`. A
/// single writer rewrites the file; readers never partially observe it
/// because [`RegistrySnapshot::save_to`] writes a temp file and renames it
/// into place (write-temp, rename).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub version: u32,
    pub models: Vec<ModelDescriptor>,
}

impl RegistrySnapshot {
    pub const CURRENT_VERSION: u32 = 1;
    pub const FILE_NAME: &'static str = "registry-snapshot.json";

    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { version: Self::CURRENT_VERSION, models }
    }

    /// Serializes to `path` via write-temp-then-rename so readers of `path`
    /// never observe a half-written file.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|err| Error::internal_with_source("failed to serialize registry snapshot", err))?;
        let tmp_path = tmp_path_for(path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Error::internal_with_source("failed to create snapshot directory", err))?;
        }
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|err| Error::internal_with_source("failed to write registry snapshot temp file", err))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|err| Error::internal_with_source("failed to rename registry snapshot into place", err))?;
        Ok(())
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let json = tokio::fs::read(path)
            .await
            .map_err(|err| Error::internal_with_source("failed to read registry snapshot", err))?;
        serde_json::from_slice(&json)
            .map_err(|err| Error::internal_with_source("failed to deserialize registry snapshot", err))
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};

    fn sample() -> RegistrySnapshot {
        RegistrySnapshot::new(vec![ModelDescriptor {
            id: ModelId::new("a"),
            name: "a".into(),
            version: "1.0".into(),
            format: "mock".into(),
            architecture: "mock".into(),
            parameter_count: 1,
            context_window: 4096,
            quantization: None,
            capabilities: vec![Capability::Completion],
            engine: ExecutionEngine::Cloud,
            size_gb: 0.1,
            source: "a".into(),
            loaded: false,
        }])
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RegistrySnapshot::FILE_NAME);
        let snapshot = sample();
        snapshot.save_to(&path).await.unwrap();

        let reloaded = RegistrySnapshot::load_from(&path).await.unwrap();
        assert_eq!(reloaded.version, RegistrySnapshot::CURRENT_VERSION);
        assert_eq!(reloaded.models.len(), 1);
        assert_eq!(reloaded.models[0].id, ModelId::new("a"));
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RegistrySnapshot::FILE_NAME);
        sample().save_to(&path).await.unwrap();
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn load_from_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        assert!(RegistrySnapshot::load_from(&path).await.is_err());
    }
}
