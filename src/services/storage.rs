use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while storing uploaded audio
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File is not an audio file")]
    NotAudio,

    #[error("File exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("Empty upload")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores uploaded audio files on local disk
///
/// Files land in `<root>/music/<uuid><ext>` and are referenced by the
/// relative path `<root-name>/music/<uuid><ext>`, which is also the URL
/// path they are served under.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStorage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn music_dir(&self) -> PathBuf {
        self.root.join("music")
    }

    /// Create the storage directories
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.music_dir()).await?;
        Ok(())
    }

    /// Write `bytes` to a fresh file and return its stored path
    pub async fn save_audio(
        &self,
        content_type: Option<&str>,
        original_filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if !content_type.map(is_audio).unwrap_or(false) {
            return Err(StorageError::NotAudio);
        }
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge(self.max_bytes));
        }

        let extension = original_filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        let filename = format!("{}{}", uuid::Uuid::new_v4(), extension);
        let stored = self.music_dir().join(&filename);

        self.ensure_dirs().await?;
        tokio::fs::write(&stored, bytes).await?;

        tracing::info!("Stored upload {} ({} bytes)", stored.display(), bytes.len());

        Ok(stored.to_string_lossy().replace('\\', "/"))
    }

    /// Remove a previously stored file; only paths inside the root are touched
    pub async fn remove(&self, stored_path: &str) -> Result<bool, StorageError> {
        let path = Path::new(stored_path);
        if !path.starts_with(&self.root) || path.components().any(|c| c.as_os_str() == "..") {
            tracing::warn!("Refusing to remove file outside upload root: {}", stored_path);
            return Ok(false);
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_audio(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("audio/")
}

/// Track name derived from an uploaded file name when none was given
pub fn track_name_from_filename(filename: Option<&str>) -> Option<String> {
    filename
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage(max_bytes: usize) -> UploadStorage {
        let root = std::env::temp_dir().join(format!("tunemap-test-{}", uuid::Uuid::new_v4()));
        UploadStorage::new(root, max_bytes)
    }

    #[tokio::test]
    async fn test_save_and_remove_audio() {
        let storage = temp_storage(1024);
        let path = storage
            .save_audio(Some("audio/mpeg"), Some("song.MP3"), b"ID3data")
            .await
            .unwrap();

        assert!(path.ends_with(".mp3"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"ID3data");

        assert!(storage.remove(&path).await.unwrap());
        assert!(!storage.remove(&path).await.unwrap());

        let _ = tokio::fs::remove_dir_all(storage.root()).await;
    }

    #[tokio::test]
    async fn test_rejects_non_audio() {
        let storage = temp_storage(1024);
        let err = storage
            .save_audio(Some("image/png"), Some("cover.png"), b"png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotAudio));

        let err = storage.save_audio(None, None, b"raw").await.unwrap_err();
        assert!(matches!(err, StorageError::NotAudio));
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let storage = temp_storage(4);
        let err = storage
            .save_audio(Some("audio/wav"), None, b"too many bytes")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::TooLarge(4)));
    }

    #[tokio::test]
    async fn test_remove_refuses_paths_outside_root() {
        let storage = temp_storage(1024);
        assert!(!storage.remove("/etc/passwd").await.unwrap());
    }

    #[test]
    fn test_track_name_from_filename() {
        assert_eq!(track_name_from_filename(Some("My Song.flac")), Some("My Song".to_string()));
        assert_eq!(track_name_from_filename(None), None);
    }
}
