//! Destination for fetched images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::constants::STAGING_DIR_NAME;
use super::error::PersistError;
use super::filename::resolve_unique_path;

/// A place fetched images are persisted to.
///
/// `save` takes ownership of the staged file: on success the staged file
/// no longer exists at its original path.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// Moves a staged image into the library and returns its final path.
    ///
    /// # Errors
    ///
    /// [`PersistError::AuthDenied`] when the library refuses access,
    /// [`PersistError::Failed`] for any other write failure.
    async fn save(&self, staged: &Path) -> Result<PathBuf, PersistError>;

    /// Directory where fetched bytes are staged before [`save`](Self::save).
    fn staging_dir(&self) -> PathBuf;
}

/// Library backed by a plain directory.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PhotoLibrary for DirectoryLibrary {
    #[instrument(skip(self), fields(root = %self.root.display(), staged = %staged.display()))]
    async fn save(&self, staged: &Path) -> Result<PathBuf, PersistError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PersistError::from_io(&self.root, e))?;

        let file_name = staged
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image.jpg");
        let destination = resolve_unique_path(&self.root, file_name);

        if let Err(rename_error) = tokio::fs::rename(staged, &destination).await {
            // Staging may sit on another filesystem; copy instead.
            debug!(error = %rename_error, "rename failed, copying staged file");
            tokio::fs::copy(staged, &destination)
                .await
                .map_err(|e| PersistError::from_io(&destination, e))?;
            let _ = tokio::fs::remove_file(staged).await;
        }

        debug!(path = %destination.display(), "image saved");
        Ok(destination)
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_directory_library_moves_staged_file() {
        let temp_dir = TempDir::new().unwrap();
        let library = DirectoryLibrary::new(temp_dir.path().join("photos"));
        let staging = library.staging_dir();
        std::fs::create_dir_all(&staging).unwrap();
        let staged = staging.join("note_01.jpg");
        std::fs::write(&staged, b"jpeg bytes").unwrap();

        let saved = library.save(&staged).await.unwrap();

        assert_eq!(saved, temp_dir.path().join("photos").join("note_01.jpg"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"jpeg bytes");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_directory_library_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let library = DirectoryLibrary::new(temp_dir.path());
        std::fs::write(temp_dir.path().join("a_01.png"), b"old").unwrap();

        let staging = library.staging_dir();
        std::fs::create_dir_all(&staging).unwrap();
        let staged = staging.join("a_01.png");
        std::fs::write(&staged, b"new").unwrap();

        let saved = library.save(&staged).await.unwrap();
        assert_eq!(saved.file_name().unwrap(), "a_01_2.png");
        assert_eq!(std::fs::read(temp_dir.path().join("a_01.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_directory_library_missing_staged_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let library = DirectoryLibrary::new(temp_dir.path());

        let result = library.save(&temp_dir.path().join("gone.jpg")).await;
        assert!(matches!(result, Err(PersistError::Failed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_directory_library_read_only_root_is_auth_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("locked");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores permission bits.
        let marker = root.join("marker");
        if std::fs::write(&marker, b"x").is_ok() {
            let _ = std::fs::remove_file(&marker);
            return;
        }

        let staged = temp_dir.path().join("a.jpg");
        std::fs::write(&staged, b"x").unwrap();
        let result = DirectoryLibrary::new(&root).save(&staged).await;

        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(PersistError::AuthDenied { .. })));
    }
}
