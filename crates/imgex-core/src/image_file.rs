//! Locating image files on disk.

use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;

/// An image file an entity is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve a user-supplied name.
    ///
    /// Absolute paths are kept. Relative names are looked up in the
    /// configured picture directory, or used as-is when there is none.
    pub fn resolve(name: impl AsRef<Path>, config: &ViewerConfig) -> Self {
        let name = name.as_ref();
        let path = match &config.picture_dir {
            Some(dir) if name.is_relative() => dir.join(name),
            _ => name.to_path_buf(),
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its directory, for diagnostics.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(dir: Option<&str>) -> ViewerConfig {
        ViewerConfig {
            picture_dir: dir.map(PathBuf::from),
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn test_resolve_bare_name() {
        let file = ImageFile::resolve("cat.png", &config_with(Some("/home/me/Pictures")));
        assert_eq!(file.path(), Path::new("/home/me/Pictures/cat.png"));
        assert_eq!(file.name(), "cat.png");
    }

    #[test]
    fn test_resolve_absolute_path_kept() {
        let file = ImageFile::resolve("/tmp/dog.jpg", &config_with(Some("/home/me/Pictures")));
        assert_eq!(file.path(), Path::new("/tmp/dog.jpg"));
    }

    #[test]
    fn test_resolve_without_picture_dir() {
        let file = ImageFile::resolve("shots/a.png", &config_with(None));
        assert_eq!(file.path(), Path::new("shots/a.png"));
        assert_eq!(file.name(), "a.png");
    }
}
