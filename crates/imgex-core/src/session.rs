//! Persisting what the user did to their images.
//!
//! A [`Session`] records, for each open image, the file it came from and
//! its pipeline. Restoring a session reloads every file and replays its
//! pipeline, reproducing the rasters the user saw.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ViewerConfig;
use crate::error::TransformError;
use crate::image_file::ImageFile;
use crate::raster::FilterType;
use crate::transform::Pipeline;
use crate::transformable::Transformable;

/// File name used when no session path is given.
pub const DEFAULT_SESSION_FILE: &str = "imgex-session.json";

/// Errors raised while saving or restoring a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed session: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Session {0} is locked")]
    Locked(u64),
}

/// One image of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub source: PathBuf,
    pub pipeline: Pipeline,
}

impl SessionEntry {
    /// Reload the source file and replay the pipeline on it.
    pub fn rebuild(&self, filter: FilterType) -> Result<Transformable, SessionError> {
        let mut entity = Transformable::load(&ImageFile::new(&self.source))?.with_filter(filter);
        entity.restore(self.pipeline.clone())?;
        Ok(entity)
    }
}

/// Everything needed to bring a viewing session back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    /// Seconds since the Unix epoch.
    pub started: u64,
    /// Locked sessions refuse new records.
    #[serde(default)]
    pub locked: bool,
    pub entries: Vec<SessionEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Session {
    pub fn new(id: u64) -> Self {
        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            id,
            started,
            locked: false,
            entries: Vec::new(),
        }
    }

    /// Where a session is written when no path is given: next to the
    /// pictures, or in the temp directory when there is no picture
    /// directory.
    pub fn default_location(config: &ViewerConfig) -> PathBuf {
        config
            .picture_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(DEFAULT_SESSION_FILE)
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Record the current pipeline of an image loaded from `source`,
    /// replacing any earlier record for the same file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Locked` if the session is locked; its
    /// entries are left as they were.
    pub fn record(
        &mut self,
        source: impl Into<PathBuf>,
        entity: &Transformable,
    ) -> Result<(), SessionError> {
        if self.locked {
            return Err(SessionError::Locked(self.id));
        }
        let source = source.into();
        let pipeline = entity.pipeline().clone();
        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(entry) => entry.pipeline = pipeline,
            None => self.entries.push(SessionEntry { source, pipeline }),
        }
        Ok(())
    }

    /// Write the session as pretty-printed JSON.
    pub fn persist(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!(
            "Persisted session {} ({} images) to {}",
            self.id,
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a session written by [`Session::persist`].
    pub fn restore(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        let session: Session = serde_json::from_str(&text)?;
        log::debug!(
            "Restored session {} ({} images) from {}",
            session.id,
            session.entries.len(),
            path.display()
        );
        Ok(session)
    }

    /// Rebuild every image. Entries whose file fails to load are skipped
    /// with a warning, so one missing picture does not lose the session.
    pub fn rebuild_all(&self, filter: FilterType) -> Vec<(PathBuf, Transformable)> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.rebuild(filter) {
                Ok(entity) => Some((entry.source.clone(), entity)),
                Err(e) => {
                    log::warn!("Skipping {}: {e}", entry.source.display());
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use crate::raster::Raster;

    fn test_raster(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 4 % 256) as u8, (y * 4 % 256) as u8, 90]);
            }
        }
        Raster::new(width, height, pixels)
    }

    fn temp_path(tag: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("imgex-{tag}-{}.{ext}", std::process::id()))
    }

    #[test]
    fn test_record_replaces_same_source() {
        let mut e = Transformable::from_raster(test_raster(10, 10));
        let mut session = Session::new(7);

        session.record("a.png", &e).unwrap();
        e.move_to(Point::new(3, 3));
        session.record("a.png", &e).unwrap();
        session.record("b.png", &e).unwrap();

        assert_eq!(session.entries.len(), 2);
        assert_eq!(session.entries[0].pipeline.to_string(), "[M(3,3)]");
    }

    #[test]
    fn test_lock_unlock() {
        let mut session = Session::default();
        assert!(!session.is_locked());
        session.lock();
        assert!(session.is_locked());
        session.unlock();
        assert!(!session.is_locked());
    }

    #[test]
    fn test_locked_session_refuses_records() {
        let mut e = Transformable::from_raster(test_raster(10, 10));
        let mut session = Session::new(4);
        session.record("a.png", &e).unwrap();

        session.lock();
        e.move_to(Point::new(3, 3));
        let err = session.record("a.png", &e).unwrap_err();
        assert!(matches!(err, SessionError::Locked(4)));
        assert!(session.record("b.png", &e).is_err());
        assert_eq!(session.entries.len(), 1);
        assert!(session.entries[0].pipeline.is_empty());

        session.unlock();
        session.record("a.png", &e).unwrap();
        assert_eq!(session.entries[0].pipeline.to_string(), "[M(3,3)]");
    }

    #[test]
    fn test_lock_survives_persist() {
        let mut session = Session::new(5);
        session.lock();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert!(back.is_locked());
    }

    #[test]
    fn test_persist_and_rebuild() {
        let image_path = temp_path("session-src", "png");
        test_raster(60, 40).to_rgb_image().unwrap().save(&image_path).unwrap();

        let mut e = Transformable::load(&ImageFile::new(&image_path)).unwrap();
        e.zoom_to(1.5).unwrap();
        e.crop(Rect::new(10, 10, 30, 20)).unwrap();
        e.move_to(Point::new(5, 5));

        let mut session = Session::new(1);
        session.record(&image_path, &e).unwrap();

        let session_path = temp_path("session", "json");
        session.persist(&session_path).unwrap();
        let restored = Session::restore(&session_path).unwrap();
        assert_eq!(restored, session);

        let rebuilt = restored.entries[0].rebuild(FilterType::Bilinear).unwrap();
        std::fs::remove_file(&image_path).ok();
        std::fs::remove_file(&session_path).ok();

        assert_eq!(rebuilt.raster(), e.raster());
        assert_eq!(rebuilt.bounds(), e.bounds());
        assert_eq!(rebuilt.pipeline(), e.pipeline());
    }

    #[test]
    fn test_rebuild_all_skips_missing_files() {
        let mut session = Session::new(2);
        session.entries.push(SessionEntry {
            source: PathBuf::from("/nonexistent/gone.png"),
            pipeline: Pipeline::new(),
        });
        assert!(session.rebuild_all(FilterType::Nearest).is_empty());

        let err = session.entries[0].rebuild(FilterType::Nearest).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transform(TransformError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_non_canonical_pipeline() {
        let path = temp_path("bad-session", "json");
        let json = r#"{
            "id": 3,
            "started": 0,
            "entries": [
                { "source": "a.png",
                  "pipeline": [ {"kind": "move_to", "x": 1, "y": 1},
                                {"kind": "zoom_to", "factor": 2.0} ] }
            ]
        }"#;
        std::fs::write(&path, json).unwrap();
        let err = Session::restore(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SessionError::Format(_)));
    }

    #[test]
    fn test_restore_missing_file() {
        let err = Session::restore(Path::new("/nonexistent/session.json")).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }

    #[test]
    fn test_default_location_in_picture_dir() {
        let config = ViewerConfig {
            picture_dir: Some(PathBuf::from("/home/user/Pictures")),
            ..ViewerConfig::default()
        };
        assert_eq!(
            Session::default_location(&config),
            Path::new("/home/user/Pictures/imgex-session.json")
        );

        let config = ViewerConfig {
            picture_dir: None,
            ..ViewerConfig::default()
        };
        assert_eq!(
            Session::default_location(&config),
            std::env::temp_dir().join(DEFAULT_SESSION_FILE)
        );
    }
}
