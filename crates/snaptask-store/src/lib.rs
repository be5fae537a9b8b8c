pub mod crop;
mod watch;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, warn};

use snaptask_core::screenshot::{is_image_file, Screenshot};

pub use crop::{crop_to_selection, CropSelection};
pub use watch::ScreenshotFeed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("watch error: {0}")]
    Watch(String),
}

/// A directory of captured screenshot files.
///
/// The store owns the on-disk bytes: files enter via [`save`](Self::save),
/// [`save_png`](Self::save_png) or [`copy_in`](Self::copy_in) and leave via
/// the delete operations. Listings cover recognized image extensions only,
/// newest first.
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_data_dir().join("screenshots"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current listing, newest first. An unreadable directory degrades to an
    /// empty listing.
    pub async fn list(&self) -> Vec<Screenshot> {
        match self.try_list().await {
            Ok(shots) => shots,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to list screenshots");
                Vec::new()
            }
        }
    }

    async fn try_list(&self) -> Result<Vec<Screenshot>, StoreError> {
        let mut shots = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_image_file(&path) {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            shots.push(Screenshot { path, modified });
        }
        // Generated names embed the capture timestamp, so the name breaks
        // mtime ties in the same newest-first direction.
        shots.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.cmp(&a.path))
        });
        Ok(shots)
    }

    /// Write a new screenshot from raw encoded bytes.
    ///
    /// The bytes land under a `.tmp` name first and are renamed into place,
    /// so a listing never sees a partial file.
    pub async fn save(&self, data: Bytes) -> Result<Screenshot, StoreError> {
        let path = self.next_path("png").await?;
        self.write_atomic(&path, &data).await?;
        debug!(path = %path.display(), "screenshot saved");
        Ok(Screenshot {
            path,
            modified: Utc::now(),
        })
    }

    /// Encode a decoded capture as PNG and save it.
    pub async fn save_png(&self, img: &DynamicImage) -> Result<Screenshot, StoreError> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        self.save(Bytes::from(buf)).await
    }

    /// Duplicate an external file's bytes into the store under a generated
    /// name. A recognized source extension is preserved; anything else is
    /// stored as png.
    pub async fn copy_in(&self, source: &Path) -> Result<Screenshot, StoreError> {
        let data = tokio::fs::read(source).await?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| snaptask_core::screenshot::IMAGE_EXTENSIONS.contains(&e.as_str()))
            .unwrap_or_else(|| "png".to_string());
        let path = self.next_path(&ext).await?;
        self.write_atomic(&path, &data).await?;
        debug!(from = %source.display(), to = %path.display(), "screenshot copied in");
        Ok(Screenshot {
            path,
            modified: Utc::now(),
        })
    }

    /// Remove a screenshot. Deleting an already-absent file succeeds.
    pub async fn delete(&self, path: &Path) -> Result<(), StoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every file in the store, continuing past individual failures.
    pub async fn delete_all(&self) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to read store for delete_all");
                return;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to delete screenshot");
            }
        }
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await?;
        match tokio::fs::rename(&tmp, path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e.into())
            }
        }
    }

    /// Next free timestamp-derived file name. The millisecond stamp is bumped
    /// until the name is unused, so rapid captures cannot collide.
    async fn next_path(&self, ext: &str) -> Result<PathBuf, StoreError> {
        let mut stamp = Utc::now().timestamp_millis();
        loop {
            let candidate = self.dir.join(format!("screenshot_{stamp}.{ext}"));
            match tokio::fs::try_exists(&candidate).await {
                Ok(false) => return Ok(candidate),
                Ok(true) => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Same default data directory logic as `snaptask_db::data_dir()` without
/// taking a dependency on the db crate.
fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("snaptask")
}
