//! Save-as-favorite workflow.
//!
//! Steps run strictly in order for one call: existence check, poster download,
//! record insert. A record is only written once its poster is on disk, so a
//! failed download never leaves a partial favorite behind.

use crate::error::{Error, Result};
use crate::image_store::{ImageFileStore, ImageNaming};
use crate::image_url;
use crate::models::{FavoriteRecord, MediaSummary};
use crate::record_store::{InsertOutcome, MediaRecordStore};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(FavoriteRecord),
    /// A record with this id exists already. Not a failure.
    AlreadySaved,
    /// Another save for the same id has not finished yet.
    InProgress,
    ImageFetchFailed(Error),
}

impl SaveOutcome {
    /// Value published to the UI: `true` only when a new record was created.
    pub fn notified(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }

    pub fn reason(&self) -> &'static str {
        match self {
            SaveOutcome::Saved(_) => "saved",
            SaveOutcome::AlreadySaved => "already_saved",
            SaveOutcome::InProgress => "in_progress",
            SaveOutcome::ImageFetchFailed(_) => "image_fetch_failed",
        }
    }
}

#[derive(Clone)]
pub struct FavoriteWorkflow {
    records: Arc<dyn MediaRecordStore>,
    images: Arc<dyn ImageFileStore>,
    naming: ImageNaming,
    in_flight: Arc<Mutex<HashSet<i64>>>,
    posters: Arc<PosterLocks>,
}

impl FavoriteWorkflow {
    pub fn new(
        records: Arc<dyn MediaRecordStore>,
        images: Arc<dyn ImageFileStore>,
        naming: ImageNaming,
    ) -> Self {
        Self {
            records,
            images,
            naming,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            posters: Arc::new(PosterLocks::default()),
        }
    }

    pub fn records(&self) -> &Arc<dyn MediaRecordStore> {
        &self.records
    }

    pub fn images(&self) -> &Arc<dyn ImageFileStore> {
        &self.images
    }

    /// Errors only come from the record store; download failures are an outcome.
    pub async fn save_favorite(&self, media: &MediaSummary) -> Result<SaveOutcome> {
        if self.records.exists(media.id)? {
            info!(media_id = media.id, "'{}' is already saved", media.title);
            return Ok(SaveOutcome::AlreadySaved);
        }

        let Some(_claim) = InFlight::claim(&self.in_flight, media.id) else {
            info!(media_id = media.id, "Save for '{}' already running", media.title);
            return Ok(SaveOutcome::InProgress);
        };
        self.download_and_insert(media).await
    }

    async fn download_and_insert(&self, media: &MediaSummary) -> Result<SaveOutcome> {
        let url = image_url::tmdb(&media.backdrop_path);
        let filename = self.naming.filename_for(media, &url);
        // Held until the record is in, so a removal sharing this file cannot delete it underneath.
        let _poster = self.posters.lock(&filename).await;

        let image_file = match self.images.add_image(&url, &filename).await {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    media_id = media.id,
                    "Failed to fetch poster for '{}': {}", media.title, e
                );
                return Ok(SaveOutcome::ImageFetchFailed(e));
            }
        };

        let record = FavoriteRecord::from_media(media, image_file);
        match self.records.insert(&record)? {
            InsertOutcome::Inserted => {
                info!(
                    media_id = record.id,
                    image_file = %record.image_file,
                    "Saved favorite '{}'",
                    record.title
                );
                Ok(SaveOutcome::Saved(record))
            }
            InsertOutcome::Conflict => {
                warn!(media_id = record.id, "Favorite inserted concurrently, keeping existing record");
                Ok(SaveOutcome::AlreadySaved)
            }
        }
    }

    pub fn is_saved(&self, id: i64) -> Result<bool> {
        self.records.exists(id)
    }

    pub fn list_favorites(&self) -> Result<Vec<FavoriteRecord>> {
        self.records.list()
    }

    /// Deletes the record and its cached poster. Returns `false` when nothing was saved.
    pub async fn remove_favorite(&self, id: i64) -> Result<bool> {
        let Some(record) = self.records.get(id)? else {
            return Ok(false);
        };
        let _poster = self.posters.lock(poster_key(&record.image_file)).await;
        if !self.records.delete(id)? {
            return Ok(false);
        }
        // Title-named posters may still back another record.
        let shared = self
            .records
            .list()?
            .iter()
            .any(|r| r.image_file == record.image_file);
        if shared {
            info!(media_id = id, "Keeping poster '{}' still in use", record.image_file);
        } else if let Err(e) = self.images.remove_image(&record.image_file).await {
            warn!(media_id = id, "Failed to remove poster '{}': {}", record.image_file, e);
        }
        info!(media_id = id, "Removed favorite '{}'", record.title);
        Ok(true)
    }
}

/// Marks an id as being saved; released on drop so a cancelled save frees it too.
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<i64>>,
    id: i64,
}

impl<'a> InFlight<'a> {
    fn claim(ids: &'a Mutex<HashSet<i64>>, id: i64) -> Option<Self> {
        let mut guard = ids.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(id).then_some(Self { ids, id })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

/// Stem of a stored file identifier; the same key a save locks before downloading.
fn poster_key(image_file: &str) -> &str {
    Path::new(image_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(image_file)
}

/// One async lock per poster file name. Entries nobody holds are pruned on the next lock.
#[derive(Default)]
struct PosterLocks(Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>);

impl PosterLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.0.lock().unwrap_or_else(|e| e.into_inner());
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(key.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }
}
