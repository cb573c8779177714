//! Home screen view-model.
//!
//! UI intents arrive as [`Action`]s. Trending lists are published on `watch`
//! slots holding the latest value; one-shot results (genre line, detail input,
//! save acknowledgment) go out on the channels in [`HomeEvents`], so they are
//! delivered on whatever task owns the receivers.

use crate::error::Result;
use crate::favorite::{FavoriteWorkflow, SaveOutcome};
use crate::genre::GenreCache;
use crate::models::{DetailViewInput, MediaSummary, MediaType};
use crate::tmdb::CatalogRepository;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub enum Action {
    ViewDidLoad,
    RandomMedia {
        media_type: MediaType,
        genre_ids: Vec<i64>,
    },
    MovieCellTap(MediaSummary),
    TvCellTap(MediaSummary),
    SaveButtonTap(MediaSummary),
}

pub struct HomeEvents {
    pub genre_data: mpsc::UnboundedReceiver<String>,
    pub detail_data: mpsc::UnboundedReceiver<DetailViewInput>,
    pub save_result: mpsc::UnboundedReceiver<bool>,
}

type TrendingSlot = watch::Sender<Option<Vec<MediaSummary>>>;

struct Inner {
    catalog: Arc<dyn CatalogRepository>,
    favorites: FavoriteWorkflow,
    genres: GenreCache,
    movie_data: TrendingSlot,
    tv_data: TrendingSlot,
    genre_tx: mpsc::UnboundedSender<String>,
    detail_tx: mpsc::UnboundedSender<DetailViewInput>,
    save_tx: mpsc::UnboundedSender<bool>,
}

#[derive(Clone)]
pub struct HomeViewModel {
    inner: Arc<Inner>,
}

impl HomeViewModel {
    pub fn new(catalog: Arc<dyn CatalogRepository>, favorites: FavoriteWorkflow) -> (Self, HomeEvents) {
        let (genre_tx, genre_data) = mpsc::unbounded_channel();
        let (detail_tx, detail_data) = mpsc::unbounded_channel();
        let (save_tx, save_result) = mpsc::unbounded_channel();
        let inner = Inner {
            catalog,
            favorites,
            genres: GenreCache::new(),
            movie_data: watch::Sender::new(None),
            tv_data: watch::Sender::new(None),
            genre_tx,
            detail_tx,
            save_tx,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            HomeEvents {
                genre_data,
                detail_data,
                save_result,
            },
        )
    }

    pub fn favorites(&self) -> &FavoriteWorkflow {
        &self.inner.favorites
    }

    /// Runs `action` in the background.
    pub fn dispatch(&self, action: Action) -> JoinHandle<()> {
        let vm = self.clone();
        tokio::spawn(async move { vm.action(action).await })
    }

    /// Runs `action` to completion and publishes its result.
    pub async fn action(&self, action: Action) {
        match action {
            Action::ViewDidLoad => self.load().await,
            Action::RandomMedia {
                media_type,
                genre_ids,
            } => {
                let line = self.genre_titles(media_type, &genre_ids).await;
                publish(&self.inner.genre_tx, line, "genre_data");
            }
            Action::MovieCellTap(media) => self.cell_tap(&media, MediaType::Movie),
            Action::TvCellTap(media) => self.cell_tap(&media, MediaType::Tv),
            Action::SaveButtonTap(media) => match self.save(&media).await {
                Ok(outcome) => publish(&self.inner.save_tx, outcome.notified(), "save_result"),
                Err(e) => error!(media_id = media.id, "Saving favorite failed: {}", e),
            },
        }
    }

    /// Fetches both genre lists and both trending lists concurrently.
    /// A failed fetch leaves its slot untouched.
    pub async fn load(&self) {
        tokio::join!(
            self.fetch_genres(MediaType::Movie),
            self.fetch_genres(MediaType::Tv),
            self.fetch_trending(MediaType::Movie),
            self.fetch_trending(MediaType::Tv),
        );
    }

    pub async fn fetch_genres(&self, media_type: MediaType) {
        let result = match media_type {
            MediaType::Movie => self.inner.catalog.request_genre_movie().await,
            MediaType::Tv => self.inner.catalog.request_genre_tv().await,
        };
        match result {
            Ok(labels) => {
                info!(media_type = %media_type, count = labels.len(), "Loaded genres");
                self.inner.genres.replace(media_type, labels).await;
            }
            Err(e) => warn!(media_type = %media_type, "Fetching genres failed: {}", e),
        }
    }

    pub async fn fetch_trending(&self, media_type: MediaType) {
        let result = match media_type {
            MediaType::Movie => self.inner.catalog.request_trending_movie().await,
            MediaType::Tv => self.inner.catalog.request_trending_tv().await,
        };
        match result {
            Ok(items) => {
                info!(media_type = %media_type, count = items.len(), "Loaded trending");
                self.slot(media_type).send_replace(Some(items));
            }
            Err(e) => warn!(media_type = %media_type, "Fetching trending failed: {}", e),
        }
    }

    fn slot(&self, media_type: MediaType) -> &TrendingSlot {
        match media_type {
            MediaType::Movie => &self.inner.movie_data,
            MediaType::Tv => &self.inner.tv_data,
        }
    }

    /// Latest trending list, `None` until a fetch has succeeded.
    pub fn trending(&self, media_type: MediaType) -> Option<Vec<MediaSummary>> {
        self.slot(media_type).borrow().clone()
    }

    pub fn subscribe_trending(&self, media_type: MediaType) -> watch::Receiver<Option<Vec<MediaSummary>>> {
        self.slot(media_type).subscribe()
    }

    pub async fn genres_loaded(&self, media_type: MediaType) -> bool {
        self.inner.genres.is_loaded(media_type).await
    }

    pub async fn genre_titles(&self, media_type: MediaType, genre_ids: &[i64]) -> String {
        self.inner.genres.titles_for(media_type, genre_ids).await
    }

    pub fn detail_for(&self, media: &MediaSummary, media_type: MediaType) -> Result<DetailViewInput> {
        let is_saved = self.inner.favorites.is_saved(media.id)?;
        Ok(DetailViewInput::new(media, media_type, is_saved))
    }

    fn cell_tap(&self, media: &MediaSummary, media_type: MediaType) {
        match self.detail_for(media, media_type) {
            Ok(detail) => publish(&self.inner.detail_tx, detail, "detail_data"),
            Err(e) => error!(media_id = media.id, "Resolving saved state failed: {}", e),
        }
    }

    pub async fn save(&self, media: &MediaSummary) -> Result<SaveOutcome> {
        self.inner.favorites.save_favorite(media).await
    }
}

fn publish<T>(tx: &mpsc::UnboundedSender<T>, value: T, channel: &str) {
    if tx.send(value).is_err() {
        debug!(channel, "No receiver for home output");
    }
}
