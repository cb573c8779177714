use crate::models::{GenreLabel, MediaType};
use tokio::sync::RwLock;

/// Session-lived genre labels, one list per media type.
#[derive(Debug, Default)]
pub struct GenreCache {
    movie: RwLock<Vec<GenreLabel>>,
    tv: RwLock<Vec<GenreLabel>>,
}

impl GenreCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, media_type: MediaType) -> &RwLock<Vec<GenreLabel>> {
        match media_type {
            MediaType::Movie => &self.movie,
            MediaType::Tv => &self.tv,
        }
    }

    pub async fn replace(&self, media_type: MediaType, labels: Vec<GenreLabel>) {
        *self.slot(media_type).write().await = labels;
    }

    pub async fn is_loaded(&self, media_type: MediaType) -> bool {
        !self.slot(media_type).read().await.is_empty()
    }

    pub async fn titles_for(&self, media_type: MediaType, genre_ids: &[i64]) -> String {
        let labels = self.slot(media_type).read().await;
        join_titles(&labels, genre_ids)
    }
}

/// Titles of `genre_ids` in input order, unknown ids dropped, space separated.
pub fn join_titles(labels: &[GenreLabel], genre_ids: &[i64]) -> String {
    genre_ids
        .iter()
        .filter_map(|id| labels.iter().find(|g| g.id == *id).map(|g| g.title.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
