#![allow(dead_code)]

use cinefav::error::{Error, Result};
use cinefav::favorite::FavoriteWorkflow;
use cinefav::home::{HomeEvents, HomeViewModel};
use cinefav::image_store::{ImageFileStore, ImageNaming};
use cinefav::models::{GenreLabel, MediaSummary};
use cinefav::record_store::SqliteRecordStore;
use cinefav::tmdb::CatalogRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn unavailable(what: &str) -> Error {
    Error::Status {
        url: format!("https://api.themoviedb.org/3/{what}"),
        status: 503,
        body: "unavailable".to_string(),
    }
}

/// Catalog with canned responses; `None` makes that request fail.
#[derive(Default)]
pub struct FakeCatalog {
    pub movie_genres: Option<Vec<GenreLabel>>,
    pub tv_genres: Option<Vec<GenreLabel>>,
    pub trending_movies: Option<Vec<MediaSummary>>,
    pub trending_tv: Option<Vec<MediaSummary>>,
}

#[async_trait::async_trait]
impl CatalogRepository for FakeCatalog {
    async fn request_genre_movie(&self) -> Result<Vec<GenreLabel>> {
        self.movie_genres
            .clone()
            .ok_or_else(|| unavailable("genre/movie/list"))
    }
    async fn request_genre_tv(&self) -> Result<Vec<GenreLabel>> {
        self.tv_genres.clone().ok_or_else(|| unavailable("genre/tv/list"))
    }
    async fn request_trending_movie(&self) -> Result<Vec<MediaSummary>> {
        self.trending_movies
            .clone()
            .ok_or_else(|| unavailable("trending/movie/day"))
    }
    async fn request_trending_tv(&self) -> Result<Vec<MediaSummary>> {
        self.trending_tv
            .clone()
            .ok_or_else(|| unavailable("trending/tv/day"))
    }
}

/// In-memory image store recording every download request.
#[derive(Default)]
pub struct FakeImages {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FakeImages {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn has_file(&self, file: &str) -> bool {
        self.files.lock().unwrap().contains_key(file)
    }
}

#[async_trait::async_trait]
impl ImageFileStore for FakeImages {
    async fn add_image(&self, url: &str, filename: &str) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), filename.to_string()));
        let file = format!("{filename}.jpg");
        // The file lands before the delay, like a download whose caller is still finishing up.
        if !self.fail {
            self.files
                .lock()
                .unwrap()
                .insert(file.clone(), b"jpeg-bytes".to_vec());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Error::Status {
                url: url.to_string(),
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(file)
    }

    fn load_image(&self, file: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(file).cloned()
    }

    async fn remove_image(&self, file: &str) -> Result<()> {
        self.files.lock().unwrap().remove(file);
        Ok(())
    }
}

pub fn media(id: i64, title: &str) -> MediaSummary {
    MediaSummary {
        id,
        title: title.to_string(),
        backdrop_path: format!("/{id}.jpg"),
        overview: format!("{title} overview"),
        vote_average: 7.8,
        genre_ids: vec![28, 12],
    }
}

pub fn genres(pairs: &[(i64, &str)]) -> Vec<GenreLabel> {
    pairs
        .iter()
        .map(|(id, title)| GenreLabel {
            id: *id,
            title: title.to_string(),
        })
        .collect()
}

pub fn full_catalog() -> FakeCatalog {
    FakeCatalog {
        movie_genres: Some(genres(&[(28, "Action"), (12, "Adventure")])),
        tv_genres: Some(genres(&[(18, "Drama"), (35, "Comedy")])),
        trending_movies: Some(vec![media(42, "Dune"), media(43, "Heat")]),
        trending_tv: Some(vec![media(7, "Severance")]),
    }
}

pub struct Harness {
    pub home: HomeViewModel,
    pub events: HomeEvents,
    pub records: Arc<SqliteRecordStore>,
    pub images: Arc<FakeImages>,
}

pub fn harness(catalog: FakeCatalog, images: FakeImages) -> Harness {
    let records = Arc::new(SqliteRecordStore::open_in_memory().expect("in-memory store"));
    let images = Arc::new(images);
    let favorites = FavoriteWorkflow::new(records.clone(), images.clone(), ImageNaming::Title);
    let (home, events) = HomeViewModel::new(Arc::new(catalog), favorites);
    Harness {
        home,
        events,
        records,
        images,
    }
}
