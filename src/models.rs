use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            _ => Err(anyhow::anyhow!("media type must be 'movie' or 'tv'")),
        }
    }
}

/// A trending movie or TV show as shown on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub backdrop_path: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreLabel {
    pub id: i64,
    pub title: String,
}

/// Locally persisted bookmark. Fields are copied from the summary at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub title: String,
    pub image_file: String,
    pub overview: String,
    pub vote_average: f64,
    pub saved_at: DateTime<Utc>,
}

impl FavoriteRecord {
    pub fn from_media(media: &MediaSummary, image_file: String) -> Self {
        Self {
            id: media.id,
            title: media.title.clone(),
            image_file,
            overview: media.overview.clone(),
            vote_average: media.vote_average,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailViewInput {
    pub id: i64,
    pub title: String,
    pub backdrop_path: String,
    pub vote_average: f64,
    pub overview: String,
    pub media_type: MediaType,
    pub is_saved: bool,
}

impl DetailViewInput {
    pub fn new(media: &MediaSummary, media_type: MediaType, is_saved: bool) -> Self {
        Self {
            id: media.id,
            title: media.title.clone(),
            backdrop_path: media.backdrop_path.clone(),
            vote_average: media.vote_average,
            overview: media.overview.clone(),
            media_type,
            is_saved,
        }
    }
}
