use crate::error::{Error, Result};
use crate::models::{GenreLabel, MediaSummary, MediaType};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn request_genre_movie(&self) -> Result<Vec<GenreLabel>>;
    async fn request_genre_tv(&self) -> Result<Vec<GenreLabel>>;
    async fn request_trending_movie(&self) -> Result<Vec<MediaSummary>>;
    async fn request_trending_tv(&self) -> Result<Vec<MediaSummary>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cinefav/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
            base_url: TMDB_BASE.to_string(),
        })
    }

    /// Points the client at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn genres(&self, media_type: MediaType) -> Result<Vec<GenreLabel>> {
        let url = format!(
            "{}/genre/{}/list?api_key={}&language={}",
            self.base_url,
            media_type.as_path(),
            self.api_key,
            urlencoding::encode(&self.language)
        );
        let data: GenreResponse = self.get_json(&url).await?;
        Ok(data.genres.into_iter().map(GenreLabel::from).collect())
    }

    async fn trending(&self, media_type: MediaType) -> Result<Vec<MediaSummary>> {
        let url = format!(
            "{}/trending/{}/day?api_key={}&language={}",
            self.base_url,
            media_type.as_path(),
            self.api_key,
            urlencoding::encode(&self.language)
        );
        let data: TrendingResponse = self.get_json(&url).await?;
        Ok(data
            .results
            .into_iter()
            .map(TrendingItem::into_summary)
            .collect())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(Error::Status {
                url: redact_api_key(url),
                status: status.as_u16(),
                body: text,
            });
        }
        debug!(url = %redact_api_key(url), bytes = text.len(), "TMDB response");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogRepository for TmdbClient {
    async fn request_genre_movie(&self) -> Result<Vec<GenreLabel>> {
        self.genres(MediaType::Movie).await
    }

    async fn request_genre_tv(&self) -> Result<Vec<GenreLabel>> {
        self.genres(MediaType::Tv).await
    }

    async fn request_trending_movie(&self) -> Result<Vec<MediaSummary>> {
        self.trending(MediaType::Movie).await
    }

    async fn request_trending_tv(&self) -> Result<Vec<MediaSummary>> {
        self.trending(MediaType::Tv).await
    }
}

#[derive(Debug, Deserialize)]
struct GenreResponse {
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: i64,
    name: String,
}

impl From<Genre> for GenreLabel {
    fn from(g: Genre) -> Self {
        GenreLabel {
            id: g.id,
            title: g.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    results: Vec<TrendingItem>,
}

/// Movies carry `title`, shows carry `name`.
#[derive(Debug, Deserialize)]
struct TrendingItem {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

impl TrendingItem {
    fn into_summary(self) -> MediaSummary {
        MediaSummary {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            backdrop_path: self.backdrop_path.unwrap_or_default(),
            overview: self.overview,
            vote_average: self.vote_average,
            genre_ids: self.genre_ids,
        }
    }
}

fn redact_api_key(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}
