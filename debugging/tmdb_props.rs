//! Fetch TMDB genres and today's trending list for a media type and print what the home screen would show.
//! Usage:
//!   cargo run --bin tmdb_props -- movie
//!   cargo run --bin tmdb_props -- tv
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinefav::genre::join_titles;
use cinefav::models::MediaType;
use cinefav::poster::Poster;
use cinefav::tmdb::{CatalogRepository, TmdbClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present for local runs.
    dotenv().ok();

    let media_type: MediaType = env::args()
        .nth(1)
        .context("usage: tmdb_props <movie|tv>")?
        .parse()?;
    let api_key = env::var("TMDB_API_KEY").context("Missing TMDB_API_KEY in environment")?;
    let language = env::var("TMDB_LANGUAGE").unwrap_or_else(|_| "en-US".to_string());
    let client = TmdbClient::new(api_key, language)?;

    let (genres, trending) = match media_type {
        MediaType::Movie => tokio::try_join!(
            client.request_genre_movie(),
            client.request_trending_movie()
        )?,
        MediaType::Tv => tokio::try_join!(client.request_genre_tv(), client.request_trending_tv())?,
    };

    println!("{} genres:", genres.len());
    for g in &genres {
        println!("  {:>6}  {}", g.id, g.title);
    }

    println!("{} trending:", trending.len());
    for media in &trending {
        let props = json!({
            "id": media.id,
            "title": media.title,
            "genres": join_titles(&genres, &media.genre_ids),
            "vote_average": media.vote_average,
            "poster": Poster::remote(&media.backdrop_path).url(),
        });
        println!("{}", serde_json::to_string_pretty(&props)?);
    }

    Ok(())
}
