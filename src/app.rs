use crate::config::Config;
use crate::favorite::{FavoriteWorkflow, SaveOutcome};
use crate::home::{Action, HomeViewModel};
use crate::image_store::FsImageStore;
use crate::models::{MediaSummary, MediaType};
use crate::poster::Poster;
use crate::record_store::SqliteRecordStore;
use crate::tmdb::TmdbClient;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub home: HomeViewModel,
}

pub async fn run_server(config: Config) -> Result<()> {
    let records = Arc::new(SqliteRecordStore::open(&config.database_path())?);
    let images = Arc::new(FsImageStore::new(config.images_dir())?);
    let catalog = Arc::new(TmdbClient::new(&config.tmdb_api_key, &config.language)?);
    info!(
        data_dir = %config.data_dir.display(),
        language = %config.language,
        naming = ?config.image_naming,
        "Catalog and favorites ready"
    );

    let favorites = FavoriteWorkflow::new(records, images, config.image_naming);
    // Results are returned to HTTP callers directly; the event channels have no reader here.
    let (home, _events) = HomeViewModel::new(catalog, favorites);
    home.dispatch(Action::ViewDidLoad);

    let app = build_router(AppState { home });

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trending/:media_type", get(trending))
        .route("/genres/:media_type", get(genres))
        .route("/detail/:media_type", post(detail))
        .route("/favorites", post(save_favorite).get(list_favorites))
        .route("/favorites/:id", delete(remove_favorite))
        .route("/favorites/:id/poster", get(favorite_poster))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
        .into_response()
}

/// Runs store work on the blocking pool; SQLite queries and poster reads are synchronous.
async fn off_runtime<T: Send + 'static>(
    work: impl FnOnce() -> T + Send + 'static,
) -> Result<T, Response> {
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!("Favorites store task failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
    })
}

fn parse_media_type(raw: &str) -> Result<MediaType, Response> {
    raw.parse()
        .map_err(|e: anyhow::Error| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

#[derive(Serialize)]
struct TrendingEntry {
    #[serde(flatten)]
    media: MediaSummary,
    poster_url: Option<String>,
}

async fn trending(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let media_type = match parse_media_type(&raw) {
        Ok(t) => t,
        Err(res) => return res,
    };
    if state.home.trending(media_type).is_none() {
        state.home.fetch_trending(media_type).await;
    }
    let Some(items) = state.home.trending(media_type) else {
        return error_response(StatusCode::BAD_GATEWAY, "Trending list unavailable");
    };
    let entries: Vec<TrendingEntry> = items
        .into_iter()
        .map(|media| TrendingEntry {
            poster_url: Poster::remote(&media.backdrop_path).url().map(str::to_string),
            media,
        })
        .collect();
    Json(entries).into_response()
}

#[derive(Deserialize)]
struct GenreQuery {
    ids: Option<String>,
}

async fn genres(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<GenreQuery>,
) -> Response {
    let media_type = match parse_media_type(&raw) {
        Ok(t) => t,
        Err(res) => return res,
    };
    let ids = match parse_ids(query.ids.as_deref().unwrap_or_default()) {
        Some(ids) => ids,
        None => return error_response(StatusCode::BAD_REQUEST, "ids must be comma-separated integers"),
    };
    if !state.home.genres_loaded(media_type).await {
        state.home.fetch_genres(media_type).await;
    }
    let line = state.home.genre_titles(media_type, &ids).await;
    Json(json!({ "genres": line })).into_response()
}

fn parse_ids(raw: &str) -> Option<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

async fn detail(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(media): Json<MediaSummary>,
) -> Response {
    let media_type = match parse_media_type(&raw) {
        Ok(t) => t,
        Err(res) => return res,
    };
    let media_id = media.id;
    let home = state.home.clone();
    let detail = match off_runtime(move || home.detail_for(&media, media_type)).await {
        Ok(detail) => detail,
        Err(res) => return res,
    };
    match detail {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => {
            error!(media_id, "Detail lookup failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
        }
    }
}

async fn save_favorite(State(state): State<AppState>, Json(media): Json<MediaSummary>) -> Response {
    match state.home.save(&media).await {
        Ok(SaveOutcome::Saved(record)) => (
            StatusCode::CREATED,
            Json(json!({ "saved": true, "record": record })),
        )
            .into_response(),
        Ok(outcome) => Json(json!({ "saved": false, "reason": outcome.reason() })).into_response(),
        Err(e) => {
            error!(media_id = media.id, "Saving favorite failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
        }
    }
}

async fn list_favorites(State(state): State<AppState>) -> Response {
    let favorites = state.home.favorites().clone();
    let listed = match off_runtime(move || favorites.list_favorites()).await {
        Ok(listed) => listed,
        Err(res) => return res,
    };
    match listed {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!("Listing favorites failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
        }
    }
}

async fn remove_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.home.favorites().remove_favorite(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("No favorite with id {}", id)),
        Err(e) => {
            error!(media_id = id, "Removing favorite failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
        }
    }
}

async fn favorite_poster(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let favorites = state.home.favorites().clone();
    let lookup = off_runtime(move || {
        favorites.records().get(id).map(|record| {
            record.map(|r| Poster::local(&r.image_file).bytes(favorites.images().as_ref()))
        })
    })
    .await;
    match lookup {
        Err(res) => res,
        Ok(Ok(Some(Some(bytes)))) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Ok(Ok(Some(None))) => error_response(StatusCode::NOT_FOUND, "Poster not cached"),
        Ok(Ok(None)) => error_response(StatusCode::NOT_FOUND, format!("No favorite with id {}", id)),
        Ok(Err(e)) => {
            error!(media_id = id, "Poster lookup failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Favorites store unavailable")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_ids("12, 99,28"), Some(vec![12, 99, 28]));
        assert_eq!(parse_ids(""), Some(vec![]));
        assert_eq!(parse_ids("12,x"), None);
    }
}
