mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cinefav::app::{build_router, AppState};
use cinefav::record_store::MediaRecordStore;
use serde_json::{json, Value};
use support::{full_catalog, harness, FakeCatalog, FakeImages, Harness};
use tower::util::ServiceExt;

fn app(h: &Harness) -> Router {
    build_router(AppState {
        home: h.home.clone(),
    })
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.oneshot(req).await.expect("router response");
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, body.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

fn dune_body() -> Value {
    json!({
        "id": 42,
        "title": "Dune",
        "backdrop_path": "/dune.jpg",
        "overview": "Spice",
        "vote_average": 8.1,
        "genre_ids": [28]
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let h = harness(full_catalog(), FakeImages::default());
    let (status, body) = send(app(&h), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn trending_loads_on_demand_and_resolves_poster_urls() {
    let h = harness(full_catalog(), FakeImages::default());
    let (status, body) = send(app(&h), get("/trending/movie")).await;
    assert_eq!(status, StatusCode::OK);

    let items = json_body(&body);
    let items = items.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Dune");
    assert_eq!(
        items[0]["poster_url"],
        "https://image.tmdb.org/t/p/original/42.jpg"
    );
}

#[tokio::test]
async fn trending_failure_is_bad_gateway() {
    let catalog = FakeCatalog {
        trending_tv: None,
        ..full_catalog()
    };
    let h = harness(catalog, FakeImages::default());
    let (status, _) = send(app(&h), get("/trending/tv")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unknown_media_type_is_rejected() {
    let h = harness(full_catalog(), FakeImages::default());
    let (status, _) = send(app(&h), get("/trending/anime")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn genre_line_follows_requested_order() {
    let h = harness(full_catalog(), FakeImages::default());
    let (status, body) = send(app(&h), get("/genres/movie?ids=12,99,28")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["genres"], "Adventure Action");

    let (status, _) = send(app(&h), get("/genres/movie?ids=12,abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn save_then_resave_reports_already_saved() {
    let h = harness(full_catalog(), FakeImages::default());

    let (status, body) = send(app(&h), post_json("/favorites", dune_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = json_body(&body);
    assert_eq!(body["saved"], true);
    assert_eq!(body["record"]["image_file"], "Dune.jpg");

    let (status, body) = send(app(&h), post_json("/favorites", dune_body())).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["saved"], false);
    assert_eq!(body["reason"], "already_saved");
}

#[tokio::test]
async fn save_with_failing_download_reports_reason_and_stores_nothing() {
    let h = harness(full_catalog(), FakeImages::failing());
    let (status, body) = send(app(&h), post_json("/favorites", dune_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["reason"], "image_fetch_failed");
    assert!(!h.records.exists(42).unwrap());
}

#[tokio::test]
async fn detail_reflects_saved_state() {
    let h = harness(full_catalog(), FakeImages::default());
    let (_, body) = send(app(&h), post_json("/detail/tv", dune_body())).await;
    let detail = json_body(&body);
    assert_eq!(detail["media_type"], "tv");
    assert_eq!(detail["is_saved"], false);

    send(app(&h), post_json("/favorites", dune_body())).await;
    let (status, body) = send(app(&h), post_json("/detail/movie", dune_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["is_saved"], true);
}

#[tokio::test]
async fn lists_serves_poster_and_deletes_favorites() {
    let h = harness(full_catalog(), FakeImages::default());
    send(app(&h), post_json("/favorites", dune_body())).await;

    let (status, body) = send(app(&h), get("/favorites")).await;
    assert_eq!(status, StatusCode::OK);
    let list = json_body(&body);
    assert_eq!(list.as_array().map(|a| a.len()), Some(1));
    assert_eq!(list[0]["id"], 42);

    let (status, body) = send(app(&h), get("/favorites/42/poster")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"jpeg-bytes");

    let delete = Request::delete("/favorites/42")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = send(app(&h), delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app(&h), get("/favorites/42/poster")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = Request::delete("/favorites/42")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = send(app(&h), delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn poster_of_record_without_cached_file_is_not_found() {
    let h = harness(full_catalog(), FakeImages::default());
    send(app(&h), post_json("/favorites", dune_body())).await;
    h.images.files.lock().unwrap().clear();

    let (status, body) = send(app(&h), get("/favorites/42/poster")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["message"], "Poster not cached");

    let (status, body) = send(app(&h), get("/favorites/7/poster")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["message"], "No favorite with id 7");
}
