//! Defines routes for the blog, the photo/video gallery, and resized assets.
//!
//! ## Structure
//! - **Blog**
//!   - `GET /` and `GET /blog` - paginated index (supports `?skip=`)
//!   - `GET /blog/{*path}` - single entry by identifier
//!
//! - **Gallery**
//!   - `GET /photos/permalink/{*path}` - photo with previous/next links
//!   - `GET /videos/permalink/{*path}` - video with previous/next links
//!   - `GET /assets/photos/{*path}` - resized photo (`?size=`, `?mode=`)
//!
//! The wildcard `*path` allows nested paths like `2019/iceland/img.jpg`.

use crate::{
    handlers::{
        asset_handlers::resized_photo,
        blog_handlers::{blog_entry, blog_index},
        health_handlers::{healthz, readyz},
        permalink_handlers::{photo_permalink, photo_permalink_root, video_permalink},
    },
    state::AppState,
};
use axum::{Router, routing::get};

/// Build and return the router for every public endpoint.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Blog
        .route("/", get(blog_index))
        .route("/blog", get(blog_index))
        .route("/blog/{*path}", get(blog_entry))
        // Gallery
        .route("/photos/permalink", get(photo_permalink_root))
        .route("/photos/permalink/", get(photo_permalink_root))
        .route("/photos/permalink/{*path}", get(photo_permalink))
        .route("/videos/permalink/{*path}", get(video_permalink))
        .route("/assets/photos/{*path}", get(resized_photo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::corpus_service::load_corpus};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use image::{Rgb, RgbImage};
    use serde_json::Value;
    use std::{fs, path::Path};
    use tempfile::{TempDir, tempdir};
    use tower::util::ServiceExt;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn create_test_app() -> (Router, TempDir) {
        let dir = tempdir().unwrap();
        let entries = dir.path().join("entries");
        let raw = dir.path().join("raw");

        write(&entries.join("01-15-24-hello.html"), b"Hello\nWorld body");
        write(&entries.join("03-01-24-later.html"), b"Later\nMore body");
        write(&entries.join("02-10-24-middle.html"), b"Middle\n");
        write(&entries.join("12-25-23-xmas.html"), b"Xmas\n");
        write(&entries.join("notes.html"), b"not an entry");

        for name in ["a.png", "b.png", "c.png"] {
            let path = raw.join("photos/trip").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            RgbImage::from_pixel(40, 60, Rgb([10, 20, 30])).save(&path).unwrap();
        }
        write(&raw.join("photos/trip/broken.jpg"), b"garbage");
        write(&raw.join("videos/clip.mp4"), b"mp4");

        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            entries_dir: entries.clone(),
            raw_root: raw,
            page_size: 3,
            default_resize: 100,
            max_resize: 1000,
            resize_cache_entries: 16,
        };
        let corpus = load_corpus(&entries).unwrap().into_corpus();
        let app = routes().with_state(AppState::new(config, corpus));
        (app, dir)
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ids(list: &Value) -> Vec<&str> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = create_test_app();
        assert_eq!(get(&app, "/healthz").await.status(), StatusCode::OK);

        let response = get(&app, "/readyz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["entries"], 4);
    }

    #[tokio::test]
    async fn test_blog_index_pages() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(
            ids(&body["entries"]),
            ["03-01-24-later", "02-10-24-middle", "01-15-24-hello", "12-25-23-xmas"]
        );
        assert_eq!(
            ids(&body["page"]),
            ["03-01-24-later", "02-10-24-middle", "01-15-24-hello"]
        );
        assert_eq!(body["next_skip"], 3);
        assert_eq!(body["page"][0]["display_date"], "03/01/24");

        let body = json(get(&app, "/blog?skip=3").await).await;
        assert_eq!(ids(&body["page"]), ["12-25-23-xmas"]);
        assert_eq!(body["next_skip"], 6);

        let body = json(get(&app, "/blog?skip=40").await).await;
        assert!(body["page"].as_array().unwrap().is_empty());

        let body = json(get(&app, "/?skip=nope").await).await;
        assert_eq!(ids(&body["page"]).len(), 3);
        assert_eq!(body["next_skip"], 3);
    }

    #[tokio::test]
    async fn test_blog_entry() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/blog/01-15-24-hello").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["entry"]["title"], "Hello");
        assert_eq!(body["entry"]["body"], "World body");
        assert_eq!(body["entries"].as_array().unwrap().len(), 4);

        let response = get(&app, "/blog/does-not-exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_photo_permalink() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/photos/permalink/trip/b.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["item"]["type"], "photo");
        assert_eq!(body["item"]["src"], "trip/b.png");
        assert_eq!(body["prev_link"], "/photos/permalink/trip/a.png");
        assert_eq!(body["next_link"], "/photos/permalink/trip/broken.jpg");

        let body = json(get(&app, "/photos/permalink/trip/a.png").await).await;
        assert_eq!(body["prev_link"], Value::Null);

        let response = get(&app, "/photos/permalink/trip/zzz.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(&app, "/photos/permalink/../entries/01-15-24-hello.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_paths_through_files() {
        let (app, _dir) = create_test_app();

        for uri in ["/photos/permalink/trip/a.png/x", "/assets/photos/trip/a.png/x"] {
            let response = get(&app, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        // A trailing slash is cleaned away like any other empty segment.
        let response = get(&app, "/photos/permalink/trip/a.png/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["item"]["src"], "trip/a.png");
        assert_eq!(body["next_link"], "/photos/permalink/trip/b.png");
    }

    #[tokio::test]
    async fn test_empty_photo_permalink_redirects() {
        let (app, _dir) = create_test_app();
        for uri in ["/photos/permalink", "/photos/permalink/"] {
            let response = get(&app, uri).await;
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(response.headers()[header::LOCATION], "/");
        }
    }

    #[tokio::test]
    async fn test_video_permalink() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/videos/permalink/clip.mp4").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["item"]["type"], "video");
        assert_eq!(body["prev_link"], Value::Null);
        assert_eq!(body["next_link"], Value::Null);
    }

    #[tokio::test]
    async fn test_resized_photo() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/assets/photos/trip/a.png?size=120").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let etag = response.headers()[header::ETAG].clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (80, 120));

        let revalidate = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/assets/photos/trip/a.png?size=120")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(revalidate.status(), StatusCode::NOT_MODIFIED);

        let body = to_bytes(
            get(&app, "/assets/photos/trip/a.png?mode=width").await.into_body(),
            usize::MAX,
        )
        .await
        .unwrap();
        let img = image::load_from_memory(&body).unwrap();
        assert_eq!(img.width(), 100);
    }

    #[tokio::test]
    async fn test_resized_photo_errors() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/assets/photos/trip/missing.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(&app, "/assets/photos/trip/broken.jpg").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = get(&app, "/assets/photos/trip/a.png?size=5000").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/assets/photos/trip/a.png?mode=sideways").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
