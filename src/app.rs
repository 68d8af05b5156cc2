use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, items, outfits, weather};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(items::router())
                .merge(outfits::router())
                .merge(weather::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::jwt::JwtKeys;

    fn upload_request(state: &AppState, field: &str, payload: &[u8]) -> Request<Body> {
        let token = JwtKeys::from_ref(state).sign_access(Uuid::new_v4()).unwrap();
        let mut body = format!(
            "--X\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"a.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n--X--\r\n");
        Request::post("/api/v1/items")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn closet_routes_require_a_token() {
        for (method, uri) in [
            ("GET", "/api/v1/items"),
            ("GET", "/api/v1/outfits"),
            ("GET", "/api/v1/outfits/generate"),
            ("DELETE", "/api/v1/items/7a1f3c1e-0000-4000-8000-000000000000"),
            ("GET", "/api/v1/me"),
        ] {
            let app = build_app(AppState::fake());
            let res = app
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn season_colors_lists_five_hex_values() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/season-colors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let colors = json["colors"].as_array().unwrap();
        assert_eq!(colors.len(), 5);
        assert!(colors.iter().all(|c| c.as_str().unwrap().starts_with('#')));
    }

    #[tokio::test]
    async fn weather_without_key_is_mocked() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::get("/api/v1/weather?location=Paris")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["location"], "Paris");
        assert_eq!(json["mock"], true);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_with_413() {
        let state = AppState::fake();
        let req = upload_request(&state, "file", &vec![0u8; 21 * 1024 * 1024]);
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Upload exceeds 20 MiB");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_a_bad_request() {
        let state = AppState::fake();
        let req = upload_request(&state, "photo", b"jpeg bytes");
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
