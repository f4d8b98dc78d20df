// src/server/http.rs

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::warn;

/// Static file router for the development server.
///
/// - `/` answers with `root/index`, everything else comes from `root`.
/// - Successful HTML responses get `script` appended before `</body>`.
/// - With `cors`, every response carries permissive CORS headers.
pub fn router(root: &Path, index: &str, cors: bool, script: String) -> Router {
    let script: Arc<str> = Arc::from(script);

    let router = Router::new()
        .route_service("/", ServeFile::new(root.join(index)))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn_with_state(script, inject_reload_script));

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn inject_reload_script(
    State(script): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if response.status() != StatusCode::OK || !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to buffer html response: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_snippet(&String::from_utf8_lossy(&bytes), &script);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

/// Insert `<script>{script}</script>` before the last `</body>`, or at the
/// end of documents without one.
pub fn inject_snippet(html: &str, script: &str) -> String {
    let tag = format!("<script>{script}</script>");
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}
