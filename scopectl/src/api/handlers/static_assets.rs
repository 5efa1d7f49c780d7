//! HTTP handlers for static asset serving.

use axum::{
    body::Body,
    http::{Response, StatusCode, header},
    response::IntoResponse,
};
use tracing::instrument;

use crate::static_assets::Assets;

/// Serve one embedded file, or 404 if it isn't in the bundle.
fn serve_embedded(path: &str) -> Response<Body> {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// The clock-sync page: estimates the browser's offset from the server clock and books slots.
#[utoipa::path(
    get,
    path = "/interface",
    tag = "interface",
    summary = "Clock synchronisation page",
    responses((status = 200, description = "HTML page", content_type = "text/html"))
)]
#[instrument]
pub async fn interface() -> impl IntoResponse {
    serve_embedded("index.html")
}
