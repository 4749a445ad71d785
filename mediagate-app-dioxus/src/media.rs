//! Streams surface bytes to the webview through a custom asset route.
//!
//! The webview does not share the HTTP client's cookie jar, so surfaces point
//! at `/media/{id}` and every request, ranged or not, is answered through the
//! controller's authenticated session.

use dioxus::desktop::wry::http::{header, Response, StatusCode};
use mediagate_core::{ByteRange, CoreError, PlaybackController};
use tracing::warn;

const LOG_TARGET: &str = "mediagate::media";

/// Name of the asset handler serving item bytes.
pub const MEDIA_ROUTE: &str = "media";

/// Webview path of an item's bytes. Segments are encoded, separators kept.
#[must_use]
pub fn asset_path(id: &str) -> String {
    let encoded: Vec<_> = id.split('/').map(urlencoding::encode).collect();
    format!("/{MEDIA_ROUTE}/{}", encoded.join("/"))
}

/// Item id addressed by a webview request path.
#[must_use]
pub fn id_from_path(path: &str) -> Option<String> {
    let encoded = path
        .trim_start_matches('/')
        .strip_prefix(MEDIA_ROUTE)?
        .strip_prefix('/')?;
    let id = urlencoding::decode(encoded).ok()?.into_owned();
    (!id.is_empty()).then_some(id)
}

/// MIME type from the file extension.
#[must_use]
pub fn mime_type(id: &str) -> &'static str {
    let extension = id
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// Answer one webview request for item bytes.
pub async fn respond(
    controller: &PlaybackController,
    path: &str,
    range: Option<&str>,
) -> Response<Vec<u8>> {
    let Some(id) = id_from_path(path) else {
        return status_only(StatusCode::NOT_FOUND);
    };
    let range = range.and_then(ByteRange::parse);

    let chunk = match controller.load_media(&id, range).await {
        Ok(chunk) => chunk,
        Err(CoreError::MediaNotFound { .. }) => return status_only(StatusCode::NOT_FOUND),
        Err(CoreError::SessionExpired) => return status_only(StatusCode::UNAUTHORIZED),
        Err(_) => return status_only(StatusCode::BAD_GATEWAY),
    };

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, mime_type(&id))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, chunk.bytes.len());
    let builder = match chunk.content_range() {
        Some(content_range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, content_range),
        None => builder.status(StatusCode::OK),
    };

    builder.body(chunk.bytes).unwrap_or_else(|e| {
        warn!(target: LOG_TARGET, "Failed to build response for {}: {}", id, e);
        status_only(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn status_only(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediagate_core::{
        ControllerSettings, InMemoryCatalog, MediaItem, MediaKind, Rating, StaticAuthGate,
    };
    use std::sync::Arc;

    #[test]
    fn test_asset_path_round_trips_id() {
        let path = asset_path("Alice/c d#1.jpg");
        assert_eq!(path, "/media/Alice/c%20d%231.jpg");
        assert_eq!(id_from_path(&path).as_deref(), Some("Alice/c d#1.jpg"));
    }

    #[test]
    fn test_foreign_paths_are_not_media() {
        assert_eq!(id_from_path("/assets/app.css"), None);
        assert_eq!(id_from_path("/media/"), None);
        assert_eq!(id_from_path("/mediafoo/x.png"), None);
    }

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type("Alice/a.JPG"), "image/jpeg");
        assert_eq!(mime_type("Bob/b.mp4"), "video/mp4");
        assert_eq!(mime_type("Bob/c.mov"), "video/quicktime");
        assert_eq!(mime_type("Alice/noext"), "application/octet-stream");
    }

    async fn controller() -> Arc<PlaybackController> {
        let catalog = InMemoryCatalog::new([MediaItem::new(
            "Bob/b.mp4",
            MediaKind::Video,
            "Bob",
            "Dogs",
            Rating(1),
        )])
        .with_bytes("Bob/b.mp4", b"0123456789".to_vec());
        let controller = PlaybackController::new(
            Arc::new(StaticAuthGate::new("12345")),
            Arc::new(catalog),
            ControllerSettings::default(),
            None,
        );
        assert!(controller.login("12345").await.granted);
        controller
    }

    #[tokio::test]
    async fn test_respond_serves_ranges() {
        let controller = controller().await;

        let response = respond(&controller, "/media/Bob/b.mp4", Some("bytes=4-")).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers()[header::CONTENT_RANGE].to_str().unwrap(),
            "bytes 4-9/10"
        );
        assert_eq!(response.body().as_slice(), b"456789");

        let response = respond(&controller, "/media/Bob/b.mp4", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(response.body().len(), 10);
    }

    #[tokio::test]
    async fn test_respond_unknown_item() {
        let controller = controller().await;
        let response = respond(&controller, "/media/Nobody/x.png", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
