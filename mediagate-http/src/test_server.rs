//! In-process gallery server used to exercise the HTTP client.

use axum::extract::{Json, Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use mediagate_core::{
    ByteRange, CoreError, FilterSelection, InMemoryCatalog, MediaCatalog, MediaItem, MediaRecord,
    StaticAuthGate,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "12345";

const SESSION_COOKIE: &str = "mediagate_session";

struct GalleryState {
    catalog: InMemoryCatalog,
    gate: StaticAuthGate,
    sessions: Mutex<HashSet<String>>,
    next_session: AtomicU64,
    /// Served verbatim by the listing endpoint when set
    raw_listing: Mutex<Option<Value>>,
}

impl GalleryState {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let sessions = self.sessions.lock().unwrap();
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == SESSION_COOKIE && sessions.contains(value))
    }
}

pub struct TestGallery {
    addr: SocketAddr,
    state: Arc<GalleryState>,
}

impl TestGallery {
    pub async fn start(items: Vec<MediaItem>) -> Self {
        let state = Arc::new(GalleryState {
            catalog: InMemoryCatalog::new(items),
            gate: StaticAuthGate::new(PASSWORD),
            sessions: Mutex::new(HashSet::new()),
            next_session: AtomicU64::new(1),
            raw_listing: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/auth", post(authenticate))
            .route("/api/media", get(list_media))
            .route("/api/media/filtered", get(filtered_media))
            .route("/api/media/{*path}", get(serve_media))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn attach_bytes(&self, id: &str, bytes: Vec<u8>) {
        self.state.catalog.insert_bytes(id, bytes);
    }

    /// Serve `listing` from `GET /api/media` instead of the catalog, as a
    /// hand-edited index file would.
    pub fn set_raw_listing(&self, listing: Value) {
        *self.state.raw_listing.lock().unwrap() = Some(listing);
    }

    /// Forget every issued session, as a server restart would.
    pub fn revoke_sessions(&self) {
        self.state.sessions.lock().unwrap().clear();
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

#[derive(Deserialize)]
struct AuthRequest {
    password: String,
}

async fn authenticate(
    State(state): State<Arc<GalleryState>>,
    Json(request): Json<AuthRequest>,
) -> Response {
    if !state.gate.accepts(&request.password) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "success": false }))).into_response();
    }

    let token = format!(
        "session-{}",
        state.next_session.fetch_add(1, Ordering::SeqCst)
    );
    state.sessions.lock().unwrap().insert(token.clone());

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn list_media(State(state): State<Arc<GalleryState>>, headers: HeaderMap) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }

    if let Some(listing) = state.raw_listing.lock().unwrap().clone() {
        return Json(listing).into_response();
    }

    let records: HashMap<String, MediaRecord> = state
        .catalog
        .snapshot()
        .items()
        .map(|item| (item.id.clone(), item.to_record()))
        .collect();
    Json(records).into_response()
}

async fn filtered_media(
    State(state): State<Arc<GalleryState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }

    let query = query.unwrap_or_default();
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let selection =
        FilterSelection::from_query_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Json(state.catalog.matching(&selection)).into_response()
}

async fn serve_media(
    State(state): State<Arc<GalleryState>>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(ByteRange::parse);

    match state.catalog.media_range(&path, range).await {
        Ok(chunk) => match chunk.content_range() {
            Some(content_range) => (
                StatusCode::PARTIAL_CONTENT,
                [(header::CONTENT_RANGE, content_range)],
                chunk.bytes,
            )
                .into_response(),
            None => chunk.bytes.into_response(),
        },
        Err(CoreError::MediaNotFound { .. }) => StatusCode::NOT_FOUND.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
