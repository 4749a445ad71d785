//! Playback controller: playlist, cursor, rendering and the autoplay state machine.
//!
//! Every state change happens under one short-lived lock, and the lock is
//! never held across a network call. Requests that finish after a newer
//! state-changing action are recognised by their ticket and dropped.

use crate::catalog::{AuthGate, MediaCatalog};
use crate::display::{GalleryView, PlayAffordance, StatusLine, Surface, SurfaceId, View};
use crate::error::CoreError;
use crate::filter::{Facet, FacetOptions, FilterSelection};
use crate::media::{MediaId, MediaKind, Rating};
use crate::playlist::PlaylistState;
use crate::range::{ByteRange, MediaChunk};
use crate::schedule::{AutoplaySchedule, ScheduleId};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "mediagate::controller";

/// Default time an image stays up during autoplay
pub const DEFAULT_IMAGE_DELAY: Duration = Duration::from_millis(5000);

/// Runtime knobs of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub image_delay: Duration,
    /// Fixed values offered by the rating facet
    pub ratings: Vec<Rating>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            image_delay: DEFAULT_IMAGE_DELAY,
            ratings: (1..=5).map(Rating).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Manual,
    Autoplaying,
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub granted: bool,
    pub reason: Option<String>,
}

/// Events emitted by the controller
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    LoginSucceeded,
    LoginFailed {
        reason: String,
    },
    FacetsLoaded {
        owners: usize,
        categories: usize,
    },
    PlaylistChanged {
        len: usize,
    },
    ItemDisplayed {
        id: MediaId,
        kind: MediaKind,
        position: usize,
        total: usize,
    },
    PlaylistEmpty,
    AutoplayStarted,
    AutoplayStopped,
    AutoplayArmed {
        kind: MediaKind,
    },
    VideoToggled {
        surface: SurfaceId,
        paused: bool,
    },
    /// The server rejected the session; the controller is back at the login screen.
    SessionExpired,
    Error {
        message: String,
    },
}

/// Render that has torn down autoplay and is waiting on item metadata.
struct PendingRender {
    ticket: u64,
    id: MediaId,
    position: usize,
    total: usize,
}

struct ControllerInner {
    authenticated: bool,
    selection: FilterSelection,
    facets: FacetOptions,
    playlist: PlaylistState,
    mode: PlaybackMode,
    schedule: AutoplaySchedule,
    // Tickets of the most recent request of each kind
    facet_request: u64,
    filter_request: u64,
    render_request: u64,
    /// Ticket of the last render that finished mounting
    rendered: Option<u64>,
    next_surface: u64,
    next_schedule: u64,
}

impl ControllerInner {
    fn new(facets: FacetOptions) -> Self {
        Self {
            authenticated: false,
            selection: FilterSelection::default(),
            facets,
            playlist: PlaylistState::default(),
            mode: PlaybackMode::Manual,
            schedule: AutoplaySchedule::None,
            facet_request: 0,
            filter_request: 0,
            render_request: 0,
            rendered: None,
            next_surface: 0,
            next_schedule: 0,
        }
    }

    /// Return to the freshly started state. Tickets keep counting so any
    /// response still in flight is recognised as stale.
    fn reset(&mut self, facets: FacetOptions) {
        self.schedule.teardown();
        self.authenticated = false;
        self.selection = FilterSelection::default();
        self.facets = facets;
        self.playlist = PlaylistState::default();
        self.mode = PlaybackMode::Manual;
        self.facet_request += 1;
        self.filter_request += 1;
        self.render_request += 1;
        self.rendered = None;
    }
}

/// Stateful gallery client.
pub struct PlaybackController {
    auth: Arc<dyn AuthGate>,
    catalog: Arc<dyn MediaCatalog>,
    settings: ControllerSettings,
    inner: Mutex<ControllerInner>,
    view_tx: watch::Sender<View>,
    event_tx: broadcast::Sender<ControllerEvent>,
    cancel_token: CancellationToken,
    weak_self: Weak<Self>,
}

impl PlaybackController {
    /// Create a new controller
    ///
    /// # Arguments
    /// * `auth` - Gate used by [`PlaybackController::login`]
    /// * `catalog` - Source of item metadata and filtered listings
    /// * `settings` - Autoplay delay and fixed facet values
    /// * `cancel_token` - Optional external cancellation token; cancelling it
    ///   stops every pending autoplay timer
    pub fn new(
        auth: Arc<dyn AuthGate>,
        catalog: Arc<dyn MediaCatalog>,
        settings: ControllerSettings,
        cancel_token: Option<CancellationToken>,
    ) -> Arc<Self> {
        let (view_tx, _) = watch::channel(View::default());
        let (event_tx, _) = broadcast::channel(64);
        let facets = FacetOptions::fixed(&settings.ratings);

        Arc::new_cyclic(|weak_self| Self {
            auth,
            catalog,
            settings,
            inner: Mutex::new(ControllerInner::new(facets)),
            view_tx,
            event_tx,
            cancel_token: cancel_token.map_or_else(CancellationToken::new, |t| t.child_token()),
            weak_self: weak_self.clone(),
        })
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to the render model
    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.view_tx.subscribe()
    }

    /// Current render model
    #[must_use]
    pub fn view(&self) -> View {
        self.view_tx.borrow().clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.authenticated
    }

    pub async fn mode(&self) -> PlaybackMode {
        self.inner.lock().await.mode
    }

    pub async fn playlist(&self) -> PlaylistState {
        self.inner.lock().await.playlist.clone()
    }

    pub async fn cursor(&self) -> Option<usize> {
        self.inner.lock().await.playlist.cursor()
    }

    pub async fn selection(&self) -> FilterSelection {
        self.inner.lock().await.selection.clone()
    }

    /// Whether a timer or completion listener is armed
    pub async fn has_active_schedule(&self) -> bool {
        self.inner.lock().await.schedule.is_active()
    }

    /// Cancel every pending timer. The controller stays usable but no
    /// autoplay timer will fire again.
    pub async fn shutdown(&self) {
        info!(target: LOG_TARGET, "Controller shutting down");
        self.cancel_token.cancel();
        self.inner.lock().await.schedule.teardown();
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.event_tx.send(event);
    }

    fn update_gallery(&self, f: impl FnOnce(&mut GalleryView)) {
        self.view_tx.send_modify(|view| {
            if let View::Gallery(gallery) = view {
                f(gallery);
            }
        });
    }

    fn report_error(&self, context: &str, error: &CoreError) {
        warn!(target: LOG_TARGET, "{}: {}", context, error);
        let message = format!("{context}: {error}");
        self.update_gallery(|gallery| gallery.error = Some(message.clone()));
        self.emit(ControllerEvent::Error { message });
    }

    /// The equivalent of reloading the page after the server dropped the session.
    fn expire_session(&self, inner: &mut ControllerInner) {
        warn!(target: LOG_TARGET, "Gallery session expired, reinitializing client");
        inner.reset(FacetOptions::fixed(&self.settings.ratings));
        self.view_tx.send_replace(View::default());
        self.emit(ControllerEvent::SessionExpired);
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Present a credential to the auth gate.
    ///
    /// On success the gallery replaces the login screen and the catalog is
    /// loaded. Rejections and transport failures both keep the login screen,
    /// show the error indicator and clear the credential input.
    pub async fn login(&self, credential: &str) -> LoginOutcome {
        info!(target: LOG_TARGET, "Attempting login");

        match self.auth.authenticate(credential).await {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.authenticated = true;
                    let facets = inner.facets.clone();
                    self.view_tx
                        .send_replace(View::Gallery(GalleryView::new(facets)));
                }
                info!(target: LOG_TARGET, "Login succeeded");
                self.emit(ControllerEvent::LoginSucceeded);

                self.initialize().await;

                LoginOutcome {
                    granted: true,
                    reason: None,
                }
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Login failed: {}", e);
                let reason = e.to_string();
                self.view_tx.send_modify(|view| {
                    if let View::Login(login) = view {
                        login.error_visible = true;
                        login.credential_resets += 1;
                    }
                });
                self.emit(ControllerEvent::LoginFailed {
                    reason: reason.clone(),
                });

                LoginOutcome {
                    granted: false,
                    reason: Some(reason),
                }
            }
        }
    }

    /// Load facets, then the first playlist.
    pub async fn initialize(&self) {
        self.load_facets().await;
        if self.is_authenticated().await {
            self.apply_filters().await;
        }
    }

    // ------------------------------------------------------------------
    // Catalog & filters
    // ------------------------------------------------------------------

    /// Refresh owner and category options from the full catalog.
    ///
    /// Selected values that are still offered stay selected. A transport
    /// failure leaves only the fixed facets; an expired session reinitializes.
    pub async fn load_facets(&self) {
        let ticket = {
            let mut inner = self.inner.lock().await;
            if !inner.authenticated {
                debug!(target: LOG_TARGET, "Ignoring facet load while logged out");
                return;
            }
            inner.facet_request += 1;
            inner.facet_request
        };

        let result = self.catalog.catalog().await;

        let mut inner = self.inner.lock().await;
        if inner.facet_request != ticket {
            debug!(target: LOG_TARGET, "Discarding stale facet response (ticket {})", ticket);
            return;
        }

        let options = match result {
            Ok(catalog) => {
                info!(
                    target: LOG_TARGET,
                    "Catalog from {} has {} items",
                    self.catalog.name(),
                    catalog.len()
                );
                FacetOptions::from_catalog(&self.settings.ratings, &catalog)
            }
            Err(e) if e.is_session_expired() => {
                self.expire_session(&mut inner);
                return;
            }
            Err(e) => {
                self.report_error("Failed to load filters", &e);
                FacetOptions::fixed(&self.settings.ratings)
            }
        };

        inner.selection.retain_available(&options);
        inner.facets = options.clone();
        let selection = inner.selection.clone();
        let (owners, categories) = (options.owners.len(), options.categories.len());
        self.update_gallery(|gallery| {
            gallery.facets = options;
            gallery.selection = selection;
        });
        self.emit(ControllerEvent::FacetsLoaded { owners, categories });
    }

    /// Select or deselect one facet value and rebuild the playlist.
    pub async fn set_facet_value(&self, facet: Facet, value: &str, selected: bool) {
        {
            let mut inner = self.inner.lock().await;
            if !inner.selection.set_value(facet, value, selected) {
                warn!(target: LOG_TARGET, "Ignoring invalid {:?} value {:?}", facet, value);
                return;
            }
            let selection = inner.selection.clone();
            self.update_gallery(|gallery| gallery.selection = selection);
        }
        self.apply_filters().await;
    }

    /// Flip one facet value and rebuild the playlist.
    pub async fn toggle_facet_value(&self, facet: Facet, value: &str) {
        let selected = !self.inner.lock().await.selection.is_selected(facet, value);
        self.set_facet_value(facet, value, selected).await;
    }

    /// Replace the whole selection and rebuild the playlist.
    pub async fn set_selection(&self, selection: FilterSelection) {
        {
            let mut inner = self.inner.lock().await;
            inner.selection = selection.clone();
            self.update_gallery(|gallery| gallery.selection = selection);
        }
        self.apply_filters().await;
    }

    /// Fetch the filtered listing and replace the playlist, cursor at 0.
    ///
    /// Always refreshes the display afterwards. A transport failure leaves an
    /// empty playlist.
    pub async fn apply_filters(&self) {
        let (ticket, selection) = {
            let mut inner = self.inner.lock().await;
            if !inner.authenticated {
                debug!(target: LOG_TARGET, "Ignoring filter change while logged out");
                return;
            }
            inner.filter_request += 1;
            (inner.filter_request, inner.selection.clone())
        };

        debug!(target: LOG_TARGET, "Applying filters {:?} (ticket {})", selection, ticket);
        let result = self.catalog.filtered(&selection).await;

        let pending = {
            let mut inner = self.inner.lock().await;
            if inner.filter_request != ticket {
                debug!(target: LOG_TARGET, "Discarding stale filter response (ticket {})", ticket);
                return;
            }

            match result {
                Ok(ids) => {
                    info!(target: LOG_TARGET, "Filtered playlist has {} items", ids.len());
                    let len = ids.len();
                    inner.playlist = PlaylistState::new(ids);
                    self.update_gallery(|gallery| gallery.error = None);
                    self.emit(ControllerEvent::PlaylistChanged { len });
                }
                Err(e) if e.is_session_expired() => {
                    self.expire_session(&mut inner);
                    return;
                }
                Err(e) => {
                    inner.playlist = PlaylistState::default();
                    self.report_error("Failed to apply filters", &e);
                }
            }

            self.begin_render(&mut inner)
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Render the item under the cursor.
    pub async fn display_current(&self) {
        let pending = {
            let mut inner = self.inner.lock().await;
            if !inner.authenticated {
                return;
            }
            self.begin_render(&mut inner)
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }

    /// First half of a render, run in the same critical section as the
    /// playlist or cursor change that caused it.
    ///
    /// Tears down autoplay, invalidates older renders and handles the empty
    /// playlist. Returns the item to fetch otherwise.
    fn begin_render(&self, inner: &mut ControllerInner) -> Option<PendingRender> {
        inner.schedule.teardown();
        inner.render_request += 1;
        let ticket = inner.render_request;

        let Some(id) = inner.playlist.current().cloned() else {
            inner.rendered = Some(ticket);
            self.update_gallery(|gallery| {
                gallery.surface = Surface::empty();
                gallery.status = StatusLine::Empty;
            });
            self.emit(ControllerEvent::PlaylistEmpty);
            return None;
        };

        let (position, total) = inner.playlist.position()?;
        Some(PendingRender {
            ticket,
            id,
            position,
            total,
        })
    }

    /// Second half of a render: resolve metadata, mount the surface and arm
    /// autoplay when it is running.
    async fn finish_render(&self, pending: PendingRender) {
        // Always reflect the latest server state for the item's metadata.
        let result = self.catalog.catalog().await;

        let mut inner = self.inner.lock().await;
        if inner.render_request != pending.ticket {
            debug!(
                target: LOG_TARGET,
                "Discarding stale render of {} (ticket {})",
                pending.id,
                pending.ticket
            );
            return;
        }

        let catalog = match result {
            Ok(catalog) => catalog,
            Err(e) if e.is_session_expired() => {
                self.expire_session(&mut inner);
                return;
            }
            Err(e) => {
                self.report_error("Failed to display media", &e);
                return;
            }
        };

        let Some(item) = catalog.get(&pending.id).cloned() else {
            let error = CoreError::MediaNotFound { id: pending.id };
            self.report_error("Failed to display media", &error);
            return;
        };

        inner.next_surface += 1;
        let surface_id = SurfaceId(inner.next_surface);
        let kind = item.kind;
        let status = StatusLine::for_item(&item, pending.position, pending.total);
        let surface = Surface::for_item(surface_id, item, self.catalog.media_url(&pending.id));

        debug!(
            target: LOG_TARGET,
            "Displaying {} ({}) at {}/{}",
            pending.id,
            kind,
            pending.position,
            pending.total
        );
        self.update_gallery(|gallery| {
            gallery.surface = surface;
            gallery.status = status;
            gallery.error = None;
        });
        inner.rendered = Some(pending.ticket);
        self.emit(ControllerEvent::ItemDisplayed {
            id: pending.id,
            kind,
            position: pending.position,
            total: pending.total,
        });

        if inner.mode == PlaybackMode::Autoplaying {
            self.arm(&mut inner, kind, surface_id);
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Move to the next item. No-op at the end of the playlist.
    pub async fn next(&self) {
        let pending = {
            let mut inner = self.inner.lock().await;
            if !inner.playlist.advance() {
                debug!(target: LOG_TARGET, "Already at the last item");
                return;
            }
            self.begin_render(&mut inner)
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }

    /// Move to the previous item. No-op at the start of the playlist.
    pub async fn prev(&self) {
        let pending = {
            let mut inner = self.inner.lock().await;
            if !inner.playlist.retreat() {
                debug!(target: LOG_TARGET, "Already at the first item");
                return;
            }
            self.begin_render(&mut inner)
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }

    /// Fetch the bytes behind a display surface through the session.
    ///
    /// # Errors
    ///
    /// Returns the catalog error, which is also raised on the gallery's error
    /// indicator. An expired session sends the controller back to the login
    /// screen instead.
    pub async fn load_media(
        &self,
        id: &str,
        range: Option<ByteRange>,
    ) -> Result<MediaChunk, CoreError> {
        let result = self.catalog.media_range(id, range).await;
        match &result {
            Err(e) if e.is_session_expired() => {
                let mut inner = self.inner.lock().await;
                if inner.authenticated {
                    self.expire_session(&mut inner);
                }
            }
            Err(e) => self.report_error(&format!("Failed to load {id}"), e),
            Ok(_) => {}
        }
        result
    }

    /// Flip the mounted video between paused and playing.
    ///
    /// Returns the new paused state, or `None` when no video is mounted.
    /// Autoplay mode and schedule are unaffected.
    pub async fn toggle_video(&self) -> Option<bool> {
        let _inner = self.inner.lock().await;
        let mut toggled = None;
        self.update_gallery(|gallery| {
            if let Surface::Video { id, paused, .. } = &mut gallery.surface {
                *paused = !*paused;
                toggled = Some((*id, *paused));
            }
        });

        let (surface, paused) = toggled?;
        debug!(target: LOG_TARGET, "Video {} paused={}", surface, paused);
        self.emit(ControllerEvent::VideoToggled { surface, paused });
        Some(paused)
    }

    /// Record a paused/playing change made through the video's own controls.
    pub async fn video_paused_changed(&self, surface: SurfaceId, paused: bool) {
        let _inner = self.inner.lock().await;
        self.view_tx.send_if_modified(|view| match view {
            View::Gallery(GalleryView {
                surface:
                    Surface::Video {
                        id, paused: current, ..
                    },
                ..
            }) if *id == surface && *current != paused => {
                *current = paused;
                true
            }
            _ => false,
        });
    }

    // ------------------------------------------------------------------
    // Autoplay
    // ------------------------------------------------------------------

    /// Enter autoplay and arm a schedule for the item under the cursor.
    ///
    /// When that item is not the one on screen, because its render failed or
    /// is still loading, it is rendered again and armed once mounted.
    pub async fn start(&self) {
        let pending = {
            let mut inner = self.inner.lock().await;
            if inner.mode == PlaybackMode::Autoplaying {
                return;
            }

            info!(target: LOG_TARGET, "Autoplay started");
            inner.mode = PlaybackMode::Autoplaying;
            self.update_gallery(|gallery| gallery.affordance = PlayAffordance::Pause);
            self.emit(ControllerEvent::AutoplayStarted);

            let current = inner.playlist.current().cloned();
            let mounted = self.view_tx.borrow().gallery().and_then(|gallery| {
                let surface = &gallery.surface;
                Some((surface.id()?, surface.kind()?, surface.item()?.id.clone()))
            });
            let settled = inner.rendered == Some(inner.render_request);

            match (current, mounted) {
                (Some(current), Some((surface, kind, shown))) if settled && current == shown => {
                    self.arm(&mut inner, kind, surface);
                    None
                }
                (Some(_), _) => self.begin_render(&mut inner),
                (None, _) => None,
            }
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }

    /// Leave autoplay and tear down any pending schedule.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if inner.mode == PlaybackMode::Manual {
            return;
        }

        info!(target: LOG_TARGET, "Autoplay stopped");
        inner.mode = PlaybackMode::Manual;
        inner.schedule.teardown();
        self.update_gallery(|gallery| gallery.affordance = PlayAffordance::Play);
        self.emit(ControllerEvent::AutoplayStopped);
    }

    /// Start autoplay when stopped, stop it when running.
    pub async fn toggle_playback(&self) {
        let mode = self.mode().await;
        match mode {
            PlaybackMode::Manual => self.start().await,
            PlaybackMode::Autoplaying => self.stop().await,
        }
    }

    /// The video on `surface` reached its natural end.
    pub async fn media_ended(&self, surface: SurfaceId) {
        let schedule = self.inner.lock().await.schedule.listener_for(surface);
        match schedule {
            Some(id) => self.schedule_fired(id).await,
            None => debug!(target: LOG_TARGET, "No autoplay listener on {}", surface),
        }
    }

    /// Arm the trigger matching `kind` for the freshly mounted `surface`.
    fn arm(&self, inner: &mut ControllerInner, kind: MediaKind, surface: SurfaceId) {
        inner.schedule.teardown();
        inner.next_schedule += 1;
        let id = ScheduleId(inner.next_schedule);

        inner.schedule = match kind {
            MediaKind::Image => {
                let cancel = self.cancel_token.child_token();
                self.spawn_timer(id, cancel.clone());
                AutoplaySchedule::Timer { id, cancel }
            }
            MediaKind::Video => AutoplaySchedule::Listener { id, surface },
        };

        debug!(target: LOG_TARGET, "Armed {} autoplay for {}", kind, surface);
        self.emit(ControllerEvent::AutoplayArmed { kind });
    }

    fn spawn_timer(&self, id: ScheduleId, cancel: CancellationToken) {
        let controller = self.weak_self.clone();
        let delay = self.settings.image_delay;

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if let Some(controller) = controller.upgrade() {
                        controller.schedule_fired(id).await;
                    }
                }
            }
        });
    }

    /// A timer or completion listener fired. Advances exactly like `next`,
    /// unless the schedule was replaced in the meantime.
    async fn schedule_fired(&self, id: ScheduleId) {
        let pending = {
            let mut inner = self.inner.lock().await;
            if !inner.schedule.fire(id) {
                debug!(target: LOG_TARGET, "Ignoring stale autoplay trigger {:?}", id);
                return;
            }
            if !inner.playlist.advance() {
                debug!(target: LOG_TARGET, "Autoplay reached the end of the playlist");
                return;
            }
            self.begin_render(&mut inner)
        };

        if let Some(pending) = pending {
            self.finish_render(pending).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, StaticAuthGate};
    use crate::media::{Catalog, MediaItem};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PASSWORD: &str = "12345";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Failure {
        Unauthorized,
        Transport,
    }

    /// In-memory catalog with injectable failures and a slow owner filter.
    struct ScriptedCatalog {
        inner: InMemoryCatalog,
        failure: std::sync::Mutex<Option<Failure>>,
        slow_owner: Option<(String, Duration)>,
        catalog_calls: AtomicUsize,
    }

    impl ScriptedCatalog {
        fn new(items: Vec<MediaItem>) -> Self {
            Self {
                inner: InMemoryCatalog::new(items),
                failure: std::sync::Mutex::new(None),
                slow_owner: None,
                catalog_calls: AtomicUsize::new(0),
            }
        }

        fn fail_with(&self, failure: Option<Failure>) {
            *self.failure.lock().unwrap() = failure;
        }

        fn check(&self) -> Result<(), CoreError> {
            match *self.failure.lock().unwrap() {
                Some(Failure::Unauthorized) => Err(CoreError::SessionExpired),
                Some(Failure::Transport) => Err(CoreError::UnexpectedStatus {
                    endpoint: "/api/media".into(),
                    status: 500,
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl MediaCatalog for ScriptedCatalog {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn catalog(&self) -> Result<Catalog, CoreError> {
            self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.inner.catalog().await
        }

        async fn filtered(&self, selection: &FilterSelection) -> Result<Vec<MediaId>, CoreError> {
            if let Some((owner, delay)) = &self.slow_owner {
                if selection.owners.contains(owner) {
                    tokio::time::sleep(*delay).await;
                }
            }
            self.check()?;
            self.inner.filtered(selection).await
        }

        async fn media_bytes(&self, id: &str) -> Result<Vec<u8>, CoreError> {
            self.check()?;
            self.inner.media_bytes(id).await
        }

        fn media_url(&self, id: &str) -> String {
            self.inner.media_url(id)
        }
    }

    fn scenario_items() -> Vec<MediaItem> {
        vec![
            MediaItem::new("a", MediaKind::Image, "Alice", "Cats", Rating(1)),
            MediaItem::new("b", MediaKind::Video, "Bob", "Dogs", Rating(2)),
            MediaItem::new("c", MediaKind::Image, "Alice", "Dogs", Rating(3)),
        ]
    }

    fn images(n: usize) -> Vec<MediaItem> {
        (0..n)
            .map(|i| MediaItem::new(format!("img{i}"), MediaKind::Image, "Alice", "Cats", Rating(1)))
            .collect()
    }

    fn controller_with(catalog: Arc<ScriptedCatalog>) -> Arc<PlaybackController> {
        PlaybackController::new(
            Arc::new(StaticAuthGate::new(PASSWORD)),
            catalog,
            ControllerSettings::default(),
            None,
        )
    }

    async fn logged_in(items: Vec<MediaItem>) -> (Arc<PlaybackController>, Arc<ScriptedCatalog>) {
        let catalog = Arc::new(ScriptedCatalog::new(items));
        let controller = controller_with(catalog.clone());
        assert!(controller.login(PASSWORD).await.granted);
        (controller, catalog)
    }

    fn gallery(controller: &PlaybackController) -> GalleryView {
        controller.view().gallery().cloned().unwrap()
    }

    fn mounted_surface(controller: &PlaybackController) -> SurfaceId {
        gallery(controller).surface.id().unwrap()
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_login_screen() {
        let catalog = Arc::new(ScriptedCatalog::new(scenario_items()));
        let controller = controller_with(catalog);

        let outcome = controller.login("wrong").await;
        assert!(!outcome.granted);
        assert!(outcome.reason.is_some());
        assert!(!controller.is_authenticated().await);

        match controller.view() {
            View::Login(login) => {
                assert!(login.error_visible);
                assert_eq!(login.credential_resets, 1);
            }
            View::Gallery(_) => panic!("gallery shown after rejected login"),
        }
    }

    #[tokio::test]
    async fn test_login_loads_facets_and_playlist() {
        let (controller, _) = logged_in(scenario_items()).await;

        assert!(controller.is_authenticated().await);
        let view = gallery(&controller);
        assert_eq!(view.facets.owners, vec!["Alice", "Bob"]);
        assert_eq!(view.facets.categories, vec!["Cats", "Dogs"]);
        assert_eq!(controller.playlist().await.len(), 3);
        assert_eq!(view.status.progress().as_deref(), Some("1/3"));
    }

    #[tokio::test]
    async fn test_owner_filter_scenario() {
        let (controller, _) = logged_in(scenario_items()).await;

        controller.set_facet_value(Facet::Owner, "Alice", true).await;

        let playlist = controller.playlist().await;
        assert_eq!(playlist.items(), ["a", "c"]);
        assert_eq!(playlist.cursor(), Some(0));

        let view = gallery(&controller);
        assert_eq!(view.status.progress().as_deref(), Some("1/2"));
        assert_eq!(view.status.to_string(), "a\nAlice; Cats\n(1/2)");
        assert!(matches!(view.surface, Surface::Image { ref src, .. } if src == "/api/media/a"));
    }

    #[tokio::test]
    async fn test_filter_change_resets_cursor() {
        let (controller, _) = logged_in(scenario_items()).await;
        controller.next().await;
        controller.next().await;
        assert_eq!(controller.cursor().await, Some(2));

        controller.set_facet_value(Facet::Category, "Dogs", true).await;
        assert_eq!(controller.cursor().await, Some(0));
        assert_eq!(controller.playlist().await.items(), ["b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_result_shows_empty_state() {
        let (controller, _) = logged_in(scenario_items()).await;

        controller.set_facet_value(Facet::Owner, "Bob", true).await;
        controller.set_facet_value(Facet::Kind, "image", true).await;

        assert!(controller.playlist().await.is_empty());
        let view = gallery(&controller);
        assert_eq!(view.surface, Surface::empty());
        assert_eq!(view.status, StatusLine::Empty);
    }

    #[tokio::test]
    async fn test_single_item_boundaries() {
        let (controller, _) = logged_in(scenario_items()).await;
        controller.set_facet_value(Facet::Category, "Cats", true).await;
        assert_eq!(controller.playlist().await.items(), ["a"]);

        let surface = mounted_surface(&controller);
        controller.next().await;
        assert_eq!(controller.cursor().await, Some(0));
        controller.prev().await;
        assert_eq!(controller.cursor().await, Some(0));
        // No re-render happened at either boundary
        assert_eq!(mounted_surface(&controller), surface);
    }

    #[tokio::test]
    async fn test_next_prev_round_trip() {
        let (controller, _) = logged_in(images(5)).await;
        controller.next().await;
        controller.next().await;

        controller.next().await;
        controller.prev().await;
        assert_eq!(controller.cursor().await, Some(2));
    }

    #[tokio::test]
    async fn test_video_surface_attributes() {
        let (controller, _) = logged_in(scenario_items()).await;
        controller.set_facet_value(Facet::Kind, "video", true).await;

        match gallery(&controller).surface {
            Surface::Video {
                attributes, src, ..
            } => {
                assert!(!attributes.looped);
                assert!(attributes.plays_inline);
                assert_eq!(src, "/api/media/b");
            }
            other => panic!("expected video, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_advances_image_after_delay() {
        let (controller, _) = logged_in(images(3)).await;

        controller.start().await;
        assert_eq!(gallery(&controller).affordance, PlayAffordance::Pause);
        assert!(controller.has_active_schedule().await);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(controller.cursor().await, Some(0));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(controller.cursor().await, Some(1));
        assert_eq!(controller.mode().await, PlaybackMode::Autoplaying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_timer() {
        let (controller, _) = logged_in(images(3)).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_millis(2500)).await;
        controller.stop().await;
        assert!(!controller.has_active_schedule().await);
        assert_eq!(gallery(&controller).affordance, PlayAffordance::Play);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(controller.cursor().await, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let (controller, _) = logged_in(images(4)).await;
        let mut events = controller.subscribe();

        controller.start().await;
        controller.start().await;
        tokio::time::sleep(Duration::from_millis(5001)).await;
        // A second start must not have armed a second timer
        assert_eq!(controller.cursor().await, Some(1));

        controller.stop().await;
        controller.stop().await;

        let mut started = 0;
        let mut stopped = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                ControllerEvent::AutoplayStarted => started += 1,
                ControllerEvent::AutoplayStopped => stopped += 1,
                _ => {}
            }
        }
        assert_eq!((started, stopped), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_navigation_rearms_single_timer() {
        let (controller, _) = logged_in(images(6)).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_millis(4000)).await;
        controller.next().await;
        controller.next().await;
        controller.prev().await;
        assert_eq!(controller.cursor().await, Some(1));

        // The timer armed before navigating is gone; the new one started with the last render
        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(controller.cursor().await, Some(1));
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(controller.cursor().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_stops_advancing_at_end_without_leaving_mode() {
        let (controller, _) = logged_in(images(2)).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(controller.cursor().await, Some(1));
        assert_eq!(controller.mode().await, PlaybackMode::Autoplaying);
        assert_eq!(gallery(&controller).affordance, PlayAffordance::Pause);

        // Moving back manually re-arms from the new position
        controller.prev().await;
        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert_eq!(controller.cursor().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_advances_on_completion_only() {
        let items = vec![
            MediaItem::new("v1", MediaKind::Video, "Bob", "Dogs", Rating(1)),
            MediaItem::new("v2", MediaKind::Video, "Bob", "Dogs", Rating(1)),
        ];
        let (controller, _) = logged_in(items).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.cursor().await, Some(0));

        let surface = mounted_surface(&controller);
        controller.media_ended(surface).await;
        assert_eq!(controller.cursor().await, Some(1));

        // Completion of the outgoing surface is ignored
        controller.media_ended(surface).await;
        assert_eq!(controller.cursor().await, Some(1));
    }

    #[tokio::test]
    async fn test_video_completion_ignored_in_manual_mode() {
        let items = vec![
            MediaItem::new("v1", MediaKind::Video, "Bob", "Dogs", Rating(1)),
            MediaItem::new("v2", MediaKind::Video, "Bob", "Dogs", Rating(1)),
        ];
        let (controller, _) = logged_in(items).await;

        controller.media_ended(mounted_surface(&controller)).await;
        assert_eq!(controller.cursor().await, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_playlist_switches_trigger_kind() {
        let items = vec![
            MediaItem::new("1", MediaKind::Image, "A", "", Rating(1)),
            MediaItem::new("2", MediaKind::Video, "A", "", Rating(1)),
            MediaItem::new("3", MediaKind::Image, "A", "", Rating(1)),
        ];
        let (controller, _) = logged_in(items).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert_eq!(controller.cursor().await, Some(1));

        // The video does not advance on a timer
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.cursor().await, Some(1));

        controller.media_ended(mounted_surface(&controller)).await;
        assert_eq!(controller.cursor().await, Some(2));
    }

    #[tokio::test]
    async fn test_toggle_video_does_not_touch_autoplay() {
        let (controller, _) = logged_in(scenario_items()).await;
        assert_eq!(controller.toggle_video().await, None);

        controller.set_facet_value(Facet::Kind, "video", true).await;
        assert_eq!(controller.toggle_video().await, Some(true));
        assert_eq!(controller.toggle_video().await, Some(false));
        assert_eq!(controller.mode().await, PlaybackMode::Manual);
        assert!(!controller.has_active_schedule().await);

        let surface = mounted_surface(&controller);
        controller.video_paused_changed(surface, true).await;
        assert!(matches!(
            gallery(&controller).surface,
            Surface::Video { paused: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_catalog_forces_reinitialization() {
        let catalog = Arc::new(ScriptedCatalog::new(scenario_items()));
        catalog.fail_with(Some(Failure::Unauthorized));
        let controller = controller_with(catalog.clone());
        let mut events = controller.subscribe();

        let outcome = controller.login(PASSWORD).await;
        assert!(outcome.granted);

        assert!(controller.view().is_login());
        assert!(!controller.is_authenticated().await);
        assert!(controller.playlist().await.is_empty());

        let mut expired = false;
        while let Ok(event) = events.try_recv() {
            expired |= matches!(event, ControllerEvent::SessionExpired);
        }
        assert!(expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_loss_mid_slideshow_clears_everything() {
        let (controller, catalog) = logged_in(images(3)).await;
        controller.start().await;

        catalog.fail_with(Some(Failure::Unauthorized));
        tokio::time::sleep(Duration::from_millis(5001)).await;

        assert!(controller.view().is_login());
        assert_eq!(controller.mode().await, PlaybackMode::Manual);
        assert!(!controller.has_active_schedule().await);

        // Nothing keeps running after the reset
        catalog.fail_with(None);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(controller.view().is_login());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_failed_render_displays_and_arms() {
        let (controller, catalog) = logged_in(images(4)).await;

        catalog.fail_with(Some(Failure::Transport));
        controller.next().await;
        assert_eq!(gallery(&controller).status.progress().as_deref(), Some("1/4"));
        catalog.fail_with(None);

        controller.start().await;
        assert!(controller.has_active_schedule().await);
        let view = gallery(&controller);
        assert_eq!(view.status.progress().as_deref(), Some("2/4"));
        assert!(view.error.is_none());

        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert_eq!(controller.cursor().await, Some(2));
    }

    #[tokio::test]
    async fn test_unauthorized_filter_forces_reinitialization() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        let mut events = controller.subscribe();
        catalog.fail_with(Some(Failure::Unauthorized));

        controller.set_facet_value(Facet::Owner, "Alice", true).await;

        assert!(controller.view().is_login());
        assert!(!controller.is_authenticated().await);
        assert!(controller.playlist().await.is_empty());
        assert!(controller.selection().await.is_unrestricted());

        let mut expired = false;
        while let Ok(event) = events.try_recv() {
            expired |= matches!(event, ControllerEvent::SessionExpired);
        }
        assert!(expired);
    }

    #[tokio::test]
    async fn test_unauthorized_media_bytes_forces_reinitialization() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        catalog.fail_with(Some(Failure::Unauthorized));

        let result = controller.load_media("a", None).await;

        assert!(matches!(result, Err(CoreError::SessionExpired)));
        assert!(controller.view().is_login());
        assert!(!controller.is_authenticated().await);
        assert!(controller.playlist().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_media_serves_ranges() {
        let catalog = Arc::new(ScriptedCatalog {
            inner: InMemoryCatalog::new(scenario_items()).with_bytes("b", b"video-bytes".to_vec()),
            failure: std::sync::Mutex::new(None),
            slow_owner: None,
            catalog_calls: AtomicUsize::new(0),
        });
        let controller = controller_with(catalog);
        assert!(controller.login(PASSWORD).await.granted);

        let chunk = controller
            .load_media("b", ByteRange::parse("bytes=6-"))
            .await
            .unwrap();
        assert_eq!(chunk.bytes, b"bytes");
        assert!(controller.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_transport_failure_on_filter_degrades_to_empty() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        catalog.fail_with(Some(Failure::Transport));

        controller.set_facet_value(Facet::Owner, "Alice", true).await;

        assert!(controller.playlist().await.is_empty());
        let view = gallery(&controller);
        assert_eq!(view.surface, Surface::empty());
        assert!(view.error.is_some());
        assert!(controller.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_failed_display_keeps_previous_surface() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        let before = gallery(&controller).surface;

        catalog.fail_with(Some(Failure::Transport));
        controller.next().await;

        let view = gallery(&controller);
        assert_eq!(view.surface, before);
        assert!(view.error.is_some());
        assert_eq!(controller.cursor().await, Some(1));
    }

    #[tokio::test]
    async fn test_facet_refresh_keeps_surviving_selection() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        controller.set_facet_value(Facet::Owner, "Alice", true).await;
        controller.set_facet_value(Facet::Owner, "Bob", true).await;

        catalog
            .inner
            .replace([MediaItem::new("c", MediaKind::Image, "Alice", "Dogs", Rating(3))]);
        controller.load_facets().await;

        let selection = controller.selection().await;
        assert!(selection.is_selected(Facet::Owner, "Alice"));
        assert!(!selection.is_selected(Facet::Owner, "Bob"));
        assert_eq!(gallery(&controller).facets.owners, vec!["Alice"]);
    }

    #[tokio::test]
    async fn test_render_refetches_metadata() {
        let (controller, catalog) = logged_in(scenario_items()).await;
        let calls = catalog.catalog_calls.load(Ordering::SeqCst);

        controller.next().await;
        assert_eq!(catalog.catalog_calls.load(Ordering::SeqCst), calls + 1);

        catalog.inner.replace([
            MediaItem::new("a", MediaKind::Image, "Alice", "Cats", Rating(1)),
            MediaItem::new("b", MediaKind::Video, "Bobby", "Dogs", Rating(2)),
            MediaItem::new("c", MediaKind::Image, "Alice", "Dogs", Rating(3)),
        ]);
        controller.display_current().await;
        assert!(gallery(&controller).status.to_string().contains("Bobby; Dogs"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_filter_response_is_discarded() {
        let mut scripted = ScriptedCatalog::new(scenario_items());
        scripted.slow_owner = Some(("Alice".to_string(), Duration::from_secs(1)));
        let catalog = Arc::new(scripted);
        let controller = controller_with(catalog);
        assert!(controller.login(PASSWORD).await.granted);

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.set_facet_value(Facet::Owner, "Alice", true).await;
            })
        };
        tokio::task::yield_now().await;

        controller.set_facet_value(Facet::Kind, "video", true).await;
        slow.await.unwrap();

        // The later request selected Alice + video, which matches nothing;
        // the earlier Alice-only response must not overwrite it.
        assert!(controller.playlist().await.is_empty());
        assert_eq!(gallery(&controller).surface, Surface::empty());
    }

    #[tokio::test]
    async fn test_logged_out_operations_are_ignored() {
        let catalog = Arc::new(ScriptedCatalog::new(scenario_items()));
        let controller = controller_with(catalog.clone());

        controller.apply_filters().await;
        controller.load_facets().await;
        controller.display_current().await;

        assert!(controller.view().is_login());
        assert_eq!(catalog.catalog_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_timer() {
        let (controller, _) = logged_in(images(3)).await;
        controller.start().await;
        controller.shutdown().await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(controller.cursor().await, Some(0));
    }
}
