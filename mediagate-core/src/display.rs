//! Render model written by the controller and read by the front-end.
//!
//! The controller is the only writer; front-ends observe a [`View`] and draw
//! it without keeping state of their own about which item is shown.

use crate::filter::{FacetOptions, FilterSelection};
use crate::media::{MediaItem, MediaKind};

/// Text shown in place of a surface when the playlist is empty.
pub const EMPTY_SURFACE_MESSAGE: &str = "No media to display";

/// Status line text when nothing is loaded.
pub const EMPTY_STATUS_MESSAGE: &str = "No file loaded.";

/// Identity of one mounted display surface. A new id is issued per render,
/// so events from an outgoing surface can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Attributes of a mounted video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoAttributes {
    pub controls: bool,
    pub autoplay: bool,
    /// Must stay `false`: the natural end of playback is what advances autoplay.
    pub looped: bool,
    /// Play inside the page instead of taking over the screen on mobile.
    pub plays_inline: bool,
}

impl VideoAttributes {
    pub const SLIDESHOW: Self = Self {
        controls: true,
        autoplay: true,
        looped: false,
        plays_inline: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// Nothing has been rendered yet.
    Blank,
    /// The playlist is empty.
    Empty { message: String },
    Image {
        id: SurfaceId,
        item: MediaItem,
        /// Byte stream endpoint of the item
        src: String,
    },
    Video {
        id: SurfaceId,
        item: MediaItem,
        src: String,
        attributes: VideoAttributes,
        paused: bool,
    },
}

impl Surface {
    /// Build the surface appropriate for `item`'s kind.
    #[must_use]
    pub fn for_item(id: SurfaceId, item: MediaItem, src: String) -> Self {
        match item.kind {
            MediaKind::Image => Self::Image { id, item, src },
            MediaKind::Video => Self::Video {
                id,
                item,
                src,
                attributes: VideoAttributes::SLIDESHOW,
                paused: false,
            },
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::Empty {
            message: EMPTY_SURFACE_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<SurfaceId> {
        match self {
            Self::Image { id, .. } | Self::Video { id, .. } => Some(*id),
            Self::Blank | Self::Empty { .. } => None,
        }
    }

    #[must_use]
    pub const fn item(&self) -> Option<&MediaItem> {
        match self {
            Self::Image { item, .. } | Self::Video { item, .. } => Some(item),
            Self::Blank | Self::Empty { .. } => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::Image { .. } => Some(MediaKind::Image),
            Self::Video { .. } => Some(MediaKind::Video),
            Self::Blank | Self::Empty { .. } => None,
        }
    }
}

/// The status line under the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Empty,
    Item {
        id: String,
        owner: String,
        category: String,
        /// 1-indexed
        position: usize,
        total: usize,
    },
}

impl StatusLine {
    #[must_use]
    pub fn for_item(item: &MediaItem, position: usize, total: usize) -> Self {
        Self::Item {
            id: item.id.clone(),
            owner: item.owner.clone(),
            category: item.category.clone(),
            position,
            total,
        }
    }

    /// The "position/total" part, if an item is shown.
    #[must_use]
    pub fn progress(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Item {
                position, total, ..
            } => Some(format!("{position}/{total}")),
        }
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str(EMPTY_STATUS_MESSAGE),
            Self::Item {
                id,
                owner,
                category,
                position,
                total,
            } => write!(f, "{id}\n{owner}; {category}\n({position}/{total})"),
        }
    }
}

/// What the play/pause button currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayAffordance {
    #[default]
    Play,
    Pause,
}

impl PlayAffordance {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
        }
    }

    /// Whether the button is drawn in its active (slideshow running) style.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pause)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginView {
    pub error_visible: bool,
    /// Bumped every time the credential input must be cleared.
    pub credential_resets: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryView {
    pub facets: FacetOptions,
    pub selection: FilterSelection,
    pub surface: Surface,
    pub status: StatusLine,
    pub affordance: PlayAffordance,
    /// Generic error indicator for the last failed operation
    pub error: Option<String>,
}

impl GalleryView {
    #[must_use]
    pub fn new(facets: FacetOptions) -> Self {
        Self {
            facets,
            selection: FilterSelection::default(),
            surface: Surface::Blank,
            status: StatusLine::Empty,
            affordance: PlayAffordance::Play,
            error: None,
        }
    }
}

/// Either the login surface or the gallery, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Login(LoginView),
    Gallery(GalleryView),
}

impl Default for View {
    fn default() -> Self {
        Self::Login(LoginView::default())
    }
}

impl View {
    #[must_use]
    pub const fn gallery(&self) -> Option<&GalleryView> {
        match self {
            Self::Gallery(gallery) => Some(gallery),
            Self::Login(_) => None,
        }
    }

    #[must_use]
    pub const fn is_login(&self) -> bool {
        matches!(self, Self::Login(_))
    }
}
