mod controls;
mod filter_panel;
mod login_overlay;
mod media_stage;

pub use controls::Controls;
pub use filter_panel::FilterPanel;
pub use login_overlay::LoginOverlay;
pub use media_stage::{MediaStage, VIDEO_ELEMENT_ID};
