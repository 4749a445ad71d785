//! The single pending autoplay trigger.

use crate::display::SurfaceId;
use tokio_util::sync::CancellationToken;

/// Identity of one armed schedule, used to ignore triggers that fire after
/// the schedule was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId(pub u64);

/// What will advance the slideshow next, if anything.
///
/// There is at most one live trigger: a timer for images or a completion
/// listener for videos, never both.
#[derive(Debug, Default)]
pub enum AutoplaySchedule {
    #[default]
    None,
    /// Image delay timer; cancelling the token stops the timer task.
    Timer {
        id: ScheduleId,
        cancel: CancellationToken,
    },
    /// Waiting for the video on `surface` to finish playing.
    Listener { id: ScheduleId, surface: SurfaceId },
}

impl AutoplaySchedule {
    #[must_use]
    pub const fn id(&self) -> Option<ScheduleId> {
        match self {
            Self::None => None,
            Self::Timer { id, .. } | Self::Listener { id, .. } => Some(*id),
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Cancel the timer or detach the listener. Safe to call when nothing is armed.
    pub fn teardown(&mut self) {
        if let Self::Timer { cancel, .. } = std::mem::take(self) {
            cancel.cancel();
        }
    }

    /// Consume the schedule if it is the one identified by `id`.
    ///
    /// Returns `true` when the trigger is still current; the schedule is then
    /// cleared, so a trigger can only ever fire once.
    pub fn fire(&mut self, id: ScheduleId) -> bool {
        if self.id() == Some(id) {
            *self = Self::None;
            true
        } else {
            false
        }
    }

    /// Id of the listener waiting on `surface`, if any.
    #[must_use]
    pub fn listener_for(&self, surface: SurfaceId) -> Option<ScheduleId> {
        match self {
            Self::Listener { id, surface: s } if *s == surface => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_is_idempotent() {
        let mut schedule = AutoplaySchedule::None;
        schedule.teardown();
        schedule.teardown();
        assert!(!schedule.is_active());
    }

    #[test]
    fn test_teardown_cancels_timer() {
        let token = CancellationToken::new();
        let mut schedule = AutoplaySchedule::Timer {
            id: ScheduleId(1),
            cancel: token.clone(),
        };
        schedule.teardown();
        assert!(token.is_cancelled());
        assert!(schedule.id().is_none());
    }

    #[test]
    fn test_fire_only_matches_current_id() {
        let mut schedule = AutoplaySchedule::Listener {
            id: ScheduleId(7),
            surface: SurfaceId(3),
        };
        assert!(!schedule.fire(ScheduleId(6)));
        assert!(schedule.is_active());
        assert!(schedule.fire(ScheduleId(7)));
        assert!(!schedule.is_active());
        assert!(!schedule.fire(ScheduleId(7)));
    }

    #[test]
    fn test_listener_for_surface() {
        let schedule = AutoplaySchedule::Listener {
            id: ScheduleId(2),
            surface: SurfaceId(9),
        };
        assert_eq!(schedule.listener_for(SurfaceId(9)), Some(ScheduleId(2)));
        assert_eq!(schedule.listener_for(SurfaceId(8)), None);
    }
}
