//! Event dispatch into the tour state machine, and the per-instance input
//! subscription resource.
//!
//! Hosts never hand the tour callbacks; they translate their input layer
//! (key presses, clicks, resizes, timer polls) into [`TourEvent`] values and
//! dispatch them. Transition logic stays pure and testable without any
//! rendering backend.

/// Navigation keys the tour understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourKey {
    Escape,
    Left,
    Right,
    Enter,
}

/// Kinds of single-shot deferral the core schedules. Each kind is mutually
/// exclusive with itself: scheduling a new one invalidates the pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fixed short delay before finalizing a step's visual transition.
    Settle,
    /// Autoplay advance after the step's duration.
    AutoAdvance,
    /// Badge auto-dismissal.
    BadgeDismiss,
}

/// Tooltip navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourButton {
    Skip,
    Previous,
    Next,
}

/// A discrete external event driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourEvent {
    Start,
    Next { auto: bool },
    Previous,
    Goto(i32),
    Stop,
    Key(TourKey),
    /// Click on the dimming overlay (exits the tour / dismisses a badge).
    OverlayClicked,
    /// Click on a step bullet; carries the bullet's step number.
    BulletClicked(i32),
    /// Press of a tooltip navigation button.
    ButtonPressed(TourButton),
    /// Viewport changed; current layers need repositioning.
    Resized,
    TimerFired(TimerKind),
}

/// Explicit keyboard/resize listener registration, scoped to one tour
/// instance. Acquired on first render, released on stop/teardown; attach is
/// idempotent. Hosts consult [`InputSubscription::is_attached`] to decide
/// whether input belongs to the tour.
#[derive(Debug, Default)]
pub struct InputSubscription {
    attached: bool,
}

impl InputSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach; returns true only on the first acquisition.
    pub fn acquire(&mut self) -> bool {
        let fresh = !self.attached;
        self.attached = true;
        fresh
    }

    pub fn release(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}
