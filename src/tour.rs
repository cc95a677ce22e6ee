//! The tour state machine.
//!
//! A [`Tour`] owns the document, the options, a renderer, and one session at
//! a time. All mutation funnels through [`Tour::dispatch`]; hosts translate
//! their input layer into [`TourEvent`] values and poll the deadline timers
//! each tick. Nothing here blocks, and the renderer is only ever driven
//! through its narrow trait.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::badge::BadgeController;
use crate::config::TourOptions;
use crate::document::Document;
use crate::events::{InputSubscription, TimerKind, TourButton, TourEvent, TourKey};
use crate::geometry::Rect;
use crate::merge;
use crate::position;
use crate::render::{Renderer, StepLayers};
use crate::step::Step;

/// Fixed deferral between building a step's layers and finalizing its
/// placement, so a layout transition can settle first.
pub const SETTLE_DELAY: Duration = Duration::from_millis(350);

/// Where the state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    /// Step numbers are 1-based while a session runs.
    Running(i32),
    /// Reached only by advancing past the last step. `start()` does not
    /// leave this state; `stop()` returns to `NotStarted`.
    Stopped,
}

/// Navigation button state for one rendered step.
///
/// A single-step tour counts as both first and last: Next is disabled and
/// the skip button carries the done label, while Prev stays enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavButtons {
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub skip_label: String,
}

/// Button state for step `current` of `total`.
pub fn nav_buttons(current: i32, total: i32, options: &TourOptions) -> NavButtons {
    if current == 1 && total > 1 {
        NavButtons {
            prev_enabled: false,
            next_enabled: true,
            skip_label: options.skip_label.clone(),
        }
    } else if total == current || total == 1 {
        NavButtons {
            prev_enabled: true,
            next_enabled: false,
            skip_label: options.done_label.clone(),
        }
    } else {
        NavButtons {
            prev_enabled: true,
            next_enabled: true,
            skip_label: options.skip_label.clone(),
        }
    }
}

/// Progress through the sequence, as a percentage.
pub fn progress_percent(current: i32, total: i32) -> f64 {
    if total <= 0 {
        0.0
    } else {
        f64::from(current) / f64::from(total) * 100.0
    }
}

pub struct Tour<R: Renderer> {
    options: TourOptions,
    document: Document,
    renderer: R,
    phase: Phase,
    steps: Vec<Step>,
    /// Once set, autoplay never resumes for the rest of the session.
    suppressed: bool,
    layers: Option<StepLayers>,
    settle_deadline: Option<Instant>,
    advance_deadline: Option<Instant>,
    input: InputSubscription,
    badge: BadgeController,
}

impl<R: Renderer> Tour<R> {
    pub fn new(document: Document, renderer: R) -> Self {
        Self::with_options(document, renderer, TourOptions::default())
    }

    pub fn with_options(document: Document, renderer: R, options: TourOptions) -> Self {
        Self {
            options,
            document,
            renderer,
            phase: Phase::NotStarted,
            steps: Vec::new(),
            suppressed: false,
            layers: None,
            settle_deadline: None,
            advance_deadline: None,
            input: InputSubscription::new(),
            badge: BadgeController::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn current_step_number(&self) -> Option<i32> {
        match self.phase {
            Phase::Running(number) if number >= 1 => Some(number),
            _ => None,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn options(&self) -> &TourOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Hosts update target rects and the viewport through this before
    /// dispatching `Resized`.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Whether keyboard/resize input currently belongs to the tour.
    pub fn input_attached(&self) -> bool {
        self.input.is_attached()
    }

    pub fn badge_visible(&self) -> bool {
        self.badge.is_visible()
    }

    // Public API surface. Each call is sugar for one dispatched event.

    pub fn start(&mut self) {
        self.dispatch(TourEvent::Start);
    }

    pub fn stop(&mut self) {
        self.dispatch(TourEvent::Stop);
    }

    pub fn next(&mut self) {
        self.dispatch(TourEvent::Next { auto: false });
    }

    pub fn previous(&mut self) {
        self.dispatch(TourEvent::Previous);
    }

    pub fn goto_step(&mut self, number: i32) {
        self.dispatch(TourEvent::Goto(number));
    }

    pub fn show_badge(&mut self, target: &str, text: Option<&str>, duration_secs: Option<i64>) {
        self.badge.show(
            &mut self.renderer,
            &self.document,
            &self.options,
            target,
            text,
            duration_secs,
        );
    }

    pub fn set_option(&mut self, name: &str, value: serde_json::Value) {
        self.options.set_option(name, value);
    }

    pub fn set_options(&mut self, options: BTreeMap<String, serde_json::Value>) {
        self.options.set_options(options);
    }

    /// Route one external event into the state machine.
    pub fn dispatch(&mut self, event: TourEvent) {
        match event {
            TourEvent::Start => self.start_session(),
            TourEvent::Next { auto } => self.advance(auto),
            TourEvent::Previous => self.step_back(),
            TourEvent::Goto(number) => {
                self.suppress();
                self.go_to(number);
            }
            TourEvent::Stop => self.stop_session(),
            TourEvent::Key(key) => self.handle_key(key),
            TourEvent::OverlayClicked => self.handle_overlay_click(),
            TourEvent::BulletClicked(number) => {
                self.suppress();
                self.go_to(number);
            }
            TourEvent::ButtonPressed(button) => self.handle_button(button),
            TourEvent::Resized => self.handle_resize(),
            TourEvent::TimerFired(kind) => self.handle_timer(kind),
        }
    }

    /// Fire any elapsed deadlines. Hosts call this once per tick with their
    /// notion of "now"; tests drive it with synthetic instants.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.settle_deadline.is_some_and(|deadline| now >= deadline) {
            self.settle_deadline = None;
            self.dispatch(TourEvent::TimerFired(TimerKind::Settle));
        }
        if self.advance_deadline.is_some_and(|deadline| now >= deadline) {
            self.advance_deadline = None;
            self.dispatch(TourEvent::TimerFired(TimerKind::AutoAdvance));
        }
        if self.badge.poll_deadline(now) {
            self.dispatch(TourEvent::TimerFired(TimerKind::BadgeDismiss));
        }
    }

    fn total(&self) -> i32 {
        i32::try_from(self.steps.len()).unwrap_or(i32::MAX)
    }

    fn find_step(&self, number: i32) -> Option<Step> {
        self.steps.iter().find(|s| s.number == number).cloned()
    }

    /// User intervention: cancel any pending advance and keep autoplay off
    /// for the rest of the session.
    fn suppress(&mut self) {
        self.suppressed = true;
        self.advance_deadline = None;
    }

    fn start_session(&mut self) {
        if self.phase != Phase::NotStarted {
            return;
        }
        let defaults = self.options.scan_defaults();
        let annotation_steps = if self.options.ignore_annotations {
            Vec::new()
        } else {
            self.document.annotation_steps(defaults)
        };
        let programmatic_steps = self
            .document
            .resolve_programmatic(&self.options.steps, defaults);

        match merge::merge(
            annotation_steps,
            programmatic_steps,
            self.options.ignore_annotations,
        ) {
            Ok(steps) => {
                tracing::info!(steps = steps.len(), "starting tour");
                if self.options.auto_play {
                    self.suppressed = false;
                }
                self.steps = steps;
                self.phase = Phase::Running(0);
                self.advance(false);
            }
            Err(err) => {
                tracing::warn!(%err, "tour not started");
            }
        }
    }

    fn advance(&mut self, auto: bool) {
        if auto && self.suppressed {
            return;
        }
        let Phase::Running(current) = self.phase else {
            return;
        };
        if current + 1 <= self.total() {
            let next = current + 1;
            self.phase = Phase::Running(next);
            self.render_current(next);
        } else {
            // Ran off the end: terminal state, layers gone.
            self.suppress();
            self.clear_session_layers();
            self.phase = Phase::Stopped;
            tracing::info!("tour finished");
        }
    }

    fn step_back(&mut self) {
        let Phase::Running(current) = self.phase else {
            return;
        };
        self.suppress();
        if current > 0 {
            let previous = current - 1;
            self.phase = Phase::Running(previous);
            // Number 0 has no step: the lookup miss below stops the tour.
            self.render_current(previous);
        }
    }

    fn go_to(&mut self, number: i32) {
        let Phase::Running(_) = self.phase else {
            return;
        };
        self.phase = Phase::Running(number);
        self.render_current(number);
    }

    fn stop_session(&mut self) {
        self.clear_session_layers();
        self.suppressed = true;
        self.steps.clear();
        self.phase = Phase::NotStarted;
        tracing::debug!("tour stopped");
    }

    /// Look up a step by number and show it; a miss is the recoverable
    /// end-of-tour condition and stops the session.
    fn render_current(&mut self, number: i32) {
        match self.find_step(number) {
            Some(step) => self.show_step(&step),
            None => {
                tracing::debug!(step = number, "no step with this number, stopping");
                self.stop_session();
            }
        }
    }

    fn show_step(&mut self, step: &Step) {
        let Phase::Running(number) = self.phase else {
            return;
        };
        let Some(target_rect) = self.document.resolve_step_rect(&step.target) else {
            // The target vanished mid-session; same recoverable path as a
            // missing step number.
            tracing::warn!(step = step.number, "step target no longer resolves");
            self.stop_session();
            return;
        };

        let total = self.total();
        let layers = self
            .renderer
            .render_step(step, usize::try_from(number).unwrap_or(0), self.steps.len());

        let reference = position::reference_rect(target_rect);
        self.renderer.set_layer_geometry(layers.helper, reference);
        self.renderer.set_layer_geometry(layers.reference, reference);
        self.renderer
            .set_layer_geometry(layers.overlay, self.document.viewport().as_rect());
        self.layers = Some(layers);
        self.input.acquire();

        // Settle timer; a new render replaces any pending one.
        self.settle_deadline = Some(Instant::now() + SETTLE_DELAY);

        // Autoplay: schedule the advance for this step, replacing whatever
        // the previous step left pending.
        self.advance_deadline = None;
        if self.options.auto_play && step.auto_advances() && !self.suppressed {
            let duration = Duration::from_secs(u64::try_from(step.duration_secs).unwrap_or(0));
            self.advance_deadline = Some(Instant::now() + duration);
        }
        tracing::debug!(step = number, total, "step rendered");
    }

    /// Settle-timer body: measure the tooltip, solve the placement, apply
    /// geometry through the held handles.
    fn finalize_current(&mut self) {
        let Phase::Running(number) = self.phase else {
            return;
        };
        let Some(layers) = self.layers else {
            return;
        };
        let Some(step) = self.find_step(number) else {
            return;
        };
        let Some(target_rect) = self.document.resolve_step_rect(&step.target) else {
            return;
        };

        let viewport = self.document.viewport();
        let measured = self.renderer.measure(layers.tooltip);
        let concrete = position::effective_position(
            step.position,
            self.options.tooltip_position,
            target_rect,
            measured,
            &self.options.position_precedence,
            viewport,
        );
        let placement = position::place(
            concrete,
            target_rect,
            measured,
            viewport,
            self.options.show_step_numbers,
        );

        self.renderer
            .set_layer_geometry(layers.tooltip, placement.tooltip);
        self.renderer.set_arrow(layers.arrow, placement.arrow);
        if let Some((left, top)) = placement.number_offset {
            self.renderer
                .set_layer_geometry(layers.number, Rect::new(top, left, 0, 0));
        }
        tracing::debug!(step = number, position = ?placement.position, "step placed");
    }

    fn clear_session_layers(&mut self) {
        if self.layers.take().is_some() {
            self.renderer.teardown();
            // Teardown invalidated every handle, the badge's included.
            self.badge.invalidate();
        }
        self.settle_deadline = None;
        self.advance_deadline = None;
        self.input.release();
    }

    fn handle_key(&mut self, key: TourKey) {
        if self.badge.is_visible() {
            // Any key dismisses a badge.
            self.badge.dismiss(&mut self.renderer);
        }
        let Phase::Running(current) = self.phase else {
            self.suppress();
            return;
        };
        let total = self.total();
        self.suppress();
        match key {
            TourKey::Escape => self.stop_session(),
            TourKey::Left => {
                if current > 1 {
                    self.step_back();
                }
            }
            TourKey::Right => {
                if current < total {
                    self.advance(false);
                } else {
                    self.stop_session();
                }
            }
            // Enter advances unconditionally; on the last step that is the
            // run-off-the-end path into the terminal state.
            TourKey::Enter => self.advance(false),
        }
    }

    fn handle_overlay_click(&mut self) {
        self.suppress();
        if self.badge.is_visible() {
            self.badge.dismiss(&mut self.renderer);
        }
        if self.is_running() {
            self.stop_session();
        }
    }

    fn handle_button(&mut self, button: TourButton) {
        let Phase::Running(current) = self.phase else {
            return;
        };
        let total = self.total();
        self.suppress();
        match button {
            TourButton::Skip => self.stop_session(),
            TourButton::Previous => {
                if current > 1 {
                    self.step_back();
                }
            }
            TourButton::Next => {
                if current < total {
                    self.advance(false);
                }
            }
        }
    }

    /// Fresh geometry for whatever is on screen. Tooltip placement is not
    /// recomputed; only the anchoring layers follow the target.
    fn handle_resize(&mut self) {
        if let (Phase::Running(number), Some(layers)) = (self.phase, self.layers) {
            if let Some(rect) = self
                .find_step(number)
                .and_then(|step| self.document.resolve_step_rect(&step.target))
            {
                let reference = position::reference_rect(rect);
                self.renderer.set_layer_geometry(layers.helper, reference);
                self.renderer
                    .set_layer_geometry(layers.reference, reference);
                self.renderer
                    .set_layer_geometry(layers.overlay, self.document.viewport().as_rect());
            }
        }
        self.badge.reposition(&mut self.renderer, &self.document);
    }

    fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Settle => self.finalize_current(),
            TimerKind::AutoAdvance => self.advance(true),
            TimerKind::BadgeDismiss => self.badge.dismiss(&mut self.renderer),
        }
    }
}
