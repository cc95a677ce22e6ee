//! End-to-end tour engine tests against a recording renderer.
//!
//! These drive the public API the way a host would: dispatch events, poll
//! deadline timers with synthetic instants, and assert on the layer calls
//! the renderer observed. No terminal is involved.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cicerone::document::{Document, StepAnnotation, Target};
use cicerone::events::{TourEvent, TourKey};
use cicerone::geometry::{Rect, Size, Viewport};
use cicerone::position::Arrow;
use cicerone::render::{BadgeLayers, LayerId, Renderer, StepLayers};
use cicerone::step::Step;
use cicerone::tour::{Phase, Tour, SETTLE_DELAY};

/// Everything the engine asked the backend to do, in order.
#[derive(Debug, Default)]
struct Recording {
    rendered_steps: Vec<(i32, usize, usize)>,
    badges: Vec<String>,
    geometry: BTreeMap<LayerId, Rect>,
    arrows: Vec<Option<Arrow>>,
    live: Vec<LayerId>,
    teardowns: usize,
}

#[derive(Default)]
struct RecordingRenderer {
    next_id: u64,
    tooltip_size: Size,
    log: Rc<RefCell<Recording>>,
}

impl RecordingRenderer {
    fn new(tooltip_size: Size) -> (Self, Rc<RefCell<Recording>>) {
        let log = Rc::new(RefCell::new(Recording::default()));
        (
            Self {
                next_id: 0,
                tooltip_size,
                log: Rc::clone(&log),
            },
            log,
        )
    }

    fn alloc(&mut self) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.log.borrow_mut().live.push(id);
        id
    }
}

impl Renderer for RecordingRenderer {
    fn render_step(&mut self, step: &Step, sequence_position: usize, total: usize) -> StepLayers {
        self.log
            .borrow_mut()
            .rendered_steps
            .push((step.number, sequence_position, total));
        StepLayers {
            overlay: self.alloc(),
            helper: self.alloc(),
            reference: self.alloc(),
            tooltip: self.alloc(),
            arrow: self.alloc(),
            number: self.alloc(),
        }
    }

    fn render_badge(&mut self, glyph: &str) -> BadgeLayers {
        self.log.borrow_mut().badges.push(glyph.to_string());
        BadgeLayers {
            overlay: self.alloc(),
            helper: self.alloc(),
            reference: self.alloc(),
            number: self.alloc(),
        }
    }

    fn set_layer_geometry(&mut self, layer: LayerId, rect: Rect) {
        self.log.borrow_mut().geometry.insert(layer, rect);
    }

    fn set_arrow(&mut self, _layer: LayerId, arrow: Option<Arrow>) {
        self.log.borrow_mut().arrows.push(arrow);
    }

    fn measure(&self, _layer: LayerId) -> Size {
        self.tooltip_size
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.log.borrow_mut().live.retain(|l| *l != layer);
    }

    fn teardown(&mut self) {
        let mut log = self.log.borrow_mut();
        log.live.clear();
        log.teardowns += 1;
    }
}

fn target(id: &str, rect: Rect) -> Target {
    Target {
        id: id.to_string(),
        parent: None,
        rect,
        annotation: None,
    }
}

/// Three targets, no annotations; steps come from the programmatic list.
fn three_panel_document() -> Document {
    let mut doc = Document::new(Viewport::new(120, 40));
    doc.add_target(target("alpha", Rect::new(5, 30, 40, 3))).unwrap();
    doc.add_target(target("beta", Rect::new(15, 30, 40, 3))).unwrap();
    doc.add_target(target("gamma", Rect::new(25, 30, 40, 3))).unwrap();
    doc
}

fn programmatic_tour(durations: [i64; 3], auto_play: bool) -> (Tour<RecordingRenderer>, Rc<RefCell<Recording>>) {
    let (renderer, log) = RecordingRenderer::new(Size::new(30, 6));
    let mut tour = Tour::new(three_panel_document(), renderer);
    tour.set_option("auto_play", serde_json::json!(auto_play));
    tour.set_option(
        "steps",
        serde_json::json!([
            { "target": "alpha", "step": 1, "kind": "tooltip", "text": "first", "duration": durations[0] },
            { "target": "beta", "step": 2, "kind": "tooltip", "text": "second", "duration": durations[1] },
            { "target": "gamma", "step": 3, "kind": "tooltip", "text": "third", "duration": durations[2] }
        ]),
    );
    (tour, log)
}

#[test]
fn full_autoplay_run_with_manual_kickoff() {
    // Durations [-1, 2, -1]: step 1 waits, step 2 self-advances, step 3
    // waits, and the final next() ends the tour.
    let (mut tour, log) = programmatic_tour([-1, 2, -1], true);

    tour.start();
    assert_eq!(tour.phase(), Phase::Running(1));

    // Step 1 has no duration: nothing fires no matter how long we wait.
    tour.poll_timers(Instant::now() + Duration::from_secs(600));
    assert_eq!(tour.phase(), Phase::Running(1));

    // A host-driven next() must leave the autoplay chain alive.
    tour.next();
    assert_eq!(tour.phase(), Phase::Running(2));

    // Settle first, then the 2s advance.
    tour.poll_timers(Instant::now() + SETTLE_DELAY + Duration::from_millis(10));
    assert_eq!(tour.phase(), Phase::Running(2));
    tour.poll_timers(Instant::now() + Duration::from_millis(2100));
    assert_eq!(tour.phase(), Phase::Running(3));

    tour.next();
    assert_eq!(tour.phase(), Phase::Stopped);

    let log = log.borrow();
    assert_eq!(
        log.rendered_steps,
        vec![(1, 1, 3), (2, 2, 3), (3, 3, 3)]
    );
    // All overlay layers are gone after the run.
    assert!(log.live.is_empty());
    assert_eq!(log.teardowns, 1);
}

#[test]
fn previous_cancels_autoplay_for_the_rest_of_the_session() {
    let (mut tour, log) = programmatic_tour([2, 2, 2], true);

    tour.start();
    tour.poll_timers(Instant::now() + Duration::from_millis(2100));
    assert_eq!(tour.phase(), Phase::Running(2));

    tour.previous();
    assert_eq!(tour.phase(), Phase::Running(1));

    // Later steps still carry positive durations, but autoplay is dead.
    for _ in 0..5 {
        tour.poll_timers(Instant::now() + Duration::from_secs(30));
    }
    assert_eq!(tour.phase(), Phase::Running(1));

    // Renders: 1 (start), 2 (autoplay), 1 (previous) - and nothing after.
    assert_eq!(
        log.borrow()
            .rendered_steps
            .iter()
            .map(|(n, _, _)| *n)
            .collect::<Vec<_>>(),
        vec![1, 2, 1]
    );
}

#[test]
fn keyboard_intervention_cancels_autoplay() {
    let (mut tour, _log) = programmatic_tour([2, 2, 2], true);
    tour.start();
    tour.dispatch(TourEvent::Key(TourKey::Right));
    assert_eq!(tour.phase(), Phase::Running(2));
    tour.poll_timers(Instant::now() + Duration::from_secs(30));
    assert_eq!(tour.phase(), Phase::Running(2));
}

#[test]
fn start_with_no_resolvable_steps_stays_not_started() {
    let (renderer, log) = RecordingRenderer::new(Size::new(30, 6));
    let mut tour = Tour::new(three_panel_document(), renderer);
    tour.set_option(
        "steps",
        serde_json::json!([
            { "target": "ghost-1", "step": 1, "kind": "tooltip", "text": "nope" },
            { "target": "ghost-2", "step": 2, "kind": "tooltip", "text": "nope" }
        ]),
    );
    tour.start();
    assert_eq!(tour.phase(), Phase::NotStarted);
    assert!(log.borrow().rendered_steps.is_empty());
    assert!(!tour.input_attached());
}

#[test]
fn stopped_is_terminal_but_stop_resets() {
    let (mut tour, _log) = programmatic_tour([-1, -1, -1], false);
    tour.start();
    tour.next();
    tour.next();
    tour.next();
    assert_eq!(tour.phase(), Phase::Stopped);

    tour.start();
    assert_eq!(tour.phase(), Phase::Stopped);

    tour.stop();
    assert_eq!(tour.phase(), Phase::NotStarted);
    tour.start();
    assert_eq!(tour.phase(), Phase::Running(1));
}

#[test]
fn annotation_and_programmatic_sources_merge() {
    let mut doc = Document::new(Viewport::new(120, 40));
    doc.add_target(Target {
        id: "annotated".to_string(),
        parent: None,
        rect: Rect::new(5, 5, 20, 3),
        annotation: Some(StepAnnotation {
            step: 1,
            kind: Some("tooltip".to_string()),
            text: Some("from markup".to_string()),
            ..StepAnnotation::default()
        }),
    })
    .unwrap();
    doc.add_target(target("extra", Rect::new(15, 5, 20, 3))).unwrap();

    let (renderer, _log) = RecordingRenderer::new(Size::new(30, 6));
    let mut tour = Tour::new(doc, renderer);
    tour.set_option(
        "steps",
        serde_json::json!([
            { "target": "extra", "step": 1, "kind": "tooltip", "text": "squeezed", "append": true }
        ]),
    );
    tour.start();

    let texts: Vec<&str> = tour.steps().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["squeezed", "from markup"]);
    let numbers: Vec<i32> = tour.steps().iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn settle_places_tooltip_below_target() {
    // alpha sits high in a 120x40 viewport with room below: bottom wins.
    let (mut tour, log) = programmatic_tour([-1, -1, -1], false);
    tour.start();
    tour.poll_timers(Instant::now() + SETTLE_DELAY + Duration::from_millis(10));

    let log = log.borrow();
    let tooltip_layer = LayerId(4); // fourth allocation of the first render
    let placed = log.geometry.get(&tooltip_layer).copied().unwrap();
    // Target (top 5, left 30, 40x3) -> reference (0, 25, 50x13) ->
    // tooltip top = 0 + 13 + 10, left = 25.
    assert_eq!(placed, Rect::new(23, 25, 30, 6));
    assert_eq!(log.arrows.last().copied().flatten(), Some(Arrow::Top));
}

#[test]
fn resize_repositions_current_layers() {
    let (mut tour, log) = programmatic_tour([-1, -1, -1], false);
    tour.start();

    let helper_layer = LayerId(2);
    let before = log.borrow().geometry.get(&helper_layer).copied().unwrap();

    tour.document_mut().set_rect("alpha", Rect::new(9, 50, 40, 3));
    tour.document_mut().set_viewport(Viewport::new(100, 30));
    tour.dispatch(TourEvent::Resized);

    let log = log.borrow();
    let after = log.geometry.get(&helper_layer).copied().unwrap();
    assert_ne!(before, after);
    assert_eq!(after, Rect::new(4, 45, 50, 13));
    // Overlay follows the fresh viewport snapshot.
    let overlay = log.geometry.get(&LayerId(1)).copied().unwrap();
    assert_eq!(overlay, Rect::new(0, 0, 100, 30));
}

#[test]
fn badge_round_trip() {
    let (renderer, log) = RecordingRenderer::new(Size::new(30, 6));
    let mut tour = Tour::new(three_panel_document(), renderer);

    // Unknown target: reported, no layers, no error.
    tour.show_badge("ghost", None, None);
    assert!(!tour.badge_visible());
    assert!(log.borrow().badges.is_empty());

    // Default glyph, 2s duration.
    tour.show_badge("alpha", None, Some(2));
    assert!(tour.badge_visible());
    assert_eq!(log.borrow().badges, vec!["\u{2798}".to_string()]);
    assert_eq!(log.borrow().live.len(), 4);

    tour.poll_timers(Instant::now() + Duration::from_secs(3));
    assert!(!tour.badge_visible());
    assert!(log.borrow().live.is_empty());
}

#[test]
fn any_key_dismisses_sticky_badge() {
    let (renderer, log) = RecordingRenderer::new(Size::new(30, 6));
    let mut tour = Tour::new(three_panel_document(), renderer);

    tour.show_badge("beta", Some("!"), None);
    assert!(tour.badge_visible());
    // Sticky: the dismiss deadline never fires on its own.
    tour.poll_timers(Instant::now() + Duration::from_secs(3600));
    assert!(tour.badge_visible());

    tour.dispatch(TourEvent::Key(TourKey::Enter));
    assert!(!tour.badge_visible());
    assert!(log.borrow().live.is_empty());
}

#[test]
fn badge_dismissal_leaves_tour_untouched() {
    let (mut tour, _log) = programmatic_tour([-1, -1, -1], false);
    tour.start();
    tour.next();
    assert_eq!(tour.phase(), Phase::Running(2));

    tour.show_badge("alpha", Some("2"), Some(1));
    tour.poll_timers(Instant::now() + Duration::from_secs(2));
    assert!(!tour.badge_visible());
    assert_eq!(tour.phase(), Phase::Running(2));
}

#[test]
fn input_subscription_tracks_session() {
    let (mut tour, _log) = programmatic_tour([-1, -1, -1], false);
    assert!(!tour.input_attached());
    tour.start();
    assert!(tour.input_attached());
    tour.stop();
    assert!(!tour.input_attached());
}
