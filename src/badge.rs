//! One-off badge overlays.
//!
//! A badge highlights a single target outside any tour sequence: it shows a
//! short glyph, auto-dismisses after a duration or waits for a key press or
//! click, and repositions on resize. Its lifecycle is independent of the
//! tour session — dismissing a badge never touches tour state.

use std::time::{Duration, Instant};

use crate::config::TourOptions;
use crate::document::Document;
use crate::position::reference_rect;
use crate::render::{BadgeLayers, Renderer};

#[derive(Debug, Default)]
pub struct BadgeController {
    layers: Option<BadgeLayers>,
    dismiss_deadline: Option<Instant>,
    target_id: Option<String>,
}

impl BadgeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.layers.is_some()
    }

    /// Show a badge on `target`. An unresolvable target is reported to the
    /// log channel and the call is a no-op; it never errors to the caller.
    /// Empty text falls back to the configured glyph; an absent duration to
    /// the configured default (zero or less stays until dismissed).
    pub fn show<R: Renderer>(
        &mut self,
        renderer: &mut R,
        document: &Document,
        options: &TourOptions,
        target: &str,
        text: Option<&str>,
        duration_secs: Option<i64>,
    ) {
        let Some(target_rect) = document.page_rect(target) else {
            tracing::error!(target_id = target, "badge target does not exist in the document");
            return;
        };

        // One badge at a time; a new one replaces the old.
        if self.is_visible() {
            self.dismiss(renderer);
        }

        let glyph = match text {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => options.default_badge_glyph.clone(),
        };
        let duration = duration_secs.unwrap_or(options.default_badge_duration);

        let layers = renderer.render_badge(&glyph);
        let reference = reference_rect(target_rect);
        renderer.set_layer_geometry(layers.helper, reference);
        renderer.set_layer_geometry(layers.reference, reference);
        renderer.set_layer_geometry(layers.overlay, document.viewport().as_rect());

        self.layers = Some(layers);
        self.target_id = Some(target.to_string());
        self.dismiss_deadline = (duration > 0)
            .then(|| Instant::now() + Duration::from_secs(u64::try_from(duration).unwrap_or(0)));
        tracing::debug!(target_id = target, duration, "badge shown");
    }

    pub fn dismiss<R: Renderer>(&mut self, renderer: &mut R) {
        if let Some(layers) = self.layers.take() {
            for layer in layers.all() {
                renderer.remove_layer(layer);
            }
            tracing::debug!("badge dismissed");
        }
        self.dismiss_deadline = None;
        self.target_id = None;
    }

    /// Check the dismiss deadline; returns true exactly once when it fires.
    pub fn poll_deadline(&mut self, now: Instant) -> bool {
        if self.dismiss_deadline.is_some_and(|deadline| now >= deadline) {
            self.dismiss_deadline = None;
            true
        } else {
            false
        }
    }

    /// Re-apply geometry after a viewport change.
    pub fn reposition<R: Renderer>(&mut self, renderer: &mut R, document: &Document) {
        let Some(layers) = self.layers else {
            return;
        };
        let Some(rect) = self
            .target_id
            .as_deref()
            .and_then(|id| document.page_rect(id))
        else {
            return;
        };
        let reference = reference_rect(rect);
        renderer.set_layer_geometry(layers.helper, reference);
        renderer.set_layer_geometry(layers.reference, reference);
        renderer.set_layer_geometry(layers.overlay, document.viewport().as_rect());
    }

    /// Forget all handles after a full renderer teardown invalidated them.
    pub fn invalidate(&mut self) {
        self.layers = None;
        self.dismiss_deadline = None;
        self.target_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size, Viewport};
    use crate::position::Arrow;
    use crate::render::{LayerId, StepLayers};
    use crate::step::Step;

    #[derive(Default)]
    struct CountingRenderer {
        next_id: u64,
        live: Vec<LayerId>,
        geometry_calls: usize,
    }

    impl CountingRenderer {
        fn alloc(&mut self) -> LayerId {
            self.next_id += 1;
            let id = LayerId(self.next_id);
            self.live.push(id);
            id
        }
    }

    impl Renderer for CountingRenderer {
        fn render_step(&mut self, _step: &Step, _pos: usize, _total: usize) -> StepLayers {
            unreachable!("badge tests never render steps")
        }

        fn render_badge(&mut self, _glyph: &str) -> BadgeLayers {
            BadgeLayers {
                overlay: self.alloc(),
                helper: self.alloc(),
                reference: self.alloc(),
                number: self.alloc(),
            }
        }

        fn set_layer_geometry(&mut self, _layer: LayerId, _rect: Rect) {
            self.geometry_calls += 1;
        }

        fn set_arrow(&mut self, _layer: LayerId, _arrow: Option<Arrow>) {}

        fn measure(&self, _layer: LayerId) -> Size {
            Size::default()
        }

        fn remove_layer(&mut self, layer: LayerId) {
            self.live.retain(|l| *l != layer);
        }

        fn teardown(&mut self) {
            self.live.clear();
        }
    }

    fn document() -> Document {
        let mut doc = Document::new(Viewport::new(100, 40));
        doc.add_target(crate::document::Target {
            id: "save".to_string(),
            parent: None,
            rect: Rect::new(5, 5, 10, 2),
            annotation: None,
        })
        .unwrap();
        doc
    }

    #[test]
    fn test_unknown_target_is_a_noop() {
        let mut renderer = CountingRenderer::default();
        let mut badge = BadgeController::new();
        badge.show(
            &mut renderer,
            &document(),
            &TourOptions::default(),
            "ghost",
            None,
            None,
        );
        assert!(!badge.is_visible());
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_show_and_key_dismiss() {
        let mut renderer = CountingRenderer::default();
        let mut badge = BadgeController::new();
        badge.show(
            &mut renderer,
            &document(),
            &TourOptions::default(),
            "save",
            None,
            None,
        );
        assert!(badge.is_visible());
        assert_eq!(renderer.live.len(), 4);
        // Default duration is 0: sticky until dismissed.
        assert!(!badge.poll_deadline(Instant::now() + Duration::from_secs(3600)));

        badge.dismiss(&mut renderer);
        assert!(!badge.is_visible());
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_duration_deadline_fires_once() {
        let mut renderer = CountingRenderer::default();
        let mut badge = BadgeController::new();
        badge.show(
            &mut renderer,
            &document(),
            &TourOptions::default(),
            "save",
            Some("!"),
            Some(2),
        );
        let later = Instant::now() + Duration::from_secs(3);
        assert!(badge.poll_deadline(later));
        assert!(!badge.poll_deadline(later));
    }

    #[test]
    fn test_second_badge_replaces_first() {
        let mut renderer = CountingRenderer::default();
        let mut badge = BadgeController::new();
        let doc = document();
        let options = TourOptions::default();
        badge.show(&mut renderer, &doc, &options, "save", None, Some(5));
        badge.show(&mut renderer, &doc, &options, "save", Some("2"), None);
        assert!(badge.is_visible());
        assert_eq!(renderer.live.len(), 4);
        // The replacement badge is sticky; the first badge's deadline is gone.
        assert!(!badge.poll_deadline(Instant::now() + Duration::from_secs(3600)));
    }
}
