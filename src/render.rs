//! The rendering seam.
//!
//! The tour core drives a [`Renderer`] through a narrow interface and holds
//! the opaque [`LayerId`] handles it returns. Layer identity is never
//! re-derived by querying the backend; the handles are the only names the
//! core knows.

use crate::geometry::{Rect, Size};
use crate::position::Arrow;
use crate::step::Step;

/// Opaque handle to one rendered overlay layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// The layer set materialized for one tour step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLayers {
    /// Full-viewport dimming layer.
    pub overlay: LayerId,
    /// Highlight frame around the target.
    pub helper: LayerId,
    /// Anchor layer the tooltip and number hang off.
    pub reference: LayerId,
    /// The tooltip balloon itself.
    pub tooltip: LayerId,
    pub arrow: LayerId,
    /// Step-number bubble.
    pub number: LayerId,
}

impl StepLayers {
    pub fn all(&self) -> [LayerId; 6] {
        [
            self.overlay,
            self.helper,
            self.reference,
            self.tooltip,
            self.arrow,
            self.number,
        ]
    }
}

/// The smaller layer set a badge needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeLayers {
    pub overlay: LayerId,
    pub helper: LayerId,
    pub reference: LayerId,
    pub number: LayerId,
}

impl BadgeLayers {
    pub fn all(&self) -> [LayerId; 4] {
        [self.overlay, self.helper, self.reference, self.number]
    }
}

/// Backend that materializes overlay layers. Implementations own widget
/// construction, styling, and the fixed fade-out timing on teardown; the
/// core owns sequencing and geometry.
pub trait Renderer {
    /// Build (or rebuild) the layers for a step; any layers from a
    /// previously rendered step are replaced and their handles become stale.
    /// `sequence_position` is 1-based; `total` is the merged sequence length.
    fn render_step(&mut self, step: &Step, sequence_position: usize, total: usize) -> StepLayers;

    /// Build the layers for a one-off badge showing `glyph`.
    fn render_badge(&mut self, glyph: &str) -> BadgeLayers;

    /// Position a layer in page coordinates. Glyph-sized layers (arrow,
    /// number) may receive a zero-sized rect and size themselves.
    fn set_layer_geometry(&mut self, layer: LayerId, rect: Rect);

    /// Point the balloon arrow; `None` hides it (floating placement).
    fn set_arrow(&mut self, layer: LayerId, arrow: Option<Arrow>);

    /// Measured size of a layer's content.
    fn measure(&self, layer: LayerId) -> Size;

    /// Remove a single layer (badges dismiss without touching tour layers).
    fn remove_layer(&mut self, layer: LayerId);

    /// Remove every layer this renderer created, with the fade applied.
    fn teardown(&mut self);
}
