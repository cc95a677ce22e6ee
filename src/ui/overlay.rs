//! Ratatui implementation of the [`Renderer`] trait.
//!
//! The tour core decides what exists and where; this backend owns how layers
//! look on a terminal frame. Layers live in an ordered store keyed by their
//! handle and are drawn back-to-front each frame. Removing the dimming
//! overlay leaves a fading ghost for a fixed timing before it disappears.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect as TermRect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::config::TourOptions;
use crate::geometry::{Rect, Size};
use crate::position::Arrow;
use crate::render::{BadgeLayers, LayerId, Renderer, StepLayers};
use crate::step::{Step, StepKind};
use crate::tour::{nav_buttons, progress_percent, NavButtons};

/// Fixed fade timing applied when the dimming overlay is removed.
pub const FADE_OUT: Duration = Duration::from_millis(400);

/// Widest a tooltip's inner text column gets, in cells.
const TOOLTIP_TEXT_WIDTH: usize = 36;
const TOOLTIP_MIN_WIDTH: usize = 16;

#[derive(Debug, Clone)]
enum LayerContent {
    Overlay,
    Helper { style: Option<String> },
    /// Invisible anchor; tooltip and number hang off it.
    Reference,
    Tooltip(TooltipContent),
    Arrow { orientation: Option<Arrow> },
    Number { glyph: String },
}

#[derive(Debug, Clone)]
struct TooltipContent {
    text: String,
    step_number: i32,
    total: usize,
    buttons: NavButtons,
    progress: f64,
    style: Option<String>,
}

#[derive(Debug, Clone)]
struct Layer {
    content: LayerContent,
    rect: Rect,
    /// Some layers are created before the core positions them.
    placed: bool,
}

pub struct TuiRenderer {
    options: TourOptions,
    next_id: u64,
    layers: BTreeMap<LayerId, Layer>,
    /// Handles belonging to the currently rendered step, so a re-render
    /// replaces them without touching badge layers.
    step_layer_ids: Vec<LayerId>,
    /// Ghosts of removed overlays, drawn dimmer until their deadline.
    fading: Vec<(Rect, Instant)>,
}

impl TuiRenderer {
    pub fn new(options: TourOptions) -> Self {
        Self {
            options,
            next_id: 0,
            layers: BTreeMap::new(),
            step_layer_ids: Vec::new(),
            fading: Vec::new(),
        }
    }

    fn insert(&mut self, content: LayerContent) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(
            id,
            Layer {
                content,
                rect: Rect::ZERO,
                placed: false,
            },
        );
        id
    }

    fn start_fade(&mut self, rect: Rect) {
        self.fading.push((rect, Instant::now() + FADE_OUT));
    }

    /// Page rect of the current tooltip, if one is placed. The demo host
    /// uses this to tell tooltip clicks from overlay clicks.
    pub fn tooltip_area(&self) -> Option<Rect> {
        self.layers.values().find_map(|layer| {
            matches!(layer.content, LayerContent::Tooltip(_)).then_some(layer.rect)
        })
    }

    fn wrap_lines(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for raw in text.split('\n') {
            let mut current = String::new();
            for word in raw.split_whitespace() {
                if current.is_empty() {
                    current = word.to_string();
                } else if current.chars().count() + 1 + word.chars().count() <= width {
                    current.push(' ');
                    current.push_str(word);
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = word.to_string();
                }
            }
            lines.push(current);
        }
        lines
    }

    fn accent_color(style: Option<&str>) -> Color {
        match style {
            Some("warning") => Color::Yellow,
            Some("danger") => Color::Red,
            Some("accent") => Color::Magenta,
            _ => Color::Cyan,
        }
    }

    fn overlay_color(&self) -> Color {
        // The terminal has no alpha channel; opacity picks the shade.
        if self.options.overlay_opacity >= 0.5 {
            Color::Black
        } else {
            Color::DarkGray
        }
    }

    /// Draw all live layers onto the frame, back to front.
    pub fn draw(&mut self, frame: &mut Frame) {
        let now = Instant::now();
        self.fading.retain(|(_, deadline)| now < *deadline);

        let mut ordered: Vec<(&LayerId, &Layer)> = self.layers.iter().collect();
        ordered.sort_by_key(|(id, layer)| (z_rank(&layer.content), **id));

        for (rect, _) in &self.fading {
            if let Some(area) = clamp(*rect, frame.area()) {
                let ghost = Block::default().style(Style::default().bg(Color::DarkGray));
                frame.render_widget(ghost, area);
            }
        }

        let tooltip_rect = self.tooltip_area();
        for (_, layer) in ordered {
            self.draw_layer(frame, layer, tooltip_rect);
        }
    }

    fn draw_layer(&self, frame: &mut Frame, layer: &Layer, tooltip_rect: Option<Rect>) {
        match &layer.content {
            LayerContent::Overlay => {
                if let Some(area) = clamp(layer.rect, frame.area()) {
                    let shade = Block::default().style(Style::default().bg(self.overlay_color()));
                    frame.render_widget(shade, area);
                }
            }
            LayerContent::Helper { style } => {
                if let Some(area) = clamp(layer.rect, frame.area()) {
                    let frame_style = Style::default()
                        .fg(Self::accent_color(style.as_deref()))
                        .add_modifier(Modifier::BOLD);
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(frame_style);
                    frame.render_widget(block, area);
                }
            }
            LayerContent::Reference => {}
            LayerContent::Tooltip(content) => {
                if layer.placed {
                    self.draw_tooltip(frame, layer.rect, content);
                }
            }
            LayerContent::Arrow { orientation } => {
                if let (Some(arrow), Some(rect)) = (orientation, tooltip_rect) {
                    self.draw_arrow(frame, *arrow, rect);
                }
            }
            LayerContent::Number { glyph } => {
                if glyph.is_empty() {
                    return;
                }
                let rect = if layer.placed {
                    layer.rect
                } else {
                    // Default roost: the top-left corner of the highlight.
                    match self.reference_area() {
                        Some(reference) => Rect::new(reference.top - 1, reference.left - 1, 0, 0),
                        None => return,
                    }
                };
                let width = u16::try_from(glyph.chars().count() + 2).unwrap_or(3);
                if let Some(area) = clamp(Rect::new(rect.top, rect.left, i32::from(width), 1), frame.area()) {
                    let badge = Paragraph::new(format!(" {glyph} ")).style(
                        Style::default()
                            .fg(Color::White)
                            .bg(Color::Red)
                            .add_modifier(Modifier::BOLD),
                    );
                    frame.render_widget(badge, area);
                }
            }
        }
    }

    fn reference_area(&self) -> Option<Rect> {
        self.layers.values().find_map(|layer| {
            matches!(layer.content, LayerContent::Reference).then_some(layer.rect)
        })
    }

    fn draw_tooltip(&self, frame: &mut Frame, rect: Rect, content: &TooltipContent) {
        let Some(area) = clamp(rect, frame.area()) else {
            return;
        };
        frame.render_widget(Clear, area);

        let accent = Self::accent_color(content.style.as_deref());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let mut lines: Vec<Line> = Self::wrap_lines(&content.text, inner.width as usize)
            .into_iter()
            .map(Line::from)
            .collect();

        if self.options.show_bullets {
            let mut spans = Vec::with_capacity(content.total);
            for slot in 1..=content.total {
                let active = slot == usize::try_from(content.step_number).unwrap_or(0);
                spans.push(Span::styled(
                    if active { "\u{25cf} " } else { "\u{25cb} " },
                    if active {
                        Style::default().fg(accent).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    },
                ));
            }
            lines.push(Line::from(spans));
        }

        if self.options.show_progress {
            let width = inner.width as usize;
            let filled = (content.progress / 100.0 * width as f64).round() as usize;
            lines.push(Line::from(vec![
                Span::styled("\u{2501}".repeat(filled.min(width)), Style::default().fg(accent)),
                Span::styled(
                    "\u{2501}".repeat(width.saturating_sub(filled)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }

        if self.options.show_buttons {
            let enabled = Style::default().fg(accent).add_modifier(Modifier::BOLD);
            let disabled = Style::default().fg(Color::DarkGray);
            let buttons = &content.buttons;
            lines.push(Line::from(vec![
                Span::styled(format!("[{}]", buttons.skip_label), enabled),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", self.options.prev_label),
                    if buttons.prev_enabled { enabled } else { disabled },
                ),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", self.options.next_label),
                    if buttons.next_enabled { enabled } else { disabled },
                ),
            ]));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn draw_arrow(&self, frame: &mut Frame, arrow: Arrow, tooltip: Rect) {
        let (glyph, top, left) = match arrow {
            Arrow::Top => ("\u{25b2}", tooltip.top, tooltip.left + 3),
            Arrow::TopMiddle => ("\u{25b2}", tooltip.top, tooltip.left + tooltip.width / 2),
            Arrow::TopRight => ("\u{25b2}", tooltip.top, tooltip.right() - 4),
            Arrow::Bottom => ("\u{25bc}", tooltip.bottom() - 1, tooltip.left + 3),
            Arrow::Left => ("\u{25c0}", tooltip.top + 1, tooltip.left),
            Arrow::Right => ("\u{25b6}", tooltip.top + 1, tooltip.right() - 1),
            Arrow::RightBottom => ("\u{25b6}", tooltip.bottom() - 2, tooltip.right() - 1),
        };
        if let Some(area) = clamp(Rect::new(top, left, 1, 1), frame.area()) {
            let widget = Paragraph::new(glyph).style(Style::default().fg(Color::Cyan));
            frame.render_widget(widget, area);
        }
    }
}

fn z_rank(content: &LayerContent) -> u8 {
    match content {
        LayerContent::Overlay => 0,
        LayerContent::Helper { .. } => 1,
        LayerContent::Reference => 2,
        LayerContent::Tooltip(_) => 3,
        LayerContent::Arrow { .. } => 4,
        LayerContent::Number { .. } => 5,
    }
}

/// Intersect a page rect with the frame and convert to terminal coordinates.
fn clamp(rect: Rect, frame_area: TermRect) -> Option<TermRect> {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right().min(i32::from(frame_area.width));
    let bottom = rect.bottom().min(i32::from(frame_area.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(TermRect {
        x: u16::try_from(left).ok()?,
        y: u16::try_from(top).ok()?,
        width: u16::try_from(right - left).ok()?,
        height: u16::try_from(bottom - top).ok()?,
    })
}

impl Renderer for TuiRenderer {
    fn render_step(&mut self, step: &Step, sequence_position: usize, total: usize) -> StepLayers {
        // One step's layers at a time; a new render replaces the old set.
        // Badge layers are unrelated and survive.
        for id in std::mem::take(&mut self.step_layer_ids) {
            self.layers.remove(&id);
        }

        let display_text = if step.kind == StepKind::Badge {
            self.options.default_badge_text.clone()
        } else {
            step.text.clone()
        };
        let current = i32::try_from(sequence_position).unwrap_or(0);
        let total_i32 = i32::try_from(total).unwrap_or(0);

        let overlay = self.insert(LayerContent::Overlay);
        let helper = self.insert(LayerContent::Helper {
            style: step
                .highlight_style
                .clone()
                .or_else(|| some_nonempty(&self.options.highlight_style)),
        });
        let reference = self.insert(LayerContent::Reference);
        let tooltip = self.insert(LayerContent::Tooltip(TooltipContent {
            text: display_text,
            step_number: current,
            total,
            buttons: nav_buttons(current, total_i32, &self.options),
            progress: progress_percent(current, total_i32),
            style: step
                .tooltip_style
                .clone()
                .or_else(|| some_nonempty(&self.options.tooltip_style)),
        }));
        let arrow = self.insert(LayerContent::Arrow { orientation: None });
        // A hidden number keeps its handle but draws nothing (empty glyph).
        let number = self.insert(LayerContent::Number {
            glyph: if self.options.show_step_numbers {
                step.number.to_string()
            } else {
                String::new()
            },
        });

        let layers = StepLayers {
            overlay,
            helper,
            reference,
            tooltip,
            arrow,
            number,
        };
        self.step_layer_ids = layers.all().to_vec();
        layers
    }

    fn render_badge(&mut self, glyph: &str) -> BadgeLayers {
        let overlay = self.insert(LayerContent::Overlay);
        let helper = self.insert(LayerContent::Helper { style: None });
        let reference = self.insert(LayerContent::Reference);
        let number = self.insert(LayerContent::Number {
            glyph: glyph.to_string(),
        });
        BadgeLayers {
            overlay,
            helper,
            reference,
            number,
        }
    }

    fn set_layer_geometry(&mut self, layer: LayerId, rect: Rect) {
        if let Some(entry) = self.layers.get_mut(&layer) {
            entry.rect = rect;
            entry.placed = true;
        }
    }

    fn set_arrow(&mut self, layer: LayerId, arrow: Option<Arrow>) {
        if let Some(entry) = self.layers.get_mut(&layer) {
            if let LayerContent::Arrow { orientation } = &mut entry.content {
                *orientation = arrow;
            }
        }
    }

    fn measure(&self, layer: LayerId) -> Size {
        let Some(entry) = self.layers.get(&layer) else {
            return Size::default();
        };
        let LayerContent::Tooltip(content) = &entry.content else {
            return entry.rect.size();
        };

        let longest = content
            .text
            .split_whitespace()
            .map(|w| w.chars().count())
            .max()
            .unwrap_or(0);
        let inner_width = longest
            .max(TOOLTIP_MIN_WIDTH)
            .min(TOOLTIP_TEXT_WIDTH)
            .max(content.total * 2);

        let mut inner_height = Self::wrap_lines(&content.text, inner_width).len();
        if self.options.show_bullets {
            inner_height += 1;
        }
        if self.options.show_progress {
            inner_height += 1;
        }
        if self.options.show_buttons {
            inner_height += 1;
        }

        Size::new(
            i32::try_from(inner_width).unwrap_or(0) + 2,
            i32::try_from(inner_height).unwrap_or(0) + 2,
        )
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if let Some(entry) = self.layers.remove(&layer) {
            if matches!(entry.content, LayerContent::Overlay) {
                self.start_fade(entry.rect);
            }
        }
    }

    fn teardown(&mut self) {
        let overlays: Vec<Rect> = self
            .layers
            .values()
            .filter(|l| matches!(l.content, LayerContent::Overlay))
            .map(|l| l.rect)
            .collect();
        for rect in overlays {
            self.start_fade(rect);
        }
        self.layers.clear();
        self.step_layer_ids.clear();
    }
}

fn some_nonempty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{PositionHint, TargetRef};

    fn sample_step(kind: StepKind, text: &str) -> Step {
        Step {
            target: TargetRef::Id("panel".to_string()),
            kind,
            text: text.to_string(),
            number: 1,
            duration_secs: -1,
            position: PositionHint::Auto,
            append: false,
            tooltip_style: None,
            highlight_style: None,
        }
    }

    #[test]
    fn test_render_step_allocates_six_layers() {
        let mut renderer = TuiRenderer::new(TourOptions::default());
        let layers = renderer.render_step(&sample_step(StepKind::Tooltip, "hello"), 1, 3);
        let ids = layers.all();
        assert_eq!(ids.len(), 6);
        // Handles are distinct.
        let mut unique = ids.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_rerender_replaces_layers() {
        let mut renderer = TuiRenderer::new(TourOptions::default());
        let first = renderer.render_step(&sample_step(StepKind::Tooltip, "one"), 1, 2);
        let second = renderer.render_step(&sample_step(StepKind::Tooltip, "two"), 2, 2);
        assert_ne!(first.tooltip, second.tooltip);
        assert_eq!(renderer.layers.len(), 6);
    }

    #[test]
    fn test_measure_grows_with_text() {
        let mut renderer = TuiRenderer::new(TourOptions::default());
        let short = renderer.render_step(&sample_step(StepKind::Tooltip, "hi"), 1, 2);
        let short_size = renderer.measure(short.tooltip);

        let long_text = "a considerably longer explanation that will need to wrap \
                         across several tooltip lines before it fits";
        let long = renderer.render_step(&sample_step(StepKind::Tooltip, long_text), 1, 2);
        let long_size = renderer.measure(long.tooltip);

        assert!(long_size.height > short_size.height);
        assert!(long_size.width >= short_size.width);
    }

    #[test]
    fn test_badge_kind_step_shows_default_badge_text() {
        let mut renderer = TuiRenderer::new(TourOptions::default());
        let layers = renderer.render_step(&sample_step(StepKind::Badge, "ignored"), 1, 1);
        let Some(entry) = renderer.layers.get(&layers.tooltip) else {
            panic!("tooltip layer missing");
        };
        let LayerContent::Tooltip(content) = &entry.content else {
            panic!("not a tooltip layer");
        };
        assert_eq!(content.text, "Note this!");
    }

    #[test]
    fn test_teardown_fades_overlay_and_clears() {
        let mut renderer = TuiRenderer::new(TourOptions::default());
        let layers = renderer.render_step(&sample_step(StepKind::Tooltip, "hello"), 1, 1);
        renderer.set_layer_geometry(layers.overlay, Rect::new(0, 0, 80, 24));
        renderer.teardown();
        assert!(renderer.layers.is_empty());
        assert_eq!(renderer.fading.len(), 1);
    }

    #[test]
    fn test_wrap_lines_respects_width() {
        let lines = TuiRenderer::wrap_lines("one two three four five", 9);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
        assert_eq!(lines.join(" "), "one two three four five");
    }

    #[test]
    fn test_clamp_discards_offscreen_rects() {
        let frame = TermRect::new(0, 0, 80, 24);
        assert!(clamp(Rect::new(-10, -10, 5, 5), frame).is_none());
        assert!(clamp(Rect::new(30, 100, 5, 5), frame).is_none());
        let visible = clamp(Rect::new(-2, -2, 10, 10), frame).unwrap();
        assert_eq!((visible.x, visible.y), (0, 0));
        assert_eq!((visible.width, visible.height), (8, 8));
    }
}
