//! Tooltip placement: side selection against viewport constraints, and the
//! per-variant layout offsets.
//!
//! The offset formulas are load-bearing for visual regression; the named
//! constants below are part of the contract, not tuning knobs.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size, Viewport};
use crate::step::PositionHint;

/// Clearance added to the measured tooltip height when probing fit.
const TOOLTIP_CLEARANCE_H: i32 = 10;
/// Clearance added to the measured tooltip width when probing fit.
const TOOLTIP_CLEARANCE_W: i32 = 20;
/// The highlight/reference layer grows by this much around the target.
const HIGHLIGHT_PADDING: i32 = 10;
/// ... and shifts up/left by half of it.
const HIGHLIGHT_SHIFT: i32 = 5;
/// Horizontal inset for top placement, vertical inset for left placement
/// when step numbers are shown.
const EDGE_INSET: i32 = 15;
/// Gap between target and tooltip for the side placements.
const SIDE_GAP: i32 = 20;
/// Gap between target and tooltip for the stacked (top/bottom) placements.
const STACK_GAP: i32 = 10;
/// Offset of the number layer from a floating tooltip's corner.
const NUMBER_INSET: i32 = 18;

/// A side eligible for elimination in the precedence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bottom,
    Top,
    Right,
    Left,
}

impl Side {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "bottom" => Some(Self::Bottom),
            "top" => Some(Self::Top),
            "right" => Some(Self::Right),
            "left" => Some(Self::Left),
            _ => None,
        }
    }
}

/// Default elimination order when a step asks for automatic placement.
pub const DEFAULT_PRECEDENCE: [Side; 4] = [Side::Bottom, Side::Top, Side::Right, Side::Left];

/// A fully decided placement variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcretePosition {
    Top,
    Right,
    Left,
    Bottom,
    BottomLeftAligned,
    BottomMiddleAligned,
    BottomRightAligned,
    Floating,
}

/// Pointer orientation for the tooltip balloon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arrow {
    Top,
    TopMiddle,
    TopRight,
    Bottom,
    Left,
    Right,
    RightBottom,
}

/// The computed layout for one rendered step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub position: ConcretePosition,
    /// Tooltip rect in page coordinates.
    pub tooltip: Rect,
    pub arrow: Option<Arrow>,
    /// Page position for the number layer; only floating placements move it.
    pub number_offset: Option<(i32, i32)>,
}

/// Highlight/reference layer geometry for a target: padded and shifted so
/// the frame sits around the region rather than on it.
pub fn reference_rect(target: Rect) -> Rect {
    Rect {
        top: target.top - HIGHLIGHT_SHIFT,
        left: target.left - HIGHLIGHT_SHIFT,
        width: target.width + HIGHLIGHT_PADDING,
        height: target.height + HIGHLIGHT_PADDING,
    }
}

/// Pick a placement side by eliminating candidates that would overflow the
/// viewport, in precedence order. The first survivor wins; an explicit
/// non-auto desired side still in the survivor set overrides the computed
/// choice; no survivors means floating.
pub fn resolve_side(
    target: Rect,
    tooltip: Size,
    desired: PositionHint,
    precedence: &[Side],
    viewport: Viewport,
) -> ConcretePosition {
    let th = tooltip.height + TOOLTIP_CLEARANCE_H;
    let tw = tooltip.width + TOOLTIP_CLEARANCE_W;
    let mut possible: Vec<Side> = precedence.to_vec();

    // A tooltip that cannot be centered against the target without spilling
    // off either horizontal edge rules out both stacked placements at once.
    if target.left + tw > viewport.width || (target.left + target.width / 2) - tw < 0 {
        remove(&mut possible, Side::Bottom);
        remove(&mut possible, Side::Top);
    } else {
        if target.height + target.top + th > viewport.height {
            remove(&mut possible, Side::Bottom);
        }
        if target.top - th < 0 {
            remove(&mut possible, Side::Top);
        }
    }
    if target.width + target.left + tw > viewport.width {
        remove(&mut possible, Side::Right);
    }
    if target.left - tw < 0 {
        remove(&mut possible, Side::Left);
    }

    let mut chosen = possible
        .first()
        .map_or(ConcretePosition::Floating, |side| concrete(*side));

    if let Some(wanted) = desired_side(desired) {
        if possible.contains(&wanted) {
            chosen = concrete(wanted);
        }
    }
    chosen
}

fn remove(sides: &mut Vec<Side>, side: Side) {
    sides.retain(|s| *s != side);
}

fn concrete(side: Side) -> ConcretePosition {
    match side {
        Side::Bottom => ConcretePosition::Bottom,
        Side::Top => ConcretePosition::Top,
        Side::Right => ConcretePosition::Right,
        Side::Left => ConcretePosition::Left,
    }
}

/// Only the four plain sides can override the automatic choice; the aligned
/// variants never appear in a precedence list.
fn desired_side(hint: PositionHint) -> Option<Side> {
    match hint {
        PositionHint::Bottom => Some(Side::Bottom),
        PositionHint::Top => Some(Side::Top),
        PositionHint::Right => Some(Side::Right),
        PositionHint::Left => Some(Side::Left),
        _ => None,
    }
}

/// Decide the concrete position for a step: automatic resolution runs when
/// either the step or the configured default asks for it, except that
/// floating is always valid and bypasses all checks.
pub fn effective_position(
    step_position: PositionHint,
    default_position: PositionHint,
    target: Rect,
    tooltip: Size,
    precedence: &[Side],
    viewport: Viewport,
) -> ConcretePosition {
    if step_position == PositionHint::Floating {
        return ConcretePosition::Floating;
    }
    if step_position == PositionHint::Auto || default_position == PositionHint::Auto {
        return resolve_side(target, tooltip, step_position, precedence, viewport);
    }
    match step_position {
        PositionHint::Top => ConcretePosition::Top,
        PositionHint::Right => ConcretePosition::Right,
        PositionHint::Left => ConcretePosition::Left,
        PositionHint::BottomLeftAligned => ConcretePosition::BottomLeftAligned,
        PositionHint::BottomMiddleAligned => ConcretePosition::BottomMiddleAligned,
        PositionHint::BottomRightAligned => ConcretePosition::BottomRightAligned,
        _ => ConcretePosition::Bottom,
    }
}

/// Layout a decided position: tooltip rect, arrow orientation, and (for
/// floating) the number layer offset.
pub fn place(
    position: ConcretePosition,
    target: Rect,
    tooltip: Size,
    viewport: Viewport,
    show_step_numbers: bool,
) -> Placement {
    let reference = reference_rect(target);
    let (tw, th) = (tooltip.width, tooltip.height);

    let (rect, arrow, number_offset) = match position {
        ConcretePosition::Top => (
            Rect::new(reference.top - (th + STACK_GAP), reference.left + EDGE_INSET, tw, th),
            Some(Arrow::Bottom),
            None,
        ),
        ConcretePosition::Right => {
            let top = if target.top + th > viewport.height {
                // Would fall below the screen; connect the tooltip's bottom
                // with the target instead.
                reference.top - (th - target.height - SIDE_GAP)
            } else {
                reference.top
            };
            (
                Rect::new(top, reference.left + target.width + SIDE_GAP, tw, th),
                Some(Arrow::Left),
                None,
            )
        }
        ConcretePosition::Left => {
            let mut arrow = Arrow::Right;
            let mut top = if show_step_numbers {
                reference.top + EDGE_INSET
            } else {
                reference.top
            };
            if target.top + th > viewport.height {
                top = reference.top - (th - target.height - SIDE_GAP);
                arrow = Arrow::RightBottom;
            }
            (
                Rect::new(top, reference.left - STACK_GAP - tw, tw, th),
                Some(arrow),
                None,
            )
        }
        ConcretePosition::BottomRightAligned => (
            Rect::new(reference.bottom() + STACK_GAP, reference.right() - tw, tw, th),
            Some(Arrow::TopRight),
            None,
        ),
        ConcretePosition::BottomMiddleAligned => (
            Rect::new(
                reference.bottom() + STACK_GAP,
                reference.left + target.width / 2 - tw / 2,
                tw,
                th,
            ),
            Some(Arrow::TopMiddle),
            None,
        ),
        ConcretePosition::Floating => {
            let left = viewport.width / 2 - tw / 2;
            let top = viewport.height / 2 - th / 2;
            (
                Rect::new(top, left, tw, th),
                None,
                Some((left - NUMBER_INSET, top - NUMBER_INSET)),
            )
        }
        ConcretePosition::Bottom | ConcretePosition::BottomLeftAligned => (
            Rect::new(reference.bottom() + STACK_GAP, reference.left, tw, th),
            Some(Arrow::Top),
            None,
        ),
    };

    Placement {
        position,
        tooltip: rect,
        arrow,
        number_offset,
    }
}
