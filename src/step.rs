//! Step data model and input validation.
//!
//! A [`Step`] is one unit of a tour: a target, text, display kind, and
//! timing. Steps come from two sources — target annotations in the
//! [`Document`](crate::document::Document) and the programmatic list in the
//! configuration — and are merged into one renumbered sequence before a tour
//! starts.

use serde::{Deserialize, Serialize};

/// Sentinel duration for steps that wait for manual advancement.
pub const MANUAL_ADVANCE: i64 = -1;

/// How a step is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Tooltip,
    #[default]
    Badge,
    Floating,
}

impl StepKind {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "tooltip" => Some(Self::Tooltip),
            "badge" => Some(Self::Badge),
            "floating" => Some(Self::Floating),
            _ => None,
        }
    }

    /// Validate a raw kind value, substituting `default` when the value is
    /// absent or not one of the recognized kinds.
    pub fn checked(input: Option<&str>, default: Self) -> Self {
        input.and_then(Self::parse).unwrap_or(default)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tooltip => "tooltip",
            Self::Badge => "badge",
            Self::Floating => "floating",
        }
    }
}

/// Desired tooltip placement for a step. `Auto` defers to the
/// [`PositionSolver`](crate::position) at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionHint {
    #[default]
    Auto,
    Top,
    Right,
    Left,
    Bottom,
    BottomLeftAligned,
    BottomMiddleAligned,
    BottomRightAligned,
    Floating,
}

impl PositionHint {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "auto" => Some(Self::Auto),
            "top" => Some(Self::Top),
            "right" => Some(Self::Right),
            "left" => Some(Self::Left),
            "bottom" => Some(Self::Bottom),
            "bottom-left-aligned" => Some(Self::BottomLeftAligned),
            "bottom-middle-aligned" => Some(Self::BottomMiddleAligned),
            "bottom-right-aligned" => Some(Self::BottomRightAligned),
            "floating" => Some(Self::Floating),
            _ => None,
        }
    }

    pub fn checked(input: Option<&str>, default: Self) -> Self {
        input.and_then(Self::parse).unwrap_or(default)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Top => "top",
            Self::Right => "right",
            Self::Left => "left",
            Self::Bottom => "bottom",
            Self::BottomLeftAligned => "bottom-left-aligned",
            Self::BottomMiddleAligned => "bottom-middle-aligned",
            Self::BottomRightAligned => "bottom-right-aligned",
            Self::Floating => "floating",
        }
    }
}

/// Opaque handle to the region a step points at.
///
/// `None` resolves to a synthetic centered target, as does any step whose
/// kind is [`StepKind::Floating`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    Id(String),
    #[default]
    None,
}

impl TargetRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::None => None,
        }
    }
}

/// One merged tour step. Immutable once part of the active sequence; only
/// `number` is rewritten during merge/renumbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub target: TargetRef,
    pub kind: StepKind,
    pub text: String,
    /// 1-based; unique and contiguous after merging.
    pub number: i32,
    /// Seconds before autoplay advances past this step; `MANUAL_ADVANCE`
    /// waits for the user.
    pub duration_secs: i64,
    pub position: PositionHint,
    /// Merge behavior when a step already occupies this slot: insert before
    /// it rather than replacing it.
    pub append: bool,
    pub tooltip_style: Option<String>,
    pub highlight_style: Option<String>,
}

impl Step {
    /// Whether autoplay may advance past this step on its own.
    pub fn auto_advances(&self) -> bool {
        self.duration_secs > 0
    }
}

/// A caller-supplied step before target resolution and validation.
///
/// Entries with a declared number of zero or less are discarded during the
/// scan, matching the annotation source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgrammaticStep {
    /// Target id in the document; absent means a centered floating step.
    #[serde(default)]
    pub target: Option<String>,
    /// Declared slot in the sequence.
    #[serde(default)]
    pub step: i32,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub append: Option<bool>,
    #[serde(default)]
    pub tooltip_style: Option<String>,
    #[serde(default)]
    pub highlight_style: Option<String>,
}
