//! The document a tour runs over: a registry of named rectangular targets.
//!
//! Hosts register each region of their interface that a tour may point at,
//! with an optional parent forming an ownership chain of offsets (a target's
//! rect is relative to its parent). Targets may carry a [`StepAnnotation`],
//! which is the declarative step source — the counterpart of the
//! programmatic list in the configuration.
//!
//! Targets are kept in insertion order. Merge determinism depends on this:
//! the annotation scan must never iterate in hash order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Rect, Viewport};
use crate::step::{PositionHint, Step, StepKind, TargetRef};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("target '{0}' is already registered")]
    DuplicateTarget(String),
    #[error("target '{0}' names unknown parent '{1}'")]
    UnknownParent(String, String),
}

/// Declarative step metadata attached to a target.
///
/// Raw `kind`/`position` strings are validated at scan time; unrecognized
/// values fall back to the configured defaults rather than failing the scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepAnnotation {
    /// Declared slot in the sequence; zero or less excludes the target from
    /// the scan.
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
    pub tooltip_style: Option<String>,
    #[serde(default)]
    pub highlight_style: Option<String>,
}

/// One registered region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    /// Owning region; the target's rect is relative to it.
    #[serde(default)]
    pub parent: Option<String>,
    pub rect: Rect,
    #[serde(default)]
    pub annotation: Option<StepAnnotation>,
}

/// Defaults substituted for absent or invalid annotation values, taken from
/// the tour options at scan time.
#[derive(Debug, Clone, Copy)]
pub struct ScanDefaults {
    pub kind: StepKind,
    pub duration_secs: i64,
    pub position: PositionHint,
}

/// Registry of tour targets plus the current viewport snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    targets: Vec<Target>,
    viewport: Viewport,
}

impl Document {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            targets: Vec::new(),
            viewport,
        }
    }

    /// Register a target. Parents must be registered before their children.
    pub fn add_target(&mut self, target: Target) -> Result<(), DocumentError> {
        if self.resolve(&target.id).is_some() {
            return Err(DocumentError::DuplicateTarget(target.id));
        }
        if let Some(parent) = &target.parent {
            if self.resolve(parent).is_none() {
                return Err(DocumentError::UnknownParent(target.id, parent.clone()));
            }
        }
        self.targets.push(target);
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Update a registered target's local rect (e.g. after a relayout).
    pub fn set_rect(&mut self, id: &str, rect: Rect) -> bool {
        match self.targets.iter_mut().find(|t| t.id == id) {
            Some(target) => {
                target.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Page-coordinate geometry of a target, computed by walking the
    /// ownership chain of parent regions and summing their offsets.
    pub fn page_rect(&self, id: &str) -> Option<Rect> {
        let target = self.resolve(id)?;
        let mut rect = target.rect;
        let mut parent = target.parent.as_deref();
        // Chain length bounds the walk; a malformed cycle cannot loop.
        for _ in 0..self.targets.len() {
            let Some(p) = parent.and_then(|id| self.resolve(id)) else {
                break;
            };
            rect = rect.offset_by(p.rect.left, p.rect.top);
            parent = p.parent.as_deref();
        }
        Some(rect)
    }

    /// Geometry for a step's target; floating steps get a synthetic zero
    /// rect (their placement ignores target geometry).
    pub fn resolve_step_rect(&self, target: &TargetRef) -> Option<Rect> {
        match target {
            TargetRef::Id(id) => self.page_rect(id),
            TargetRef::None => Some(Rect::ZERO),
        }
    }

    /// The declarative step source: scan targets in insertion order for
    /// annotations with a positive step number. A later target declaring an
    /// already-taken number replaces the earlier one (last writer wins).
    /// Output is stable-sorted ascending by declared number.
    pub fn annotation_steps(&self, defaults: ScanDefaults) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::new();
        for target in &self.targets {
            let Some(annotation) = &target.annotation else {
                continue;
            };
            if annotation.step <= 0 {
                continue;
            }
            let step = Step {
                target: TargetRef::Id(target.id.clone()),
                kind: StepKind::checked(annotation.kind.as_deref(), StepKind::Badge),
                text: annotation.text.clone().unwrap_or_default(),
                number: annotation.step,
                duration_secs: annotation.duration.unwrap_or(defaults.duration_secs),
                position: PositionHint::checked(annotation.position.as_deref(), defaults.position),
                append: false,
                tooltip_style: annotation.tooltip_style.clone(),
                highlight_style: annotation.highlight_style.clone(),
            };
            match steps.iter_mut().find(|s| s.number == step.number) {
                Some(existing) => *existing = step,
                None => steps.push(step),
            }
        }
        steps.sort_by_key(|s| s.number);
        steps
    }

    /// Resolve and validate the programmatic step list. Steps with a
    /// non-positive declared number are discarded; a step whose target id has
    /// no match in the document is silently dropped rather than failing the
    /// tour. An absent target, or an explicit floating kind, becomes a
    /// centered floating step.
    pub fn resolve_programmatic(
        &self,
        raw: &[crate::step::ProgrammaticStep],
        defaults: ScanDefaults,
    ) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::new();
        for item in raw {
            if item.step <= 0 {
                continue;
            }
            let kind = StepKind::checked(item.kind.as_deref(), defaults.kind);
            let floating = kind == StepKind::Floating || item.target.is_none();
            let target = if floating {
                TargetRef::None
            } else {
                let id = item.target.as_deref().unwrap_or_default();
                if self.resolve(id).is_none() {
                    tracing::debug!(target_id = id, step = item.step, "dropping step with unresolvable target");
                    continue;
                }
                TargetRef::Id(id.to_string())
            };
            steps.push(Step {
                target,
                kind: if floating { StepKind::Floating } else { kind },
                text: item.text.clone().unwrap_or_default(),
                number: item.step,
                duration_secs: item.duration.unwrap_or(defaults.duration_secs),
                position: if floating {
                    PositionHint::Floating
                } else {
                    PositionHint::checked(item.position.as_deref(), defaults.position)
                },
                append: item.append.unwrap_or(false),
                tooltip_style: item.tooltip_style.clone(),
                highlight_style: item.highlight_style.clone(),
            });
        }
        steps.sort_by_key(|s| s.number);
        steps
    }
}
