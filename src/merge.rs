//! Merging the two step sources into one ordered, renumbered sequence.
//!
//! The annotation list is the base; programmatic steps take precedence on
//! conflict. The output is deterministic: both inputs are stable-sorted by
//! declared number before merging, and every entry is renumbered to its
//! final 1-based index afterwards.

use thiserror::Error;

use crate::step::Step;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("no steps to run: both step sources are empty")]
    NoSteps,
}

/// Merge annotation and programmatic steps.
///
/// For each programmatic step declaring slot S:
/// - an occupant at S with `append == true` on the incomer: insert before the
///   occupant, which keeps its place in the shifted tail;
/// - an occupant at S with `append == false`: replace the occupant;
/// - no occupant: insert at slot S, shifting later entries down (a slot past
///   the end appends).
///
/// When `ignore_annotations` is set, or the annotation list is empty, the
/// programmatic list is used verbatim — still renumbered 1..=N.
pub fn merge(
    annotation_steps: Vec<Step>,
    programmatic_steps: Vec<Step>,
    ignore_annotations: bool,
) -> Result<Vec<Step>, MergeError> {
    let mut base = compact_and_sort(annotation_steps);
    let incoming = compact_and_sort(programmatic_steps);

    if base.is_empty() && incoming.is_empty() {
        return Err(MergeError::NoSteps);
    }

    if ignore_annotations || base.is_empty() {
        return Ok(renumber(incoming));
    }

    for step in incoming {
        let slot = step.number;
        match base.iter().position(|s| s.number == slot) {
            Some(occupant) => {
                if step.append {
                    // The occupant keeps participating in later lookups at
                    // the next slot up; everything else is settled by the
                    // final renumbering.
                    base[occupant].number += 1;
                    base.insert(occupant, step);
                } else {
                    base[occupant] = step;
                }
            }
            None => {
                let index = usize::try_from(slot - 1).unwrap_or(0).min(base.len());
                base.insert(index, step);
            }
        }
    }

    Ok(renumber(base))
}

/// Drop nothing but re-establish declared-number order; ties keep their
/// source order (stable sort, last-writer-wins slots were already resolved
/// at scan time).
fn compact_and_sort(mut steps: Vec<Step>) -> Vec<Step> {
    steps.sort_by_key(|s| s.number);
    steps
}

/// Rewrite every step number to its final 1-based index.
fn renumber(mut steps: Vec<Step>) -> Vec<Step> {
    for (index, step) in steps.iter_mut().enumerate() {
        step.number = i32::try_from(index).unwrap_or(i32::MAX - 1) + 1;
    }
    steps
}
