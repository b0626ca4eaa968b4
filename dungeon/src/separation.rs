//! Overlap removal by iterated repulsion.

use glam::Vec2;
use serde::Serialize;

use crate::Rect;

/// Outcome of a [`separate`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeparationReport {
    /// Passes run
    pub iterations: usize,
    /// Whether the last pass moved nothing
    pub converged: bool,
    /// Pairs of rects still overlapping at the end
    pub residual_overlaps: usize,
}

/// Push overlapping rects apart until a full pass moves nothing.
///
/// Every rect is repelled by each rect it overlaps, with a strength decaying
/// with the squared distance between the centers, and moved by one unit along
/// the resulting direction. Rects are moved in place, so later rects in a pass
/// see the new position of earlier ones. Rects sharing the same center do not
/// push each other.
pub fn separate(rects: &mut [Rect], max_iterations: usize) -> SeparationReport {
    let mut iterations = 0;
    let converged = loop {
        if iterations >= max_iterations {
            break false;
        }
        iterations += 1;

        let mut moved = false;
        for i in 0..rects.len() {
            let rect = rects[i];
            let mut push = Vec2::ZERO;
            for (j, other) in rects.iter().enumerate() {
                if i == j || !rect.overlaps(other) {
                    continue;
                }
                let diff = rect.center - other.center;
                let dist2 = diff.length_squared();
                if dist2 > 0. {
                    push += diff.normalize() / dist2;
                }
            }
            if let Some(step) = push.try_normalize() {
                rects[i] = rect.translated(step);
                moved = true;
            }
        }
        log::trace!("Separation pass {iterations}: moved = {moved}");

        if !moved {
            break true;
        }
    };

    let residual_overlaps = count_overlaps(rects);
    if !converged {
        log::warn!(
            "Room separation did not converge after {iterations} passes, {residual_overlaps} overlaps left"
        );
    } else if residual_overlaps > 0 {
        log::warn!("Room separation left {residual_overlaps} overlaps between coincident rooms");
    } else {
        log::debug!("Rooms separated in {iterations} passes");
    }
    SeparationReport {
        iterations,
        converged,
        residual_overlaps,
    }
}

/// Number of overlapping pairs
#[must_use]
pub fn count_overlaps(rects: &[Rect]) -> usize {
    rects
        .iter()
        .enumerate()
        .map(|(i, r)| rects[..i].iter().filter(|o| r.overlaps(o)).count())
        .sum()
}
