// ============================================================================
// scenecut-core/src/detection/refinement.rs
// ============================================================================
//
// BOUNDARY REFINEMENT: Snap an approximate cut time to nearby evidence
//
// An externally supplied cut estimate is rarely frame-accurate. The refiner
// looks at every local maximum of the change series inside
// [approx - radius, approx + radius] and scores each one as
//
//     fitness = change_score * max(0, 1 - distance / radius)^2
//
// The squared proximity term decays faster than linear, so a strong cut far
// from the estimate loses to a weaker one close to it. When the window holds
// no local maximum the estimate is returned unchanged with fitness 0.

use log::debug;

use super::peaks::find_peaks;
use super::types::{FuzzyBoundary, RefinedBoundary};
use crate::error::{CoreResult, invalid};
use crate::series::ContentChangeSeries;

/// Proximity-weighted boundary refiner with a fixed search radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryRefiner {
    radius_seconds: f64,
}

impl BoundaryRefiner {
    /// Creates a refiner.
    ///
    /// # Returns
    ///
    /// * `Err(CoreError::InvalidParameter)` - `radius_seconds` is negative or not finite
    pub fn new(radius_seconds: f64) -> CoreResult<Self> {
        if !(radius_seconds.is_finite() && radius_seconds >= 0.0) {
            return Err(invalid(format!(
                "search radius must be non-negative, got {radius_seconds}"
            )));
        }
        Ok(Self { radius_seconds })
    }

    pub fn radius_seconds(&self) -> f64 {
        self.radius_seconds
    }

    /// Inclusive search window around `approximate_seconds`.
    pub fn search_window(&self, approximate_seconds: f64) -> (f64, f64) {
        (
            approximate_seconds - self.radius_seconds,
            approximate_seconds + self.radius_seconds,
        )
    }

    /// Finds the best cut near `fuzzy` in `local_series`.
    ///
    /// `local_series` may extend past the search window; points outside it
    /// only serve as neighbours when deciding whether an in-window point is
    /// a local maximum.
    ///
    /// # Arguments
    ///
    /// * `fuzzy` - The approximate boundary
    /// * `local_series` - Change scores around the boundary
    ///
    /// # Returns
    ///
    /// * `Ok(RefinedBoundary)` - The winning candidate, or a pass-through of the estimate
    /// * `Err(CoreError::InvalidParameter)` - The approximate time is not finite
    pub fn refine(
        &self,
        fuzzy: &FuzzyBoundary,
        local_series: &ContentChangeSeries,
    ) -> CoreResult<RefinedBoundary> {
        let approx = fuzzy.approximate_seconds;
        if !approx.is_finite() {
            return Err(invalid(format!(
                "approximate boundary must be finite, got {approx}"
            )));
        }

        // ====================================================================
        // STEP 1: COLLECT CANDIDATE CUTS INSIDE THE WINDOW
        // ====================================================================

        let (window_start, window_end) = self.search_window(approx);
        let points = local_series.points();
        let scores = local_series.scores();
        let candidates: Vec<usize> = find_peaks(&scores, f64::NEG_INFINITY, 1)
            .into_iter()
            .filter(|&i| {
                let t = points[i].timestamp_seconds;
                t >= window_start && t <= window_end
            })
            .collect();

        if candidates.is_empty() {
            debug!("No candidate cut within {approx:.3}s +/- {:.3}s, keeping estimate", self.radius_seconds);
            return Ok(RefinedBoundary::passthrough(approx));
        }

        // ====================================================================
        // STEP 2: SCORE EACH CANDIDATE AND KEEP THE FITTEST
        // ====================================================================

        let mut best: Option<(usize, f64, f64)> = None; // (index, fitness, distance)
        for i in candidates {
            let point = &points[i];
            let distance = (point.timestamp_seconds - approx).abs();
            let score = fitness(point.change_score, distance, self.radius_seconds);
            let better = match best {
                None => true,
                Some((_, best_fitness, best_distance)) => {
                    score > best_fitness || (score == best_fitness && distance < best_distance)
                }
            };
            if better {
                best = Some((i, score, distance));
            }
        }

        // `candidates` was non-empty, so `best` is always set here.
        let Some((index, fitness_score, distance)) = best else {
            return Ok(RefinedBoundary::passthrough(approx));
        };
        let winner = &points[index];
        debug!(
            "Refined {approx:.3}s -> {:.3}s (frame {}, distance {distance:.3}s, fitness {fitness_score:.4})",
            winner.timestamp_seconds, winner.frame_index
        );

        Ok(RefinedBoundary {
            actual_seconds: winner.timestamp_seconds,
            fitness_score,
            candidate_frame: Some(winner.frame_index),
        })
    }
}

/// Refines one boundary with a throwaway [`BoundaryRefiner`].
pub fn refine(
    fuzzy: &FuzzyBoundary,
    radius_seconds: f64,
    local_series: &ContentChangeSeries,
) -> CoreResult<RefinedBoundary> {
    BoundaryRefiner::new(radius_seconds)?.refine(fuzzy, local_series)
}

/// `max(0, 1 - distance / radius)`; for a zero radius, 1 at distance 0 and 0 elsewhere.
pub fn proximity_factor(distance: f64, radius_seconds: f64) -> f64 {
    if radius_seconds <= 0.0 {
        return if distance == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - distance / radius_seconds).max(0.0)
}

/// `cut_strength * proximity_factor(distance, radius)^2`.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::detection::fitness;
///
/// // Half way to the edge of the window keeps a quarter of the strength.
/// assert_eq!(fitness(8.0, 0.75, 1.5), 2.0);
/// assert_eq!(fitness(8.0, 2.0, 1.5), 0.0);
/// ```
pub fn fitness(cut_strength: f64, distance: f64, radius_seconds: f64) -> f64 {
    let proximity = proximity_factor(distance, radius_seconds);
    cut_strength * proximity * proximity
}
