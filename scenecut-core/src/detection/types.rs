//! Value types passed between the detection components.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, invalid};

/// A half-open span of video time, `end_seconds > start_seconds`.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::detection::SceneRange;
///
/// let range = SceneRange::new(2.0, 5.5).unwrap();
/// assert_eq!(range.duration(), 3.5);
/// assert!(SceneRange::new(5.0, 5.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRange {
    start_seconds: f64,
    end_seconds: f64,
}

impl SceneRange {
    /// Creates a range, failing fast on negative, non-finite or inverted bounds.
    pub fn new(start_seconds: f64, end_seconds: f64) -> CoreResult<Self> {
        if !(start_seconds.is_finite() && end_seconds.is_finite()) {
            return Err(invalid(format!(
                "scene bounds must be finite, got ({start_seconds}, {end_seconds})"
            )));
        }
        if start_seconds < 0.0 {
            return Err(invalid(format!(
                "scene start must be non-negative, got {start_seconds}"
            )));
        }
        if end_seconds <= start_seconds {
            return Err(invalid(format!(
                "scene end {end_seconds} must be after start {start_seconds}"
            )));
        }
        Ok(Self {
            start_seconds,
            end_seconds,
        })
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_seconds
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_seconds
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Approximate cut time supplied by an external estimator.
///
/// The optional rationale is carried for callers' logs and never read by
/// the refinement logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyBoundary {
    pub approximate_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl FuzzyBoundary {
    pub fn new(approximate_seconds: f64) -> Self {
        Self {
            approximate_seconds,
            rationale: None,
        }
    }

    /// Copy of this boundary with its time clamped into `[0, total_duration]`.
    pub fn clamped(&self, total_duration: f64) -> Self {
        let upper = total_duration.max(0.0);
        Self {
            approximate_seconds: self.approximate_seconds.clamp(0.0, upper),
            rationale: self.rationale.clone(),
        }
    }
}

/// Cut time chosen by the boundary refiner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedBoundary {
    pub actual_seconds: f64,
    pub fitness_score: f64,
    /// Frame of the winning candidate; `None` when the approximate time was passed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_frame: Option<u64>,
}

impl RefinedBoundary {
    /// Pass-through result used when no candidate cut exists near the estimate.
    pub fn passthrough(approximate_seconds: f64) -> Self {
        Self {
            actual_seconds: approximate_seconds,
            fitness_score: 0.0,
            candidate_frame: None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.candidate_frame.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_range_rejects_bad_bounds() {
        assert!(SceneRange::new(-0.1, 1.0).is_err());
        assert!(SceneRange::new(2.0, 1.0).is_err());
        assert!(SceneRange::new(0.0, f64::INFINITY).is_err());
        assert!(SceneRange::new(0.0, 0.04).is_ok());
    }

    #[test]
    fn test_fuzzy_boundary_clamp() {
        let early = FuzzyBoundary::new(-3.0).clamped(60.0);
        let late = FuzzyBoundary::new(75.0).clamped(60.0);
        let inside = FuzzyBoundary::new(12.5).clamped(60.0);
        assert_eq!(early.approximate_seconds, 0.0);
        assert_eq!(late.approximate_seconds, 60.0);
        assert_eq!(inside.approximate_seconds, 12.5);
    }

    #[test]
    fn test_fuzzy_boundary_deserializes_with_rationale() {
        let json = r#"[{"approximateSeconds": 4.2, "rationale": "cut to exterior"},
                       {"approximateSeconds": 9}]"#;
        let hints: Vec<FuzzyBoundary> = serde_json::from_str(json).unwrap();
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].rationale.as_deref(), Some("cut to exterior"));
        assert_eq!(hints[1].approximate_seconds, 9.0);
        assert!(hints[1].rationale.is_none());
    }

    #[test]
    fn test_scene_range_serializes_camel_case() {
        let range = SceneRange::new(1.0, 2.5).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"{"startSeconds":1.0,"endSeconds":2.5}"#);
    }
}
