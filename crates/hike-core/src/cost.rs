//! Calorie cost model for walking between two grid nodes.
//!
//! Base burn is a flat rate per minute at a fixed walking speed. Ascents add a
//! small per-percent-grade surcharge; descents walk at the base rate. On top
//! of that, an edge steeper than [`CostModel::steep_grade_threshold`] carries
//! a large search penalty so the planner only takes it when nothing else
//! connects.

use serde::{Deserialize, Serialize};

use crate::models::GridNode;
use crate::spatial::surface_distance;

/// Distances below this are treated as coincident when computing grade.
const MIN_GRADE_DISTANCE_M: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    pub walking_speed_mps: f64,
    pub kcal_per_minute: f64,
    /// Fractional calorie increase per 1% of uphill grade.
    pub ascent_coefficient_per_percent: f64,
    pub steep_grade_threshold: f64,
    pub steep_grade_penalty: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            walking_speed_mps: 1.34112,
            kcal_per_minute: 4.0,
            ascent_coefficient_per_percent: 0.000_074_564_72,
            steep_grade_threshold: 0.5,
            steep_grade_penalty: 50.0,
        }
    }
}

/// Cost of walking one edge in one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCost {
    pub distance_m: f64,
    pub duration_s: f64,
    pub calories_kcal: f64,
    pub grade: f64,
    pub grade_penalty: f64,
}

impl CostModel {
    /// Seconds needed to walk `distance_m` at the model's pace.
    pub fn travel_time_s(&self, distance_m: f64) -> f64 {
        distance_m / self.walking_speed_mps.max(1e-9)
    }

    /// Calories burned walking `distance_m` on the flat.
    pub fn base_calories(&self, distance_m: f64) -> f64 {
        self.kcal_per_minute / 60.0 * self.travel_time_s(distance_m)
    }

    /// Steep edges, in either direction, carry the penalty multiplier.
    pub fn grade_penalty(&self, grade: f64) -> f64 {
        if grade.abs() > self.steep_grade_threshold {
            self.steep_grade_penalty
        } else {
            1.0
        }
    }

    /// Cost of walking from `from` to `to`.
    pub fn edge_cost(&self, from: &GridNode, to: &GridNode) -> EdgeCost {
        let distance_m = surface_distance(&from.position, &to.position);
        let duration_s = self.travel_time_s(distance_m);
        let base = self.base_calories(distance_m);

        let grade = if distance_m > MIN_GRADE_DISTANCE_M {
            (to.elevation_m - from.elevation_m) / distance_m
        } else {
            0.0
        };

        let surcharge = if grade > 0.0 {
            self.ascent_coefficient_per_percent * grade * 100.0
        } else {
            0.0
        };

        EdgeCost {
            distance_m,
            duration_s,
            calories_kcal: base * (1.0 + surcharge),
            grade,
            grade_penalty: self.grade_penalty(grade),
        }
    }
}
