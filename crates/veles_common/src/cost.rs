//! Cost vectors and optimization criteria.
//!
//! Both the logic optimizer and the techmapper score candidates with the
//! same fixed-length cost vector; a [`Criterion`] names the dimension being
//! minimized and optionally bounds the others.

use serde::{Deserialize, Serialize};

/// The dimensions of a [`CostVector`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Indicator {
    /// Number of internal cells.
    Size,
    /// Longest input-to-output path in cells.
    Depth,
    /// Total cell area (library units, typically um^2).
    Area,
    /// Worst arrival time (ns).
    Delay,
    /// Estimated dynamic power (uW).
    Power,
}

/// A fixed-length cost tuple `(size, depth, area, delay, power)`.
///
/// Technology-independent passes use only the first two dimensions; the
/// techmapper fills all five from the liberty library.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CostVector {
    /// Number of internal cells.
    pub size: f32,
    /// Longest path in cells.
    pub depth: f32,
    /// Total area.
    pub area: f32,
    /// Worst arrival time.
    pub delay: f32,
    /// Estimated switching power.
    pub power: f32,
}

impl CostVector {
    /// Returns the value of the given dimension.
    pub fn get(&self, indicator: Indicator) -> f32 {
        match indicator {
            Indicator::Size => self.size,
            Indicator::Depth => self.depth,
            Indicator::Area => self.area,
            Indicator::Delay => self.delay,
            Indicator::Power => self.power,
        }
    }

    /// Component-wise sum.
    pub fn add(&self, other: &CostVector) -> CostVector {
        CostVector {
            size: self.size + other.size,
            depth: self.depth + other.depth,
            area: self.area + other.area,
            delay: self.delay + other.delay,
            power: self.power + other.power,
        }
    }

    /// Component-wise maximum.
    pub fn max(&self, other: &CostVector) -> CostVector {
        CostVector {
            size: self.size.max(other.size),
            depth: self.depth.max(other.depth),
            area: self.area.max(other.area),
            delay: self.delay.max(other.delay),
            power: self.power.max(other.power),
        }
    }
}

/// An optimization criterion: the dimension to minimize plus optional
/// per-dimension upper bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Criterion {
    /// The dimension being minimized.
    pub objective: Indicator,
    /// Upper bounds checked by [`Criterion::check`]; `None` means unbounded.
    pub bounds: [Option<f32>; 5],
}

impl Criterion {
    /// Creates an unbounded criterion minimizing `objective`.
    pub fn minimize(objective: Indicator) -> Self {
        Self {
            objective,
            bounds: [None; 5],
        }
    }

    /// Adds an upper bound on one dimension.
    pub fn with_bound(mut self, indicator: Indicator, bound: f32) -> Self {
        self.bounds[indicator as usize] = Some(bound);
        self
    }

    /// Checks that every bounded dimension is within its bound.
    pub fn check(&self, vector: &CostVector) -> bool {
        const DIMS: [Indicator; 5] = [
            Indicator::Size,
            Indicator::Depth,
            Indicator::Area,
            Indicator::Delay,
            Indicator::Power,
        ];
        DIMS.iter().all(|&dim| match self.bounds[dim as usize] {
            Some(bound) => vector.get(dim) <= bound,
            None => true,
        })
    }

    /// Returns `true` if `a` is strictly better than `b` in the objective.
    pub fn better(&self, a: &CostVector, b: &CostVector) -> bool {
        a.get(self.objective) < b.get(self.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_with(size: f32, area: f32) -> CostVector {
        CostVector {
            size,
            area,
            ..Default::default()
        }
    }

    #[test]
    fn get_by_indicator() {
        let v = CostVector {
            size: 1.0,
            depth: 2.0,
            area: 3.0,
            delay: 4.0,
            power: 5.0,
        };
        assert_eq!(v.get(Indicator::Size), 1.0);
        assert_eq!(v.get(Indicator::Depth), 2.0);
        assert_eq!(v.get(Indicator::Area), 3.0);
        assert_eq!(v.get(Indicator::Delay), 4.0);
        assert_eq!(v.get(Indicator::Power), 5.0);
    }

    #[test]
    fn add_and_max() {
        let a = vec_with(2.0, 10.0);
        let b = vec_with(3.0, 4.0);
        let sum = a.add(&b);
        assert_eq!(sum.size, 5.0);
        assert_eq!(sum.area, 14.0);
        let m = a.max(&b);
        assert_eq!(m.size, 3.0);
        assert_eq!(m.area, 10.0);
    }

    #[test]
    fn unbounded_criterion_accepts_all() {
        let c = Criterion::minimize(Indicator::Area);
        assert!(c.check(&vec_with(1e9, 1e9)));
    }

    #[test]
    fn bound_rejects_over_limit() {
        let c = Criterion::minimize(Indicator::Area).with_bound(Indicator::Size, 10.0);
        assert!(c.check(&vec_with(10.0, 0.0)));
        assert!(!c.check(&vec_with(10.5, 0.0)));
    }

    #[test]
    fn better_compares_objective_only() {
        let c = Criterion::minimize(Indicator::Area);
        let small_area = vec_with(100.0, 1.0);
        let big_area = vec_with(1.0, 2.0);
        assert!(c.better(&small_area, &big_area));
        assert!(!c.better(&big_area, &small_area));
    }
}
