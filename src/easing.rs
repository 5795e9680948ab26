use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Control points of the site-wide "out" curve.
pub const EASE_OUT: [f32; 4] = [0.25, 1.0, 0.5, 1.0];
/// Control points of the symmetric in/out curve.
pub const EASE_IN_OUT: [f32; 4] = [0.65, 0.0, 0.35, 1.0];

const BEZIER_NEWTON_ITERATIONS: usize = 8;
const BEZIER_BISECTION_ITERATIONS: usize = 32;
const BEZIER_EPSILON: f32 = 1e-6;

/// Clamps into `[0, 1]`. NaN maps to 0 so downstream values stay well-defined.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Hermite smoothstep. A degenerate range acts as a hard step at `edge0`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span == 0.0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp01((x - edge0) / span);
    t * t * (3.0 - 2.0 * t)
}

/// Maps `value` from `input` onto `output`, clamping at both ends of the input range.
pub fn map_range(value: f32, input: [f32; 2], output: [f32; 2]) -> f32 {
    let span = input[1] - input[0];
    if span == 0.0 {
        return if value < input[0] { output[0] } else { output[1] };
    }
    let t = clamp01((value - input[0]) / span);
    lerp(output[0], output[1], t)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingCurve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier([f32; 4]),
}

impl EasingCurve {
    pub fn apply(self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::CubicBezier(points) => cubic_bezier(points, t),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::CubicBezier([x1, y1, x2, y2]) = self {
            for (label, value) in [("x1", x1), ("y1", y1), ("x2", x2), ("y2", y2)] {
                if !value.is_finite() {
                    bail!("cubic_bezier {label} must be finite");
                }
            }
            if !(0.0..=1.0).contains(x1) || !(0.0..=1.0).contains(x2) {
                bail!("cubic_bezier x control points must lie in [0, 1], got {x1} and {x2}");
            }
        }
        Ok(())
    }
}

fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    let inv = 1.0 - t;
    3.0 * inv * inv * t * p1 + 3.0 * inv * t * t * p2 + t * t * t
}

fn bezier_slope(p1: f32, p2: f32, t: f32) -> f32 {
    let inv = 1.0 - t;
    3.0 * inv * inv * p1 + 6.0 * inv * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn cubic_bezier([x1, y1, x2, y2]: [f32; 4], x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Solve x(t) = x with Newton, falling back to bisection on flat slopes.
    let mut t = x;
    let mut solved = false;
    for _ in 0..BEZIER_NEWTON_ITERATIONS {
        let error = bezier_component(x1, x2, t) - x;
        if error.abs() < BEZIER_EPSILON {
            solved = true;
            break;
        }
        let slope = bezier_slope(x1, x2, t);
        if slope.abs() < BEZIER_EPSILON {
            break;
        }
        t -= error / slope;
    }

    if !solved || !(0.0..=1.0).contains(&t) {
        let (mut low, mut high) = (0.0_f32, 1.0_f32);
        t = x;
        for _ in 0..BEZIER_BISECTION_ITERATIONS {
            let estimate = bezier_component(x1, x2, t);
            if (estimate - x).abs() < BEZIER_EPSILON {
                break;
            }
            if estimate < x {
                low = t;
            } else {
                high = t;
            }
            t = (low + high) * 0.5;
        }
    }

    bezier_component(y1, y2, t)
}

#[cfg(test)]
mod tests {
    use super::{clamp01, map_range, smoothstep, EasingCurve, EASE_IN_OUT, EASE_OUT};

    #[test]
    fn smoothstep_hits_exact_edges() {
        assert_eq!(smoothstep(0.2, 0.8, 0.2), 0.0);
        assert_eq!(smoothstep(0.2, 0.8, 0.8), 1.0);
        assert_eq!(smoothstep(0.2, 0.8, -5.0), 0.0);
        assert_eq!(smoothstep(0.2, 0.8, 5.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_is_monotonic_between_edges() {
        let mut previous = 0.0;
        for step in 0..=200 {
            let x = 0.92 + 0.08 * step as f32 / 200.0;
            let value = smoothstep(0.92, 1.0, x);
            assert!(value >= previous, "smoothstep decreased at x={x}");
            previous = value;
        }
    }

    #[test]
    fn degenerate_smoothstep_is_a_step() {
        assert_eq!(smoothstep(0.5, 0.5, 0.49), 0.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.5), 1.0);
    }

    #[test]
    fn clamp01_maps_nan_to_zero() {
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(1.4), 1.0);
        assert_eq!(clamp01(-0.1), 0.0);
    }

    #[test]
    fn map_range_clamps_outside_input() {
        assert_eq!(map_range(0.0, [0.0, 0.5], [0.0, -150.0]), 0.0);
        assert_eq!(map_range(0.25, [0.0, 0.5], [0.0, -150.0]), -75.0);
        assert_eq!(map_range(0.9, [0.0, 0.5], [0.0, -150.0]), -150.0);
    }

    #[test]
    fn cubic_bezier_presets_hold_endpoints_and_shape() {
        for points in [EASE_OUT, EASE_IN_OUT] {
            let curve = EasingCurve::CubicBezier(points);
            assert_eq!(curve.apply(0.0), 0.0);
            assert_eq!(curve.apply(1.0), 1.0);
        }

        let ease_out = EasingCurve::CubicBezier(EASE_OUT);
        assert!(ease_out.apply(0.25) > 0.25, "ease-out should lead linear");

        let ease_in_out = EasingCurve::CubicBezier(EASE_IN_OUT);
        assert!((ease_in_out.apply(0.5) - 0.5).abs() < 1e-3);
        assert!(ease_in_out.apply(0.2) < 0.2);
    }

    #[test]
    fn cubic_bezier_rejects_out_of_range_x() {
        assert!(EasingCurve::CubicBezier([1.5, 0.0, 0.5, 1.0])
            .validate()
            .is_err());
        assert!(EasingCurve::CubicBezier(EASE_OUT).validate().is_ok());
    }
}
