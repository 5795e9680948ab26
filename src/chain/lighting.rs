//! Fixed overhead light: an element facing up (0°) is brightest, facing down (180°) darkest.

use serde::Serialize;

const BASE_BRIGHTNESS: f32 = 70.0;
const BRIGHTNESS_RANGE: f32 = 30.0;
const BRIGHTNESS_BOUNDS: (f32, f32) = (30.0, 150.0);
const HIGHLIGHT_BOUNDS: (f32, f32) = (0.05, 0.30);
const SHADOW_BOUNDS: (f32, f32) = (0.10, 0.30);
/// The gradient turns at under a third of the twist rate.
const GRADIENT_FOLLOW: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightingParams {
    /// Metal grey level, 0-255 scale.
    pub brightness: f32,
    pub highlight_intensity: f32,
    pub shadow_intensity: f32,
    pub gradient_rotation: f32,
    /// `cos(angle)`: 1 facing the light, -1 facing away.
    pub light_factor: f32,
}

/// Grey levels for the stops of the metallic gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetalPalette {
    pub dark: u8,
    pub mid: u8,
    pub light: u8,
    pub highlight: u8,
}

pub fn normalize_angle(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

pub fn compute_lighting(twist_angle_degrees: f32) -> LightingParams {
    let angle = normalize_angle(twist_angle_degrees);
    let light_factor = angle.to_radians().cos();

    let brightness = (BASE_BRIGHTNESS + light_factor * BRIGHTNESS_RANGE)
        .round()
        .clamp(BRIGHTNESS_BOUNDS.0, BRIGHTNESS_BOUNDS.1);
    let highlight_intensity =
        (0.15 + light_factor * 0.1).clamp(HIGHLIGHT_BOUNDS.0, HIGHLIGHT_BOUNDS.1);
    let shadow_intensity = (0.2 - light_factor * 0.1).clamp(SHADOW_BOUNDS.0, SHADOW_BOUNDS.1);

    LightingParams {
        brightness,
        highlight_intensity,
        shadow_intensity,
        gradient_rotation: angle * GRADIENT_FOLLOW,
        light_factor,
    }
}

impl LightingParams {
    pub fn palette(&self) -> MetalPalette {
        let base = self.brightness;
        let level = |value: f32| value.clamp(0.0, 255.0) as u8;
        MetalPalette {
            dark: level((base - 25.0).max(30.0)),
            mid: level(base),
            light: level((base + 25.0).min(130.0)),
            highlight: level((base + 40.0).min(150.0)),
        }
    }

    /// Alpha of the soft shadow cast below the element.
    pub fn drop_shadow_alpha(&self) -> f32 {
        0.15 + self.light_factor * 0.1
    }

    /// Alpha of the thin outline around the element body.
    pub fn rim_alpha(&self) -> f32 {
        0.05 + self.light_factor * 0.05
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_lighting, normalize_angle};

    #[test]
    fn facing_the_light_is_brightest() {
        let up = compute_lighting(0.0);
        let side = compute_lighting(90.0);
        let down = compute_lighting(180.0);

        assert_eq!(up.brightness, 100.0);
        assert_eq!(side.brightness, 70.0);
        assert_eq!(down.brightness, 40.0);
        assert!(up.highlight_intensity > down.highlight_intensity);
        assert!(up.shadow_intensity < down.shadow_intensity);
        assert!((up.highlight_intensity - 0.25).abs() < 1e-6);
        assert!((down.shadow_intensity - 0.3).abs() < 1e-6);
    }

    #[test]
    fn lighting_is_periodic_in_full_turns() {
        for angle in [0.0_f32, 17.0, 45.5, 90.0, 180.0, 271.25, 359.0] {
            let base = compute_lighting(angle);
            for turns in [-3_i32, -1, 1, 2, 5] {
                let shifted = compute_lighting(angle + 360.0 * turns as f32);
                assert_eq!(base, shifted, "angle {angle} turns {turns}");
            }
        }
    }

    #[test]
    fn outputs_stay_within_bounds() {
        for step in 0..720 {
            let lighting = compute_lighting(step as f32 * 0.5 - 90.0);
            assert!((30.0..=150.0).contains(&lighting.brightness));
            assert!((0.05..=0.30).contains(&lighting.highlight_intensity));
            assert!((0.10..=0.30).contains(&lighting.shadow_intensity));
            assert!((0.0..108.0).contains(&lighting.gradient_rotation));
        }
    }

    #[test]
    fn palette_respects_floor_and_caps() {
        let bright = compute_lighting(0.0).palette();
        assert_eq!(bright.mid, 100);
        assert_eq!(bright.light, 125);
        assert_eq!(bright.highlight, 140);

        let dark = compute_lighting(180.0).palette();
        assert_eq!(dark.dark, 30);
        assert_eq!(dark.mid, 40);
    }

    #[test]
    fn normalize_angle_wraps_negatives() {
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(720.0), 0.0);
        assert_eq!(normalize_angle(f32::INFINITY), 0.0);
    }
}
