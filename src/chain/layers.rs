use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::easing::smoothstep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    /// Slides left to right as progress increases.
    Forward,
    /// Slides right to left as progress increases.
    Reverse,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Reverse),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Opacity envelope over progress: a staggered fade-in and a shared fade-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FadeEnvelope {
    pub fade_in: [f32; 2],
    pub fade_out: [f32; 2],
    #[serde(default)]
    pub stagger_per_element: f32,
}

impl FadeEnvelope {
    /// The assembling-chain envelope: links fade in one after another, all fade out at the end.
    pub const fn staggered_assembly() -> Self {
        Self {
            fade_in: [0.0, 0.08],
            fade_out: [0.92, 1.0],
            stagger_per_element: 0.015,
        }
    }

    /// Whole-container envelope for the assembling chain.
    pub const fn container() -> Self {
        Self {
            fade_in: [0.0, 0.05],
            fade_out: [0.92, 1.0],
            stagger_per_element: 0.0,
        }
    }

    pub fn factor(&self, element_index: usize, progress: f32) -> f32 {
        let shift = element_index as f32 * self.stagger_per_element;
        let fade_in = smoothstep(self.fade_in[0] + shift, self.fade_in[1] + shift, progress);
        let fade_out = 1.0 - smoothstep(self.fade_out[0], self.fade_out[1], progress);
        fade_in.min(fade_out)
    }

    fn validate(&self) -> Result<()> {
        for (label, range) in [("fade_in", self.fade_in), ("fade_out", self.fade_out)] {
            if !range[0].is_finite() || !range[1].is_finite() {
                bail!("{label} edges must be finite");
            }
            if range[1] < range[0] {
                bail!("{label} must be ascending, got [{}, {}]", range[0], range[1]);
            }
        }
        if !self.stagger_per_element.is_finite() || self.stagger_per_element < 0.0 {
            bail!("stagger_per_element must be >= 0");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainLayerConfig {
    pub id: String,
    pub vertical_position_percent: f32,
    pub base_scale: f32,
    pub base_opacity: f32,
    #[serde(default)]
    pub blur_amount: f32,
    pub element_count: usize,
    pub direction: Direction,
    #[serde(default)]
    pub rotation_bias: f32,
    pub move_distance: f32,
    pub twist_amount_degrees: f32,
    pub twist_phase_spread_degrees: f32,
    pub element_spacing: f32,
    #[serde(default)]
    pub depth_z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade: Option<FadeEnvelope>,
}

impl ChainLayerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("layer id cannot be empty");
        }
        if self.element_count < 1 {
            bail!("layer '{}': element_count must be >= 1", self.id);
        }
        if !(self.element_spacing > 0.0) {
            bail!(
                "layer '{}': element_spacing must be > 0, got {}",
                self.id,
                self.element_spacing
            );
        }
        for (field, value) in [
            ("vertical_position_percent", self.vertical_position_percent),
            ("base_scale", self.base_scale),
            ("base_opacity", self.base_opacity),
            ("blur_amount", self.blur_amount),
            ("rotation_bias", self.rotation_bias),
            ("move_distance", self.move_distance),
            ("twist_amount_degrees", self.twist_amount_degrees),
            ("twist_phase_spread_degrees", self.twist_phase_spread_degrees),
            ("depth_z", self.depth_z),
        ] {
            if !value.is_finite() {
                bail!("layer '{}': {field} must be finite", self.id);
            }
        }
        if !(0.0..=1.0).contains(&self.base_opacity) {
            bail!(
                "layer '{}': base_opacity must be within [0, 1], got {}",
                self.id,
                self.base_opacity
            );
        }
        if self.blur_amount < 0.0 {
            bail!("layer '{}': blur_amount must be >= 0", self.id);
        }
        if let Some(fade) = &self.fade {
            fade.validate()
                .with_context(|| format!("layer '{}': invalid fade envelope", self.id))?;
        }
        Ok(())
    }
}

/// The stock five-plane backdrop, front to back.
#[rustfmt::skip]
pub fn default_layers() -> Vec<ChainLayerConfig> {
    vec![
        stock_layer("foreground", 50.0, 1.0, 0.9, 0.0, 9, Direction::Reverse, 0.0, 600.0, 360.0, 45.0),
        stock_layer("mid-upper", 25.0, 0.7, 0.5, 1.5, 11, Direction::Forward, 5.0, 450.0, 270.0, 40.0),
        stock_layer("mid-lower", 75.0, 0.65, 0.45, 2.0, 11, Direction::Reverse, -5.0, 500.0, 300.0, 50.0),
        stock_layer("back-upper", 12.0, 0.45, 0.25, 3.0, 14, Direction::Forward, 8.0, 300.0, 180.0, 30.0),
        stock_layer("back-lower", 88.0, 0.4, 0.2, 4.0, 14, Direction::Reverse, -6.0, 250.0, 200.0, 35.0),
    ]
}

const STOCK_ELEMENT_SPACING: f32 = 140.0;

#[allow(clippy::too_many_arguments)]
fn stock_layer(
    id: &str,
    vertical_position_percent: f32,
    base_scale: f32,
    base_opacity: f32,
    blur_amount: f32,
    element_count: usize,
    direction: Direction,
    rotation_bias: f32,
    move_distance: f32,
    twist_amount_degrees: f32,
    twist_phase_spread_degrees: f32,
) -> ChainLayerConfig {
    ChainLayerConfig {
        id: id.to_owned(),
        vertical_position_percent,
        base_scale,
        base_opacity,
        blur_amount,
        element_count,
        direction,
        rotation_bias,
        move_distance,
        twist_amount_degrees,
        twist_phase_spread_degrees,
        element_spacing: STOCK_ELEMENT_SPACING,
        depth_z: 0.0,
        fade: None,
    }
}

/// Validated, immutable set of depth layers shared by every per-element computation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRegistry {
    layers: Vec<ChainLayerConfig>,
}

impl LayerRegistry {
    pub fn new(layers: Vec<ChainLayerConfig>) -> Result<Self> {
        if layers.is_empty() {
            bail!("chain must define at least one layer");
        }
        let mut seen = HashSet::with_capacity(layers.len());
        for layer in &layers {
            layer.validate()?;
            if !seen.insert(layer.id.as_str()) {
                bail!("duplicate layer id '{}'", layer.id);
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[ChainLayerConfig] {
        &self.layers
    }

    pub fn get(&self, id: &str) -> Option<&ChainLayerConfig> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn total_elements(&self) -> usize {
        self.layers.iter().map(|layer| layer.element_count).sum()
    }

    /// Layer indices in paint order: most blurred first, then deeper first, then declaration order.
    pub fn back_to_front(&self) -> Vec<usize> {
        let mut order = (0..self.layers.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            let (left, right) = (&self.layers[a], &self.layers[b]);
            right
                .blur_amount
                .total_cmp(&left.blur_amount)
                .then(left.depth_z.total_cmp(&right.depth_z))
                .then(a.cmp(&b))
        });
        order
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self {
            layers: default_layers(),
        }
    }
}
