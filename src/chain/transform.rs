use serde::Serialize;

use crate::chain::layers::ChainLayerConfig;
use crate::easing::clamp01;

/// Placement of one chain element for a single progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementTransform {
    pub horizontal_offset: f32,
    pub twist_angle_degrees: f32,
    pub depth_z: f32,
    pub scale: f32,
    pub opacity: f32,
}

/// Offset of an element's slot from the chain centre; slots are evenly spaced around zero.
pub fn fixed_slot_offset(element_index: usize, element_count: usize, element_spacing: f32) -> f32 {
    if element_count <= 1 {
        return 0.0;
    }
    let center = (element_count - 1) as f32 / 2.0;
    (element_index as f32 - center) * element_spacing
}

/// Per-element lag of the travelling twist wave.
pub fn phase_offset(element_index: usize, element_count: usize, phase_spread_degrees: f32) -> f32 {
    if element_count <= 1 {
        return 0.0;
    }
    let normalized = element_index as f32 / (element_count - 1).max(1) as f32;
    normalized * phase_spread_degrees
}

/// Horizontal translation shared by every element of the layer.
pub fn chain_offset(progress: f32, layer: &ChainLayerConfig) -> f32 {
    clamp01(progress) * layer.move_distance * layer.direction.sign()
}

/// Twist of the chain's first element; the rest lag behind by [`phase_offset`].
pub fn twist_base(progress: f32, layer: &ChainLayerConfig) -> f32 {
    clamp01(progress) * layer.twist_amount_degrees
}

pub fn compute_element_transform(
    element_index: usize,
    layer: &ChainLayerConfig,
    smoothed_progress: f32,
) -> ElementTransform {
    let progress = clamp01(smoothed_progress);
    let count = layer.element_count;

    let horizontal_offset = chain_offset(progress, layer)
        + fixed_slot_offset(element_index, count, layer.element_spacing);
    let twist_angle_degrees = twist_base(progress, layer)
        + phase_offset(element_index, count, layer.twist_phase_spread_degrees);

    let fade = layer
        .fade
        .map_or(1.0, |envelope| envelope.factor(element_index, progress));

    ElementTransform {
        horizontal_offset,
        twist_angle_degrees,
        depth_z: layer.depth_z,
        scale: layer.base_scale,
        opacity: clamp01(layer.base_opacity * fade),
    }
}
