use serde::Serialize;

use crate::chain::layers::{ChainLayerConfig, LayerRegistry};
use crate::chain::lighting::{compute_lighting, LightingParams};
use crate::chain::transform::{chain_offset, compute_element_transform, ElementTransform};
use crate::easing::clamp01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementFrame {
    pub index: usize,
    pub transform: ElementTransform,
    pub lighting: LightingParams,
    /// Whether a connector piece joins this element to the next one.
    pub has_connector: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerFrame {
    pub id: String,
    pub vertical_position_percent: f32,
    pub scale: f32,
    pub opacity: f32,
    pub blur_amount: f32,
    pub rotation_bias: f32,
    pub chain_offset: f32,
    pub elements: Vec<ElementFrame>,
}

/// Every layer's geometry for one progress value, in paint order (back first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainFrame {
    pub progress: f32,
    pub layers: Vec<LayerFrame>,
}

impl ChainFrame {
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.elements.len()).sum()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerFrame> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct Compositor {
    registry: LayerRegistry,
    paint_order: Vec<usize>,
}

impl Compositor {
    pub fn new(registry: LayerRegistry) -> Self {
        let paint_order = registry.back_to_front();
        Self {
            registry,
            paint_order,
        }
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn compose(&self, smoothed_progress: f32) -> ChainFrame {
        let progress = clamp01(smoothed_progress);
        let layers = self
            .paint_order
            .iter()
            .map(|&index| compose_layer(&self.registry.layers()[index], progress))
            .collect();

        ChainFrame { progress, layers }
    }
}

fn compose_layer(layer: &ChainLayerConfig, progress: f32) -> LayerFrame {
    let elements = (0..layer.element_count)
        .map(|index| {
            let transform = compute_element_transform(index, layer, progress);
            ElementFrame {
                index,
                lighting: compute_lighting(transform.twist_angle_degrees),
                transform,
                has_connector: index + 1 < layer.element_count,
            }
        })
        .collect();

    LayerFrame {
        id: layer.id.clone(),
        vertical_position_percent: layer.vertical_position_percent,
        scale: layer.base_scale,
        opacity: layer.base_opacity,
        blur_amount: layer.blur_amount,
        rotation_bias: layer.rotation_bias,
        chain_offset: chain_offset(progress, layer),
        elements,
    }
}

#[cfg(test)]
mod tests {
    use super::Compositor;
    use crate::chain::layers::LayerRegistry;

    #[test]
    fn frame_covers_every_element_back_to_front() {
        let compositor = Compositor::new(LayerRegistry::default());
        let frame = compositor.compose(0.3);

        assert_eq!(frame.element_count(), compositor.registry().total_elements());
        assert_eq!(frame.layers.first().map(|layer| layer.id.as_str()), Some("back-lower"));
        assert_eq!(frame.layers.last().map(|layer| layer.id.as_str()), Some("foreground"));
    }

    #[test]
    fn only_the_last_element_lacks_a_connector() {
        let frame = Compositor::new(LayerRegistry::default()).compose(0.0);
        let foreground = frame.layer("foreground").expect("foreground layer");
        let connectors = foreground
            .elements
            .iter()
            .filter(|element| element.has_connector)
            .count();
        assert_eq!(connectors, foreground.elements.len() - 1);
        assert!(!foreground.elements[foreground.elements.len() - 1].has_connector);
    }

    #[test]
    fn lighting_follows_each_element_twist() {
        let frame = Compositor::new(LayerRegistry::default()).compose(0.5);
        let layer = frame.layer("mid-upper").expect("mid-upper layer");
        for element in &layer.elements {
            assert_eq!(
                element.lighting,
                crate::chain::lighting::compute_lighting(element.transform.twist_angle_degrees)
            );
        }
    }

    #[test]
    fn compose_clamps_progress() {
        let compositor = Compositor::new(LayerRegistry::default());
        assert_eq!(compositor.compose(1.2), compositor.compose(1.0));
        assert_eq!(compositor.compose(1.2).progress, 1.0);
    }
}
