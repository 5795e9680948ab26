//! Scroll-synchronized chain backdrop.
//!
//! Progress flows one way: [`crate::progress::ProgressSource`] smooths the scroll signal,
//! [`transform::compute_element_transform`] places each element of each layer,
//! [`lighting::compute_lighting`] shades it from its twist, and the [`compositor::Compositor`]
//! assembles the layers back to front. All of it is pure per frame except the view controller.

pub mod compositor;
pub mod layers;
pub mod lighting;
pub mod transform;
pub mod view;

pub use compositor::{ChainFrame, Compositor, ElementFrame, LayerFrame};
pub use layers::{default_layers, ChainLayerConfig, Direction, FadeEnvelope, LayerRegistry};
pub use lighting::{compute_lighting, LightingParams, MetalPalette};
pub use transform::{compute_element_transform, ElementTransform};
pub use view::ChainView;
