use crate::chain::compositor::{ChainFrame, Compositor};
use crate::chain::layers::LayerRegistry;
use crate::progress::{ProgressOptions, ProgressSource, ScrollProgress};

/// Frame-driven controller for one mounted chain backdrop.
#[derive(Debug)]
pub struct ChainView {
    source: ProgressSource,
    compositor: Compositor,
    reduced_motion: bool,
    frame: Option<ChainFrame>,
    mounted: bool,
}

impl ChainView {
    pub fn new(registry: LayerRegistry, options: ProgressOptions) -> Self {
        Self {
            source: ProgressSource::new(options),
            compositor: Compositor::new(registry),
            reduced_motion: options.reduced_motion,
            frame: None,
            mounted: true,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn progress(&self) -> ScrollProgress {
        self.source.snapshot()
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn on_scroll(&mut self, raw_fraction: f32, at_ms: f64) {
        if self.mounted {
            self.source.observe_scroll(raw_fraction, at_ms);
        }
    }

    /// Advances one display frame. Returns the new frame only when the geometry changed.
    pub fn on_frame(&mut self, at_ms: f64) -> Option<&ChainFrame> {
        if !self.mounted {
            return None;
        }
        if self.reduced_motion {
            if self.frame.is_none() {
                self.frame = Some(self.static_frame());
                return self.frame.as_ref();
            }
            return None;
        }

        let smoothed = self.source.on_frame(at_ms).smoothed;
        let unchanged = self
            .frame
            .as_ref()
            .is_some_and(|frame| frame.progress == smoothed.clamp(0.0, 1.0));
        if unchanged {
            return None;
        }
        self.frame = Some(self.compositor.compose(smoothed));
        self.frame.as_ref()
    }

    pub fn current_frame(&self) -> Option<&ChainFrame> {
        self.frame.as_ref()
    }

    /// The motionless fallback shown when animation is disabled.
    pub fn static_frame(&self) -> ChainFrame {
        self.compositor.compose(0.0)
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.source.teardown();
        self.frame = None;
        tracing::debug!("chain view unmounted");
    }
}
