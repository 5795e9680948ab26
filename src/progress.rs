use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::easing::clamp01;
use crate::motion_value::{MotionValue, SubscriptionId};
use crate::spring::{Spring, SpringConfig};

/// A raw derivative older than this is considered stale and reported as zero.
pub const VELOCITY_WINDOW_MS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollProgress {
    pub raw: f32,
    pub smoothed: f32,
    pub velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressOptions {
    #[serde(default = "SpringConfig::scroll")]
    pub spring: SpringConfig,
    #[serde(default = "default_velocity_spring")]
    pub velocity_spring: Option<SpringConfig>,
    #[serde(default)]
    pub reduced_motion: bool,
}

impl ProgressOptions {
    pub fn chain_backdrop() -> Self {
        Self {
            spring: SpringConfig::scroll_chain(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.spring.validate("scroll.spring")?;
        if let Some(velocity_spring) = &self.velocity_spring {
            velocity_spring.validate("scroll.velocity_spring")?;
        }
        Ok(())
    }
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            spring: SpringConfig::scroll(),
            velocity_spring: default_velocity_spring(),
            reduced_motion: false,
        }
    }
}

fn default_velocity_spring() -> Option<SpringConfig> {
    Some(SpringConfig::velocity())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChannel {
    Raw,
    Smoothed,
    Velocity,
    SmoothVelocity,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    at_ms: f64,
    value: f32,
}

/// Turns host scroll events and frame callbacks into a smoothed progress signal.
#[derive(Debug)]
pub struct ProgressSource {
    raw: MotionValue<f32>,
    smoothed: MotionValue<f32>,
    velocity: MotionValue<f32>,
    smooth_velocity: MotionValue<f32>,
    spring: Spring,
    velocity_spring: Option<Spring>,
    reduced_motion: bool,
    last_sample: Option<Sample>,
    raw_velocity: f32,
    last_frame_ms: Option<f64>,
    active: bool,
}

impl ProgressSource {
    pub fn new(options: ProgressOptions) -> Self {
        Self {
            raw: MotionValue::new(0.0),
            smoothed: MotionValue::new(0.0),
            velocity: MotionValue::new(0.0),
            smooth_velocity: MotionValue::new(0.0),
            spring: Spring::new(options.spring, 0.0),
            velocity_spring: options
                .velocity_spring
                .map(|config| Spring::new(config, 0.0)),
            reduced_motion: options.reduced_motion,
            last_sample: None,
            raw_velocity: 0.0,
            last_frame_ms: None,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feeds one scroll/resize observation from the host.
    pub fn observe_scroll(&mut self, raw_fraction: f32, at_ms: f64) {
        if !self.active {
            return;
        }
        let value = clamp01(raw_fraction);

        self.raw_velocity = match self.last_sample {
            Some(previous) => {
                let dt_ms = at_ms - previous.at_ms;
                if dt_ms > 0.0 {
                    ((value - previous.value) as f64 / (dt_ms / 1000.0)) as f32
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last_sample = Some(Sample { at_ms, value });

        self.raw.set(value);
        if self.reduced_motion {
            self.spring.jump(value);
            self.smoothed.set(value);
        } else {
            self.spring.set_target(value);
        }
    }

    /// Integrates the springs up to `at_ms`. Called once per display refresh.
    pub fn on_frame(&mut self, at_ms: f64) -> ScrollProgress {
        if !self.active {
            return self.snapshot();
        }

        let dt_seconds = self
            .last_frame_ms
            .map(|previous| ((at_ms - previous).max(0.0) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_frame_ms = Some(at_ms);

        let stale = self
            .last_sample
            .map_or(true, |sample| at_ms - sample.at_ms > VELOCITY_WINDOW_MS);
        if stale {
            self.raw_velocity = 0.0;
        }
        self.velocity.set(self.raw_velocity);

        let position = self.spring.step(dt_seconds);
        self.smoothed.set(position);

        let filtered = match self.velocity_spring.as_mut() {
            Some(spring) => {
                spring.set_target(self.raw_velocity);
                spring.step(dt_seconds)
            }
            None => self.raw_velocity,
        };
        self.smooth_velocity.set(filtered);

        self.snapshot()
    }

    pub fn snapshot(&self) -> ScrollProgress {
        ScrollProgress {
            raw: self.raw.get(),
            smoothed: self.smoothed.get(),
            velocity: self.velocity.get(),
        }
    }

    pub fn smooth_velocity(&self) -> f32 {
        self.smooth_velocity.get()
    }

    pub fn is_settled(&self) -> bool {
        self.spring.is_at_rest() && self.raw_velocity == 0.0
    }

    pub fn subscribe(
        &mut self,
        channel: ProgressChannel,
        listener: impl FnMut(f32) + 'static,
    ) -> SubscriptionId {
        self.channel_mut(channel).subscribe(listener)
    }

    pub fn unsubscribe(&mut self, channel: ProgressChannel, id: SubscriptionId) -> bool {
        self.channel_mut(channel).unsubscribe(id)
    }

    /// Stops observation; later scroll events and frames are ignored.
    pub fn teardown(&mut self) {
        self.active = false;
        for channel in [
            ProgressChannel::Raw,
            ProgressChannel::Smoothed,
            ProgressChannel::Velocity,
            ProgressChannel::SmoothVelocity,
        ] {
            self.channel_mut(channel).clear_subscribers();
        }
        tracing::debug!("progress source torn down");
    }

    fn channel_mut(&mut self, channel: ProgressChannel) -> &mut MotionValue<f32> {
        match channel {
            ProgressChannel::Raw => &mut self.raw,
            ProgressChannel::Smoothed => &mut self.smoothed,
            ProgressChannel::Velocity => &mut self.velocity,
            ProgressChannel::SmoothVelocity => &mut self.smooth_velocity,
        }
    }
}

/// Where progress 0 and 1 sit relative to a tracked element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollOffset {
    /// 0 when the element's top meets the viewport bottom, 1 when its bottom leaves the top.
    #[default]
    StartEndToEndStart,
    /// 0 when the element's top meets the viewport top, 1 when its bottom does.
    StartStartToEndStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRegion {
    Page {
        content_height: f32,
        viewport_height: f32,
    },
    Element {
        top: f32,
        height: f32,
        viewport_height: f32,
        offset: ScrollOffset,
    },
}

impl ScrollRegion {
    /// Raw progress for the given vertical scroll position. Empty ranges yield 0.
    pub fn fraction(&self, scroll_top: f32) -> f32 {
        let (start, end) = match *self {
            Self::Page {
                content_height,
                viewport_height,
            } => (0.0, content_height - viewport_height),
            Self::Element {
                top,
                height,
                viewport_height,
                offset,
            } => match offset {
                ScrollOffset::StartEndToEndStart => (top - viewport_height, top + height),
                ScrollOffset::StartStartToEndStart => (top, top + height),
            },
        };

        let span = end - start;
        if !span.is_finite() || span <= 0.0 {
            return 0.0;
        }
        clamp01((scroll_top - start) / span)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ProgressChannel, ProgressOptions, ProgressSource, ScrollOffset, ScrollRegion};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn run_frames(source: &mut ProgressSource, start_ms: f64, frames: u32) -> f64 {
        let mut now = start_ms;
        for _ in 0..frames {
            now += FRAME_MS;
            source.on_frame(now);
        }
        now
    }

    #[test]
    fn smoothed_converges_to_held_raw_value() {
        let mut source = ProgressSource::new(ProgressOptions::chain_backdrop());
        source.on_frame(0.0);
        source.observe_scroll(0.6, 1.0);

        let now = run_frames(&mut source, 0.0, 5);
        let early = source.snapshot();
        assert!(early.smoothed > 0.0 && early.smoothed < 0.6);

        run_frames(&mut source, now, 600);
        let settled = source.snapshot();
        assert_eq!(settled.raw, 0.6);
        assert_eq!(settled.smoothed, 0.6);
        assert!(source.is_settled());
    }

    #[test]
    fn identical_timestamps_yield_zero_velocity() {
        let mut source = ProgressSource::new(ProgressOptions::default());
        source.observe_scroll(0.1, 100.0);
        source.observe_scroll(0.4, 100.0);
        let progress = source.on_frame(100.0);
        assert_eq!(progress.velocity, 0.0);
        assert!(progress.velocity.is_finite());
    }

    #[test]
    fn velocity_is_derivative_of_raw_and_decays_when_idle() {
        let mut source = ProgressSource::new(ProgressOptions::default());
        source.observe_scroll(0.0, 0.0);
        source.observe_scroll(0.1, 100.0);
        let moving = source.on_frame(110.0);
        assert!((moving.velocity - 1.0).abs() < 1e-4);

        let idle = source.on_frame(200.0);
        assert_eq!(idle.velocity, 0.0);
    }

    #[test]
    fn raw_input_is_clamped() {
        let mut source = ProgressSource::new(ProgressOptions::default());
        source.observe_scroll(1.7, 0.0);
        assert_eq!(source.snapshot().raw, 1.0);
        source.observe_scroll(-3.0, 10.0);
        assert_eq!(source.snapshot().raw, 0.0);
    }

    #[test]
    fn reduced_motion_tracks_raw_without_lag() {
        let mut source = ProgressSource::new(ProgressOptions {
            reduced_motion: true,
            ..ProgressOptions::default()
        });
        source.observe_scroll(0.8, 0.0);
        assert_eq!(source.snapshot().smoothed, 0.8);
    }

    #[test]
    fn subscribers_follow_smoothed_until_teardown() {
        let seen = Rc::new(RefCell::new(0_usize));
        let counter = Rc::clone(&seen);

        let mut source = ProgressSource::new(ProgressOptions::default());
        source.subscribe(ProgressChannel::Smoothed, move |_| {
            *counter.borrow_mut() += 1
        });
        source.on_frame(0.0);
        source.observe_scroll(0.5, 0.0);
        let now = run_frames(&mut source, 0.0, 3);
        assert!(*seen.borrow() >= 3);

        source.teardown();
        let before = *seen.borrow();
        source.observe_scroll(1.0, now + 1.0);
        run_frames(&mut source, now, 10);
        assert_eq!(*seen.borrow(), before);
        assert!(!source.is_active());
        assert_eq!(source.snapshot().raw, 0.5);
    }

    #[test]
    fn page_fraction_handles_short_pages() {
        let page = ScrollRegion::Page {
            content_height: 3000.0,
            viewport_height: 1000.0,
        };
        assert_eq!(page.fraction(0.0), 0.0);
        assert_eq!(page.fraction(1000.0), 0.5);
        assert_eq!(page.fraction(5000.0), 1.0);

        let short = ScrollRegion::Page {
            content_height: 800.0,
            viewport_height: 1000.0,
        };
        assert_eq!(short.fraction(100.0), 0.0);
    }

    #[test]
    fn element_offsets_shift_the_tracked_window() {
        let enter_leave = ScrollRegion::Element {
            top: 2000.0,
            height: 500.0,
            viewport_height: 1000.0,
            offset: ScrollOffset::StartEndToEndStart,
        };
        assert_eq!(enter_leave.fraction(1000.0), 0.0);
        assert_eq!(enter_leave.fraction(1750.0), 0.5);
        assert_eq!(enter_leave.fraction(2500.0), 1.0);

        let pinned = ScrollRegion::Element {
            top: 0.0,
            height: 800.0,
            viewport_height: 1000.0,
            offset: ScrollOffset::StartStartToEndStart,
        };
        assert_eq!(pinned.fraction(400.0), 0.5);
    }
}
