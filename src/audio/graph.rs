//! Per-channel lowpass + gain chain used for the realistic-mode muffle.
//!
//! Cutoff changes follow set-target-at-time semantics: the cutoff approaches
//! the target exponentially with the given time constant, so a 0.25 s
//! constant covers ~63 % of the distance in a quarter second.

use super::frame::StereoFrame;
use crate::shared::{Channel, NUM_CHANNELS};

pub const FULL_RANGE_HZ: f32 = 22050.0;
pub const MUFFLED_HZ: f32 = 1000.0;

const MIN_CUTOFF_HZ: f32 = 10.0;
const NYQUIST_MARGIN: f32 = 0.45; // keep the cutoff below this fraction of the sample rate
const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;
const RECALC_EPSILON_HZ: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// RBJ cookbook lowpass, one state per side.
#[derive(Clone, Debug)]
struct Lowpass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    left: BiquadState,
    right: BiquadState,
}

impl Lowpass {
    fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut lp = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            left: BiquadState::default(),
            right: BiquadState::default(),
        };
        lp.set_cutoff(cutoff_hz, sample_rate);
        lp
    }

    fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let fc = cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * NYQUIST_MARGIN);
        let w0 = std::f32::consts::TAU * fc / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * BUTTERWORTH_Q);
        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos) * 0.5 / a0;
        self.b1 = (1.0 - cos) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    #[inline]
    fn tick(&self, s: &mut BiquadState, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * s.x1 + self.b2 * s.x2 - self.a1 * s.y1 - self.a2 * s.y2;
        s.x2 = s.x1;
        s.x1 = x;
        s.y2 = s.y1;
        s.y1 = y;
        y
    }

    fn process(&mut self, buf: &mut [StereoFrame]) {
        let (mut left, mut right) = (self.left, self.right);
        for f in buf.iter_mut() {
            f.left = self.tick(&mut left, f.left);
            f.right = self.tick(&mut right, f.right);
        }
        self.left = left;
        self.right = right;
    }
}

#[derive(Clone, Debug)]
struct GraphNode {
    filter: Lowpass,
    cutoff: f32,
    target: f32,
    time_constant: f32,
    applied: f32, // cutoff the coefficients were last computed for
    gain: f32,
}

#[derive(Clone, Debug)]
pub struct AudioGraph {
    sample_rate: f32,
    nodes: [GraphNode; NUM_CHANNELS],
}

impl AudioGraph {
    /// `None` when the chain can't be built for this output; callers then play directly.
    pub fn try_build(sample_rate: f32) -> Option<Self> {
        if !sample_rate.is_finite() || sample_rate < 2.0 * MIN_CUTOFF_HZ / NYQUIST_MARGIN {
            return None;
        }
        let node = GraphNode {
            filter: Lowpass::new(FULL_RANGE_HZ, sample_rate),
            cutoff: FULL_RANGE_HZ,
            target: FULL_RANGE_HZ,
            time_constant: 0.0,
            applied: FULL_RANGE_HZ,
            gain: 1.0,
        };
        Some(Self {
            sample_rate,
            nodes: std::array::from_fn(|_| node.clone()),
        })
    }

    pub fn ramp_cutoff(&mut self, channel: Channel, target_hz: f32, time_constant: f32) {
        let node = &mut self.nodes[channel.index()];
        node.target = target_hz.max(MIN_CUTOFF_HZ);
        node.time_constant = time_constant.max(0.0);
    }

    pub fn set_gain(&mut self, channel: Channel, gain: f32) {
        self.nodes[channel.index()].gain = gain.clamp(0.0, 1.0);
    }

    #[cfg(test)]
    pub fn cutoff(&self, channel: Channel) -> f32 {
        self.nodes[channel.index()].cutoff
    }

    /// Source -> lowpass -> gain, in place. The cutoff moves once per block.
    pub fn process(&mut self, channel: Channel, buf: &mut [StereoFrame]) {
        let sample_rate = self.sample_rate;
        let node = &mut self.nodes[channel.index()];
        let dt = buf.len() as f32 / sample_rate;
        node.cutoff = if node.time_constant <= 0.0 {
            node.target
        } else {
            node.target + (node.cutoff - node.target) * (-dt / node.time_constant).exp()
        };
        if (node.cutoff - node.applied).abs() > RECALC_EPSILON_HZ {
            node.filter.set_cutoff(node.cutoff, sample_rate);
            node.applied = node.cutoff;
        }
        node.filter.process(buf);
        for f in buf.iter_mut() {
            *f = f.scaled(node.gain);
        }
    }
}
