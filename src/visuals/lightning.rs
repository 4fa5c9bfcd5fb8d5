//! Lightning visuals: a screen flash, a jagged bolt and (for multi-strike
//! types) a few thinner branches.
//!
//! A strike is precomputed into a keyframe timeline when it starts; the view
//! samples it with the time elapsed since the strike. All geometry is in
//! normalised sky coordinates: x in [0, 1] left to right, y in [0, 1] from
//! the top.

use std::time::Duration;

use rand::Rng;

use crate::settings::{LightningIntensity, LightningType};

const BOLT_SEGMENTS: usize = 20;
const BOLT_JITTER: f64 = 0.1;
const BRANCH_COUNT: usize = 3;
const BRANCH_SEGMENTS: usize = 8;
const BRANCH_JITTER: f64 = 0.06;
const BRANCH_OPACITY: f32 = 0.6;
const CONTINUOUS_FLICKERS: usize = 8;

const FADE_HIDE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlashProfile {
    pub opacity: f32,
    pub duration: Duration,
}

pub fn flash_profile(intensity: LightningIntensity) -> FlashProfile {
    let (opacity, ms) = match intensity {
        LightningIntensity::Subtle => (0.15, 100),
        LightningIntensity::Medium => (0.3, 150),
        LightningIntensity::Bright => (0.5, 200),
        LightningIntensity::Extreme => (0.7, 250),
    };
    FlashProfile { opacity, duration: Duration::from_millis(ms) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Screen,
    Bolt,
    Branches,
}

// `opacity: None` hides the layer entirely.
#[derive(Clone, Copy, Debug)]
struct Keyframe {
    at: Duration,
    layer: Layer,
    opacity: Option<f32>,
}

/// Opacity of each layer at one instant; `None` means not drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightningFrame {
    pub screen: Option<f32>,
    pub bolt: Option<f32>,
    pub branches: Option<f32>,
}

impl LightningFrame {
    pub fn is_dark(&self) -> bool {
        let lit = |o: Option<f32>| o.is_some_and(|v| v > 0.0);
        !(lit(self.screen) || lit(self.bolt) || lit(self.branches))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoltPath {
    pub points: Vec<(f64, f64)>,
}

impl BoltPath {
    fn jagged<R: Rng + ?Sized>(
        rng: &mut R,
        start: (f64, f64),
        segments: usize,
        jitter: f64,
        step_y: f64,
    ) -> Self {
        let mut points = Vec::with_capacity(segments + 1);
        let (mut x, mut y) = start;
        points.push((x, y));
        for _ in 0..segments {
            x = (x + (rng.random::<f64>() - 0.5) * jitter).clamp(0.0, 1.0);
            y += step_y;
            points.push((x, y));
        }
        Self { points }
    }

    /// Main bolt from the top centre down the full height.
    pub fn bolt<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::jagged(rng, (0.5, 0.0), BOLT_SEGMENTS, BOLT_JITTER, 1.0 / BOLT_SEGMENTS as f64)
    }

    /// Short offshoot starting in the middle third, a third of the way down.
    pub fn branch<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x0 = 1.0 / 3.0 + rng.random::<f64>() / 3.0;
        Self::jagged(rng, (x0, 1.0 / 3.0), BRANCH_SEGMENTS, BRANCH_JITTER, 1.0 / 30.0)
    }
}

#[derive(Clone, Debug)]
pub struct LightningShow {
    keyframes: Vec<Keyframe>,
    end: Duration,
    pub bolt: BoltPath,
    pub branches: Vec<BoltPath>,
}

impl LightningShow {
    pub fn new<R: Rng + ?Sized>(
        intensity: LightningIntensity,
        kind: LightningType,
        rng: &mut R,
    ) -> Self {
        let mut keyframes = Vec::new();
        let ms = Duration::from_millis;

        let profile = flash_profile(intensity);
        keyframes.push(Keyframe {
            at: Duration::ZERO,
            layer: Layer::Screen,
            opacity: Some(profile.opacity),
        });
        keyframes.push(Keyframe { at: profile.duration, layer: Layer::Screen, opacity: Some(0.0) });
        keyframes.push(Keyframe {
            at: profile.duration + ms(100),
            layer: Layer::Screen,
            opacity: None,
        });

        let mut bolt = |at: Duration, opacity: Option<f32>| {
            keyframes.push(Keyframe { at, layer: Layer::Bolt, opacity })
        };
        match kind {
            LightningType::Single => {
                bolt(Duration::ZERO, Some(1.0));
                bolt(ms(150), Some(0.0));
                bolt(ms(150) + FADE_HIDE, None);
            }
            LightningType::Multiple => {
                let flashes = rng.random_range(2..=4);
                let mut t = Duration::ZERO;
                for i in 0..flashes {
                    bolt(t, Some(1.0));
                    t += ms(rng.random_range(80..=200));
                    bolt(t, Some(0.0));
                    if i + 1 < flashes {
                        t += ms(rng.random_range(100..=300));
                    }
                }
                bolt(t + FADE_HIDE, None);
            }
            LightningType::Continuous => {
                let mut t = Duration::ZERO;
                for i in 0..CONTINUOUS_FLICKERS {
                    bolt(t, Some(0.2 + rng.random::<f32>() * 0.8));
                    if i + 1 < CONTINUOUS_FLICKERS {
                        // gaps shrink as the strobe runs out
                        let decay = 1.0 - i as f64 / (2 * CONTINUOUS_FLICKERS) as f64;
                        let gap = (50.0 + rng.random::<f64>() * 100.0) * decay;
                        t += Duration::from_secs_f64(gap / 1000.0);
                    }
                }
                t += ms(100);
                bolt(t, Some(0.0));
                bolt(t + FADE_HIDE, None);
            }
        }

        let branches = match kind {
            LightningType::Single => Vec::new(),
            LightningType::Multiple | LightningType::Continuous => {
                keyframes.push(Keyframe {
                    at: Duration::ZERO,
                    layer: Layer::Branches,
                    opacity: Some(BRANCH_OPACITY),
                });
                keyframes.push(Keyframe {
                    at: ms(200),
                    layer: Layer::Branches,
                    opacity: Some(0.0),
                });
                keyframes.push(Keyframe {
                    at: ms(200) + FADE_HIDE,
                    layer: Layer::Branches,
                    opacity: None,
                });
                (0..BRANCH_COUNT).map(|_| BoltPath::branch(rng)).collect()
            }
        };

        keyframes.sort_by_key(|k| k.at);
        let end = keyframes.last().map(|k| k.at).unwrap_or_default();
        Self { keyframes, end, bolt: BoltPath::bolt(rng), branches }
    }

    pub fn frame_at(&self, t: Duration) -> LightningFrame {
        let mut frame = LightningFrame::default();
        for k in self.keyframes.iter().take_while(|k| k.at <= t) {
            match k.layer {
                Layer::Screen => frame.screen = k.opacity,
                Layer::Bolt => frame.bolt = k.opacity,
                Layer::Branches => frame.branches = k.opacity,
            }
        }
        frame
    }

    pub fn is_finished(&self, t: Duration) -> bool {
        t >= self.end
    }

    #[cfg(test)]
    pub fn duration(&self) -> Duration {
        self.end
    }

    /// How many times the bolt lights up at full strength.
    #[cfg(test)]
    pub fn bolt_flashes(&self) -> usize {
        self.keyframes
            .iter()
            .filter(|k| k.layer == Layer::Bolt && k.opacity == Some(1.0))
            .count()
    }

    #[cfg(test)]
    fn bolt_lit_count(&self) -> usize {
        self.keyframes
            .iter()
            .filter(|k| k.layer == Layer::Bolt && k.opacity.is_some_and(|o| o > 0.0))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn flash_table() {
        assert_eq!(
            flash_profile(LightningIntensity::Subtle),
            FlashProfile { opacity: 0.15, duration: ms(100) }
        );
        assert_eq!(
            flash_profile(LightningIntensity::Extreme),
            FlashProfile { opacity: 0.7, duration: ms(250) }
        );
    }

    #[test]
    fn single_strike_flashes_once_and_hides() {
        let mut rng = StdRng::seed_from_u64(1);
        let show = LightningShow::new(LightningIntensity::Bright, LightningType::Single, &mut rng);
        assert_eq!(show.bolt_flashes(), 1);
        assert!(show.branches.is_empty());

        let start = show.frame_at(Duration::ZERO);
        assert_eq!(start.screen, Some(0.5));
        assert_eq!(start.bolt, Some(1.0));
        assert_eq!(start.branches, None);
        assert_eq!(show.frame_at(ms(200)).screen, Some(0.0));
        assert_eq!(show.frame_at(ms(350)).bolt, None);
        assert!(show.is_finished(ms(350)));
        assert!(show.frame_at(ms(400)).is_dark());
    }

    #[test]
    fn multiple_strike_has_two_to_four_flashes() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let show =
                LightningShow::new(LightningIntensity::Medium, LightningType::Multiple, &mut rng);
            assert!((2..=4).contains(&show.bolt_flashes()), "seed {seed}");
            assert_eq!(show.branches.len(), BRANCH_COUNT);
            assert_eq!(show.frame_at(Duration::ZERO).branches, Some(BRANCH_OPACITY));
        }
    }

    #[test]
    fn continuous_strike_flickers_eight_times() {
        let mut rng = StdRng::seed_from_u64(9);
        let show =
            LightningShow::new(LightningIntensity::Subtle, LightningType::Continuous, &mut rng);
        assert_eq!(show.bolt_lit_count(), CONTINUOUS_FLICKERS);
        let bolt_opacities: Vec<f32> = show
            .keyframes
            .iter()
            .filter(|k| k.layer == Layer::Bolt)
            .filter_map(|k| k.opacity)
            .filter(|o| *o > 0.0)
            .collect();
        assert!(bolt_opacities.iter().all(|o| (0.2..=1.0).contains(o)));
        assert!(show.is_finished(show.duration()));
        assert!(!show.is_finished(Duration::ZERO));
    }

    #[test]
    fn paths_stay_on_screen() {
        let mut rng = StdRng::seed_from_u64(3);
        let bolt = BoltPath::bolt(&mut rng);
        assert_eq!(bolt.points.len(), BOLT_SEGMENTS + 1);
        assert_eq!(bolt.points[0], (0.5, 0.0));
        assert!((bolt.points.last().unwrap().1 - 1.0).abs() < 1e-9);
        assert!(bolt.points.iter().all(|(x, _)| (0.0..=1.0).contains(x)));

        let branch = BoltPath::branch(&mut rng);
        assert_eq!(branch.points.len(), BRANCH_SEGMENTS + 1);
        let (x0, y0) = branch.points[0];
        assert!((1.0 / 3.0..=2.0 / 3.0).contains(&x0));
        assert!((y0 - 1.0 / 3.0).abs() < 1e-9);
    }
}
