// Rain drops drawn over the sky while the rain channel plays.
// Each restart queues a fixed batch of drops released one per SPAWN_INTERVAL.
use std::time::Duration;

use rand::Rng;

use crate::settings::RainIntensity;

const SPAWN_INTERVAL: Duration = Duration::from_millis(50);
const DROP_LIFETIME: Duration = Duration::from_secs(3);

pub fn drop_count(intensity: RainIntensity) -> usize {
    match intensity {
        RainIntensity::Light => 50,
        RainIntensity::Medium => 100,
        RainIntensity::Heavy => 200,
        RainIntensity::Storm => 300,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainDrop {
    pub x: f64,
    pub y: f64, // fall progress, 0 at the top; past 1.0 the drop is below the sky
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug)]
struct LiveDrop {
    born: Duration,
    x: f64,
    fall: Duration,
    opacity: f32,
}

#[derive(Clone, Debug, Default)]
pub struct RainField {
    visible: bool,
    clock: Duration,
    remaining: usize,
    next_spawn: Duration,
    drops: Vec<LiveDrop>,
}

impl RainField {
    pub fn restart(&mut self, intensity: RainIntensity) {
        self.visible = true;
        self.drops.clear();
        self.remaining = drop_count(intensity);
        self.next_spawn = self.clock;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.remaining = 0;
        self.drops.clear();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.drops.len()
    }

    /// Queued spawns are consumed even while rain is off; they just don't produce drops.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: Duration, rain_enabled: bool, rng: &mut R) {
        self.clock += dt;
        while self.remaining > 0 && self.next_spawn <= self.clock {
            if rain_enabled {
                self.drops.push(LiveDrop {
                    born: self.next_spawn,
                    x: rng.random::<f64>(),
                    fall: Duration::from_secs_f64(1.0 + rng.random::<f64>() * 2.0),
                    opacity: 0.3 + rng.random::<f32>() * 0.5,
                });
            }
            self.remaining -= 1;
            self.next_spawn += SPAWN_INTERVAL;
        }
        let clock = self.clock;
        self.drops.retain(|d| clock.saturating_sub(d.born) < DROP_LIFETIME);
    }

    pub fn drops(&self) -> Vec<RainDrop> {
        self.drops
            .iter()
            .map(|d| RainDrop {
                x: d.x,
                y: self.clock.saturating_sub(d.born).as_secs_f64() / d.fall.as_secs_f64(),
                opacity: d.opacity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawns_at_a_capped_rate() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = RainField::default();
        field.restart(RainIntensity::Light);
        field.advance(Duration::from_millis(1000), true, &mut rng);
        // t=0, 50, ..., 1000
        assert_eq!(field.live_count(), 21);
        assert!(field.drops().iter().all(|d| (0.3..0.8).contains(&d.opacity)));
    }

    #[test]
    fn batch_is_finite_and_drops_expire() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = RainField::default();
        field.restart(RainIntensity::Light);
        for _ in 0..100 {
            field.advance(Duration::from_millis(100), true, &mut rng);
        }
        assert_eq!(field.live_count(), 0);
        assert!(field.is_visible());
    }

    #[test]
    fn no_drops_while_disabled() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = RainField::default();
        field.restart(RainIntensity::Storm);
        field.advance(Duration::from_millis(500), false, &mut rng);
        assert_eq!(field.live_count(), 0);
    }

    #[test]
    fn hide_clears_everything() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = RainField::default();
        field.restart(RainIntensity::Heavy);
        field.advance(Duration::from_millis(200), true, &mut rng);
        field.hide();
        field.advance(Duration::from_millis(200), true, &mut rng);
        assert_eq!(field.live_count(), 0);
        assert!(!field.is_visible());
    }

    #[test]
    fn drop_counts_grow_with_intensity() {
        let counts: Vec<usize> = RainIntensity::ALL.iter().map(|i| drop_count(*i)).collect();
        assert_eq!(counts, vec![50, 100, 200, 300]);
    }
}
