// Realistic mode: muffles every channel and, every 45 s, nudges the settings
// of whatever is already playing.
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use super::{AmbientController, Task};
use crate::audio::{FULL_RANGE_HZ, MUFFLED_HZ};
use crate::audio_api::AudioCommand;
use crate::scheduler::cancel_slot;
use crate::settings::RainIntensity;
use crate::shared::Channel;

const REALISTIC_PERIOD: Duration = Duration::from_secs(45);
const CUTOFF_TIME_CONSTANT: f32 = 0.25;

const RAIN_CHOICES: [RainIntensity; 3] =
    [RainIntensity::Light, RainIntensity::Medium, RainIntensity::Heavy];
const RAIN_VOLUME: RangeInclusive<i32> = 20..=49;
const CROWD_VOLUME: RangeInclusive<i32> = 10..=29;
const MUSIC_VOLUME: RangeInclusive<i32> = 15..=29;
const THUNDER_DROP_CHANCE: f64 = 0.2;
const THUNDER_JOIN_CHANCE: f64 = 0.1;

impl AmbientController {
    pub fn toggle_realistic_mode(&mut self) {
        self.realistic_mode = !self.realistic_mode;
        if self.realistic_mode {
            self.enable_realistic_mode();
        } else {
            self.disable_realistic_mode();
        }
        self.persist();
    }

    pub(super) fn enable_realistic_mode(&mut self) {
        self.ramp_all_cutoffs(MUFFLED_HZ);
        cancel_slot(&mut self.scheduler, &mut self.realistic_timer);
        self.realistic_timer =
            Some(self.scheduler.schedule_repeating(REALISTIC_PERIOD, Task::RealisticTick));
        info!(muffled = self.graph_available, "realistic mode enabled");
    }

    fn disable_realistic_mode(&mut self) {
        self.ramp_all_cutoffs(FULL_RANGE_HZ);
        cancel_slot(&mut self.scheduler, &mut self.realistic_timer);
        info!("realistic mode disabled");
    }

    // Without a filter graph there is nothing to ramp.
    fn ramp_all_cutoffs(&mut self, target_hz: f32) {
        if !self.graph_available {
            return;
        }
        for channel in Channel::ALL {
            self.emit(AudioCommand::RampCutoff {
                channel,
                target_hz,
                time_constant: CUTOFF_TIME_CONSTANT,
            });
        }
    }

    /// Varies only what is already on. Thunder is the one channel that may
    /// switch itself off, or on when rain is falling.
    pub fn randomize_settings(&mut self) {
        if !self.realistic_mode {
            return;
        }
        let s = &mut self.settings;
        let rng = &mut self.rng;
        let thunder_was_on = s.thunder.enabled;

        if s.rain.enabled {
            if let Some(&intensity) = RAIN_CHOICES.choose(rng) {
                s.rain.intensity = intensity;
            }
            s.rain.volume = rng.random_range(RAIN_VOLUME);
        }

        if s.thunder.enabled {
            if rng.random_bool(THUNDER_DROP_CHANCE) {
                s.thunder.enabled = false;
            }
        } else if s.rain.enabled && rng.random_bool(THUNDER_JOIN_CHANCE) {
            s.thunder.enabled = true;
        }

        if s.crowd.enabled {
            s.crowd.volume = rng.random_range(CROWD_VOLUME);
        }
        if s.music.enabled {
            s.music.volume = rng.random_range(MUSIC_VOLUME);
        }

        // a running thunder cycle is only reset when the flag flips
        let thunder_flipped = self.settings.thunder.enabled != thunder_was_on;
        self.update_rain();
        if thunder_flipped {
            self.update_thunder();
        }
        self.update_crowd();
        self.update_music();
        self.refresh_controls();
    }
}
