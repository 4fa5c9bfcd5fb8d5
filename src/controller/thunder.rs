//! Lightning/thunder sequencer.
//!
//! Idle (thunder off, no timers) -> Armed (one lightning-cycle timer pending)
//! -> Firing (flash shown, one thunder-clap timer pending, guard set). The
//! cycle timer rearms itself for as long as thunder stays enabled.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

use super::{AmbientController, Task};
use crate::assets::THUNDER_SOUNDS;
use crate::audio_api::AudioCommand;
use crate::scheduler::cancel_slot;
use crate::settings::{gain, ThunderFrequency};
use crate::shared::{Channel, SequencerState};
use crate::visuals::LightningShow;

// light before sound
const THUNDER_LAG_MS: RangeInclusive<u64> = 500..=3500;

/// Milliseconds between lightning cycles, bounds inclusive.
pub fn thunder_delay_range(frequency: ThunderFrequency) -> RangeInclusive<u64> {
    match frequency {
        ThunderFrequency::Rare => 300_000..=600_000,
        ThunderFrequency::Occasional => 120_000..=300_000,
        ThunderFrequency::Frequent => 30_000..=120_000,
        ThunderFrequency::Storm => 10_000..=30_000,
    }
}

pub fn sample_thunder_delay<R: Rng + ?Sized>(frequency: ThunderFrequency, rng: &mut R) -> Duration {
    Duration::from_millis(rng.random_range(thunder_delay_range(frequency)))
}

impl AmbientController {
    pub fn sequencer_state(&self) -> SequencerState {
        if self.lightning_in_progress {
            SequencerState::Firing
        } else if self.lightning_timer.is_some() {
            SequencerState::Armed
        } else {
            SequencerState::Idle
        }
    }

    /// Any thunder setting change lands here: everything pending is dropped
    /// first, then the cycle is rearmed if thunder is still on.
    pub fn update_thunder(&mut self) {
        self.stop_all_thunder_timers();
        let thunder = self.settings.thunder.clone();
        if thunder.enabled {
            self.emit(AudioCommand::SetVolume {
                channel: Channel::Thunder,
                gain: gain(thunder.volume),
            });
            self.arm_thunder();
        } else {
            self.stop_channel(Channel::Thunder);
        }
        self.persist();
    }

    /// Replaces the pending lightning-cycle timer. A clap already on its way
    /// is left alone so the running sequence can finish.
    pub fn arm_thunder(&mut self) {
        cancel_slot(&mut self.scheduler, &mut self.lightning_timer);
        if !self.settings.thunder.enabled {
            return;
        }
        let delay = sample_thunder_delay(self.settings.thunder.frequency, &mut self.rng);
        debug!(delay_ms = delay.as_millis() as u64, "lightning armed");
        self.lightning_timer = Some(self.scheduler.schedule(delay, Task::LightningCycle));
    }

    pub fn stop_all_thunder_timers(&mut self) {
        cancel_slot(&mut self.scheduler, &mut self.thunder_timer);
        cancel_slot(&mut self.scheduler, &mut self.lightning_timer);
        self.lightning_in_progress = false;
    }

    pub fn test_thunder(&mut self) {
        info!("testing thunder and lightning");
        self.fire_sequence();
    }

    pub(super) fn on_lightning_cycle(&mut self) {
        if self.settings.thunder.enabled && !self.lightning_in_progress {
            self.fire_sequence();
        }
        if self.settings.thunder.enabled {
            self.arm_thunder();
        }
    }

    fn fire_sequence(&mut self) {
        if !self.settings.thunder.enabled || self.lightning_in_progress {
            return;
        }
        self.lightning_in_progress = true;

        let lightning = self.settings.lightning.clone();
        let show = LightningShow::new(lightning.intensity, lightning.kind, &mut self.rng);
        self.strike = Some((self.scheduler.now(), show));

        let lag = Duration::from_millis(self.rng.random_range(THUNDER_LAG_MS));
        debug!(lag_ms = lag.as_millis() as u64, kind = lightning.kind.as_str(), "lightning strike");
        self.thunder_timer = Some(self.scheduler.schedule(lag, Task::ThunderClap));
    }

    pub(super) fn on_thunder_clap(&mut self) {
        if self.settings.thunder.enabled {
            self.play_thunder_sound();
        }
        self.lightning_in_progress = false;
    }

    fn play_thunder_sound(&mut self) {
        let Some(&file) = THUNDER_SOUNDS.choose(&mut self.rng) else {
            return;
        };
        let url = self.catalog.url(file);
        self.load_if_changed(Channel::Thunder, url);
        let volume = self.settings.thunder.volume;
        self.emit(AudioCommand::SetVolume { channel: Channel::Thunder, gain: gain(volume) });
        self.emit(AudioCommand::SetLoop { channel: Channel::Thunder, looped: false });
        self.emit(AudioCommand::Rewind(Channel::Thunder));
        self.emit(AudioCommand::Play(Channel::Thunder));
    }
}
