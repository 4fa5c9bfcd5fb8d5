//! The ambient effects controller.
//!
//! One explicitly constructed object owns the settings, the settings store,
//! the timers and the visuals. Like the rest of the middle layer it never
//! talks to the audio engine directly: every entry point returns the
//! `AudioCommand`s the caller should forward.
//!
//! Time is virtual. `tick` moves the scheduler clock forward by the elapsed
//! frame time and runs whatever fell due, in due order.

use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::assets::AssetCatalog;
use crate::audio_api::{AudioCommand, AudioEvent};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::settings::{AmbientSettings, SettingsStore};
use crate::shared::{Channel, ControlValues, DisplayState, InputEvent, NUM_CHANNELS};
use crate::visuals::{LightningShow, RainField};

mod channels;
mod realistic;
mod thunder;

const RESTORE_DELAY: Duration = Duration::from_secs(1);
pub const NO_SONG: &str = "No song playing";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    LightningCycle,
    ThunderClap,
    RealisticTick,
    RestoreRealistic,
}

pub struct AmbientController {
    settings: AmbientSettings,
    realistic_mode: bool,
    store: SettingsStore,
    catalog: AssetCatalog,
    rng: StdRng,
    graph_available: bool,

    scheduler: Scheduler<Task>,
    lightning_timer: Option<TimerHandle>, // next lightning cycle
    thunder_timer: Option<TimerHandle>,   // pending clap after a flash
    realistic_timer: Option<TimerHandle>,
    lightning_in_progress: bool,

    current_song: usize,
    loaded: [Option<String>; NUM_CHANNELS], // url each channel last loaded

    panel_open: bool,
    controls: ControlValues,
    now_playing: String,
    rain: RainField,
    strike: Option<(Duration, LightningShow)>, // started at, timeline

    out: Vec<AudioCommand>,
}

impl AmbientController {
    pub fn new(
        catalog: AssetCatalog,
        store: SettingsStore,
        graph_available: bool,
        rng: StdRng,
    ) -> Self {
        Self {
            settings: AmbientSettings::default(),
            realistic_mode: false,
            store,
            catalog,
            rng,
            graph_available,
            scheduler: Scheduler::new(),
            lightning_timer: None,
            thunder_timer: None,
            realistic_timer: None,
            lightning_in_progress: false,
            current_song: 0,
            loaded: Default::default(),
            panel_open: false,
            controls: ControlValues::default(),
            now_playing: NO_SONG.to_string(),
            rain: RainField::default(),
            strike: None,
            out: Vec::new(),
        }
    }

    /// Loads persisted settings and brings every channel in line with them.
    pub fn start(&mut self) -> Vec<AudioCommand> {
        let loaded = self.store.load();
        self.settings = loaded.settings;
        if let Some(flag) = loaded.realistic_mode {
            self.realistic_mode = flag;
            // the muffle and the ticker come back a moment after startup
            self.scheduler.schedule(RESTORE_DELAY, Task::RestoreRealistic);
        }
        // pick the song first so an enabled music channel starts on it
        self.randomize_initial_song();
        self.update_audio_elements();
        self.refresh_controls();
        info!(realistic = self.realistic_mode, "ambience controller started");
        self.take_commands()
    }

    pub fn settings(&self) -> &AmbientSettings {
        &self.settings
    }

    pub fn realistic_mode(&self) -> bool {
        self.realistic_mode
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::TogglePanel => self.toggle_panel(),
            InputEvent::ClosePanel => self.close_panel(),
            InputEvent::ToggleRealisticMode => self.toggle_realistic_mode(),
            InputEvent::MuteAll => self.mute_all(),
            InputEvent::SetEnabled(channel, enabled) => {
                match channel {
                    Channel::Rain => self.settings.rain.enabled = enabled,
                    Channel::Thunder => self.settings.thunder.enabled = enabled,
                    Channel::Crowd => self.settings.crowd.enabled = enabled,
                    Channel::Music => self.settings.music.enabled = enabled,
                }
                self.update_channel(channel);
            }
            InputEvent::SetVolume(channel, volume) => {
                match channel {
                    Channel::Rain => self.settings.rain.volume = volume,
                    Channel::Thunder => self.settings.thunder.volume = volume,
                    Channel::Crowd => self.settings.crowd.volume = volume,
                    Channel::Music => self.settings.music.volume = volume,
                }
                self.update_channel(channel);
            }
            InputEvent::SetRainIntensity(intensity) => {
                self.settings.rain.intensity = intensity;
                self.update_rain();
            }
            InputEvent::SetThunderFrequency(frequency) => {
                self.settings.thunder.frequency = frequency;
                self.update_thunder();
            }
            InputEvent::SetLightningIntensity(intensity) => {
                self.settings.lightning.intensity = intensity;
                self.persist();
            }
            InputEvent::SetLightningType(kind) => {
                self.settings.lightning.kind = kind;
                self.persist();
            }
            InputEvent::TestThunder => self.test_thunder(),
            InputEvent::Quit => {}
        }
        self.refresh_controls();
        self.take_commands()
    }

    /// Advances the clock, runs due timers and moves the visuals along.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<AudioCommand> {
        let until = self.scheduler.now() + elapsed;
        while let Some((_, task)) = self.scheduler.pop_due(until) {
            self.run_task(task);
        }
        self.scheduler.advance_to(until);

        self.rain.advance(elapsed, self.settings.rain.enabled, &mut self.rng);
        let now = self.scheduler.now();
        if self
            .strike
            .as_ref()
            .is_some_and(|(started, show)| show.is_finished(now.saturating_sub(*started)))
        {
            self.strike = None;
        }
        self.take_commands()
    }

    pub fn on_audio_event(&mut self, event: AudioEvent) -> Vec<AudioCommand> {
        match event {
            AudioEvent::TrackEnded(Channel::Music) => {
                self.next_song();
                self.refresh_controls();
            }
            AudioEvent::TrackEnded(channel) => debug!(channel = channel.label(), "track ended"),
            AudioEvent::PlaybackFailed { channel, url, reason } => {
                // no retry; the channel just stays quiet
                warn!(channel = channel.label(), %url, %reason, "playback failed");
            }
        }
        self.take_commands()
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::LightningCycle => {
                self.lightning_timer = None;
                self.on_lightning_cycle();
            }
            Task::ThunderClap => {
                self.thunder_timer = None;
                self.on_thunder_clap();
            }
            Task::RealisticTick => {
                if self.realistic_mode {
                    self.randomize_settings();
                }
            }
            Task::RestoreRealistic => {
                if self.realistic_mode {
                    self.enable_realistic_mode();
                }
                self.refresh_controls();
            }
        }
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Turns every channel off and silences any pending thunder.
    pub fn mute_all(&mut self) {
        self.settings.rain.enabled = false;
        self.settings.thunder.enabled = false;
        self.settings.crowd.enabled = false;
        self.settings.music.enabled = false;
        self.stop_all_thunder_timers();
        self.update_audio_elements();
        self.refresh_controls();
        info!("all channels muted");
    }

    /// Rebuilds what the panel shows from the current settings.
    pub fn refresh_controls(&mut self) {
        let s = &self.settings;
        self.controls = ControlValues {
            rain_enabled: s.rain.enabled,
            rain_volume: s.rain.volume,
            rain_intensity: s.rain.intensity,
            thunder_enabled: s.thunder.enabled,
            thunder_volume: s.thunder.volume,
            thunder_frequency: s.thunder.frequency,
            lightning_intensity: s.lightning.intensity,
            lightning_type: s.lightning.kind,
            crowd_enabled: s.crowd.enabled,
            crowd_volume: s.crowd.volume,
            music_enabled: s.music.enabled,
            music_volume: s.music.volume,
            realistic_mode: self.realistic_mode,
        };
    }

    pub fn display_state(&self) -> DisplayState {
        let now = self.scheduler.now();
        let (lightning, bolt, branches) = match &self.strike {
            Some((started, show)) => {
                let frame = show.frame_at(now.saturating_sub(*started));
                let bolt = frame.bolt.map(|_| show.bolt.clone());
                let branches =
                    if frame.branches.is_some() { show.branches.clone() } else { Vec::new() };
                (frame, bolt, branches)
            }
            None => Default::default(),
        };
        DisplayState {
            panel_open: self.panel_open,
            controls: self.controls.clone(),
            now_playing: self.now_playing.clone(),
            sequencer: self.sequencer_state(),
            rain_visible: self.rain.is_visible(),
            drops: self.rain.drops(),
            lightning,
            bolt,
            branches,
        }
    }

    /// Saves settings; a failed write is logged and otherwise ignored.
    pub fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.settings, self.realistic_mode) {
            warn!("could not save ambience settings: {e}");
        }
    }

    fn emit(&mut self, cmd: AudioCommand) {
        self.out.push(cmd);
    }

    fn take_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.out)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::settings::LightningType;
    use crate::shared::{ControlId, ControlValue, SequencerState};

    #[test]
    fn start_applies_persisted_settings() {
        let blob = r#"{"rain":{"enabled":true,"volume":42,"intensity":"heavy"}}"#;
        let (ctl, _) = started(Some(blob));
        assert!(ctl.settings().rain.enabled);
        assert_eq!(ctl.settings().rain.volume, 42);
        assert!(!ctl.settings().thunder.enabled);
        let ds = ctl.display_state();
        assert!(ds.rain_visible);
        assert_eq!(
            ds.controls.value(ControlId::RainVolume),
            ControlValue::Slider { value: 42, display: "42%".into() }
        );
    }

    #[test]
    fn start_emits_rain_playback() {
        let (mut ctl, _) = controller_with(Some(r#"{"rain":{"enabled":true}}"#), 1);
        let cmds = ctl.start();
        assert!(cmds.contains(&AudioCommand::Load {
            channel: Channel::Rain,
            url: "/static/chatkada/sounds/Rain.mp3".into()
        }));
        assert!(cmds.contains(&AudioCommand::Play(Channel::Rain)));
    }

    #[test]
    fn persisted_realistic_mode_is_restored_after_a_second() {
        let (mut ctl, _) = started(Some(r#"{"realisticMode":true}"#));
        assert!(ctl.realistic_mode());
        assert!(ctl.realistic_timer.is_none());

        let cmds = ctl.tick(Duration::from_millis(999));
        assert!(!cmds.iter().any(|c| matches!(c, AudioCommand::RampCutoff { .. })));

        let cmds = ctl.tick(Duration::from_millis(1));
        let ramps = cmds.iter().filter(|c| matches!(c, AudioCommand::RampCutoff { .. })).count();
        assert_eq!(ramps, NUM_CHANNELS);
        assert!(ctl.realistic_timer.is_some());
        assert_eq!(
            ctl.display_state().controls.value(ControlId::RealisticModeBtn),
            ControlValue::Button("Disable Realistic Mode")
        );
    }

    #[test]
    fn persisted_false_flag_only_refreshes() {
        let (mut ctl, _) = started(Some(r#"{"realisticMode":false}"#));
        let cmds = ctl.tick(Duration::from_secs(2));
        assert!(cmds.is_empty());
        assert!(ctl.realistic_timer.is_none());
    }

    #[test]
    fn mute_all_disables_everything_and_saves() {
        let blob = concat!(
            r#"{"rain":{"enabled":true},"thunder":{"enabled":true},"#,
            r#""crowd":{"enabled":true},"music":{"enabled":true}}"#,
        );
        let (mut ctl, mem) = started(Some(blob));
        assert_eq!(ctl.sequencer_state(), SequencerState::Armed);

        let cmds = ctl.handle_input(InputEvent::MuteAll);
        for channel in Channel::ALL {
            assert!(cmds.contains(&AudioCommand::Pause(channel)));
            assert!(cmds.contains(&AudioCommand::Rewind(channel)));
        }
        assert_eq!(ctl.sequencer_state(), SequencerState::Idle);
        assert_eq!(ctl.scheduler.pending(), 0);

        let saved = persisted(&mem);
        for section in ["rain", "thunder", "crowd", "music"] {
            assert_eq!(saved[section]["enabled"], false);
        }
        assert_eq!(ctl.display_state().now_playing, NO_SONG);
    }

    #[test]
    fn every_mutation_is_saved() {
        let (mut ctl, mem) = started(None);
        ctl.handle_input(InputEvent::SetLightningType(LightningType::Continuous));
        assert_eq!(persisted(&mem)["lightning"]["type"], "continuous");

        ctl.handle_input(InputEvent::SetVolume(Channel::Crowd, 70));
        assert_eq!(persisted(&mem)["crowd"]["volume"], 70);

        ctl.handle_input(InputEvent::ToggleRealisticMode);
        assert_eq!(persisted(&mem)["realisticMode"], true);
    }

    #[test]
    fn panel_opens_and_closes() {
        let (mut ctl, _) = started(None);
        assert!(!ctl.display_state().panel_open);
        ctl.handle_input(InputEvent::TogglePanel);
        assert!(ctl.display_state().panel_open);
        ctl.handle_input(InputEvent::ClosePanel);
        assert!(!ctl.display_state().panel_open);
        ctl.handle_input(InputEvent::ClosePanel);
        assert!(!ctl.display_state().panel_open);
    }

    #[test]
    fn strike_is_drawn_then_cleared() {
        let blob = r#"{"thunder":{"enabled":true},"lightning":{"type":"multiple"}}"#;
        let (mut ctl, _) = started(Some(blob));
        ctl.handle_input(InputEvent::TestThunder);
        let ds = ctl.display_state();
        assert!(ds.bolt.is_some());
        assert_eq!(ds.branches.len(), 3);
        assert!(!ds.lightning.is_dark());

        ctl.tick(Duration::from_secs(5));
        let ds = ctl.display_state();
        assert!(ds.bolt.is_none());
        assert!(ds.lightning.is_dark());
    }

    #[test]
    fn unsaveable_store_does_not_break_updates() {
        struct Broken;
        impl crate::settings::KeyValueStore for Broken {
            fn get(&self, _: &str) -> crate::error::Result<Option<String>> {
                Ok(None)
            }
            fn set(&mut self, _: &str, _: &str) -> crate::error::Result<()> {
                Err(std::io::Error::other("read-only").into())
            }
        }
        use rand::SeedableRng;
        let mut ctl = AmbientController::new(
            AssetCatalog::new("chatkada", "static"),
            SettingsStore::new(Box::new(Broken)),
            false,
            StdRng::seed_from_u64(3),
        );
        ctl.start();
        let cmds = ctl.handle_input(InputEvent::SetEnabled(Channel::Crowd, true));
        assert!(cmds.contains(&AudioCommand::Play(Channel::Crowd)));
    }
}
