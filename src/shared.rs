// The control plan:
//
// Panel (audio-control-panel), navigated with the arrow keys:
//   Up / Down       //  move focus between the controls present in this layout
//   Space / Enter   //  flip a toggle, press a button
//   Left / Right    //  slider -5 / +5, or cycle a select backwards / forwards
//
// Hotkeys (work even when the panel is closed):
//   p               //  TogglePanel (audio-control-btn)
//   m               //  MuteAll
//   R               //  ToggleRealisticMode
//   t               //  TestThunder
//   Esc             //  Quit
//
// Rendering: only the controller owns settings and timers; every frame the
// TUI asks it for a `DisplayState` and draws exactly that. Controls missing
// from the layout never produce
// events and are never drawn, without affecting the others.

use serde::Deserialize;

use crate::settings::{LightningIntensity, LightningType, RainIntensity, ThunderFrequency};
use crate::visuals::{BoltPath, LightningFrame, RainDrop};

pub const NUM_CHANNELS: usize = 4;
pub const VOLUME_STEP: i32 = 5;

/// One independently controllable ambient sound source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Rain,
    Thunder,
    Crowd,
    Music,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] =
        [Channel::Rain, Channel::Thunder, Channel::Crowd, Channel::Music];

    pub fn index(self) -> usize {
        match self {
            Channel::Rain => 0,
            Channel::Thunder => 1,
            Channel::Crowd => 2,
            Channel::Music => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Rain => "rain",
            Channel::Thunder => "thunder",
            Channel::Crowd => "crowd",
            Channel::Music => "music",
        }
    }
}

// Kebab-case names double as the panel element ids a config can hide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlId {
    AudioControlBtn,
    CloseAudioPanel,
    RealisticModeBtn,
    MuteAllBtn,
    RainToggle,
    RainVolume,
    RainIntensity,
    ThunderToggle,
    ThunderVolume,
    ThunderFrequency,
    LightningIntensity,
    LightningType,
    ThunderTest,
    CrowdToggle,
    CrowdVolume,
    MusicToggle,
    MusicVolume,
}

impl ControlId {
    // panel order
    pub const ALL: [ControlId; 17] = [
        ControlId::AudioControlBtn,
        ControlId::CloseAudioPanel,
        ControlId::RealisticModeBtn,
        ControlId::MuteAllBtn,
        ControlId::RainToggle,
        ControlId::RainVolume,
        ControlId::RainIntensity,
        ControlId::ThunderToggle,
        ControlId::ThunderVolume,
        ControlId::ThunderFrequency,
        ControlId::LightningIntensity,
        ControlId::LightningType,
        ControlId::ThunderTest,
        ControlId::CrowdToggle,
        ControlId::CrowdVolume,
        ControlId::MusicToggle,
        ControlId::MusicVolume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ControlId::AudioControlBtn => "Ambience panel",
            ControlId::CloseAudioPanel => "Close panel",
            ControlId::RealisticModeBtn => "Realistic mode",
            ControlId::MuteAllBtn => "Mute all",
            ControlId::RainToggle => "Rain",
            ControlId::RainVolume => "  volume",
            ControlId::RainIntensity => "  intensity",
            ControlId::ThunderToggle => "Thunder",
            ControlId::ThunderVolume => "  volume",
            ControlId::ThunderFrequency => "  frequency",
            ControlId::LightningIntensity => "  lightning",
            ControlId::LightningType => "  lightning type",
            ControlId::ThunderTest => "  test thunder",
            ControlId::CrowdToggle => "Crowd",
            ControlId::CrowdVolume => "  volume",
            ControlId::MusicToggle => "Music",
            ControlId::MusicVolume => "  volume",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    TogglePanel,
    ClosePanel,
    ToggleRealisticMode,
    MuteAll,

    SetEnabled(Channel, bool),
    SetVolume(Channel, i32), // raw slider value, stored without validation

    SetRainIntensity(RainIntensity),
    SetThunderFrequency(ThunderFrequency),
    SetLightningIntensity(LightningIntensity),
    SetLightningType(LightningType),
    TestThunder,

    Quit,
}

/// What a single control currently shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    Button(&'static str),
    Toggle(bool),
    Slider { value: i32, display: String },
    Select(&'static str),
}

// Mirror of every widget value; rebuilt by the controller's refresh_controls().
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlValues {
    pub rain_enabled: bool,
    pub rain_volume: i32,
    pub rain_intensity: RainIntensity,
    pub thunder_enabled: bool,
    pub thunder_volume: i32,
    pub thunder_frequency: ThunderFrequency,
    pub lightning_intensity: LightningIntensity,
    pub lightning_type: LightningType,
    pub crowd_enabled: bool,
    pub crowd_volume: i32,
    pub music_enabled: bool,
    pub music_volume: i32,
    pub realistic_mode: bool,
}

impl ControlValues {
    pub fn value(&self, control: ControlId) -> ControlValue {
        let slider = |value: i32| ControlValue::Slider { value, display: format!("{value}%") };
        match control {
            ControlId::AudioControlBtn => ControlValue::Button("toggle"),
            ControlId::CloseAudioPanel => ControlValue::Button("close"),
            ControlId::RealisticModeBtn => ControlValue::Button(if self.realistic_mode {
                "Disable Realistic Mode"
            } else {
                "Enable Realistic Mode"
            }),
            ControlId::MuteAllBtn => ControlValue::Button("mute"),
            ControlId::RainToggle => ControlValue::Toggle(self.rain_enabled),
            ControlId::RainVolume => slider(self.rain_volume),
            ControlId::RainIntensity => ControlValue::Select(self.rain_intensity.as_str()),
            ControlId::ThunderToggle => ControlValue::Toggle(self.thunder_enabled),
            ControlId::ThunderVolume => slider(self.thunder_volume),
            ControlId::ThunderFrequency => ControlValue::Select(self.thunder_frequency.as_str()),
            ControlId::LightningIntensity => {
                ControlValue::Select(self.lightning_intensity.as_str())
            }
            ControlId::LightningType => ControlValue::Select(self.lightning_type.as_str()),
            ControlId::ThunderTest => ControlValue::Button("strike"),
            ControlId::CrowdToggle => ControlValue::Toggle(self.crowd_enabled),
            ControlId::CrowdVolume => slider(self.crowd_volume),
            ControlId::MusicToggle => ControlValue::Toggle(self.music_enabled),
            ControlId::MusicVolume => slider(self.music_volume),
        }
    }
}

/// Where the lightning/thunder sequencer is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequencerState {
    #[default]
    Idle,
    Armed,
    Firing,
}

impl SequencerState {
    pub fn label(self) -> &'static str {
        match self {
            SequencerState::Idle => "idle",
            SequencerState::Armed => "armed",
            SequencerState::Firing => "striking",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    pub panel_open: bool,
    pub controls: ControlValues,
    pub now_playing: String, // "No song playing" while music is off
    pub sequencer: SequencerState,
    pub rain_visible: bool,
    pub drops: Vec<RainDrop>,
    pub lightning: LightningFrame,
    pub bolt: Option<BoltPath>,
    pub branches: Vec<BoltPath>,
}
