use crate::shared::Channel;

// Everything the controller can ask of the audio side. Mirrors what the web
// client did to its <audio> elements and filter nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    // The engine can't open files (it would stall the audio callback), so a
    // Load goes through the loader thread, which decodes the asset and hands
    // the buffer over.
    Load { channel: Channel, url: String },

    Play(Channel),
    Pause(Channel),
    Rewind(Channel), // back to position 0

    SetVolume { channel: Channel, gain: f32 }, // already normalised to [0, 1]
    SetLoop { channel: Channel, looped: bool },

    // Exponential approach toward target_hz; ignored when there is no filter graph.
    RampCutoff { channel: Channel, target_hz: f32, time_constant: f32 },
}

// What the audio side reports back.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioEvent {
    TrackEnded(Channel),
    PlaybackFailed { channel: Channel, url: String, reason: String },
}
