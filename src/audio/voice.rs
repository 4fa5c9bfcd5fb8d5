use std::sync::Arc;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

/// One channel's playback state: the engine-side twin of an `<audio>` element.
#[derive(Clone, Debug)]
pub struct ChannelVoice {
    buffer: Option<Arc<SampleBuffer>>,
    pos: usize,
    playing: bool,
    looped: bool,
    volume: f32,
}

impl Default for ChannelVoice {
    fn default() -> Self {
        Self {
            buffer: None,
            pos: 0,
            playing: false,
            looped: false,
            volume: 1.0,
        }
    }
}

impl ChannelVoice {
    /// A new source always starts from the top.
    pub fn attach(&mut self, buffer: Arc<SampleBuffer>) {
        self.buffer = Some(buffer);
        self.pos = 0;
    }

    pub fn detach(&mut self) {
        self.buffer = None;
        self.playing = false;
        self.pos = 0;
    }

    // Playing before the buffer arrives is allowed; output starts once it is attached.
    pub fn play(&mut self) {
        if let Some(buffer) = &self.buffer {
            if self.pos >= buffer.len() {
                self.pos = 0; // replaying an ended track starts over
            }
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Writes this voice into `out` (overwriting it) scaled by `gain`.
    /// Returns true when a non-looping source ran out during this block.
    pub fn render_into(&mut self, out: &mut [StereoFrame], gain: f32) -> bool {
        out.fill(StereoFrame::zero());
        if !self.playing {
            return false;
        }
        let Some(buffer) = &self.buffer else {
            return false;
        };
        let data = &buffer.data;
        if data.is_empty() {
            self.playing = false;
            return true;
        }

        for frame in out.iter_mut() {
            if self.pos >= data.len() {
                if self.looped {
                    self.pos = 0;
                } else {
                    self.playing = false;
                    return true;
                }
            }
            *frame = data[self.pos].scaled(gain);
            self.pos += 1;
        }
        if !self.looped && self.pos >= data.len() {
            self.playing = false;
            return true;
        }
        false
    }
}
