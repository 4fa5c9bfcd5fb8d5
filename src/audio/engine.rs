use std::sync::Arc;

use crossbeam_channel::Sender;

use super::frame::StereoFrame;
use super::graph::AudioGraph;
use super::sample_buffer::SampleBuffer;
use super::voice::ChannelVoice;
use crate::audio_api::{AudioCommand, AudioEvent};
use crate::shared::{Channel, NUM_CHANNELS};

const MAX_BLOCK: usize = 1024; // scratch size, so we don't malloc in the audio callback

// What actually reaches the audio thread: loads have already been decoded.
#[derive(Debug)]
pub enum EngineCommand {
    Attach { channel: Channel, buffer: Arc<SampleBuffer> },
    Detach(Channel),
    Control(AudioCommand),
}

pub struct Engine {
    voices: [ChannelVoice; NUM_CHANNELS],
    graph: Option<AudioGraph>, // None = direct playback, no muffle
    scratch: Vec<StereoFrame>,
    events_tx: Option<Sender<AudioEvent>>,
}

impl Engine {
    pub fn new(graph: Option<AudioGraph>) -> Self {
        Self {
            voices: std::array::from_fn(|_| ChannelVoice::default()),
            graph,
            scratch: vec![StereoFrame::zero(); MAX_BLOCK],
            events_tx: None,
        }
    }

    pub fn set_events_tx(&mut self, tx: Sender<AudioEvent>) {
        self.events_tx = Some(tx);
    }

    #[cfg(test)]
    pub fn voice(&self, channel: Channel) -> &ChannelVoice {
        &self.voices[channel.index()]
    }

    pub fn handle_cmd(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Attach { channel, buffer } => {
                self.voices[channel.index()].attach(buffer)
            }
            EngineCommand::Detach(channel) => self.voices[channel.index()].detach(),
            EngineCommand::Control(cmd) => self.apply(cmd),
        }
    }

    fn apply(&mut self, cmd: AudioCommand) {
        match cmd {
            // loads never get this far; the loader turns them into Attach/Detach
            AudioCommand::Load { .. } => {}
            AudioCommand::Play(channel) => self.voices[channel.index()].play(),
            AudioCommand::Pause(channel) => self.voices[channel.index()].pause(),
            AudioCommand::Rewind(channel) => self.voices[channel.index()].rewind(),
            AudioCommand::SetVolume { channel, gain } => {
                self.voices[channel.index()].set_volume(gain);
                if let Some(graph) = &mut self.graph {
                    graph.set_gain(channel, gain);
                }
            }
            AudioCommand::SetLoop { channel, looped } => {
                self.voices[channel.index()].set_looped(looped)
            }
            AudioCommand::RampCutoff { channel, target_hz, time_constant } => {
                if let Some(graph) = &mut self.graph {
                    graph.ramp_cutoff(channel, target_hz, time_constant);
                }
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for chunk in out.chunks_mut(MAX_BLOCK) {
            let n = chunk.len();
            for channel in Channel::ALL {
                let voice = &mut self.voices[channel.index()];
                let scratch = &mut self.scratch[..n];
                let ended = match &mut self.graph {
                    Some(graph) => {
                        let ended = voice.render_into(scratch, 1.0);
                        graph.process(channel, scratch);
                        ended
                    }
                    None => {
                        let volume = voice.volume();
                        voice.render_into(scratch, volume)
                    }
                };
                for (o, s) in chunk.iter_mut().zip(scratch.iter()) {
                    o.mix_in(*s);
                }
                if ended {
                    if let Some(tx) = &self.events_tx {
                        let _ = tx.try_send(AudioEvent::TrackEnded(channel));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(len: usize) -> Arc<SampleBuffer> {
        Arc::new(SampleBuffer { data: vec![StereoFrame::mono(1.0); len] })
    }

    fn control(engine: &mut Engine, cmd: AudioCommand) {
        engine.handle_cmd(EngineCommand::Control(cmd));
    }

    #[test]
    fn direct_playback_applies_volume() {
        let mut engine = Engine::new(None);
        engine.handle_cmd(EngineCommand::Attach { channel: Channel::Rain, buffer: ones(64) });
        control(&mut engine, AudioCommand::SetVolume { channel: Channel::Rain, gain: 0.3 });
        control(&mut engine, AudioCommand::Play(Channel::Rain));
        // ignored without a graph
        control(
            &mut engine,
            AudioCommand::RampCutoff {
                channel: Channel::Rain,
                target_hz: 1000.0,
                time_constant: 0.25,
            },
        );
        let mut out = vec![StereoFrame::zero(); 16];
        engine.render_block(&mut out);
        assert!((out[0].left - 0.3).abs() < 1e-6);
    }

    #[test]
    fn channels_are_mixed() {
        let mut engine = Engine::new(None);
        for channel in [Channel::Crowd, Channel::Music] {
            engine.handle_cmd(EngineCommand::Attach { channel, buffer: ones(64) });
            control(&mut engine, AudioCommand::SetVolume { channel, gain: 0.25 });
            control(&mut engine, AudioCommand::Play(channel));
        }
        let mut out = vec![StereoFrame::zero(); 8];
        engine.render_block(&mut out);
        assert!((out[7].right - 0.5).abs() < 1e-6);
    }

    #[test]
    fn track_end_is_reported() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut engine = Engine::new(AudioGraph::try_build(44100.0));
        engine.set_events_tx(tx);
        engine.handle_cmd(EngineCommand::Attach { channel: Channel::Music, buffer: ones(10) });
        control(&mut engine, AudioCommand::Play(Channel::Music));
        let mut out = vec![StereoFrame::zero(); 3000];
        engine.render_block(&mut out);
        assert_eq!(rx.try_recv(), Ok(AudioEvent::TrackEnded(Channel::Music)));
        assert!(rx.try_recv().is_err());
        assert!(!engine.voice(Channel::Music).is_playing());
    }

    #[test]
    fn detach_stops_the_voice() {
        let mut engine = Engine::new(None);
        engine.handle_cmd(EngineCommand::Attach { channel: Channel::Thunder, buffer: ones(10) });
        control(&mut engine, AudioCommand::Play(Channel::Thunder));
        engine.handle_cmd(EngineCommand::Detach(Channel::Thunder));
        let mut out = vec![StereoFrame::mono(3.0); 4];
        engine.render_block(&mut out);
        assert_eq!(out, vec![StereoFrame::zero(); 4]);
    }
}
