use std::thread::JoinHandle;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::assets::AssetCatalog;
use crate::audio_api::{AudioCommand, AudioEvent};
use crate::config::AudioConfig;
use crate::loader::{spawn_loader, AssetLoader};

mod engine;
mod frame;
mod graph;
mod sample_buffer;
mod voice;

pub use engine::EngineCommand;
pub use frame::StereoFrame;
pub use graph::{FULL_RANGE_HZ, MUFFLED_HZ};
pub use sample_buffer::SampleBuffer;

use engine::Engine;
use graph::AudioGraph;

const EVENT_CAPACITY: usize = 64;
const MIX_FRAMES: usize = 8192; // preallocated interleave buffer

pub struct AudioHandle {
    tx: Option<Sender<AudioCommand>>, // None = no output device, commands are dropped
    events_rx: Receiver<AudioEvent>,
    graph_available: bool,
    _stream: Option<cpal::Stream>,
    _loader: Option<JoinHandle<()>>,
}

impl AudioHandle {
    /// Silent stand-in used when no output can be opened. The controller still
    /// runs; it just never hears anything back.
    pub fn disabled() -> Self {
        let (_events_tx, events_rx) = crossbeam_channel::bounded(1);
        Self {
            tx: None,
            events_rx,
            graph_available: false,
            _stream: None,
            _loader: None,
        }
    }

    pub fn send(&self, cmd: AudioCommand) {
        match &self.tx {
            Some(tx) => {
                if tx.try_send(cmd).is_err() {
                    tracing::warn!("audio command queue full, dropping command");
                }
            }
            None => tracing::debug!(?cmd, "audio disabled, dropping command"),
        }
    }

    pub fn poll_event(&self) -> Option<AudioEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Whether the lowpass + gain chain exists; without it realistic mode can't muffle.
    pub fn graph_available(&self) -> bool {
        self.graph_available
    }
}

pub fn start_audio(config: &AudioConfig, catalog: AssetCatalog) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(config.command_capacity.max(1));
    let (engine_tx, engine_rx) =
        crossbeam_channel::bounded::<EngineCommand>(config.command_capacity.max(1));
    let (events_tx, events_rx) = crossbeam_channel::bounded::<AudioEvent>(EVENT_CAPACITY);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;

    let sample_rate = supported.sample_rate();
    let channels = supported.channels() as usize;

    let graph = if config.filter_graph {
        let graph = AudioGraph::try_build(sample_rate as f32);
        if graph.is_none() {
            tracing::warn!(
                sample_rate,
                "filter graph unavailable, falling back to direct playback"
            );
        }
        graph
    } else {
        None
    };
    let graph_available = graph.is_some();

    let mut engine = Engine::new(graph);
    engine.set_events_tx(events_tx.clone());

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output_stream_f32(&device, &supported.into(), engine, engine_rx, channels)?
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    };
    stream.play().context("failed to play output stream")?;

    let loader = spawn_loader(AssetLoader::new(catalog, sample_rate), rx, engine_tx, events_tx)
        .context("failed to start asset loader")?;

    tracing::info!(sample_rate, channels, graph_available, "audio output started");
    Ok(AudioHandle {
        tx: Some(tx),
        events_rx,
        graph_available,
        _stream: Some(stream),
        _loader: Some(loader),
    })
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
    rx: Receiver<EngineCommand>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut mix = vec![StereoFrame::zero(); MIX_FRAMES];
    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            if channels == 0 {
                return;
            }
            for out in data.chunks_mut(MIX_FRAMES * channels) {
                let n_frames = out.len() / channels;
                let frames = &mut mix[..n_frames];
                engine.render_block(frames);
                write_interleaved(frames, out, channels);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// Stereo into whatever layout the device has: mono gets the average, extra channels silence.
fn write_interleaved(frames: &[StereoFrame], out: &mut [f32], channels: usize) {
    for (frame, slot) in frames.iter().zip(out.chunks_mut(channels)) {
        match slot {
            [mono] => *mono = (frame.left + frame.right) * 0.5,
            [l, r, rest @ ..] => {
                *l = frame.left;
                *r = frame.right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Channel;

    #[test]
    fn disabled_handle_swallows_commands() {
        let audio = AudioHandle::disabled();
        audio.send(AudioCommand::Play(Channel::Rain));
        assert!(audio.poll_event().is_none());
        assert!(!audio.graph_available());
    }

    #[test]
    fn interleave_handles_mono_and_surround() {
        let frames = [StereoFrame { left: 1.0, right: 0.0 }, StereoFrame { left: 0.5, right: 0.5 }];
        let mut mono = [9.0; 2];
        write_interleaved(&frames, &mut mono, 1);
        assert_eq!(mono, [0.5, 0.5]);

        let mut quad = [9.0; 8];
        write_interleaved(&frames, &mut quad, 4);
        assert_eq!(quad, [1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0]);
    }
}
